//! The intake orchestrator: one request lifecycle through a fixed gate
//! order, plus the decoupled attachment upload sub-flow.
//!
//! Gate order for a submission: rate limit, field validation, spam scoring,
//! normalization, persistence, audit event. Each gate either advances or
//! returns a tagged failure; only the lead insert is fatal once reached. The
//! `lead_created` event and the attachment metadata row are best-effort
//! secondary writes: their failure is logged loudly and never rolled back
//! into the caller's response.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tracing::{debug, error, info, warn};

use super::attachments;
use super::domain::{
    ContactMethod, IntakePayload, Language, Lead, LeadEvent, LeadEventId, LeadFile, LeadFileId,
    LeadId, LeadStatus, UploadPayload, Urgency,
};
use super::rate_limit::RateLimiter;
use super::repository::{AttachmentStore, LeadStore, StorageError, StoreError};
use super::scoring;
use super::spam::{self, SpamVerdict};
use crate::config::IntakeConfig;

/// Source channel recorded when the payload does not name one.
const DEFAULT_SOURCE: &str = "website";

/// Pipeline stages, in gate order. Used for tracing and to make the gate
/// sequence visible to tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeStage {
    RateChecked,
    Validated,
    SpamScored,
    Normalized,
    Persisted,
    EventLogged,
}

impl IntakeStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RateChecked => "rate_checked",
            Self::Validated => "validated",
            Self::SpamScored => "spam_scored",
            Self::Normalized => "normalized",
            Self::Persisted => "persisted",
            Self::EventLogged => "event_logged",
        }
    }
}

/// Who is calling, as best the edge can tell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    /// Forwarded-for identity, or `"unknown"`. Unknown callers share one
    /// rate-limit bucket, a known weak point.
    pub identity: String,
    pub user_agent: Option<String>,
}

impl CallerContext {
    pub fn unknown() -> Self {
        Self {
            identity: "unknown".to_string(),
            user_agent: None,
        }
    }
}

/// Successful submission result.
#[derive(Debug, Clone)]
pub struct IntakeAccepted {
    pub lead_id: LeadId,
    pub priority_score: u32,
    /// `NEW`, or `SPAM` when the heuristics flagged the submission. Spam is
    /// still acknowledged as a success to the caller.
    pub status: LeadStatus,
    pub spam: SpamVerdict,
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("Too many requests. Please try again later.")]
    RateLimited,
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid value for field: {0}")]
    InvalidField(&'static str),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Successful upload result.
///
/// `file_id` is `None` when the bytes were stored but the metadata row could
/// not be written; the stored object is reconciled out-of-band.
#[derive(Debug, Clone)]
pub struct UploadAccepted {
    pub file_id: Option<LeadFileId>,
    pub storage_path: String,
    pub signed_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid lead id")]
    InvalidLeadId,
    #[error("Invalid file type. Only images allowed.")]
    DisallowedMimeType,
    #[error("Invalid base64 file data")]
    InvalidEncoding(#[source] base64::DecodeError),
    #[error("File too large. Max {max} bytes.")]
    TooLarge { size: usize, max: usize },
    #[error("Lead not found")]
    LeadNotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Orchestrates the full intake pipeline over injected stores.
pub struct IntakeService<R, S> {
    store: Arc<R>,
    attachments: Arc<S>,
    limiter: RateLimiter,
    config: IntakeConfig,
}

impl<R, S> IntakeService<R, S>
where
    R: LeadStore + 'static,
    S: AttachmentStore + 'static,
{
    pub fn new(store: Arc<R>, attachments: Arc<S>, config: IntakeConfig) -> Self {
        let limiter = RateLimiter::new(
            Duration::seconds(config.rate_limit_window_secs),
            config.rate_limit_max_requests,
        );
        Self {
            store,
            attachments,
            limiter,
            config,
        }
    }

    /// Runs one public submission through the pipeline.
    pub fn submit(
        &self,
        payload: IntakePayload,
        caller: &CallerContext,
        now: DateTime<Utc>,
    ) -> Result<IntakeAccepted, IntakeError> {
        // Rate limiting precedes all validation to shed abusive volume
        // before any per-field work.
        if !self.limiter.check(&caller.identity, now) {
            warn!(identity = %caller.identity, "intake request over rate limit");
            return Err(IntakeError::RateLimited);
        }
        debug!(stage = IntakeStage::RateChecked.as_str(), identity = %caller.identity, "intake gate passed");

        if let Some(field) = first_missing_field(&payload) {
            return Err(IntakeError::MissingField(field));
        }
        debug!(stage = IntakeStage::Validated.as_str(), "intake gate passed");

        // Recorded regardless of outcome so the heuristics can be tuned
        // against real traffic.
        let verdict = spam::check_submission(&payload, now);
        info!(
            stage = IntakeStage::SpamScored.as_str(),
            identity = %caller.identity,
            score = verdict.score,
            spam = verdict.is_spam(),
            reasons = ?verdict.reasons(),
            pest = %payload.pest_detail,
            "intake spam check"
        );

        // The strict phone validator already ran client-side; the server
        // only strips formatting so equivalent inputs store identically.
        let phone: String = payload.phone.split_whitespace().collect();
        let lang: Language = payload
            .lang
            .parse()
            .map_err(|_| IntakeError::InvalidField("lang"))?;
        let urgency: Urgency = payload
            .urgency
            .parse()
            .map_err(|_| IntakeError::InvalidField("urgency"))?;
        let contact_method: ContactMethod = payload
            .contact_method
            .parse()
            .map_err(|_| IntakeError::InvalidField("contact_method"))?;
        debug!(stage = IntakeStage::Normalized.as_str(), "intake gate passed");

        let priority_score = scoring::priority_score(&payload.pest_detail, urgency);
        let sla_due_at = scoring::sla_due_at(urgency, now);
        let status = if verdict.is_spam() {
            LeadStatus::Spam
        } else {
            LeadStatus::New
        };

        let source = payload
            .source
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SOURCE.to_string());

        let lead = Lead {
            id: LeadId::new(),
            created_at: now,
            lang,
            source: source.clone(),
            utm_source: payload.utm_source.clone(),
            utm_campaign: payload.utm_campaign.clone(),
            pest_category: payload.pest_category.clone(),
            pest_detail: payload.pest_detail.clone(),
            urgency,
            postal_code: payload.postal_code.clone(),
            city: payload.city.clone(),
            description: payload.description.clone(),
            contact_method,
            phone,
            status,
            priority_score,
            sla_due_at,
            notes: None,
            assignee: None,
            updated_at: now,
        };

        let stored = self.store.insert_lead(lead).map_err(|err| {
            error!(stage = IntakeStage::Persisted.as_str(), error = %err, "lead insert failed");
            err
        })?;
        info!(
            stage = IntakeStage::Persisted.as_str(),
            lead_id = %stored.id,
            status = ?stored.status,
            priority_score,
            "lead created"
        );

        // Best-effort: the lead is worth more than its audit trail, so a
        // failed event write never rolls the lead back.
        let event = LeadEvent {
            id: LeadEventId::new(),
            lead_id: stored.id,
            actor: None,
            event_type: "lead_created".to_string(),
            payload: Some(json!({
                "source": source,
                "ip": caller.identity,
                "user_agent": caller.user_agent,
            })),
            created_at: now,
        };
        if let Err(err) = self.store.insert_event(event) {
            error!(
                stage = IntakeStage::EventLogged.as_str(),
                lead_id = %stored.id,
                error = %err,
                "lead created but audit event write failed"
            );
        } else {
            debug!(stage = IntakeStage::EventLogged.as_str(), lead_id = %stored.id, "intake gate passed");
        }

        Ok(IntakeAccepted {
            lead_id: stored.id,
            priority_score,
            status: stored.status,
            spam: verdict,
        })
    }

    /// Stores one attachment for an existing lead. Stateless per call;
    /// concurrent uploads for the same lead need no coordination because
    /// every call writes its own uniquely timestamped path.
    pub fn upload(
        &self,
        payload: UploadPayload,
        now: DateTime<Utc>,
    ) -> Result<UploadAccepted, UploadError> {
        if payload.lead_id.trim().is_empty() {
            return Err(UploadError::MissingField("lead_id"));
        }
        if payload.file_name.trim().is_empty() {
            return Err(UploadError::MissingField("file_name"));
        }
        if payload.file_data.is_empty() {
            return Err(UploadError::MissingField("file_data"));
        }
        if payload.mime_type.trim().is_empty() {
            return Err(UploadError::MissingField("mime_type"));
        }

        if !attachments::mime_allowed(&payload.mime_type) {
            return Err(UploadError::DisallowedMimeType);
        }

        let bytes =
            attachments::decode_file_data(&payload.file_data).map_err(UploadError::InvalidEncoding)?;
        if bytes.len() > self.config.max_upload_bytes {
            return Err(UploadError::TooLarge {
                size: bytes.len(),
                max: self.config.max_upload_bytes,
            });
        }

        let lead_id: LeadId = payload
            .lead_id
            .parse()
            .map_err(|_| UploadError::InvalidLeadId)?;
        if !self.store.lead_exists(lead_id)? {
            return Err(UploadError::LeadNotFound);
        }

        let path = attachments::storage_path(lead_id, &payload.file_name, now);
        self.attachments
            .put(&path, &bytes, &payload.mime_type)
            .map_err(|err| {
                error!(%lead_id, path = %path, error = %err, "attachment store write failed");
                err
            })?;
        info!(%lead_id, path = %path, size = bytes.len(), "attachment stored");

        // Best-effort metadata row; the stored object stays either way and
        // is reconciled out-of-band if this write fails.
        let file = LeadFile {
            id: LeadFileId::new(),
            lead_id,
            storage_path: path.clone(),
            mime_type: payload.mime_type.clone(),
            size_bytes: bytes.len() as u64,
            created_at: now,
        };
        let file_id = match self.store.insert_file(file) {
            Ok(stored) => Some(stored.id),
            Err(err) => {
                error!(
                    %lead_id,
                    path = %path,
                    error = %err,
                    "attachment stored but metadata write failed; object is unindexed"
                );
                None
            }
        };

        let signed_url = match self.attachments.signed_url(
            &path,
            Duration::seconds(self.config.signed_url_ttl_secs),
            now,
        ) {
            Ok(url) => Some(url),
            Err(err) => {
                error!(%lead_id, path = %path, error = %err, "signed url mint failed");
                None
            }
        };

        Ok(UploadAccepted {
            file_id,
            storage_path: path,
            signed_url,
        })
    }

    /// Identities currently tracked by the limiter; exported as a gauge by
    /// the metrics endpoint.
    pub fn tracked_identities(&self) -> usize {
        self.limiter.tracked_identities()
    }

    /// Decoded upload ceiling; the router sizes its HTTP body limit from it.
    pub fn max_upload_bytes(&self) -> usize {
        self.config.max_upload_bytes
    }
}

/// Exhaustive presence check; reports the first missing required field in
/// declaration order.
fn first_missing_field(payload: &IntakePayload) -> Option<&'static str> {
    let required: [(&'static str, &str); 9] = [
        ("lang", &payload.lang),
        ("pest_category", &payload.pest_category),
        ("pest_detail", &payload.pest_detail),
        ("urgency", &payload.urgency),
        ("postal_code", &payload.postal_code),
        ("city", &payload.city),
        ("description", &payload.description),
        ("contact_method", &payload.contact_method),
        ("phone", &payload.phone),
    ];
    required
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
}
