//! Storage abstractions consumed by the pipeline.
//!
//! The durable lead store and the attachment object store are external
//! collaborators; the pipeline only depends on these traits so it can run
//! against in-memory implementations in tests and local serving.

use chrono::{DateTime, Duration, Utc};

use super::domain::{Lead, LeadEvent, LeadFile, LeadId};

/// Durable table of leads, lead files, and lead events.
pub trait LeadStore: Send + Sync {
    fn insert_lead(&self, lead: Lead) -> Result<Lead, StoreError>;
    fn lead_exists(&self, id: LeadId) -> Result<bool, StoreError>;
    /// Appends an audit event. Callers treat failures as best-effort.
    fn insert_event(&self, event: LeadEvent) -> Result<(), StoreError>;
    fn insert_file(&self, file: LeadFile) -> Result<LeadFile, StoreError>;
    /// `NEW`-status leads ordered by priority, backing the operator queue.
    fn active_leads(&self, limit: usize) -> Result<Vec<Lead>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("lead store unavailable: {0}")]
    Unavailable(String),
}

/// Private object bucket holding intake attachments.
pub trait AttachmentStore: Send + Sync {
    /// Stores `bytes` at `path`; paths are unique per upload so no
    /// overwrite semantics are needed.
    fn put(&self, path: &str, bytes: &[u8], mime_type: &str) -> Result<(), StorageError>;
    /// Mints a time-limited read URL for a stored object.
    fn signed_url(
        &self,
        path: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("attachment storage unavailable: {0}")]
    Unavailable(String),
    #[error("stored object missing: {0}")]
    Missing(String),
}
