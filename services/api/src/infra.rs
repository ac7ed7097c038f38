//! In-process infrastructure adapters.
//!
//! The durable lead store and attachment bucket are external collaborators;
//! these in-memory implementations back local serving and tests.

use chrono::{DateTime, Duration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use lead_intake::intake::domain::{Lead, LeadEvent, LeadFile, LeadId, LeadStatus};
use lead_intake::intake::{AttachmentStore, LeadStore, StorageError, StoreError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryLeadStore {
    leads: Mutex<HashMap<LeadId, Lead>>,
    events: Mutex<Vec<LeadEvent>>,
    files: Mutex<Vec<LeadFile>>,
}

impl LeadStore for InMemoryLeadStore {
    fn insert_lead(&self, lead: Lead) -> Result<Lead, StoreError> {
        let mut leads = self.leads.lock().expect("lead mutex poisoned");
        if leads.contains_key(&lead.id) {
            return Err(StoreError::Conflict);
        }
        leads.insert(lead.id, lead.clone());
        Ok(lead)
    }

    fn lead_exists(&self, id: LeadId) -> Result<bool, StoreError> {
        let leads = self.leads.lock().expect("lead mutex poisoned");
        Ok(leads.contains_key(&id))
    }

    fn insert_event(&self, event: LeadEvent) -> Result<(), StoreError> {
        let mut events = self.events.lock().expect("event mutex poisoned");
        events.push(event);
        Ok(())
    }

    fn insert_file(&self, file: LeadFile) -> Result<LeadFile, StoreError> {
        let mut files = self.files.lock().expect("file mutex poisoned");
        files.push(file.clone());
        Ok(file)
    }

    fn active_leads(&self, limit: usize) -> Result<Vec<Lead>, StoreError> {
        let leads = self.leads.lock().expect("lead mutex poisoned");
        let mut active: Vec<Lead> = leads
            .values()
            .filter(|lead| lead.status == LeadStatus::New)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));
        active.truncate(limit);
        Ok(active)
    }
}

struct StoredObject {
    bytes: Vec<u8>,
    mime_type: String,
}

/// Keeps attachment bytes in memory and mints pseudo-signed URLs carrying an
/// expiry and an opaque token, mirroring the shape of a bucket's signed URL.
#[derive(Default)]
pub(crate) struct InMemoryAttachmentStore {
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl AttachmentStore for InMemoryAttachmentStore {
    fn put(&self, path: &str, bytes: &[u8], mime_type: &str) -> Result<(), StorageError> {
        let mut objects = self.objects.lock().expect("object mutex poisoned");
        objects.insert(
            path.to_string(),
            StoredObject {
                bytes: bytes.to_vec(),
                mime_type: mime_type.to_string(),
            },
        );
        Ok(())
    }

    fn signed_url(
        &self,
        path: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String, StorageError> {
        let objects = self.objects.lock().expect("object mutex poisoned");
        if !objects.contains_key(path) {
            return Err(StorageError::Missing(path.to_string()));
        }
        let expires = (now + ttl).timestamp();
        let token = Uuid::new_v4().simple();
        Ok(format!("/storage/v1/{path}?token={token}&expires={expires}"))
    }
}

impl InMemoryAttachmentStore {
    #[cfg(test)]
    pub(crate) fn object_size(&self, path: &str) -> Option<usize> {
        let objects = self.objects.lock().expect("object mutex poisoned");
        objects.get(path).map(|object| object.bytes.len())
    }

    #[cfg(test)]
    pub(crate) fn object_mime(&self, path: &str) -> Option<String> {
        let objects = self.objects.lock().expect("object mutex poisoned");
        objects.get(path).map(|object| object.mime_type.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_url_requires_a_stored_object() {
        let store = InMemoryAttachmentStore::default();
        let now = Utc::now();
        assert!(matches!(
            store.signed_url("leads/x/1_a.jpg", Duration::seconds(60), now),
            Err(StorageError::Missing(_))
        ));

        store
            .put("leads/x/1_a.jpg", b"bytes", "image/jpeg")
            .expect("put succeeds");
        let url = store
            .signed_url("leads/x/1_a.jpg", Duration::seconds(60), now)
            .expect("url minted");
        assert!(url.contains("leads/x/1_a.jpg"));
        assert!(url.contains(&format!("expires={}", (now + Duration::seconds(60)).timestamp())));
        assert_eq!(store.object_size("leads/x/1_a.jpg"), Some(5));
        assert_eq!(
            store.object_mime("leads/x/1_a.jpg").as_deref(),
            Some("image/jpeg")
        );
    }
}
