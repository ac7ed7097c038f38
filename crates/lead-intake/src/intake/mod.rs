//! Public lead-intake pipeline: validation, anti-spam scoring, rate limiting,
//! priority/SLA computation, persistence, and the attachment upload sub-flow.
//!
//! The orchestrating [`IntakeService`] runs each submission through a fixed
//! gate order (rate limit, field validation, spam scoring, normalization,
//! persistence, audit event). Storage is reached only through the
//! [`repository`] traits so the pipeline can be exercised against in-memory
//! fakes.

pub mod attachments;
pub mod domain;
pub mod rate_limit;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;
pub mod spam;
pub mod validation;

pub use domain::{
    ContactMethod, IntakePayload, Language, Lead, LeadEvent, LeadFile, LeadId, LeadStatus,
    UploadPayload, Urgency,
};
pub use rate_limit::RateLimiter;
pub use repository::{AttachmentStore, LeadStore, StorageError, StoreError};
pub use router::intake_router;
pub use service::{
    CallerContext, IntakeAccepted, IntakeError, IntakeService, UploadAccepted, UploadError,
};
pub use spam::{SpamSignal, SpamVerdict};
