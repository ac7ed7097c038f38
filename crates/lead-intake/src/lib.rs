//! Lead intake and triage pipeline for a pest-control dispatch service.
//!
//! The `intake` module carries the whole public-submission pipeline: payload
//! validation, anti-spam scoring, rate limiting, priority/SLA computation,
//! persistence through the [`intake::repository`] traits, and the attachment
//! upload sub-flow. HTTP routing lives in [`intake::router`] so the service
//! binary only adds operational endpoints around it.

pub mod config;
pub mod error;
pub mod intake;
pub mod telemetry;
