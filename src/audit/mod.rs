//! Run journal module.
//!
//! Records every step of every run as one JSON line, so an operator can
//! see what a partially failed run left behind.
//!
//! ## Features
//!
//! - Structured JSON entries with run id, step and outcome
//! - Redaction of credential keys and known secret values

mod entry;
mod logger;
mod sanitize;

pub use entry::{AuditEntry, AuditResult};
pub use logger::{AuditLogger, AuditSink, NullAuditLogger};
pub use sanitize::{redact_secrets, sanitize_params};
