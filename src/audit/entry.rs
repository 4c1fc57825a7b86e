//! Audit entry types.
//!
//! Defines the structure of run journal entries.

use serde::Serialize;
use uuid::Uuid;

/// A single journal entry: one provisioning step of one run.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// RFC 3339 timestamp when the step finished.
    pub timestamp: String,
    /// Identifier shared by every entry of one run.
    pub run_id: Uuid,
    /// Position of the step in the pipeline, starting at 1.
    pub index: usize,
    /// Step name, e.g. `service.register`.
    pub step: String,
    /// Sanitized step details (paths, URLs; credentials redacted).
    pub details: serde_json::Value,
    /// Outcome of the step.
    pub result: AuditResult,
    /// Step duration in milliseconds.
    pub duration_ms: u64,
}

impl AuditEntry {
    pub fn new(
        run_id: Uuid,
        index: usize,
        step: impl Into<String>,
        details: serde_json::Value,
        result: AuditResult,
        duration_ms: u64,
    ) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            run_id,
            index,
            step: step.into(),
            details,
            result,
            duration_ms,
        }
    }
}

/// Result of a step for audit purposes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status")]
pub enum AuditResult {
    /// The step changed the host.
    #[serde(rename = "applied")]
    Applied,
    /// The step's target state was already present.
    #[serde(rename = "skipped")]
    Skipped { reason: String },
    /// The step failed and the run stopped.
    #[serde(rename = "failure")]
    Failure {
        error_code: String,
        error_message: String,
    },
}
