//! Step trait definition.

use crate::error::ProvisionError;

use super::types::{Check, StepContext};

/// One idempotent provisioning step.
///
/// Every step the provisioner runs implements this trait. `check` inspects
/// the host and reports whether the target state is already present;
/// `apply` brings the host to the target state.
///
/// # Example
///
/// ```ignore
/// pub struct EnsureToolStep;
///
/// impl Step for EnsureToolStep {
///     fn name(&self) -> &'static str {
///         "tool.install"
///     }
///
///     fn description(&self) -> &'static str {
///         "Installing tool"
///     }
///
///     fn check(&self, ctx: &StepContext<'_>) -> Result<Check, ProvisionError> {
///         if ctx.host.fs.exists(Path::new(r"C:\tool\tool.exe")) {
///             return Ok(Check::satisfied("tool.exe present"));
///         }
///         Ok(Check::Required)
///     }
///
///     fn apply(&self, ctx: &mut StepContext<'_>) -> Result<(), ProvisionError> {
///         // download and install
///         Ok(())
///     }
/// }
/// ```
pub trait Step {
    /// Unique step identifier (e.g., "runtime.install", "service.register").
    fn name(&self) -> &'static str;

    /// Progress message shown while the step runs.
    fn description(&self) -> &'static str;

    /// Inspect the host without changing it.
    ///
    /// Steps whose output is always replaced keep the default, which
    /// reports the step as required on every run.
    fn check(&self, _ctx: &StepContext<'_>) -> Result<Check, ProvisionError> {
        Ok(Check::Required)
    }

    /// Bring the host to the step's target state.
    fn apply(&self, ctx: &mut StepContext<'_>) -> Result<(), ProvisionError>;

    /// Details recorded in the run journal.
    fn details(&self, _ctx: &StepContext<'_>) -> serde_json::Value {
        serde_json::json!({})
    }
}
