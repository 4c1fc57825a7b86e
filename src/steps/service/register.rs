//! Service registration step.

use tracing::info;

use crate::error::ProvisionError;
use crate::services::ServiceSpec;
use crate::steps::traits::Step;
use crate::steps::types::StepContext;

/// Register the application as a Windows service, stopping and removing
/// any existing registration of the same name first.
pub struct RegisterServiceStep;

impl Step for RegisterServiceStep {
    fn name(&self) -> &'static str {
        "service.register"
    }

    fn description(&self) -> &'static str {
        "Registering Windows service"
    }

    fn apply(&self, ctx: &mut StepContext<'_>) -> Result<(), ProvisionError> {
        let spec = ServiceSpec::from_settings(ctx.settings);
        let nssm = ctx.nssm();

        if ctx.service_control().exists(&spec.name)? {
            info!(service = %spec.name, "Replacing existing service registration");
            nssm.stop(&spec.name)?;
            nssm.remove(&spec.name)?;
        }

        nssm.apply(&spec)
    }

    fn details(&self, ctx: &StepContext<'_>) -> serde_json::Value {
        serde_json::to_value(ServiceSpec::from_settings(ctx.settings))
            .unwrap_or(serde_json::Value::Null)
    }
}
