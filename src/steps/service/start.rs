//! Service startup step.

use tracing::info;

use crate::error::ProvisionError;
use crate::steps::traits::Step;
use crate::steps::types::StepContext;

/// Start the application service, then make sure the web server's host
/// service is running.
pub struct StartServicesStep;

impl Step for StartServicesStep {
    fn name(&self) -> &'static str {
        "services.start"
    }

    fn description(&self) -> &'static str {
        "Starting services"
    }

    fn apply(&self, ctx: &mut StepContext<'_>) -> Result<(), ProvisionError> {
        let control = ctx.service_control();
        let app_service = &ctx.settings.app.service_name;
        let proxy_service = &ctx.settings.proxy.service_name;

        control.start(app_service)?;
        if control.ensure_running(proxy_service)? {
            info!(service = %proxy_service, "Started proxy host service");
        }
        Ok(())
    }

    fn details(&self, ctx: &StepContext<'_>) -> serde_json::Value {
        serde_json::json!({
            "services": [ctx.settings.app.service_name, ctx.settings.proxy.service_name],
        })
    }
}
