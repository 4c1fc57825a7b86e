//! Application dependency step.

use tracing::info;

use crate::error::ProvisionError;
use crate::services::venv_python;
use crate::steps::traits::Step;
use crate::steps::types::StepContext;

/// Run the environment's package installer against the requirements
/// manifest. Always invoked.
pub struct InstallDependenciesStep;

impl Step for InstallDependenciesStep {
    fn name(&self) -> &'static str {
        "app.dependencies"
    }

    fn description(&self) -> &'static str {
        "Installing application dependencies"
    }

    fn apply(&self, ctx: &mut StepContext<'_>) -> Result<(), ProvisionError> {
        let settings = ctx.settings;
        let requirements = settings.paths.install_root.join(&settings.app.requirements);

        let invocation = ctx
            .command(venv_python(settings).display().to_string())
            .args(["-m", "pip", "install", "-r"])
            .arg(requirements.display().to_string())
            .working_dir(&settings.paths.install_root)
            .timeout(ctx.install_timeout());
        ctx.run_install("application dependencies", &invocation)?;

        info!(requirements = %requirements.display(), "Dependencies installed");
        Ok(())
    }

    fn details(&self, ctx: &StepContext<'_>) -> serde_json::Value {
        serde_json::json!({
            "requirements": ctx.settings.paths.install_root.join(&ctx.settings.app.requirements),
        })
    }
}
