//! Virtual environment step.

use tracing::{debug, info};

use crate::error::ProvisionError;
use crate::services::venv_python;
use crate::steps::traits::Step;
use crate::steps::types::{install_failure, StepContext};

/// Create the virtual environment under the install root.
///
/// Always invoked. An environment that already exists counts as success.
pub struct CreateVirtualenvStep;

impl Step for CreateVirtualenvStep {
    fn name(&self) -> &'static str {
        "runtime.virtualenv"
    }

    fn description(&self) -> &'static str {
        "Creating virtual environment"
    }

    fn apply(&self, ctx: &mut StepContext<'_>) -> Result<(), ProvisionError> {
        let settings = ctx.settings;
        let venv_dir = settings.paths.install_root.join(&settings.runtime.venv_dir);

        let invocation = ctx
            .command(settings.runtime.marker.display().to_string())
            .args(["-m", "venv"])
            .arg(venv_dir.display().to_string())
            .working_dir(&settings.paths.install_root)
            .timeout(ctx.install_timeout());
        let result = ctx.run(&invocation)?;

        if result.success {
            info!(path = %venv_dir.display(), "Virtual environment ready");
            return Ok(());
        }

        let already_exists = result.diagnostic().to_lowercase().contains("already exists")
            || ctx.host.fs.exists(&venv_python(settings));
        if already_exists {
            debug!(path = %venv_dir.display(), "Virtual environment already exists");
            return Ok(());
        }

        Err(install_failure("virtual environment", &invocation, &result))
    }

    fn details(&self, ctx: &StepContext<'_>) -> serde_json::Value {
        serde_json::json!({
            "path": ctx.settings.paths.install_root.join(&ctx.settings.runtime.venv_dir),
        })
    }
}
