//! Directory layout step.

use tracing::{debug, info};

use crate::error::ProvisionError;
use crate::steps::traits::Step;
use crate::steps::types::{Check, StepContext};

/// Create the install root and the log directory.
pub struct EnsureDirectoriesStep;

impl Step for EnsureDirectoriesStep {
    fn name(&self) -> &'static str {
        "host.directories"
    }

    fn description(&self) -> &'static str {
        "Creating application directories"
    }

    fn check(&self, ctx: &StepContext<'_>) -> Result<Check, ProvisionError> {
        let paths = &ctx.settings.paths;
        if ctx.host.fs.exists(&paths.install_root) && ctx.host.fs.exists(&paths.log_dir) {
            return Ok(Check::satisfied("directories already exist"));
        }
        Ok(Check::Required)
    }

    fn apply(&self, ctx: &mut StepContext<'_>) -> Result<(), ProvisionError> {
        let paths = &ctx.settings.paths;
        for dir in [&paths.install_root, &paths.log_dir] {
            if ctx.host.fs.exists(dir) {
                debug!(path = %dir.display(), "Directory exists");
                continue;
            }
            ctx.host.fs.create_dir_all(dir)?;
            info!(path = %dir.display(), "Created directory");
        }
        Ok(())
    }

    fn details(&self, ctx: &StepContext<'_>) -> serde_json::Value {
        serde_json::json!({
            "install_root": ctx.settings.paths.install_root,
            "log_dir": ctx.settings.paths.log_dir,
        })
    }
}
