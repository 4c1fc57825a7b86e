//! Interpreter installation step.

use tracing::{debug, info, warn};

use crate::error::ProvisionError;
use crate::steps::traits::Step;
use crate::steps::types::{Check, StepContext};

const COMPONENT: &str = "Python runtime";

/// Re-reads the persisted PATH, which the installer extends.
const REFRESH_PATH_SCRIPT: &str = "[System.Environment]::GetEnvironmentVariable('Path','Machine') + ';' + [System.Environment]::GetEnvironmentVariable('Path','User')";

/// Download and silently run the interpreter installer unless the
/// interpreter marker already exists.
pub struct InstallRuntimeStep;

impl Step for InstallRuntimeStep {
    fn name(&self) -> &'static str {
        "runtime.install"
    }

    fn description(&self) -> &'static str {
        "Installing Python runtime"
    }

    fn check(&self, ctx: &StepContext<'_>) -> Result<Check, ProvisionError> {
        let marker = &ctx.settings.runtime.marker;
        if ctx.host.fs.exists(marker) {
            return Ok(Check::satisfied(format!(
                "{} already present",
                marker.display()
            )));
        }
        Ok(Check::Required)
    }

    fn apply(&self, ctx: &mut StepContext<'_>) -> Result<(), ProvisionError> {
        let settings = ctx.settings;
        let runtime = &settings.runtime;

        let installer = ctx.download_to_temp(&runtime.installer_url)?;
        let invocation = ctx
            .command(installer.display().to_string())
            .args(&runtime.install_args)
            .timeout(ctx.install_timeout());
        ctx.run_install(COMPONENT, &invocation)?;

        if !ctx.host.fs.exists(&runtime.marker) {
            return Err(ProvisionError::Install {
                component: COMPONENT.to_string(),
                message: format!(
                    "installer finished but {} does not exist",
                    runtime.marker.display()
                ),
            });
        }
        info!(marker = %runtime.marker.display(), "Runtime installed");

        let refresh = ctx.powershell(REFRESH_PATH_SCRIPT);
        let result = ctx.run(&refresh)?;
        let path = result.stdout.trim();
        if result.success && !path.is_empty() {
            debug!("Refreshed PATH from machine and user environment");
            ctx.path_env = Some(path.to_string());
        } else {
            warn!(
                exit_code = ?result.exit_code,
                "Could not refresh PATH, later commands use the inherited environment"
            );
        }

        Ok(())
    }

    fn details(&self, ctx: &StepContext<'_>) -> serde_json::Value {
        serde_json::json!({
            "url": ctx.settings.runtime.installer_url,
            "marker": ctx.settings.runtime.marker,
        })
    }
}
