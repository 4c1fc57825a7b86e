//! Service wrapper installation step.

use tracing::info;

use crate::error::ProvisionError;
use crate::steps::traits::Step;
use crate::steps::types::{Check, StepContext};

/// Download the service wrapper archive and copy its platform subtree
/// into place, unless the install directory already exists.
pub struct InstallServiceManagerStep;

impl Step for InstallServiceManagerStep {
    fn name(&self) -> &'static str {
        "service_manager.install"
    }

    fn description(&self) -> &'static str {
        "Installing NSSM service manager"
    }

    fn check(&self, ctx: &StepContext<'_>) -> Result<Check, ProvisionError> {
        let install_dir = &ctx.settings.service_manager.install_dir;
        if ctx.host.fs.exists(install_dir) {
            return Ok(Check::satisfied(format!(
                "{} already exists",
                install_dir.display()
            )));
        }
        Ok(Check::Required)
    }

    fn apply(&self, ctx: &mut StepContext<'_>) -> Result<(), ProvisionError> {
        let settings = ctx.settings;
        let manager = &settings.service_manager;

        let archive = ctx.download_to_temp(&manager.archive_url)?;
        let extract_dir = settings.paths.temp_dir.join("nssm-extract");
        ctx.host.fs.extract_zip(&archive, &extract_dir)?;

        let subtree = extract_dir.join(&manager.archive_subdir);
        if !ctx.host.fs.exists(&subtree) {
            return Err(ProvisionError::Install {
                component: "NSSM".to_string(),
                message: format!("archive does not contain {}", manager.archive_subdir),
            });
        }
        ctx.host.fs.copy_dir_all(&subtree, &manager.install_dir)?;

        info!(path = %manager.install_dir.display(), "Service manager installed");
        Ok(())
    }

    fn details(&self, ctx: &StepContext<'_>) -> serde_json::Value {
        serde_json::json!({
            "url": ctx.settings.service_manager.archive_url,
            "install_dir": ctx.settings.service_manager.install_dir,
        })
    }
}
