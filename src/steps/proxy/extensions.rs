//! Web server extension step.

use tracing::{info, warn};

use crate::config::{ExtensionPackage, Settings};
use crate::error::ProvisionError;
use crate::steps::traits::Step;
use crate::steps::types::{install_failure, Check, StepContext};

/// `ERROR_SUCCESS_REBOOT_REQUIRED`
const MSI_REBOOT_REQUIRED: i32 = 3010;

/// Install every extension package whose marker file is missing.
pub struct InstallProxyExtensionsStep;

fn missing<'s>(ctx: &StepContext<'s>) -> Vec<&'s ExtensionPackage> {
    let settings: &'s Settings = ctx.settings;
    settings
        .proxy
        .extensions
        .iter()
        .filter(|ext| !ctx.host.fs.exists(&ext.marker))
        .collect()
}

impl Step for InstallProxyExtensionsStep {
    fn name(&self) -> &'static str {
        "proxy.extensions"
    }

    fn description(&self) -> &'static str {
        "Installing IIS extension modules"
    }

    fn check(&self, ctx: &StepContext<'_>) -> Result<Check, ProvisionError> {
        if missing(ctx).is_empty() {
            return Ok(Check::satisfied("extension modules present"));
        }
        Ok(Check::Required)
    }

    fn apply(&self, ctx: &mut StepContext<'_>) -> Result<(), ProvisionError> {
        for ext in missing(ctx) {
            let package = ctx.download_to_temp(&ext.url)?;
            let invocation = ctx
                .command("msiexec.exe")
                .arg("/i")
                .arg(package.display().to_string())
                .args(["/quiet", "/norestart"])
                .timeout(ctx.install_timeout());
            let result = ctx.run(&invocation)?;

            if result.exit_code == Some(MSI_REBOOT_REQUIRED) {
                warn!(extension = %ext.name, "Extension installed, reboot required");
            } else if !result.success {
                return Err(install_failure(&ext.name, &invocation, &result));
            }

            info!(extension = %ext.name, "Extension installed");
        }
        Ok(())
    }

    fn details(&self, ctx: &StepContext<'_>) -> serde_json::Value {
        let names: Vec<&str> = ctx
            .settings
            .proxy
            .extensions
            .iter()
            .map(|ext| ext.name.as_str())
            .collect();
        serde_json::json!({ "extensions": names })
    }
}
