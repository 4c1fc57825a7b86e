//! Web server feature step.

use tracing::{debug, info};

use crate::error::ProvisionError;
use crate::steps::traits::Step;
use crate::steps::types::{Check, StepContext};

const COMPONENT: &str = "IIS features";

/// Install the configured Windows features, with management tools,
/// unless all of them are already installed.
pub struct InstallProxyFeaturesStep;

impl InstallProxyFeaturesStep {
    /// Names of configured features that are not installed.
    fn missing_features(&self, ctx: &StepContext<'_>) -> Result<Vec<String>, ProvisionError> {
        let features = &ctx.settings.proxy.features;
        if features.is_empty() {
            return Ok(Vec::new());
        }

        let script = format!(
            "Get-WindowsFeature -Name {} | Where-Object {{ -not $_.Installed }} | Select-Object -ExpandProperty Name",
            features.join(",")
        );
        let invocation = ctx.powershell(&script);
        let result = ctx.run_install(COMPONENT, &invocation)?;

        let missing: Vec<String> = result
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        debug!(missing = ?missing, "Queried Windows features");
        Ok(missing)
    }
}

impl Step for InstallProxyFeaturesStep {
    fn name(&self) -> &'static str {
        "proxy.features"
    }

    fn description(&self) -> &'static str {
        "Installing IIS with WebSocket support"
    }

    fn check(&self, ctx: &StepContext<'_>) -> Result<Check, ProvisionError> {
        if self.missing_features(ctx)?.is_empty() {
            return Ok(Check::satisfied("all features installed"));
        }
        Ok(Check::Required)
    }

    fn apply(&self, ctx: &mut StepContext<'_>) -> Result<(), ProvisionError> {
        let missing = self.missing_features(ctx)?;
        if missing.is_empty() {
            return Ok(());
        }

        let script = format!(
            "Install-WindowsFeature -Name {} -IncludeManagementTools",
            missing.join(",")
        );
        let invocation = ctx.powershell(&script).timeout(ctx.install_timeout());
        ctx.run_install(COMPONENT, &invocation)?;

        info!(features = ?missing, "Windows features installed");
        Ok(())
    }

    fn details(&self, ctx: &StepContext<'_>) -> serde_json::Value {
        serde_json::json!({ "features": ctx.settings.proxy.features })
    }
}
