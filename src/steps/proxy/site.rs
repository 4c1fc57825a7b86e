//! Reverse proxy site configuration step.

use serde::Serialize;
use tracing::info;

use crate::config::Settings;
use crate::error::ProvisionError;
use crate::steps::traits::Step;
use crate::steps::types::StepContext;
use crate::templates::WEB_CONFIG_TEMPLATE;

/// The application listens locally; the proxy forwards to it.
const BACKEND_HOST: &str = "localhost";

/// Catch-all rewrite from the public site to the application port, plus
/// the default handler and module that would intercept proxied verbs.
#[derive(Debug, Clone, Serialize)]
pub struct ReverseProxyRule {
    pub site_name: String,
    pub public_port: u32,
    pub backend_host: String,
    pub backend_port: u32,
    pub removed_handler: String,
    pub removed_module: String,
}

impl ReverseProxyRule {
    pub fn from_settings(settings: &Settings) -> Self {
        let proxy = &settings.proxy;
        Self {
            site_name: proxy.site_name.clone(),
            public_port: proxy.public_port,
            backend_host: BACKEND_HOST.to_string(),
            backend_port: settings.app.port,
            removed_handler: proxy.removed_handler.clone(),
            removed_module: proxy.removed_module.clone(),
        }
    }

    /// Forwarding target for a request path, `/{R:1}` in rewrite syntax.
    pub fn target(&self, path: &str) -> String {
        format!(
            "http://{}:{}/{}",
            self.backend_host,
            self.backend_port,
            path.trim_start_matches('/')
        )
    }

    /// PowerShell that adds the public HTTP binding to the site unless it
    /// already exists.
    pub fn binding_script(&self) -> String {
        let site = ps_quote(&self.site_name);
        format!(
            "Import-Module WebAdministration; if (-not (Get-WebBinding -Name {site} -Protocol http -Port {port})) {{ New-WebBinding -Name {site} -Protocol http -IPAddress '*' -Port {port} }}",
            site = site,
            port = self.public_port
        )
    }
}

/// Single-quoted PowerShell literal.
fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Overwrite the site's configuration with the rewrite rule and make sure
/// the site listens on the public port.
pub struct WriteProxyConfigStep;

impl Step for WriteProxyConfigStep {
    fn name(&self) -> &'static str {
        "proxy.config"
    }

    fn description(&self) -> &'static str {
        "Configuring IIS reverse proxy"
    }

    fn apply(&self, ctx: &mut StepContext<'_>) -> Result<(), ProvisionError> {
        let rule = ReverseProxyRule::from_settings(ctx.settings);
        let content = ctx.templates.render(WEB_CONFIG_TEMPLATE, &rule)?;
        let path = &ctx.settings.proxy.site_config;

        ctx.write_file(path, &content)?;

        let binding = ctx.powershell(&rule.binding_script());
        ctx.run_install("IIS site binding", &binding)?;

        info!(
            path = %path.display(),
            public_port = rule.public_port,
            backend = %rule.target(""),
            "Reverse proxy configured"
        );
        Ok(())
    }

    fn details(&self, ctx: &StepContext<'_>) -> serde_json::Value {
        let rule = ReverseProxyRule::from_settings(ctx.settings);
        serde_json::json!({
            "path": ctx.settings.proxy.site_config,
            "public_port": rule.public_port,
            "backend": rule.target(""),
        })
    }
}
