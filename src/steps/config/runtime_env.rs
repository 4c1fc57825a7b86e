//! Runtime environment file step.

use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::config::{Settings, TelemetryCredentials};
use crate::error::ProvisionError;
use crate::steps::traits::Step;
use crate::steps::types::StepContext;
use crate::templates::DOTENV_TEMPLATE;

const DOTENV_FILE: &str = ".env";

/// Key/value settings the application reads at startup.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeEnv {
    pub host: String,
    pub port: u32,
    pub debug: String,
    pub instrumentation_key: String,
    pub connection_string: String,
    pub resource_group: String,
}

impl RuntimeEnv {
    pub fn new(settings: &Settings, credentials: &TelemetryCredentials) -> Self {
        Self {
            host: settings.app.host.clone(),
            port: settings.app.port,
            // The application compares against the capitalized literal.
            debug: if settings.app.debug { "True" } else { "False" }.to_string(),
            instrumentation_key: credentials.instrumentation_key.clone(),
            connection_string: credentials.connection_string.clone(),
            resource_group: settings.app.resource_group.clone(),
        }
    }
}

pub(crate) fn dotenv_path(settings: &Settings) -> PathBuf {
    settings.paths.install_root.join(DOTENV_FILE)
}

/// Write the `.env` file into the install root.
pub struct WriteRuntimeConfigStep;

impl Step for WriteRuntimeConfigStep {
    fn name(&self) -> &'static str {
        "config.runtime"
    }

    fn description(&self) -> &'static str {
        "Writing runtime configuration"
    }

    fn apply(&self, ctx: &mut StepContext<'_>) -> Result<(), ProvisionError> {
        let env = RuntimeEnv::new(ctx.settings, ctx.credentials);
        let content = ctx.templates.render(DOTENV_TEMPLATE, &env)?;
        let path = dotenv_path(ctx.settings);

        ctx.write_file(&path, &content)?;
        info!(path = %path.display(), "Runtime configuration written");
        Ok(())
    }

    fn details(&self, ctx: &StepContext<'_>) -> serde_json::Value {
        serde_json::json!({
            "path": dotenv_path(ctx.settings),
            "port": ctx.settings.app.port,
            "instrumentation_key": ctx.credentials.instrumentation_key,
            "connection_string": ctx.credentials.connection_string,
        })
    }
}
