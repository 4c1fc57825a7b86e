//! Worker pool configuration step.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::config::Settings;
use crate::error::ProvisionError;
use crate::steps::traits::Step;
use crate::steps::types::StepContext;
use crate::templates::WORKER_CONFIG_TEMPLATE;

/// Settings for the application's process-worker manager.
///
/// String fields are escaped for a double-quoted Python literal.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerPoolConfig {
    pub bind: String,
    pub workers: u32,
    pub worker_class: String,
    pub threads: u32,
    pub timeout: u64,
    pub graceful_timeout: u64,
    pub keepalive: u64,
    pub access_log: String,
    pub error_log: String,
    pub log_level: String,
}

impl WorkerPoolConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let workers = &settings.workers;
        let log_dir = &settings.paths.log_dir;

        Self {
            bind: py_str(&format!("{}:{}", workers.bind_host, settings.app.port)),
            workers: workers.workers,
            worker_class: py_str(&workers.worker_class),
            threads: workers.threads,
            timeout: workers.timeout_seconds,
            graceful_timeout: workers.graceful_timeout_seconds,
            keepalive: workers.keepalive_seconds,
            access_log: py_path(&log_dir.join("gunicorn_access.log")),
            error_log: py_path(&log_dir.join("gunicorn_error.log")),
            log_level: py_str(&workers.log_level),
        }
    }
}

fn py_str(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn py_path(path: &Path) -> String {
    py_str(&path.display().to_string())
}

pub(crate) fn worker_config_path(settings: &Settings) -> PathBuf {
    settings.paths.install_root.join(&settings.workers.config_file)
}

/// Write the worker pool configuration into the install root.
pub struct WriteWorkerConfigStep;

impl Step for WriteWorkerConfigStep {
    fn name(&self) -> &'static str {
        "config.workers"
    }

    fn description(&self) -> &'static str {
        "Writing worker pool configuration"
    }

    fn apply(&self, ctx: &mut StepContext<'_>) -> Result<(), ProvisionError> {
        let config = WorkerPoolConfig::from_settings(ctx.settings);
        let content = ctx.templates.render(WORKER_CONFIG_TEMPLATE, &config)?;
        let path = worker_config_path(ctx.settings);

        ctx.write_file(&path, &content)?;
        info!(path = %path.display(), workers = config.workers, "Worker configuration written");
        Ok(())
    }

    fn details(&self, ctx: &StepContext<'_>) -> serde_json::Value {
        serde_json::json!({ "path": worker_config_path(ctx.settings) })
    }
}
