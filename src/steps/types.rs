//! Step types: precondition checks, outcomes, and execution context.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::config::{Settings, TelemetryCredentials};
use crate::error::ProvisionError;
use crate::executor::{sanitize_output, Invocation, SubprocessResult};
use crate::host::Host;
use crate::services::{Nssm, ServiceControl};
use crate::templates::TemplateEngine;

const POWERSHELL: &str = "powershell.exe";

/// Result of a step's precondition check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    /// Target state already present; the reason is reported and journaled.
    Satisfied(String),
    /// The step has work to do.
    Required,
}

impl Check {
    pub fn satisfied(reason: impl Into<String>) -> Self {
        Check::Satisfied(reason.into())
    }
}

/// What a step did during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Applied,
    Skipped { reason: String },
}

/// Everything a step may touch while it runs.
pub struct StepContext<'a> {
    /// Identifier shared by every journal entry of this run.
    pub run_id: Uuid,
    pub settings: &'a Settings,
    pub credentials: &'a TelemetryCredentials,
    pub host: &'a Host,
    pub templates: &'a TemplateEngine,
    /// Machine plus user PATH re-read after the runtime installer ran.
    /// Applied to every later child process.
    pub path_env: Option<String>,
}

impl<'a> StepContext<'a> {
    pub fn new(
        run_id: Uuid,
        settings: &'a Settings,
        credentials: &'a TelemetryCredentials,
        host: &'a Host,
        templates: &'a TemplateEngine,
    ) -> Self {
        Self {
            run_id,
            settings,
            credentials,
            host,
            templates,
            path_env: None,
        }
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.limits.command_timeout_seconds)
    }

    pub fn install_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.limits.install_timeout_seconds)
    }

    /// Invocation of `program` with the command timeout and the refreshed
    /// PATH, if any.
    pub fn command(&self, program: impl Into<String>) -> Invocation {
        let invocation = Invocation::new(program).timeout(self.command_timeout());
        match &self.path_env {
            Some(path) => invocation.env("PATH", path),
            None => invocation,
        }
    }

    /// Invocation of a non-interactive PowerShell script.
    pub fn powershell(&self, script: &str) -> Invocation {
        self.command(POWERSHELL).args([
            "-NoProfile",
            "-NonInteractive",
            "-ExecutionPolicy",
            "Bypass",
            "-Command",
            script,
        ])
    }

    /// Run an invocation and return its result, whatever the exit code.
    pub fn run(&self, invocation: &Invocation) -> Result<SubprocessResult, ProvisionError> {
        self.host.runner.run(invocation)
    }

    /// Run an installer-like invocation. A non-zero exit becomes an
    /// install failure for `component`.
    pub fn run_install(
        &self,
        component: &str,
        invocation: &Invocation,
    ) -> Result<SubprocessResult, ProvisionError> {
        let result = self.run(invocation)?;
        if !result.success {
            return Err(install_failure(component, invocation, &result));
        }
        Ok(result)
    }

    /// The service wrapper at its installed location.
    pub fn nssm(&self) -> Nssm<'_> {
        let manager = &self.settings.service_manager;
        Nssm::new(
            self.host.runner.as_ref(),
            manager.install_dir.join(&manager.executable),
            self.command_timeout(),
        )
    }

    pub fn service_control(&self) -> ServiceControl<'_> {
        ServiceControl::new(self.host.runner.as_ref(), self.command_timeout())
    }

    /// Download `url` into the temp directory and return the local path.
    pub fn download_to_temp(&self, url: &str) -> Result<PathBuf, ProvisionError> {
        let temp_dir = &self.settings.paths.temp_dir;
        self.host.fs.create_dir_all(temp_dir)?;

        let dest = temp_dir.join(file_name_from_url(url));
        let bytes = self.host.downloader.download(url, &dest)?;
        debug!(url = %url, path = %dest.display(), bytes, "Downloaded");
        Ok(dest)
    }

    /// Replace the file at `path` with `content`.
    pub fn write_file(&self, path: &Path, content: &str) -> Result<(), ProvisionError> {
        self.host.fs.write_atomic(path, content.as_bytes())
    }
}

/// Map a failed installer invocation to an install error.
pub(crate) fn install_failure(
    component: &str,
    invocation: &Invocation,
    result: &SubprocessResult,
) -> ProvisionError {
    ProvisionError::Install {
        component: component.to_string(),
        message: format!(
            "'{}' exited with code {}: {}",
            invocation.program,
            result
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "none".to_string()),
            sanitize_output(result.diagnostic(), 5)
        ),
    }
}

/// Last path segment of `url`, without query or fragment.
fn file_name_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit('/').next() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "download.bin".to_string(),
    }
}
