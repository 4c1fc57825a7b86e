//! Application service description.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::Settings;

/// Service start type as understood by NSSM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StartMode {
    Auto,
}

impl StartMode {
    pub fn as_nssm(&self) -> &'static str {
        match self {
            StartMode::Auto => "SERVICE_AUTO_START",
        }
    }
}

/// Everything needed to register the application as a Windows service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceSpec {
    pub name: String,
    pub display_name: String,
    pub description: String,
    /// Interpreter inside the virtual environment.
    pub executable: PathBuf,
    pub arguments: Vec<String>,
    pub working_dir: PathBuf,
    pub start_mode: StartMode,
    pub stdout_log: PathBuf,
    pub stderr_log: PathBuf,
    pub rotate_bytes: u64,
}

impl ServiceSpec {
    /// Build the application service from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let app = &settings.app;
        let install_root = &settings.paths.install_root;
        let log_dir = &settings.paths.log_dir;

        Self {
            name: app.service_name.clone(),
            display_name: app.display_name.clone(),
            description: app.description.clone(),
            executable: venv_python(settings),
            arguments: vec![install_root.join(&app.entrypoint).display().to_string()],
            working_dir: install_root.clone(),
            start_mode: StartMode::Auto,
            stdout_log: log_dir.join("service_stdout.log"),
            stderr_log: log_dir.join("service_stderr.log"),
            rotate_bytes: settings.service_manager.rotate_bytes,
        }
    }
}

/// Interpreter of the application's virtual environment.
pub fn venv_python(settings: &Settings) -> PathBuf {
    settings
        .paths
        .install_root
        .join(&settings.runtime.venv_dir)
        .join("Scripts")
        .join("python.exe")
}
