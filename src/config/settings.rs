//! Configuration settings for the provisioner.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ProvisionError;
use crate::validation::{
    validate_absolute_path, validate_https_url, validate_port, validate_service_name,
    validate_single_line,
};

/// Main configuration structure.
///
/// Every field has a default, so an empty file (or no file at all)
/// describes the standard single-host deployment.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub service_manager: ServiceManagerConfig,
    #[serde(default)]
    pub proxy: ProxyConfig,
    #[serde(default)]
    pub workers: WorkersConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Host directory layout.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Application install root.
    #[serde(default = "default_install_root")]
    pub install_root: PathBuf,
    /// Directory for service and worker logs.
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// Scratch directory for downloads and archive extraction.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

/// Application and service identity.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_display_name")]
    pub display_name: String,
    #[serde(default = "default_description")]
    pub description: String,
    /// Address the application binds to.
    #[serde(default = "default_app_host")]
    pub host: String,
    /// Internal port the reverse proxy forwards to.
    #[serde(default = "default_port")]
    pub port: u32,
    #[serde(default)]
    pub debug: bool,
    /// Script passed to the interpreter, relative to the install root.
    #[serde(default = "default_entrypoint")]
    pub entrypoint: String,
    /// Requirements manifest, relative to the install root.
    #[serde(default = "default_requirements")]
    pub requirements: String,
    #[serde(default = "default_resource_group")]
    pub resource_group: String,
}

/// Language runtime installation.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_runtime_installer_url")]
    pub installer_url: String,
    /// Interpreter path whose presence means the runtime is installed.
    #[serde(default = "default_runtime_marker")]
    pub marker: PathBuf,
    #[serde(default = "default_runtime_install_args")]
    pub install_args: Vec<String>,
    /// Virtual environment directory, relative to the install root.
    #[serde(default = "default_venv_dir")]
    pub venv_dir: String,
}

/// Service wrapper utility (NSSM).
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceManagerConfig {
    #[serde(default = "default_nssm_archive_url")]
    pub archive_url: String,
    #[serde(default = "default_nssm_install_dir")]
    pub install_dir: PathBuf,
    /// Subtree of the extracted archive copied into `install_dir`.
    #[serde(default = "default_nssm_archive_subdir")]
    pub archive_subdir: String,
    #[serde(default = "default_nssm_executable")]
    pub executable: String,
    /// Log size at which NSSM rotates stdout/stderr files.
    #[serde(default = "default_rotate_bytes")]
    pub rotate_bytes: u64,
}

/// IIS reverse proxy.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    #[serde(default = "default_proxy_features")]
    pub features: Vec<String>,
    #[serde(default = "default_proxy_extensions")]
    pub extensions: Vec<ExtensionPackage>,
    #[serde(default = "default_site_config")]
    pub site_config: PathBuf,
    /// IIS site that receives the public binding and the rewrite rule.
    #[serde(default = "default_site_name")]
    pub site_name: String,
    #[serde(default = "default_public_port")]
    pub public_port: u32,
    #[serde(default = "default_proxy_service")]
    pub service_name: String,
    #[serde(default = "default_removed_handler")]
    pub removed_handler: String,
    #[serde(default = "default_removed_module")]
    pub removed_module: String,
}

/// An IIS extension installed from an MSI package.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExtensionPackage {
    pub name: String,
    pub url: String,
    /// File whose presence means the extension is installed.
    pub marker: PathBuf,
}

/// Process-worker manager settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkersConfig {
    #[serde(default = "default_worker_bind_host")]
    pub bind_host: String,
    #[serde(default = "default_workers")]
    pub workers: u32,
    #[serde(default = "default_worker_class")]
    pub worker_class: String,
    #[serde(default = "default_threads")]
    pub threads: u32,
    #[serde(default = "default_worker_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_graceful_timeout")]
    pub graceful_timeout_seconds: u64,
    #[serde(default = "default_keepalive")]
    pub keepalive_seconds: u64,
    #[serde(default = "default_worker_log_level")]
    pub log_level: String,
    /// Config file name, written into the install root.
    #[serde(default = "default_worker_config_file")]
    pub config_file: String,
}

/// Timeouts for long-running operations.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_download_timeout")]
    pub download_timeout_seconds: u64,
    #[serde(default = "default_install_timeout")]
    pub install_timeout_seconds: u64,
    #[serde(default = "default_command_timeout")]
    pub command_timeout_seconds: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Run journal configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Journal path; defaults to `provision-audit.log` in the log directory.
    pub log_path: Option<PathBuf>,
}

// Default value functions
fn default_install_root() -> PathBuf {
    PathBuf::from(r"C:\pyapp")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(r"C:\pyapp\logs")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from(r"C:\Windows\Temp\pyhost")
}

fn default_service_name() -> String {
    "PyWebApp".to_string()
}

fn default_display_name() -> String {
    "Python Web Application".to_string()
}

fn default_description() -> String {
    "Python web application served behind IIS".to_string()
}

fn default_app_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u32 {
    5000
}

fn default_entrypoint() -> String {
    "app.py".to_string()
}

fn default_requirements() -> String {
    "requirements.txt".to_string()
}

fn default_resource_group() -> String {
    "pyapp-rg".to_string()
}

fn default_runtime_installer_url() -> String {
    "https://www.python.org/ftp/python/3.11.9/python-3.11.9-amd64.exe".to_string()
}

fn default_runtime_marker() -> PathBuf {
    PathBuf::from(r"C:\Program Files\Python311\python.exe")
}

fn default_runtime_install_args() -> Vec<String> {
    ["/quiet", "InstallAllUsers=1", "PrependPath=1", "Include_test=0"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_venv_dir() -> String {
    "venv".to_string()
}

fn default_nssm_archive_url() -> String {
    "https://nssm.cc/release/nssm-2.24.zip".to_string()
}

fn default_nssm_install_dir() -> PathBuf {
    PathBuf::from(r"C:\nssm")
}

fn default_nssm_archive_subdir() -> String {
    r"nssm-2.24\win64".to_string()
}

fn default_nssm_executable() -> String {
    "nssm.exe".to_string()
}

fn default_rotate_bytes() -> u64 {
    10_485_760 // 10MB
}

fn default_proxy_features() -> Vec<String> {
    vec!["Web-Server".to_string(), "Web-WebSockets".to_string()]
}

fn default_proxy_extensions() -> Vec<ExtensionPackage> {
    vec![ExtensionPackage {
        name: "IIS URL Rewrite".to_string(),
        url: "https://download.microsoft.com/download/1/2/8/128E2E22-C1B9-44A4-BE2A-5859ED1D4592/rewrite_amd64_en-US.msi".to_string(),
        marker: PathBuf::from(r"C:\Windows\System32\inetsrv\rewrite.dll"),
    }]
}

fn default_site_config() -> PathBuf {
    PathBuf::from(r"C:\inetpub\wwwroot\web.config")
}

fn default_site_name() -> String {
    "Default Web Site".to_string()
}

fn default_public_port() -> u32 {
    80
}

fn default_proxy_service() -> String {
    "W3SVC".to_string()
}

fn default_removed_handler() -> String {
    "WebDAV".to_string()
}

fn default_removed_module() -> String {
    "WebDAVModule".to_string()
}

fn default_worker_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_workers() -> u32 {
    4
}

fn default_worker_class() -> String {
    "sync".to_string()
}

fn default_threads() -> u32 {
    2
}

fn default_worker_timeout() -> u64 {
    600
}

fn default_graceful_timeout() -> u64 {
    30
}

fn default_keepalive() -> u64 {
    5
}

fn default_worker_log_level() -> String {
    "info".to_string()
}

fn default_worker_config_file() -> String {
    "gunicorn.conf.py".to_string()
}

fn default_download_timeout() -> u64 {
    600
}

fn default_install_timeout() -> u64 {
    1800
}

fn default_command_timeout() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_audit_enabled() -> bool {
    true
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            install_root: default_install_root(),
            log_dir: default_log_dir(),
            temp_dir: default_temp_dir(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            display_name: default_display_name(),
            description: default_description(),
            host: default_app_host(),
            port: default_port(),
            debug: false,
            entrypoint: default_entrypoint(),
            requirements: default_requirements(),
            resource_group: default_resource_group(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            installer_url: default_runtime_installer_url(),
            marker: default_runtime_marker(),
            install_args: default_runtime_install_args(),
            venv_dir: default_venv_dir(),
        }
    }
}

impl Default for ServiceManagerConfig {
    fn default() -> Self {
        Self {
            archive_url: default_nssm_archive_url(),
            install_dir: default_nssm_install_dir(),
            archive_subdir: default_nssm_archive_subdir(),
            executable: default_nssm_executable(),
            rotate_bytes: default_rotate_bytes(),
        }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            features: default_proxy_features(),
            extensions: default_proxy_extensions(),
            site_config: default_site_config(),
            site_name: default_site_name(),
            public_port: default_public_port(),
            service_name: default_proxy_service(),
            removed_handler: default_removed_handler(),
            removed_module: default_removed_module(),
        }
    }
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            bind_host: default_worker_bind_host(),
            workers: default_workers(),
            worker_class: default_worker_class(),
            threads: default_threads(),
            timeout_seconds: default_worker_timeout(),
            graceful_timeout_seconds: default_graceful_timeout(),
            keepalive_seconds: default_keepalive(),
            log_level: default_worker_log_level(),
            config_file: default_worker_config_file(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            download_timeout_seconds: default_download_timeout(),
            install_timeout_seconds: default_install_timeout(),
            command_timeout_seconds: default_command_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            log_path: None,
        }
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ProvisionError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ProvisionError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        let settings = Self::from_toml(&content).map_err(|e| ProvisionError::Config {
            message: format!("Invalid config file '{}': {}", path.display(), e),
        })?;

        Ok(settings)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ProvisionError> {
        let settings: Settings = toml::from_str(content).map_err(|e| ProvisionError::Config {
            message: format!("Failed to parse settings: {}", e),
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ProvisionError::Config {
                message: format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(ProvisionError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        validate_port(self.app.port)?;
        validate_port(self.proxy.public_port)?;
        validate_service_name(&self.app.service_name)?;
        validate_service_name(&self.proxy.service_name)?;

        validate_absolute_path(&self.paths.install_root)?;
        validate_absolute_path(&self.paths.log_dir)?;
        validate_absolute_path(&self.paths.temp_dir)?;
        validate_absolute_path(&self.service_manager.install_dir)?;
        validate_absolute_path(&self.proxy.site_config)?;

        validate_https_url(&self.runtime.installer_url)?;
        validate_https_url(&self.service_manager.archive_url)?;
        for extension in &self.proxy.extensions {
            validate_https_url(&extension.url)?;
        }

        // Rendered into managed files and scripts.
        for (param, value) in [
            ("app.host", &self.app.host),
            ("app.resource_group", &self.app.resource_group),
            ("proxy.site_name", &self.proxy.site_name),
            ("proxy.removed_handler", &self.proxy.removed_handler),
            ("proxy.removed_module", &self.proxy.removed_module),
            ("workers.bind_host", &self.workers.bind_host),
            ("workers.worker_class", &self.workers.worker_class),
            ("workers.log_level", &self.workers.log_level),
        ] {
            validate_single_line(param, value)?;
        }

        if self.workers.workers == 0 || self.workers.threads == 0 {
            return Err(ProvisionError::Config {
                message: "Worker and thread counts must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Path of the run journal.
    pub fn audit_log_path(&self) -> PathBuf {
        self.audit
            .log_path
            .clone()
            .unwrap_or_else(|| self.paths.log_dir.join("provision-audit.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = Settings::default();
        assert_eq!(settings.app.port, 5000);
        assert_eq!(settings.app.service_name, "PyWebApp");
        assert_eq!(settings.workers.workers, 4);
        assert_eq!(settings.workers.worker_class, "sync");
        assert_eq!(settings.workers.threads, 2);
        assert_eq!(settings.workers.timeout_seconds, 600);
        assert_eq!(settings.workers.graceful_timeout_seconds, 30);
        assert_eq!(settings.workers.keepalive_seconds, 5);
        assert_eq!(settings.proxy.service_name, "W3SVC");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings.app.port, 5000);
        assert_eq!(settings.paths.install_root, PathBuf::from(r"C:\pyapp"));
    }

    #[test]
    fn test_partial_override() {
        let settings = Settings::from_toml(
            r#"
            [app]
            port = 8080
            service_name = "Orders"

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(settings.app.port, 8080);
        assert_eq!(settings.app.service_name, "Orders");
        assert_eq!(settings.app.entrypoint, "app.py");
        assert_eq!(settings.logging.format, "json");
    }

    #[test]
    fn test_invalid_log_level() {
        let result = Settings::from_toml("[logging]\nlevel = \"loud\"\n");
        assert!(matches!(result, Err(ProvisionError::Config { .. })));
    }

    #[test]
    fn test_invalid_port() {
        assert!(Settings::from_toml("[app]\nport = 0\n").is_err());
        assert!(Settings::from_toml("[app]\nport = 99999\n").is_err());
    }

    #[test]
    fn test_plain_http_download_rejected() {
        let result = Settings::from_toml(
            "[service_manager]\narchive_url = \"http://nssm.cc/release/nssm-2.24.zip\"\n",
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_multiline_values_rejected() {
        let result = Settings::from_toml("[app]\nresource_group = \"rg\\nPORT=1\"\n");
        assert!(matches!(result, Err(ProvisionError::Validation { .. })));

        let mut settings = Settings::default();
        settings.workers.log_level = "info\nimport os".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.app.host = "0.0.0.0\r".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_audit_log_path_default() {
        let settings = Settings::default();
        assert_eq!(
            settings.audit_log_path(),
            PathBuf::from(r"C:\pyapp\logs").join("provision-audit.log")
        );
    }

    #[test]
    fn test_load_missing_file() {
        let result = Settings::load("/nonexistent/pyhost.toml");
        assert!(matches!(result, Err(ProvisionError::Config { .. })));
    }
}
