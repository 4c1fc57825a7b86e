//! Error types for the provisioner.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for provisioning operations.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Configuration-related errors.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Validation errors.
    #[error("Validation error: {kind}")]
    Validation { kind: ValidationErrorKind },

    /// A download over HTTPS failed.
    #[error("Download of {url} failed: {message}")]
    Download { url: String, message: String },

    /// An installer or package manager exited unsuccessfully.
    #[error("Installation of {component} failed: {message}")]
    Install { component: String, message: String },

    /// A file or directory could not be created or written.
    #[error("Filesystem error at {}: {message}", path.display())]
    Filesystem { path: PathBuf, message: String },

    /// The service manager or service control returned an error.
    #[error("Service operation on '{service}' failed: {message}")]
    ServiceOperation { service: String, message: String },

    /// A child process could not be run at all.
    #[error("Command error: {kind}")]
    Command { kind: CommandErrorKind },

    /// Template-related errors.
    #[error("Template error: {message}")]
    Template { message: String },

    /// A provisioning step failed; wraps the underlying cause.
    #[error("Step '{step}' failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: Box<ProvisionError>,
    },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProvisionError {
    /// Short machine-readable code, used in the audit journal.
    pub fn code(&self) -> &'static str {
        match self {
            ProvisionError::Config { .. } => "CONFIG_ERROR",
            ProvisionError::Validation { .. } => "VALIDATION_ERROR",
            ProvisionError::Download { .. } => "DOWNLOAD_FAILED",
            ProvisionError::Install { .. } => "INSTALL_FAILED",
            ProvisionError::Filesystem { .. } => "FILESYSTEM_ERROR",
            ProvisionError::ServiceOperation { .. } => "SERVICE_OPERATION_FAILED",
            ProvisionError::Command { .. } => "COMMAND_ERROR",
            ProvisionError::Template { .. } => "TEMPLATE_ERROR",
            ProvisionError::Step { source, .. } => source.code(),
            ProvisionError::Io(_) => "IO_ERROR",
            ProvisionError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Name of the failed step, if this error came out of the step pipeline.
    pub fn failed_step(&self) -> Option<&'static str> {
        match self {
            ProvisionError::Step { step, .. } => Some(step),
            _ => None,
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        ProvisionError::Filesystem {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Validation error kinds.
#[derive(Error, Debug)]
pub enum ValidationErrorKind {
    #[error("Invalid service name '{name}': {message}")]
    InvalidServiceName { name: String, message: String },

    #[error("Invalid port {port}")]
    InvalidPort { port: u32 },

    #[error("URL must use https: {url}")]
    InsecureUrl { url: String },

    #[error("Path must be absolute: {}", path.display())]
    RelativePath { path: PathBuf },

    #[error("Path traversal detected in: {}", path.display())]
    PathTraversal { path: PathBuf },

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },
}

/// Command error kinds.
#[derive(Error, Debug)]
pub enum CommandErrorKind {
    #[error("Failed to spawn {program}: {message}")]
    SpawnFailed { program: String, message: String },

    #[error("Command execution failed: {message}")]
    ExecutionFailed { message: String },

    #[error("{program} timed out after {timeout_secs} seconds")]
    Timeout { program: String, timeout_secs: u64 },
}

/// Result type alias for provisioning operations.
pub type ProvisionResult<T> = Result<T, ProvisionError>;
