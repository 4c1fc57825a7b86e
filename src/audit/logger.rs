//! Audit logger for writing journal entries to file.
//!
//! Writes structured entries as JSON lines (one JSON object per line).

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::error::ProvisionError;

use super::entry::AuditEntry;

/// Destination for journal entries.
pub trait AuditSink {
    fn log(&self, entry: &AuditEntry) -> Result<(), ProvisionError>;
}

/// Appends journal entries to a file.
pub struct AuditLogger {
    file: Mutex<File>,
    path: PathBuf,
}

impl AuditLogger {
    /// Create a new audit logger that appends to `path`, creating the
    /// parent directory if needed.
    pub fn new(path: &Path) -> Result<Self, ProvisionError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                debug!(path = %parent.display(), "Creating audit log directory");
                std::fs::create_dir_all(parent)
                    .map_err(|e| ProvisionError::filesystem(parent, e))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| ProvisionError::filesystem(path, e))?;

        debug!(path = %path.display(), "Audit logger initialized");

        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the audit log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for AuditLogger {
    fn log(&self, entry: &AuditEntry) -> Result<(), ProvisionError> {
        let json = serde_json::to_string(entry)?;

        let mut file = self.file.lock().map_err(|e| ProvisionError::Filesystem {
            path: self.path.clone(),
            message: format!("Failed to acquire audit log lock: {}", e),
        })?;

        writeln!(file, "{}", json)?;

        if let Err(e) = file.sync_data() {
            warn!(error = %e, "Failed to sync audit log");
        }

        debug!(run_id = %entry.run_id, step = %entry.step, "Audit entry logged");

        Ok(())
    }
}

/// A no-op sink for when the journal is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditLogger;

impl AuditSink for NullAuditLogger {
    fn log(&self, _entry: &AuditEntry) -> Result<(), ProvisionError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditResult;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn create_test_entry(step: &str) -> AuditEntry {
        AuditEntry::new(
            Uuid::nil(),
            1,
            step,
            serde_json::json!({"key": "value"}),
            AuditResult::Applied,
            10,
        )
    }

    #[test]
    fn test_logger_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("subdir/audit.log");

        let logger = AuditLogger::new(&log_path).unwrap();
        assert!(log_path.parent().unwrap().exists());
        assert_eq!(logger.path(), log_path);
    }

    #[test]
    fn test_logger_writes_json_lines() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("audit.log");
        let logger = AuditLogger::new(&log_path).unwrap();

        logger.log(&create_test_entry("host.directories")).unwrap();
        logger
            .log(&AuditEntry::new(
                Uuid::nil(),
                2,
                "runtime.install",
                serde_json::json!({}),
                AuditResult::Failure {
                    error_code: "DOWNLOAD_FAILED".to_string(),
                    error_message: "HTTP status 404".to_string(),
                },
                5,
            ))
            .unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed1: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed1["step"], "host.directories");
        assert_eq!(parsed1["result"]["status"], "applied");

        let parsed2: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed2["result"]["status"], "failure");
        assert_eq!(parsed2["result"]["error_code"], "DOWNLOAD_FAILED");
    }

    #[test]
    fn test_logger_appends_to_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("audit.log");

        {
            let logger = AuditLogger::new(&log_path).unwrap();
            logger.log(&create_test_entry("a")).unwrap();
        }
        {
            let logger = AuditLogger::new(&log_path).unwrap();
            logger.log(&create_test_entry("b")).unwrap();
        }

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn test_null_logger() {
        assert!(NullAuditLogger.log(&create_test_entry("a")).is_ok());
    }
}
