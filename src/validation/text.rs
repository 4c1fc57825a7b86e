//! Free-text value validation.
//!
//! Values written into managed files (`.env`, `web.config`,
//! `gunicorn.conf.py`) or PowerShell scripts must stay on one line.

use crate::error::{ProvisionError, ValidationErrorKind};

/// Validate that `value` contains no control characters (CR, LF, NUL, ...).
///
/// # Example
///
/// ```
/// use pyhost_provisioner::validation::validate_single_line;
///
/// assert!(validate_single_line("host", "0.0.0.0").is_ok());
/// assert!(validate_single_line("host", "0.0.0.0\nPORT=1").is_err());
/// ```
pub fn validate_single_line(param: &str, value: &str) -> Result<(), ProvisionError> {
    if value.chars().any(|c| c.is_control()) {
        return Err(ProvisionError::Validation {
            kind: ValidationErrorKind::InvalidParameter {
                param: param.to_string(),
                message: "must not contain line breaks or control characters".to_string(),
            },
        });
    }
    Ok(())
}
