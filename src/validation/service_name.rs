//! Service name validation.
//!
//! Windows service names are registry key names under
//! `HKLM\SYSTEM\CurrentControlSet\Services`, so they cannot contain
//! path separators and are limited to 256 characters.

use crate::error::{ProvisionError, ValidationErrorKind};

/// Maximum length of a Windows service name.
const MAX_SERVICE_NAME_LENGTH: usize = 256;

/// Validate a Windows service name.
///
/// # Example
///
/// ```
/// use pyhost_provisioner::validation::validate_service_name;
///
/// assert!(validate_service_name("PyWebApp").is_ok());
/// assert!(validate_service_name("bad\\name").is_err());
/// ```
pub fn validate_service_name(name: &str) -> Result<(), ProvisionError> {
    let invalid = |message: &str| ProvisionError::Validation {
        kind: ValidationErrorKind::InvalidServiceName {
            name: name.to_string(),
            message: message.to_string(),
        },
    };

    if name.trim().is_empty() {
        return Err(invalid("Service name cannot be empty"));
    }

    if name.len() > MAX_SERVICE_NAME_LENGTH {
        return Err(invalid("Service name exceeds 256 characters"));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(invalid("Service name cannot contain path separators"));
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(invalid("Service name cannot contain control characters"));
    }

    Ok(())
}
