//! Port and URL validation.

use crate::error::{ProvisionError, ValidationErrorKind};

/// Validate a TCP port number.
pub fn validate_port(port: u32) -> Result<u16, ProvisionError> {
    match u16::try_from(port) {
        Ok(p) if p != 0 => Ok(p),
        _ => Err(ProvisionError::Validation {
            kind: ValidationErrorKind::InvalidPort { port },
        }),
    }
}

/// Validate that a download URL uses TLS.
///
/// Installers are executed with administrator rights, so plain HTTP
/// sources are refused outright.
pub fn validate_https_url(url: &str) -> Result<(), ProvisionError> {
    let lower = url.to_ascii_lowercase();
    match lower.strip_prefix("https://") {
        Some(rest) if !rest.is_empty() && !rest.starts_with('/') => Ok(()),
        _ => Err(ProvisionError::Validation {
            kind: ValidationErrorKind::InsecureUrl {
                url: url.to_string(),
            },
        }),
    }
}
