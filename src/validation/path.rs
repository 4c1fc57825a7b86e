//! Path validation for configured host locations.
//!
//! Host paths are Windows paths, but the provisioner must also validate them
//! when built and tested elsewhere, so this works on the string form rather
//! than on `std::path::Path::is_absolute`, which is platform dependent.

use std::path::{Path, PathBuf};

use crate::error::{ProvisionError, ValidationErrorKind};

/// Returns true for `C:\...`, `C:/...`, `\\server\share`, `\...` or `/...`.
fn is_rooted(path: &str) -> bool {
    let bytes = path.as_bytes();
    let drive_rooted = bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'\\' || bytes[2] == b'/');

    drive_rooted || path.starts_with('\\') || path.starts_with('/')
}

/// Validate that a configured path is absolute and free of `..` components.
pub fn validate_absolute_path(path: &Path) -> Result<PathBuf, ProvisionError> {
    let raw = path.to_string_lossy();

    if !is_rooted(&raw) {
        return Err(ProvisionError::Validation {
            kind: ValidationErrorKind::RelativePath {
                path: path.to_path_buf(),
            },
        });
    }

    if raw.split(['\\', '/']).any(|component| component == "..") {
        return Err(ProvisionError::Validation {
            kind: ValidationErrorKind::PathTraversal {
                path: path.to_path_buf(),
            },
        });
    }

    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_absolute_paths() {
        assert!(validate_absolute_path(Path::new("C:\\pyapp")).is_ok());
        assert!(validate_absolute_path(Path::new("D:/data/logs")).is_ok());
        assert!(validate_absolute_path(Path::new("\\\\server\\share")).is_ok());
    }

    #[test]
    fn test_unix_absolute_paths() {
        assert!(validate_absolute_path(Path::new("/tmp/pyapp")).is_ok());
    }

    #[test]
    fn test_relative_paths_rejected() {
        assert!(validate_absolute_path(Path::new("pyapp")).is_err());
        assert!(validate_absolute_path(Path::new("C:pyapp")).is_err());
        assert!(validate_absolute_path(Path::new("")).is_err());
    }

    #[test]
    fn test_traversal_rejected() {
        let result = validate_absolute_path(Path::new("C:\\pyapp\\..\\Windows"));
        assert!(matches!(
            result,
            Err(ProvisionError::Validation {
                kind: ValidationErrorKind::PathTraversal { .. }
            })
        ));
        assert!(validate_absolute_path(Path::new("/srv/../etc")).is_err());
    }
}
