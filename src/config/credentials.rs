//! Telemetry credentials supplied per run.

use std::fmt;

use crate::error::ProvisionError;
use crate::validation::validate_single_line;

/// The two optional Application Insights credentials.
///
/// Missing values are treated as empty strings when written out.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TelemetryCredentials {
    pub instrumentation_key: String,
    pub connection_string: String,
}

impl TelemetryCredentials {
    pub fn new(instrumentation_key: Option<String>, connection_string: Option<String>) -> Self {
        Self {
            instrumentation_key: instrumentation_key.unwrap_or_default(),
            connection_string: connection_string.unwrap_or_default(),
        }
    }

    /// Both values are written verbatim as `KEY=VALUE` lines.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        validate_single_line("instrumentation_key", &self.instrumentation_key)?;
        validate_single_line("connection_string", &self.connection_string)?;
        Ok(())
    }

    /// Non-empty credential values, for redaction.
    pub fn secrets(&self) -> Vec<&str> {
        [
            self.instrumentation_key.as_str(),
            self.connection_string.as_str(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect()
    }
}

// Never print the values.
impl fmt::Debug for TelemetryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryCredentials")
            .field("instrumentation_key_set", &!self.instrumentation_key.is_empty())
            .field("connection_string_set", &!self.connection_string.is_empty())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_values_become_empty() {
        let creds = TelemetryCredentials::new(None, Some("InstrumentationKey=abc".to_string()));
        assert_eq!(creds.instrumentation_key, "");
        assert_eq!(creds.secrets(), vec!["InstrumentationKey=abc"]);
    }

    #[test]
    fn test_validate_rejects_line_breaks() {
        let creds = TelemetryCredentials::new(Some("ik\nDEBUG=True\nPORT=1".to_string()), None);
        let err = creds.validate().unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(!err.to_string().contains("PORT=1"));

        let creds = TelemetryCredentials::new(None, Some("InstrumentationKey=a\r".to_string()));
        assert!(creds.validate().is_err());

        assert!(TelemetryCredentials::default().validate().is_ok());
    }

    #[test]
    fn test_debug_does_not_leak() {
        let creds = TelemetryCredentials::new(Some("k-123".to_string()), None);
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("k-123"));
        assert!(debug.contains("instrumentation_key_set: true"));
    }
}
