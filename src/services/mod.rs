//! Windows service plumbing.
//!
//! `ServiceSpec` describes the application service, `Nssm` registers it
//! through the service wrapper utility, and `ServiceControl` queries and
//! starts services through `sc.exe`.

mod nssm;
mod scm;
mod spec;

pub use nssm::Nssm;
pub use scm::{ServiceControl, ServiceState};
pub use spec::{venv_python, ServiceSpec, StartMode};

use crate::error::ProvisionError;
use crate::executor::{sanitize_output, Invocation, SubprocessResult};

/// Map a failed service tool invocation to a service-operation error.
fn service_failure(
    service: &str,
    invocation: &Invocation,
    result: &SubprocessResult,
) -> ProvisionError {
    ProvisionError::ServiceOperation {
        service: service.to_string(),
        message: format!(
            "'{}' exited with code {}: {}",
            invocation.command_line(),
            result
                .exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "none".to_string()),
            sanitize_output(result.diagnostic(), 5)
        ),
    }
}
