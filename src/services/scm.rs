//! Service Control Manager access through `sc.exe`.

use std::time::Duration;

use tracing::{debug, info};

use crate::error::ProvisionError;
use crate::executor::{CommandRunner, Invocation};

use super::service_failure;

/// `ERROR_SERVICE_DOES_NOT_EXIST`
const ERROR_SERVICE_DOES_NOT_EXIST: i32 = 1060;
/// `ERROR_SERVICE_ALREADY_RUNNING`
const ERROR_SERVICE_ALREADY_RUNNING: i32 = 1056;

const SC: &str = "sc.exe";

/// State of a Windows service as reported by `sc.exe query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Missing,
    Stopped,
    Running,
    Pending,
    Unknown,
}

impl ServiceState {
    /// Parse the `STATE` line of `sc.exe query` output, e.g.
    /// `        STATE              : 4  RUNNING`.
    pub fn parse_query(output: &str) -> Self {
        let state = output
            .lines()
            .map(str::trim)
            .find(|line| line.starts_with("STATE"))
            .and_then(|line| line.split(':').nth(1))
            .and_then(|rest| rest.split_whitespace().nth(1));

        match state {
            Some("RUNNING") => ServiceState::Running,
            Some("STOPPED") => ServiceState::Stopped,
            Some(s) if s.ends_with("_PENDING") => ServiceState::Pending,
            _ => ServiceState::Unknown,
        }
    }
}

/// Queries and starts services.
pub struct ServiceControl<'a> {
    runner: &'a dyn CommandRunner,
    timeout: Duration,
}

impl<'a> ServiceControl<'a> {
    pub fn new(runner: &'a dyn CommandRunner, timeout: Duration) -> Self {
        Self { runner, timeout }
    }

    /// Current state of `name`.
    pub fn query(&self, name: &str) -> Result<ServiceState, ProvisionError> {
        let invocation = Invocation::new(SC)
            .args(["query", name])
            .timeout(self.timeout);
        let result = self.runner.run(&invocation)?;

        if result.exit_code == Some(ERROR_SERVICE_DOES_NOT_EXIST) {
            return Ok(ServiceState::Missing);
        }
        if !result.success {
            return Err(service_failure(name, &invocation, &result));
        }

        let state = ServiceState::parse_query(&result.stdout);
        debug!(service = %name, state = ?state, "Queried service");
        Ok(state)
    }

    pub fn exists(&self, name: &str) -> Result<bool, ProvisionError> {
        Ok(self.query(name)? != ServiceState::Missing)
    }

    /// Start `name`. Starting a running service is not an error.
    pub fn start(&self, name: &str) -> Result<(), ProvisionError> {
        let invocation = Invocation::new(SC)
            .args(["start", name])
            .timeout(self.timeout);
        let result = self.runner.run(&invocation)?;

        if result.success || result.exit_code == Some(ERROR_SERVICE_ALREADY_RUNNING) {
            info!(service = %name, "Service started");
            return Ok(());
        }

        Err(service_failure(name, &invocation, &result))
    }

    /// Start `name` unless it is already running. Returns whether a start
    /// was issued.
    pub fn ensure_running(&self, name: &str) -> Result<bool, ProvisionError> {
        match self.query(name)? {
            ServiceState::Running => {
                debug!(service = %name, "Service already running");
                Ok(false)
            }
            ServiceState::Missing => Err(ProvisionError::ServiceOperation {
                service: name.to_string(),
                message: "service is not installed".to_string(),
            }),
            _ => {
                self.start(name)?;
                Ok(true)
            }
        }
    }
}
