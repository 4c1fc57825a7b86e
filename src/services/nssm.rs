//! NSSM service wrapper.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::ProvisionError;
use crate::executor::{CommandRunner, Invocation, SubprocessResult};

use super::service_failure;
use super::spec::ServiceSpec;

/// Drives the `nssm.exe` command line.
pub struct Nssm<'a> {
    runner: &'a dyn CommandRunner,
    executable: PathBuf,
    timeout: Duration,
}

impl<'a> Nssm<'a> {
    pub fn new(runner: &'a dyn CommandRunner, executable: PathBuf, timeout: Duration) -> Self {
        Self {
            runner,
            executable,
            timeout,
        }
    }

    fn invocation<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Invocation::new(self.executable.display().to_string())
            .args(args)
            .timeout(self.timeout)
    }

    fn exec(&self, service: &str, invocation: Invocation) -> Result<SubprocessResult, ProvisionError> {
        let result = self.runner.run(&invocation)?;
        if !result.success {
            return Err(service_failure(service, &invocation, &result));
        }
        Ok(result)
    }

    /// `nssm install <name> <program> [args...]`
    pub fn install(&self, name: &str, program: &str, args: &[String]) -> Result<(), ProvisionError> {
        let mut argv = vec!["install".to_string(), name.to_string(), program.to_string()];
        argv.extend(args.iter().cloned());
        self.exec(name, self.invocation(argv))?;
        Ok(())
    }

    /// `nssm set <name> <key> <value...>`
    pub fn set(&self, name: &str, key: &str, values: &[&str]) -> Result<(), ProvisionError> {
        let mut argv = vec!["set", name, key];
        argv.extend_from_slice(values);
        self.exec(name, self.invocation(argv))?;
        Ok(())
    }

    /// `nssm stop <name>`. A service that is already stopped is not an error.
    pub fn stop(&self, name: &str) -> Result<(), ProvisionError> {
        let invocation = self.invocation(["stop", name]);
        let result = self.runner.run(&invocation)?;
        if !result.success {
            warn!(
                service = %name,
                exit_code = ?result.exit_code,
                output = %result.diagnostic().trim(),
                "nssm stop reported failure, continuing with removal"
            );
        }
        Ok(())
    }

    /// `nssm remove <name> confirm`
    pub fn remove(&self, name: &str) -> Result<(), ProvisionError> {
        self.exec(name, self.invocation(["remove", name, "confirm"]))?;
        Ok(())
    }

    /// Register a service and apply every setting in `spec`.
    pub fn apply(&self, spec: &ServiceSpec) -> Result<(), ProvisionError> {
        let name = spec.name.as_str();
        let rotate_bytes = spec.rotate_bytes.to_string();
        let working_dir = spec.working_dir.display().to_string();
        let stdout_log = spec.stdout_log.display().to_string();
        let stderr_log = spec.stderr_log.display().to_string();

        self.install(
            name,
            &spec.executable.display().to_string(),
            &spec.arguments,
        )?;

        let settings: [(&str, &str); 9] = [
            ("AppDirectory", &working_dir),
            ("DisplayName", &spec.display_name),
            ("Description", &spec.description),
            ("Start", spec.start_mode.as_nssm()),
            ("AppStdout", &stdout_log),
            ("AppStderr", &stderr_log),
            ("AppRotateFiles", "1"),
            ("AppRotateOnline", "1"),
            ("AppRotateBytes", &rotate_bytes),
        ];

        for (key, value) in settings {
            debug!(service = %name, key, value, "Setting service parameter");
            self.set(name, key, &[value])?;
        }

        info!(service = %name, executable = %spec.executable.display(), "Service registered");
        Ok(())
    }
}
