//! Subprocess execution.
//!
//! Provides utilities for running installers and service tools with:
//! - No shell interpretation (direct exec)
//! - Configurable timeouts
//! - Captured stdout/stderr
//! - Environment and working directory control

use std::collections::BTreeMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{CommandErrorKind, ProvisionError};

/// Result of a subprocess execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubprocessResult {
    /// Whether the command exited successfully (exit code 0).
    pub success: bool,
    /// The exit code, if available.
    pub exit_code: Option<i32>,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl SubprocessResult {
    fn from_parts(status: ExitStatus, stdout: &[u8], stderr: &[u8]) -> Self {
        Self {
            success: status.success(),
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(stdout).to_string(),
            stderr: String::from_utf8_lossy(stderr).to_string(),
        }
    }

    /// A successful result with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed result with the given exit code and stderr.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Stderr if present, otherwise stdout. Windows tools are inconsistent
    /// about which stream carries the failure reason.
    pub fn diagnostic(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Description of a child process to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub working_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl Invocation {
    /// Create a new invocation of `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            working_dir: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Add arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args.extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<str>) -> Self {
        self.args.push(arg.as_ref().to_string());
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the timeout for the command.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Program and arguments joined by spaces, for logs and test assertions.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Runs invocations. The seam that lets the provisioner be tested
/// without touching the host.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<SubprocessResult, ProvisionError>;
}

/// Runs invocations as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    /// Execute the command and wait for completion with timeout enforcement.
    ///
    /// If the process exceeds the configured timeout, it will be killed
    /// and a timeout error will be returned.
    fn run(&self, invocation: &Invocation) -> Result<SubprocessResult, ProvisionError> {
        debug!(
            program = %invocation.program,
            args = ?invocation.args,
            timeout_secs = invocation.timeout.as_secs(),
            "Executing subprocess"
        );

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        for (key, value) in &invocation.env {
            cmd.env(key, value);
        }
        if let Some(dir) = &invocation.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| ProvisionError::Command {
            kind: CommandErrorKind::SpawnFailed {
                program: invocation.program.clone(),
                message: e.to_string(),
            },
        })?;

        // Drain both pipes on their own threads so chatty installers
        // cannot block on a full pipe while we poll.
        let stdout_reader = child.stdout.take().map(drain);
        let stderr_reader = child.stderr.take().map(drain);

        // Poll for completion with timeout enforcement
        let start = Instant::now();
        let poll_interval = Duration::from_millis(100);

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let stdout = collect(stdout_reader);
                    let stderr = collect(stderr_reader);
                    let result = SubprocessResult::from_parts(status, &stdout, &stderr);
                    debug!(
                        success = result.success,
                        exit_code = ?result.exit_code,
                        duration_ms = start.elapsed().as_millis(),
                        "Subprocess completed"
                    );
                    return Ok(result);
                }
                Ok(None) => {
                    if start.elapsed() > invocation.timeout {
                        warn!(
                            program = %invocation.program,
                            timeout_secs = invocation.timeout.as_secs(),
                            "Process timed out, killing"
                        );
                        if let Err(e) = child.kill() {
                            warn!(error = %e, "Failed to kill timed-out process");
                        }
                        // Reap the zombie process
                        let _ = child.wait();
                        return Err(ProvisionError::Command {
                            kind: CommandErrorKind::Timeout {
                                program: invocation.program.clone(),
                                timeout_secs: invocation.timeout.as_secs(),
                            },
                        });
                    }
                    std::thread::sleep(poll_interval);
                }
                Err(e) => {
                    return Err(ProvisionError::Command {
                        kind: CommandErrorKind::ExecutionFailed {
                            message: format!("Failed to check process status: {}", e),
                        },
                    });
                }
            }
        }
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn run(invocation: Invocation) -> Result<SubprocessResult, ProvisionError> {
        SystemRunner.run(&invocation.timeout(Duration::from_secs(5)))
    }

    #[test]
    fn test_run_echo() {
        let result = run(Invocation::new("echo").args(["hello", "world"])).unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout.trim(), "hello world");
    }

    #[test]
    fn test_run_false_command() {
        let result = run(Invocation::new("false")).unwrap();
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(1));
    }

    #[test]
    fn test_run_with_env() {
        let result = run(Invocation::new("sh")
            .args(["-c", "echo $TEST_VAR"])
            .env("TEST_VAR", "hello_env"))
        .unwrap();
        assert_eq!(result.stdout.trim(), "hello_env");
    }

    #[test]
    fn test_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(Invocation::new("pwd").working_dir(dir.path())).unwrap();
        let reported = std::path::PathBuf::from(result.stdout.trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_nonexistent_command() {
        let result = run(Invocation::new("nonexistent_command_12345"));
        assert!(matches!(
            result,
            Err(ProvisionError::Command {
                kind: CommandErrorKind::SpawnFailed { .. }
            })
        ));
    }

    #[test]
    fn test_timeout_kills_process() {
        let result = SystemRunner.run(
            &Invocation::new("sleep")
                .arg("5")
                .timeout(Duration::from_millis(200)),
        );
        assert!(matches!(
            result,
            Err(ProvisionError::Command {
                kind: CommandErrorKind::Timeout { .. }
            })
        ));
    }

    #[test]
    fn test_stderr_capture() {
        let result = run(Invocation::new("sh").args(["-c", "echo error >&2"])).unwrap();
        assert!(result.success);
        assert_eq!(result.stderr.trim(), "error");
        assert_eq!(result.diagnostic().trim(), "error");
    }

    #[test]
    fn test_command_line() {
        let inv = Invocation::new("nssm.exe").args(["remove", "PyWebApp", "confirm"]);
        assert_eq!(inv.command_line(), "nssm.exe remove PyWebApp confirm");
        assert_eq!(Invocation::new("sc.exe").command_line(), "sc.exe");
    }
}
