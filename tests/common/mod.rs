//! In-memory host used by the integration tests.
//!
//! Simulates just enough of a Windows machine for the provisioning steps:
//! a filesystem, the service registry, Windows features, and the tools the
//! steps invoke (installer, venv, pip, NSSM, sc.exe, PowerShell, msiexec).
//! Individual tools can be switched into their failure modes.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use pyhost_provisioner::config::Settings;
use pyhost_provisioner::executor::{CommandRunner, Invocation, SubprocessResult};
use pyhost_provisioner::host::{Downloader, Filesystem, Host};
use pyhost_provisioner::services::venv_python;
use pyhost_provisioner::ProvisionError;

pub const REFRESHED_PATH: &str = r"C:\Windows\system32;C:\Program Files\Python311\";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeService {
    pub running: bool,
    pub program: String,
    pub params: BTreeMap<String, String>,
}

/// Observable machine state; compared across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub files: BTreeMap<PathBuf, String>,
    pub dirs: BTreeSet<PathBuf>,
    pub services: BTreeMap<String, FakeService>,
    pub features: BTreeSet<String>,
    /// IIS bindings as `site:port`.
    pub bindings: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct State {
    machine: Snapshot,
    calls: Vec<Invocation>,
    downloads: Vec<String>,
    fail_on: Option<String>,
    fail_download: Option<String>,
    msi_exit_code: i32,
    venv_reports_existing: bool,
    installer_skips_marker: bool,
    archive_without_subdir: bool,
}

/// Paths the simulated tools need to recognize.
#[derive(Debug, Clone)]
struct Layout {
    runtime_marker: PathBuf,
    venv_python: PathBuf,
    archive_subdir: String,
    nssm_executable: String,
    extension_markers: Vec<PathBuf>,
}

#[derive(Clone)]
pub struct FakeHost {
    state: Rc<RefCell<State>>,
    layout: Rc<Layout>,
}

impl FakeHost {
    pub fn new(settings: &Settings) -> Self {
        let layout = Layout {
            runtime_marker: settings.runtime.marker.clone(),
            venv_python: venv_python(settings),
            archive_subdir: settings.service_manager.archive_subdir.clone(),
            nssm_executable: settings.service_manager.executable.clone(),
            extension_markers: settings
                .proxy
                .extensions
                .iter()
                .map(|e| e.marker.clone())
                .collect(),
        };
        Self {
            state: Rc::new(RefCell::new(State::default())),
            layout: Rc::new(layout),
        }
    }

    /// Boundaries backed by this fake, ready to hand to a provisioner.
    pub fn host(&self) -> Host {
        Host::new(
            Box::new(FakeFs(self.clone())),
            Box::new(FakeRunner(self.clone())),
            Box::new(FakeDownloader(self.clone())),
        )
    }

    /// Any invocation whose command line contains `pattern` exits with 5.
    pub fn fail_on(&self, pattern: &str) {
        self.state.borrow_mut().fail_on = Some(pattern.to_string());
    }

    /// Downloads of any URL containing `pattern` fail.
    pub fn fail_download(&self, pattern: &str) {
        self.state.borrow_mut().fail_download = Some(pattern.to_string());
    }

    pub fn set_msi_exit_code(&self, code: i32) {
        self.state.borrow_mut().msi_exit_code = code;
    }

    /// `python -m venv` exits non-zero with an "already exists" message.
    pub fn venv_reports_existing(&self) {
        self.state.borrow_mut().venv_reports_existing = true;
    }

    /// The runtime installer exits 0 without creating the interpreter.
    pub fn installer_skips_marker(&self) {
        self.state.borrow_mut().installer_skips_marker = true;
    }

    /// Extracted service manager archives lack the expected subtree.
    pub fn archive_without_subdir(&self) {
        self.state.borrow_mut().archive_without_subdir = true;
    }

    pub fn add_file(&self, path: impl Into<PathBuf>, content: &str) {
        let path = path.into();
        let mut state = self.state.borrow_mut();
        add_ancestors(&mut state.machine.dirs, &path);
        state.machine.files.insert(path, content.to_string());
    }

    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut state = self.state.borrow_mut();
        add_ancestors(&mut state.machine.dirs, &path);
        state.machine.dirs.insert(path);
    }

    pub fn add_service(&self, name: &str, running: bool) {
        self.state.borrow_mut().machine.services.insert(
            name.to_string(),
            FakeService {
                running,
                program: "old.exe".to_string(),
                params: BTreeMap::new(),
            },
        );
    }

    pub fn add_feature(&self, name: &str) {
        self.state.borrow_mut().machine.features.insert(name.to_string());
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().machine.clone()
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state.borrow().machine.files.get(path.as_ref()).cloned()
    }

    pub fn service(&self, name: &str) -> Option<FakeService> {
        self.state.borrow().machine.services.get(name).cloned()
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.state.borrow().calls.clone()
    }

    /// Command lines of every invocation, in order.
    pub fn command_lines(&self) -> Vec<String> {
        self.state
            .borrow()
            .calls
            .iter()
            .map(Invocation::command_line)
            .collect()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.state.borrow().downloads.clone()
    }

    pub fn clear_history(&self) {
        let mut state = self.state.borrow_mut();
        state.calls.clear();
        state.downloads.clear();
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state.borrow();
        state.machine.files.contains_key(path) || state.machine.dirs.contains(path)
    }

    fn run(&self, invocation: &Invocation) -> SubprocessResult {
        let command_line = invocation.command_line();
        {
            let mut state = self.state.borrow_mut();
            state.calls.push(invocation.clone());
            if let Some(pattern) = &state.fail_on {
                if command_line.contains(pattern.as_str()) {
                    return SubprocessResult::failed(5, "Access is denied.");
                }
            }
        }

        let program = invocation.program.as_str();
        let args: Vec<&str> = invocation.args.iter().map(String::as_str).collect();

        if program.ends_with(&self.layout.nssm_executable) {
            self.nssm(&args)
        } else if program == "sc.exe" {
            self.sc(&args)
        } else if program == "powershell.exe" {
            self.powershell(args.last().copied().unwrap_or_default())
        } else if program == "msiexec.exe" {
            self.msiexec()
        } else if Path::new(program) == self.layout.runtime_marker {
            self.base_python(&args)
        } else if Path::new(program) == self.layout.venv_python {
            SubprocessResult::ok("Successfully installed flask")
        } else if program.ends_with(".exe") && args.contains(&"InstallAllUsers=1") {
            if !self.state.borrow().installer_skips_marker {
                self.add_file(self.layout.runtime_marker.clone(), "python");
            }
            SubprocessResult::ok("")
        } else {
            SubprocessResult::failed(9009, format!("'{}' is not recognized", program))
        }
    }

    fn base_python(&self, args: &[&str]) -> SubprocessResult {
        if args.starts_with(&["-m", "venv"]) {
            if self.state.borrow().venv_reports_existing {
                return SubprocessResult::failed(
                    1,
                    "Error: [WinError 183] Cannot create a file when that file already exists",
                );
            }
            self.add_file(self.layout.venv_python.clone(), "python");
            return SubprocessResult::ok("");
        }
        SubprocessResult::failed(2, "unexpected arguments")
    }

    fn nssm(&self, args: &[&str]) -> SubprocessResult {
        let mut state = self.state.borrow_mut();
        let services = &mut state.machine.services;
        match args {
            ["install", name, program, ..] => {
                if services.contains_key(*name) {
                    return SubprocessResult::failed(5, "service already exists");
                }
                services.insert(
                    name.to_string(),
                    FakeService {
                        running: false,
                        program: program.to_string(),
                        params: BTreeMap::new(),
                    },
                );
                SubprocessResult::ok("Service installed successfully!")
            }
            ["set", name, key, value @ ..] => match services.get_mut(*name) {
                Some(service) => {
                    service.params.insert(key.to_string(), value.join(" "));
                    SubprocessResult::ok("Set parameter")
                }
                None => SubprocessResult::failed(3, "Can't open service!"),
            },
            ["stop", name] => match services.get_mut(*name) {
                Some(service) if service.running => {
                    service.running = false;
                    SubprocessResult::ok("STOP: The operation completed successfully.")
                }
                Some(_) => SubprocessResult::failed(1, "The service has not been started."),
                None => SubprocessResult::failed(3, "Can't open service!"),
            },
            ["remove", name, "confirm"] => match services.remove(*name) {
                Some(_) => SubprocessResult::ok("Service removed successfully!"),
                None => SubprocessResult::failed(3, "Can't open service!"),
            },
            _ => SubprocessResult::failed(1, "unknown nssm command"),
        }
    }

    fn sc(&self, args: &[&str]) -> SubprocessResult {
        let mut state = self.state.borrow_mut();
        let services = &mut state.machine.services;
        match args {
            ["query", name] => match services.get(*name) {
                Some(service) => {
                    let label = if service.running { "4  RUNNING" } else { "1  STOPPED" };
                    SubprocessResult::ok(format!(
                        "\r\nSERVICE_NAME: {}\r\n        STATE              : {} \r\n",
                        name, label
                    ))
                }
                None => SubprocessResult {
                    success: false,
                    exit_code: Some(1060),
                    stdout: "[SC] EnumQueryServicesStatus:OpenService FAILED 1060".to_string(),
                    stderr: String::new(),
                },
            },
            ["start", name] => match services.get_mut(*name) {
                Some(service) if service.running => SubprocessResult::failed(
                    1056,
                    "An instance of the service is already running.",
                ),
                Some(service) => {
                    service.running = true;
                    SubprocessResult::ok("STATE              : 2  START_PENDING")
                }
                None => SubprocessResult::failed(1060, "The specified service does not exist."),
            },
            _ => SubprocessResult::failed(1, "unknown sc command"),
        }
    }

    fn powershell(&self, script: &str) -> SubprocessResult {
        if script.contains("GetEnvironmentVariable('Path'") {
            return SubprocessResult::ok(format!("{}\r\n", REFRESHED_PATH));
        }

        let names = feature_names(script);
        let mut state = self.state.borrow_mut();
        if script.starts_with("Get-WindowsFeature") {
            let missing: Vec<String> = names
                .into_iter()
                .filter(|n| !state.machine.features.contains(n))
                .collect();
            return SubprocessResult::ok(missing.join("\r\n"));
        }
        if script.starts_with("Install-WindowsFeature") {
            for name in names {
                if name == "Web-Server" {
                    state.machine.bindings.insert("Default Web Site:80".to_string());
                    state
                        .machine
                        .services
                        .entry("W3SVC".to_string())
                        .or_insert(FakeService {
                            running: false,
                            program: "svchost.exe".to_string(),
                            params: BTreeMap::new(),
                        });
                }
                state.machine.features.insert(name);
            }
            return SubprocessResult::ok("Success Restart Needed Exit Code");
        }
        if script.contains("New-WebBinding") {
            if let Some(binding) = binding_target(script) {
                state.machine.bindings.insert(binding);
                return SubprocessResult::ok("");
            }
        }
        SubprocessResult::failed(1, "unsupported script")
    }

    fn msiexec(&self) -> SubprocessResult {
        let code = self.state.borrow().msi_exit_code;
        if code != 0 && code != 3010 {
            return SubprocessResult::failed(code, "Fatal error during installation.");
        }
        for marker in self.layout.extension_markers.clone() {
            self.add_file(marker, "module");
        }
        SubprocessResult {
            success: code == 0,
            exit_code: Some(code),
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

/// Names following `-Name` in a feature cmdlet invocation.
fn feature_names(script: &str) -> Vec<String> {
    script
        .split_whitespace()
        .skip_while(|token| *token != "-Name")
        .nth(1)
        .map(|list| list.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}

/// `site:port` of the binding a `New-WebBinding` script creates.
fn binding_target(script: &str) -> Option<String> {
    let (_, rest) = script.split_once("-Name '")?;
    let mut name = String::new();
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
            } else {
                break;
            }
        }
        name.push(c);
    }
    let (_, rest) = script.split_once("-Port ")?;
    let port: String = rest.chars().take_while(char::is_ascii_digit).collect();
    Some(format!("{}:{}", name, port))
}

fn add_ancestors(dirs: &mut BTreeSet<PathBuf>, path: &Path) {
    for ancestor in path.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        dirs.insert(ancestor.to_path_buf());
    }
}

struct FakeFs(FakeHost);

impl Filesystem for FakeFs {
    fn exists(&self, path: &Path) -> bool {
        self.0.exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> Result<(), ProvisionError> {
        self.0.add_dir(path);
        Ok(())
    }

    fn write_atomic(&self, path: &Path, content: &[u8]) -> Result<(), ProvisionError> {
        self.0.add_file(path, &String::from_utf8_lossy(content));
        Ok(())
    }

    fn copy_dir_all(&self, src: &Path, dst: &Path) -> Result<(), ProvisionError> {
        let mut state = self.0.state.borrow_mut();
        let machine = &mut state.machine;

        let files: Vec<(PathBuf, String)> = machine
            .files
            .iter()
            .filter_map(|(path, content)| {
                path.strip_prefix(src)
                    .ok()
                    .map(|rel| (dst.join(rel), content.clone()))
            })
            .collect();
        let dirs: Vec<PathBuf> = machine
            .dirs
            .iter()
            .filter_map(|path| path.strip_prefix(src).ok().map(|rel| dst.join(rel)))
            .collect();

        add_ancestors(&mut machine.dirs, dst);
        machine.dirs.insert(dst.to_path_buf());
        machine.dirs.extend(dirs);
        machine.files.extend(files);
        Ok(())
    }

    fn extract_zip(&self, archive: &Path, dest: &Path) -> Result<(), ProvisionError> {
        if !self.0.exists(archive) {
            return Err(ProvisionError::Filesystem {
                path: archive.to_path_buf(),
                message: "archive not found".to_string(),
            });
        }
        let subdir = if self.0.state.borrow().archive_without_subdir {
            "win32"
        } else {
            self.0.layout.archive_subdir.as_str()
        };
        let binary = dest.join(subdir).join(&self.0.layout.nssm_executable);
        self.0.add_file(binary, "nssm");
        Ok(())
    }
}

struct FakeRunner(FakeHost);

impl CommandRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<SubprocessResult, ProvisionError> {
        Ok(self.0.run(invocation))
    }
}

struct FakeDownloader(FakeHost);

impl Downloader for FakeDownloader {
    fn download(&self, url: &str, dest: &Path) -> Result<u64, ProvisionError> {
        {
            let mut state = self.0.state.borrow_mut();
            state.downloads.push(url.to_string());
            if let Some(pattern) = &state.fail_download {
                if url.contains(pattern.as_str()) {
                    return Err(ProvisionError::Download {
                        url: url.to_string(),
                        message: "HTTP status 404 Not Found".to_string(),
                    });
                }
            }
        }
        self.0.add_file(dest, "payload");
        Ok(7)
    }
}
