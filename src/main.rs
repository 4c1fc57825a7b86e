//! pyhost-provision - Provision a Windows host to run a Python web application
//! as a service behind IIS.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pyhost_provisioner::audit::{redact_secrets, AuditLogger, AuditSink, NullAuditLogger};
use pyhost_provisioner::config::{Settings, TelemetryCredentials};
use pyhost_provisioner::host::Host;
use pyhost_provisioner::provisioner::{ConsoleProgress, Provisioner};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Parser, Debug)]
#[command(name = "pyhost-provision", version, about)]
struct Args {
    /// Path to a TOML settings file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Application Insights instrumentation key written to the .env file.
    #[arg(long, env = "APPINSIGHTS_INSTRUMENTATIONKEY", hide_env_values = true)]
    instrumentation_key: Option<String>,

    /// Application Insights connection string written to the .env file.
    #[arg(long, env = "APPLICATIONINSIGHTS_CONNECTION_STRING", hide_env_values = true)]
    connection_string: Option<String>,

    /// Report which steps would run without changing the host.
    #[arg(long)]
    plan: bool,

    /// Override the configured log level.
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => match Settings::load(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error loading configuration: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => Settings::default(),
    };
    if let Some(level) = &args.log_level {
        settings.logging.level = level.clone();
    }

    if let Err(e) = settings.validate() {
        eprintln!("Invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = init_logging(&settings) {
        eprintln!("Error initializing logging: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Starting {} v{}", NAME, VERSION);
    match &args.config {
        Some(path) => info!("Configuration loaded from: {}", path.display()),
        None => info!("Using built-in configuration"),
    }

    let credentials = TelemetryCredentials::new(args.instrumentation_key, args.connection_string);
    let secrets: Vec<String> = credentials.secrets().iter().map(|s| s.to_string()).collect();
    let redact = |text: String| {
        let refs: Vec<&str> = secrets.iter().map(String::as_str).collect();
        redact_secrets(&text, &refs)
    };

    let host = match Host::local(&settings) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Error initializing host access: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let audit = if args.plan {
        None
    } else {
        Some(open_journal(&settings))
    };

    let provisioner = match Provisioner::new(settings, credentials, host) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", redact(e.to_string()));
            return ExitCode::FAILURE;
        }
    };

    if args.plan {
        return match provisioner.plan() {
            Ok(plan) => {
                for (i, step) in plan.iter().enumerate() {
                    let action = match &step.skip_reason {
                        Some(reason) => format!("skip ({})", reason),
                        None => "run".to_string(),
                    };
                    println!("[{}/{}] {}: {}", i + 1, plan.len(), step.name, action);
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(code = e.code(), "Planning failed");
                eprintln!("Error: {}", redact(e.to_string()));
                ExitCode::FAILURE
            }
        };
    }

    let provisioner = match audit {
        Some(sink) => provisioner.with_audit(sink),
        None => provisioner,
    };

    match provisioner.provision(&ConsoleProgress) {
        Ok(report) => {
            println!(
                "Provisioning complete: {} applied, {} skipped.",
                report.applied(),
                report.skipped()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(
                step = e.failed_step().unwrap_or("unknown"),
                code = e.code(),
                "Provisioning failed"
            );
            eprintln!("Error: {}", redact(e.to_string()));
            ExitCode::FAILURE
        }
    }
}

/// Open the run journal, or a no-op sink when disabled or unavailable.
fn open_journal(settings: &Settings) -> Box<dyn AuditSink> {
    if !settings.audit.enabled {
        return Box::new(NullAuditLogger);
    }

    let path = settings.audit_log_path();
    match AuditLogger::new(&path) {
        Ok(logger) => {
            info!(path = %path.display(), "Journal enabled");
            Box::new(logger)
        }
        Err(e) => {
            warn!(error = %e, "Journal unavailable, continuing without it");
            Box::new(NullAuditLogger)
        }
    }
}

/// Initialize logging based on settings.
///
/// Logs go to stderr; stdout carries the progress lines.
fn init_logging(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    match settings.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }

    Ok(())
}
