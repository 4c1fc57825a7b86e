//! Configuration module for the provisioner.
//!
//! Handles loading and validating settings from TOML files, and the
//! per-run telemetry credentials.

mod credentials;
mod settings;

pub use credentials::TelemetryCredentials;
pub use settings::*;
