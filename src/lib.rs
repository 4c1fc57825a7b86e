//! pyhost-provisioner library
//!
//! One-shot, idempotent provisioning of a Windows host that runs a Python
//! web application as a service behind an IIS reverse proxy.

pub mod audit;
pub mod config;
pub mod error;
pub mod executor;
pub mod host;
pub mod provisioner;
pub mod services;
pub mod steps;
pub mod templates;
pub mod validation;

pub use error::{ProvisionError, ProvisionResult};
pub use provisioner::{ConsoleProgress, ProgressReporter, ProvisionReport, Provisioner};
