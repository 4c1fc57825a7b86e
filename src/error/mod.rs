//! Error types for the provisioner.
//!
//! Provides a unified error handling system using thiserror.

mod types;

pub use types::*;
