//! Provisioning steps.
//!
//! Each step checks whether its target state is already present and, if
//! not, applies it. `StepRegistry` holds the steps in execution order.

pub mod config;
pub mod host;
pub mod proxy;
pub mod runtime;
pub mod service;

mod registry;
mod traits;
mod types;

pub use registry::StepRegistry;
pub use traits::Step;
pub use types::{Check, StepContext, StepOutcome};
