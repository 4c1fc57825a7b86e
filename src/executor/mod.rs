//! Command executor module.
//!
//! Handles subprocess spawning, execution timeouts and output shaping.

mod output;
mod subprocess;

pub use output::sanitize_output;
pub use subprocess::{CommandRunner, Invocation, SubprocessResult, SystemRunner};
