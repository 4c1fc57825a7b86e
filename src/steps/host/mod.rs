//! Host preparation steps.
//!
//! - `host.directories` - Create the install root and log directory

mod directories;

pub use directories::EnsureDirectoriesStep;
