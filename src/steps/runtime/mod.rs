//! Language runtime steps.
//!
//! - `runtime.install` - Install the interpreter if its marker is missing
//! - `runtime.virtualenv` - Create the application's virtual environment
//! - `app.dependencies` - Install the application's requirements

mod dependencies;
mod install;
mod virtualenv;

pub use dependencies::InstallDependenciesStep;
pub use install::InstallRuntimeStep;
pub use virtualenv::CreateVirtualenvStep;
