//! Managed configuration files.
//!
//! Both files are rendered from templates and replaced on every run.
//!
//! - `config.runtime` - Application `.env` file
//! - `config.workers` - Worker pool configuration

mod runtime_env;
mod workers;

pub use runtime_env::{RuntimeEnv, WriteRuntimeConfigStep};
pub use workers::{WorkerPoolConfig, WriteWorkerConfigStep};
