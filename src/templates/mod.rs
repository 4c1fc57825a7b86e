//! Template module.
//!
//! Renders the managed configuration files from templates embedded in the
//! binary.

mod engine;

pub use engine::{TemplateEngine, DOTENV_TEMPLATE, WEB_CONFIG_TEMPLATE, WORKER_CONFIG_TEMPLATE};
