//! Input validation module.
//!
//! Provides validators for service names, host paths, ports, download URLs
//! and single-line text values.

mod network;
mod path;
mod service_name;
mod text;

pub use network::{validate_https_url, validate_port};
pub use path::validate_absolute_path;
pub use service_name::validate_service_name;
pub use text::validate_single_line;
