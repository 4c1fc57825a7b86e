//! Reverse proxy steps.
//!
//! - `proxy.features` - Install the web server role and WebSocket support
//! - `proxy.extensions` - Install the rewrite extension module
//! - `proxy.config` - Write the default site's rewrite rule

mod extensions;
mod features;
mod site;

pub use extensions::InstallProxyExtensionsStep;
pub use features::InstallProxyFeaturesStep;
pub use site::{ReverseProxyRule, WriteProxyConfigStep};
