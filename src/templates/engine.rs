//! Tera template engine wrapper.

use std::sync::Arc;

use serde::Serialize;
use tera::{Context, Tera};
use tracing::debug;

use crate::error::ProvisionError;

/// `.env` file read by the application at startup.
pub const DOTENV_TEMPLATE: &str = "env/dotenv.tera";
/// IIS site configuration with the reverse-proxy rewrite rule.
pub const WEB_CONFIG_TEMPLATE: &str = "iis/web.config.tera";
/// Worker-pool configuration for the process-worker manager.
pub const WORKER_CONFIG_TEMPLATE: &str = "workers/gunicorn.conf.py.tera";

const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[
    (
        DOTENV_TEMPLATE,
        include_str!("../../templates/env/dotenv.tera"),
    ),
    (
        WEB_CONFIG_TEMPLATE,
        include_str!("../../templates/iis/web.config.tera"),
    ),
    (
        WORKER_CONFIG_TEMPLATE,
        include_str!("../../templates/workers/gunicorn.conf.py.tera"),
    ),
];

/// Template engine for rendering configuration files.
///
/// Wraps Tera and provides a simplified interface for template operations.
#[derive(Clone)]
pub struct TemplateEngine {
    tera: Arc<Tera>,
}

impl TemplateEngine {
    /// Create an engine holding the templates compiled into the binary.
    pub fn embedded() -> Result<Self, ProvisionError> {
        let mut tera = Tera::default();
        // Only the XML site configuration is escaped; the other files are
        // line-oriented and take values verbatim.
        tera.autoescape_on(vec![".config.tera"]);
        tera.add_raw_templates(EMBEDDED_TEMPLATES.iter().copied())
            .map_err(|e| ProvisionError::Template {
                message: format!("Failed to load embedded templates: {}", e),
            })?;

        debug!(count = EMBEDDED_TEMPLATES.len(), "Template engine initialized");

        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    /// Render a template with any serializable context.
    pub fn render<C: Serialize>(
        &self,
        template_name: &str,
        context: &C,
    ) -> Result<String, ProvisionError> {
        let tera_context = Context::from_serialize(context).map_err(|e| ProvisionError::Template {
            message: format!("Invalid template context: {}", e),
        })?;

        self.tera
            .render(template_name, &tera_context)
            .map_err(|e| ProvisionError::Template {
                message: format!("Failed to render template '{}': {}", template_name, e),
            })
    }
}
