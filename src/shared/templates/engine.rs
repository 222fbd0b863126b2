//! Template engine for outgoing email bodies using Jinja2 syntax.
//!
//! Templates are compiled into the binary from `templates/` so the server has no
//! runtime dependency on its working directory.

use minijinja::{Environment, Value};
use std::collections::HashMap;
use std::sync::OnceLock;
use thiserror::Error;

static TEMPLATE_ENV: OnceLock<Environment<'static>> = OnceLock::new();

const EMBEDDED_TEMPLATES: &[(&str, &str)] = &[
    (
        "email/otp.jinja",
        include_str!("../../../templates/email/otp.jinja"),
    ),
    (
        "email/invite.jinja",
        include_str!("../../../templates/email/invite.jinja"),
    ),
];

/// Errors that can occur during template operations
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template '{0}' not found")]
    NotFound(String),

    #[error("Failed to render template: {0}")]
    RenderError(String),
}

fn init_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|name| {
        if name.ends_with(".jinja") {
            minijinja::AutoEscape::Html
        } else {
            minijinja::AutoEscape::None
        }
    });

    for &(name, source) in EMBEDDED_TEMPLATES {
        if let Err(e) = env.add_template(name, source) {
            tracing::warn!("Failed to load template {}: {}", name, e);
        }
    }

    env
}

fn get_environment() -> &'static Environment<'static> {
    TEMPLATE_ENV.get_or_init(init_environment)
}

/// Render an embedded template with the given context
pub fn render_template(
    template_name: &str,
    ctx: &HashMap<&str, Value>,
) -> Result<String, TemplateError> {
    let template = get_environment()
        .get_template(template_name)
        .map_err(|_| TemplateError::NotFound(template_name.to_string()))?;

    let render_ctx = Value::from_iter(ctx.iter().map(|(k, v)| (*k, v.clone())));

    template
        .render(render_ctx)
        .map_err(|e| TemplateError::RenderError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_template() {
        let result = render_template("nonexistent.jinja", &HashMap::new());
        assert!(matches!(result, Err(TemplateError::NotFound(_))));
    }

    #[test]
    fn test_embedded_templates_load() {
        let env = get_environment();
        assert!(env.get_template("email/otp.jinja").is_ok());
        assert!(env.get_template("email/invite.jinja").is_ok());
    }

    #[test]
    fn test_values_are_html_escaped() {
        let mut ctx = HashMap::new();
        ctx.insert("sender", Value::from("<script>"));
        ctx.insert("file_name", Value::from("a.pdf"));
        ctx.insert("expires_at", Value::from("tomorrow"));
        ctx.insert("link", Value::from("http://x"));

        let html = render_template("email/invite.jinja", &ctx).unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
