//! Minijinja rendering for alert titles and messages.
//!
//! Templates are static strings, but the context changes per alert, so a
//! fresh [`minijinja::Environment`] is built per render call.

use minijinja::UndefinedBehavior;
use pulse_core::Details;
use tracing::warn;

use super::AlertTemplate;

/// Errors raised while rendering a template.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("template error: {0}")]
    Render(String),
}

/// Renders alert templates with the engine's custom filters.
#[derive(Debug)]
pub struct TemplateRenderer {
    _private: (),
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self { _private: () }
    }

    fn build_env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        // A missing field is a template bug, not an empty string.
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_filter("round", round_filter);
        env.add_filter("signed", signed_filter);
        env.add_filter("usd", usd_filter);
        env
    }

    /// Render a template string against a context map.
    pub fn render(&self, template_str: &str, ctx: &Details) -> Result<String, TemplateError> {
        let env = Self::build_env();
        env.render_str(template_str, ctx)
            .map_err(|e| TemplateError::Render(e.to_string()))
    }

    /// Render, falling back to the raw template text on failure.
    pub fn render_or_raw(&self, template_str: &str, ctx: &Details) -> String {
        match self.render(template_str, ctx) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, template = template_str, "alert template failed to render");
                template_str.to_string()
            }
        }
    }

    /// Render both title and message of an alert template.
    pub fn render_alert(&self, template: &AlertTemplate, ctx: &Details) -> (String, String) {
        (
            self.render_or_raw(template.title, ctx),
            self.render_or_raw(template.message, ctx),
        )
    }

    /// Check that a template string parses.
    pub fn validate(&self, template_str: &str) -> Result<(), TemplateError> {
        let env = Self::build_env();
        env.template_from_str(template_str)
            .map_err(|e| TemplateError::Render(e.to_string()))?;
        Ok(())
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Round a float to N decimal places.
fn round_filter(value: f64, decimals: Option<u32>) -> String {
    let n = decimals.unwrap_or(0);
    format!("{:.prec$}", value, prec = n as usize)
}

/// Like `round`, with an explicit sign.
fn signed_filter(value: f64, decimals: Option<u32>) -> String {
    let n = decimals.unwrap_or(0);
    format!("{:+.prec$}", value, prec = n as usize)
}

/// Dollar amount with thousands separators, no currency symbol.
fn usd_filter(value: f64, decimals: Option<u32>) -> String {
    group_thousands(value, decimals.unwrap_or(0) as usize)
}

pub(crate) fn group_thousands(value: f64, decimals: usize) -> String {
    let raw = format!("{:.prec$}", value.abs(), prec = decimals);
    let (int_part, frac_part) = match raw.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (raw.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && raw.chars().any(|c| c != '0' && c != '.') { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}
