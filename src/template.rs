//! Endpoint template interpolation
//!
//! Handles `{placeholder}` substitution in endpoint paths such as
//! `/industries/{industry_id}/skills/emerging`.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Regex for matching placeholders: {name}
static TEMPLATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_][a-z0-9_]*)\}").unwrap());

/// Values available to a template
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    vars: HashMap<String, Value>,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context from existing values
    pub fn from_values(vars: HashMap<String, Value>) -> Self {
        Self { vars }
    }

    /// Set a variable
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Get a variable
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }
}

/// Render a template string with the given context
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut missing = Vec::new();

    let rendered = TEMPLATE_REGEX.replace_all(template, |cap: &regex::Captures<'_>| {
        match ctx.get(&cap[1]).and_then(value_to_segment) {
            Some(value) => value,
            None => {
                missing.push(cap[1].to_string());
                String::new()
            }
        }
    });

    if !missing.is_empty() {
        return Err(Error::undefined_var(missing.join(", ")));
    }

    if rendered.contains('{') || rendered.contains('}') {
        return Err(Error::template(format!(
            "malformed placeholder in '{template}'"
        )));
    }

    Ok(rendered.into_owned())
}

/// Check if a string contains placeholders
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Extract all placeholder names from a template, in order of appearance
pub fn placeholders(template: &str) -> Vec<String> {
    TEMPLATE_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Scalar values only; a path segment cannot hold an object or be empty
fn value_to_segment(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
