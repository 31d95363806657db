//! Transform requests: a prompt template plus the structured context that
//! fills it.
//!
//! Templates use `{name}` placeholders. String context values are inserted
//! verbatim, every other JSON value is inserted in its compact serialized
//! form. `{{` and `}}` produce literal braces; a brace that does not open a
//! well-formed placeholder is copied through unchanged.

use serde_json::{Map, Value};

use crate::error::{LlmError, Result};

/// One call to a text-transform service.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    /// Prompt template with `{name}` placeholders.
    pub template: String,
    /// Values for the placeholders.
    pub context: Map<String, Value>,
}

impl TransformRequest {
    /// Create a request with an empty context.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            context: Map::new(),
        }
    }

    /// Add a context value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Substitute every placeholder with its context value.
    pub fn render(&self) -> Result<String> {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(pos) = rest.find(|c| c == '{' || c == '}') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if tail.starts_with("{{") {
                out.push('{');
                rest = &tail[2..];
                continue;
            }
            if tail.starts_with("}}") {
                out.push('}');
                rest = &tail[2..];
                continue;
            }
            if tail.starts_with('{')
                && let Some(end) = tail[1..].find('}')
            {
                let name = &tail[1..1 + end];
                if is_placeholder_name(name) {
                    let value = self.context.get(name).ok_or_else(|| {
                        LlmError::InvalidRequest(format!(
                            "template placeholder '{{{name}}}' has no value in context"
                        ))
                    })?;
                    out.push_str(&value_to_text(value));
                    rest = &tail[end + 2..];
                    continue;
                }
            }

            out.push_str(&tail[..1]);
            rest = &tail[1..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

fn is_placeholder_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
