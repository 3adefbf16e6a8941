//! Helpers for editing collaborators.
//!
//! The store applies no validation on `put`; editors are expected to check
//! user input against the schema first. This module holds the shared pieces:
//! turning typed-in text into a value, checking it against `allowed_types`,
//! and shortening long values for display.

use crate::schema::Schema;
use crate::value::{Value, ValueKind, describe_kinds};
use crate::{Error, Result};

/// Characters kept at each end when [`preview`] shortens a value.
const PREVIEW_HEAD: usize = 30;
const PREVIEW_TAIL: usize = 15;

/// Parse text typed by a user into a value.
///
/// JSON literals are tried first (`0.5`, `[1, 2]`, `"quoted"`, `true`,
/// `null`). Otherwise `none`, `true` and `false` are recognized in any case,
/// a single-quoted word is unquoted, and anything else is kept as a string.
pub fn parse_input(raw: &str) -> Value {
    let raw = raw.trim();

    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return value;
    }

    match raw.to_lowercase().as_str() {
        "none" => return Value::Null,
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }

    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return Value::String(raw[1..raw.len() - 1].to_string());
    }

    Value::String(raw.to_string())
}

/// Check `value` against the schema entry for `key`.
///
/// Unknown keys and entries without `allowed_types` accept anything.
pub fn validate(schema: &Schema, key: &str, value: &Value) -> Result<()> {
    match schema.lookup(key) {
        Some(entry) if !entry.accepts(value) => Err(Error::TypeNotAllowed {
            key: key.to_string(),
            found: ValueKind::of(value),
            allowed: describe_kinds(&entry.allowed_types),
        }),
        _ => Ok(()),
    }
}

/// Render a value for listings, shortening long renderings to
/// `head ... tail`.
pub fn preview(value: &Value) -> String {
    let rendered = render(value);
    let chars: Vec<char> = rendered.chars().collect();
    if chars.len() <= PREVIEW_HEAD + PREVIEW_TAIL {
        return rendered;
    }

    let head: String = chars[..PREVIEW_HEAD].iter().collect();
    let tail: String = chars[chars.len() - PREVIEW_TAIL..].iter().collect();
    format!("{} ... {}", head, tail)
}

/// Render a value without JSON quoting for plain strings.
pub fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
