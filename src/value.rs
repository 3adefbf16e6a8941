//! Value model for stored parameters.
//!
//! Stored values are plain [`serde_json::Value`]s: a closed sum of null,
//! bool, number, string, list and object. [`ValueKind`] is the matching tag
//! set used by schema entries to restrict what a parameter may hold.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use serde_json::Value;

/// In-memory view of the params document, keyed by parameter name.
///
/// A `BTreeMap` keeps keys sorted so the serialized file is deterministic.
pub type Snapshot = BTreeMap<String, Value>;

/// Tag for each kind of value a parameter can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Integer or floating point number
    Number,
    Bool,
    String,
    List,
    Object,
    Null,
}

impl ValueKind {
    /// Kind of the given value.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::List,
            Value::Object(_) => ValueKind::Object,
        }
    }

    /// Parse from string, case-insensitive. Accepts common aliases
    /// (`float`, `int`, `str`, `array`, `dict`, `none`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "number" | "float" | "int" | "integer" => Some(ValueKind::Number),
            "bool" | "boolean" => Some(ValueKind::Bool),
            "string" | "str" => Some(ValueKind::String),
            "list" | "array" => Some(ValueKind::List),
            "object" | "dict" | "map" => Some(ValueKind::Object),
            "null" | "none" => Some(ValueKind::Null),
            _ => None,
        }
    }

    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Number => "number",
            ValueKind::Bool => "bool",
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Object => "object",
            ValueKind::Null => "null",
        }
    }

    /// Whether `value` has this kind.
    pub fn matches(&self, value: &Value) -> bool {
        ValueKind::of(value) == *self
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether `value`'s kind is one of `allowed`.
pub fn kind_allowed(allowed: &[ValueKind], value: &Value) -> bool {
    allowed.contains(&ValueKind::of(value))
}

/// Last-resort value for a parameter whose stored value and default are both
/// outside its allowed kinds.
///
/// First matching rule wins: list, number, null, string. Anything else
/// (bool or object only) falls back to null.
pub fn zero_value(allowed: &[ValueKind]) -> Value {
    if allowed.contains(&ValueKind::List) {
        Value::Array(Vec::new())
    } else if allowed.contains(&ValueKind::Number) {
        Value::from(0)
    } else if allowed.contains(&ValueKind::Null) {
        Value::Null
    } else if allowed.contains(&ValueKind::String) {
        Value::String(String::new())
    } else {
        Value::Null
    }
}

/// Join kinds for display, e.g. `"number, null"`.
pub fn describe_kinds(kinds: &[ValueKind]) -> String {
    kinds
        .iter()
        .map(ValueKind::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_of() {
        assert_eq!(ValueKind::of(&json!(null)), ValueKind::Null);
        assert_eq!(ValueKind::of(&json!(true)), ValueKind::Bool);
        assert_eq!(ValueKind::of(&json!(3)), ValueKind::Number);
        assert_eq!(ValueKind::of(&json!(0.06)), ValueKind::Number);
        assert_eq!(ValueKind::of(&json!("x")), ValueKind::String);
        assert_eq!(ValueKind::of(&json!([1, 2])), ValueKind::List);
        assert_eq!(ValueKind::of(&json!({"a": 1})), ValueKind::Object);
    }

    #[test]
    fn test_bool_is_not_a_number() {
        assert!(!kind_allowed(&[ValueKind::Number], &json!(true)));
        assert!(kind_allowed(&[ValueKind::Number], &json!(1)));
    }

    #[test]
    fn test_kind_parse_aliases() {
        assert_eq!(ValueKind::parse("float"), Some(ValueKind::Number));
        assert_eq!(ValueKind::parse("INT"), Some(ValueKind::Number));
        assert_eq!(ValueKind::parse("str"), Some(ValueKind::String));
        assert_eq!(ValueKind::parse("NoneType"), None);
        assert_eq!(ValueKind::parse("none"), Some(ValueKind::Null));
        assert_eq!(ValueKind::parse("dict"), Some(ValueKind::Object));
        assert_eq!(ValueKind::parse("tuple"), None);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(format!("{}", ValueKind::List), "list");
        assert_eq!(
            describe_kinds(&[ValueKind::Number, ValueKind::Null]),
            "number, null"
        );
    }

    #[test]
    fn test_zero_value_precedence() {
        assert_eq!(zero_value(&[ValueKind::Number, ValueKind::List]), json!([]));
        assert_eq!(zero_value(&[ValueKind::String, ValueKind::Number]), json!(0));
        assert_eq!(zero_value(&[ValueKind::String, ValueKind::Null]), json!(null));
        assert_eq!(zero_value(&[ValueKind::String]), json!(""));
        assert_eq!(zero_value(&[ValueKind::Bool]), json!(null));
        assert_eq!(zero_value(&[ValueKind::Object]), json!(null));
    }
}
