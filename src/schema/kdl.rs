//! KDL parsing for schema files.
//!
//! Lets a deployment describe its parameters in a file instead of code.
//!
//! # KDL Schema
//!
//! ```kdl
//! param "camera_offset" {
//!     default 0.06
//!     allowed-types "number"
//!     live #true
//!     description "Your camera offset to use in lane_planner.py"
//! }
//!
//! param "lanes" {
//!     default-json "[1, 2, 3]"   // lists and objects
//!     allowed-types "list" "null"
//! }
//!
//! param "op_edit_live_mode" {
//!     default #false
//!     hidden #true
//! }
//!
//! obsolete "old_key_to_delete"
//! ```

use crate::schema::{Schema, SchemaBuilder, SchemaEntry};
use crate::value::{Value, ValueKind};
use crate::{Error, Result};
use kdl::{KdlDocument, KdlNode, KdlValue};
use std::path::Path;

/// Parse a schema from a KDL document.
///
/// Top-level `param` and `obsolete` nodes are read; other nodes are ignored.
pub fn parse_schema(doc: &KdlDocument) -> Result<Schema> {
    let mut builder = SchemaBuilder::default();

    for node in doc.nodes() {
        match node.name().value() {
            "param" => builder = builder.param(parse_param_node(node)?),
            "obsolete" => {
                for entry in node.entries() {
                    let key = entry.value().as_string().ok_or_else(|| {
                        Error::Kdl("obsolete entries must be strings".to_string())
                    })?;
                    builder = builder.obsolete(key);
                }
            }
            _ => {}
        }
    }

    builder.build()
}

/// Parse a single `param` node.
fn parse_param_node(node: &KdlNode) -> Result<SchemaEntry> {
    let key = get_string_arg(node)
        .ok_or_else(|| Error::Kdl("param node must have a name argument".to_string()))?;

    let mut entry = SchemaEntry::without_default(key);

    if let Some(children) = node.children() {
        for child in children.nodes() {
            match child.name().value() {
                "default" => {
                    let value = child.entries().first().ok_or_else(|| {
                        Error::Kdl(format!("{}: default needs a value", entry.key))
                    })?;
                    entry.default = Some(kdl_to_json(value.value(), &entry.key)?);
                }
                "default-json" => {
                    let raw = get_string_arg(child).ok_or_else(|| {
                        Error::Kdl(format!("{}: default-json needs a string", entry.key))
                    })?;
                    let value: Value = serde_json::from_str(&raw).map_err(|e| {
                        Error::Kdl(format!("{}: invalid default-json: {}", entry.key, e))
                    })?;
                    entry.default = Some(value);
                }
                "allowed-types" => {
                    entry.allowed_types = parse_kinds(child, &entry.key)?;
                }
                "live" => {
                    if let Some(live) = get_bool_arg(child) {
                        entry.live = live;
                    }
                }
                "hidden" => {
                    if let Some(hidden) = get_bool_arg(child) {
                        entry.hidden = hidden;
                    }
                }
                "description" => {
                    entry.description = get_string_arg(child);
                }
                _ => {
                    // Ignore unknown fields for forward compatibility
                }
            }
        }
    }

    Ok(entry)
}

/// Parse every argument of an `allowed-types` node as a kind tag.
fn parse_kinds(node: &KdlNode, key: &str) -> Result<Vec<ValueKind>> {
    let mut kinds = Vec::new();
    for entry in node.entries() {
        let name = entry
            .value()
            .as_string()
            .ok_or_else(|| Error::Kdl(format!("{}: allowed-types must be strings", key)))?;
        let kind = ValueKind::parse(name)
            .ok_or_else(|| Error::Kdl(format!("{}: unknown type '{}'", key, name)))?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}

/// Convert a scalar KDL value into a JSON value.
fn kdl_to_json(value: &KdlValue, key: &str) -> Result<Value> {
    match value {
        KdlValue::String(s) => Ok(Value::String(s.clone())),
        KdlValue::Integer(i) => i64::try_from(*i)
            .map(Value::from)
            .map_err(|_| Error::Kdl(format!("{}: integer default out of range", key))),
        KdlValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .ok_or_else(|| Error::Kdl(format!("{}: default must be a finite number", key))),
        KdlValue::Bool(b) => Ok(Value::Bool(*b)),
        KdlValue::Null => Ok(Value::Null),
    }
}

/// Get a string argument from a node's first entry.
fn get_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .first()
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

/// Get a boolean argument from a node's first entry.
fn get_bool_arg(node: &KdlNode) -> Option<bool> {
    node.entries().first().and_then(|e| e.value().as_bool())
}

/// Load a schema from a KDL file path.
pub fn load_schema_from_file(path: &Path) -> Result<Schema> {
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "schema file {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;

    let doc: KdlDocument = content
        .parse()
        .map_err(|e| Error::Kdl(format!("Failed to parse KDL in {}: {}", path.display(), e)))?;

    parse_schema(&doc)
}
