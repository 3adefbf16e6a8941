//! Schema registry: the static table of known parameters.
//!
//! Each [`SchemaEntry`] gives a parameter's default value and optional
//! constraints:
//! - `allowed_types` restricts which [`ValueKind`]s a read may return
//! - `live` marks parameters the store re-reads from disk while running
//! - `description` is shown to users by editors
//! - `hidden` excludes the parameter from whole-snapshot reads
//!
//! The registry also carries the ordered list of obsolete keys that the
//! store removes from the params file when it loads.
//!
//! A schema is built once (in code via [`SchemaBuilder`], or from a KDL file
//! via [`kdl::load_schema_from_file`]) and never mutated afterwards.

pub mod kdl;

use crate::value::{Snapshot, Value, ValueKind};
use crate::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Definition of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaEntry {
    /// Parameter name, unique within a schema
    pub key: String,

    /// Value written for new users and used as the read fallback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Kinds a read may return; empty means unrestricted
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_types: Vec<ValueKind>,

    /// Re-read from disk while the consumer runs
    pub live: bool,

    /// Help text for editors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Excluded from whole-snapshot reads
    pub hidden: bool,
}

impl SchemaEntry {
    /// Create an entry with a default value and no constraints.
    pub fn new(key: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            default: Some(default.into()),
            allowed_types: Vec::new(),
            live: false,
            description: None,
            hidden: false,
        }
    }

    /// Create an entry without a default value.
    pub fn without_default(key: impl Into<String>) -> Self {
        Self {
            default: None,
            ..Self::new(key, Value::Null)
        }
    }

    /// Restrict the kinds a read may return.
    pub fn allow(mut self, kinds: &[ValueKind]) -> Self {
        self.allowed_types = kinds.to_vec();
        self
    }

    /// Mark the parameter as live.
    pub fn live(mut self) -> Self {
        self.live = true;
        self
    }

    /// Attach help text.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Hide the parameter from whole-snapshot reads.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Whether the entry restricts the kinds of its value.
    pub fn has_allowed_types(&self) -> bool {
        !self.allowed_types.is_empty()
    }

    /// Whether `value` satisfies the entry's kind restriction.
    ///
    /// Always true for entries without `allowed_types`.
    pub fn accepts(&self, value: &Value) -> bool {
        !self.has_allowed_types() || self.allowed_types.contains(&ValueKind::of(value))
    }
}

/// Introspection flags for a parameter, all false for unknown keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeyInfo {
    pub has_allowed_types: bool,
    pub allowed_types: Vec<ValueKind>,
    pub live: bool,
    pub has_default: bool,
    pub has_description: bool,
    pub hidden: bool,
}

/// Immutable table of parameter definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    entries: BTreeMap<String, SchemaEntry>,
    obsolete: Vec<String>,
}

impl Schema {
    /// Start building a schema.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// The stock parameter table.
    pub fn builtin() -> Self {
        let entries = [
            SchemaEntry::new("camera_offset", 0.06)
                .allow(&[ValueKind::Number])
                .describe("Your camera offset to use in lane_planner.py")
                .live(),
            SchemaEntry::new("non_live_param", false),
            SchemaEntry::new("op_edit_live_mode", false)
                .describe(
                    "This parameter controls which mode opEdit starts in. \
                     It should be hidden from the user with the hide key",
                )
                .hidden(),
        ];

        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.key.clone(), entry))
                .collect(),
            obsolete: vec!["old_key_to_delete".to_string()],
        }
    }

    /// Look up a parameter definition.
    pub fn lookup(&self, key: &str) -> Option<&SchemaEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// All definitions in key order.
    pub fn entries(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys removed from the params file on load.
    pub fn obsolete_keys(&self) -> &[String] {
        &self.obsolete
    }

    /// Materialize `{key: default}` for every entry that has a default.
    pub fn defaults_snapshot(&self) -> Snapshot {
        self.entries
            .values()
            .filter_map(|entry| {
                entry
                    .default
                    .as_ref()
                    .map(|default| (entry.key.clone(), default.clone()))
            })
            .collect()
    }

    /// Introspection flags for `key`.
    pub fn key_info(&self, key: &str) -> KeyInfo {
        match self.entries.get(key) {
            Some(entry) => KeyInfo {
                has_allowed_types: entry.has_allowed_types(),
                allowed_types: entry.allowed_types.clone(),
                live: entry.live,
                has_default: entry.default.is_some(),
                has_description: entry.description.is_some(),
                hidden: entry.hidden,
            },
            None => KeyInfo::default(),
        }
    }
}

/// Builder for [`Schema`] that rejects duplicate keys.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    entries: Vec<SchemaEntry>,
    obsolete: Vec<String>,
}

impl SchemaBuilder {
    /// Add a parameter definition.
    pub fn param(mut self, entry: SchemaEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Add a key to remove from the params file on load.
    pub fn obsolete(mut self, key: impl Into<String>) -> Self {
        self.obsolete.push(key.into());
        self
    }

    /// Finish the schema.
    ///
    /// Fails with [`Error::DuplicateKey`] if two entries share a key, and
    /// with [`Error::InvalidInput`] if a key is both defined and obsolete.
    pub fn build(self) -> Result<Schema> {
        let mut entries = BTreeMap::new();
        for entry in self.entries {
            if entries.contains_key(&entry.key) {
                return Err(Error::DuplicateKey(entry.key));
            }
            entries.insert(entry.key.clone(), entry);
        }

        if let Some(key) = self.obsolete.iter().find(|k| entries.contains_key(*k)) {
            return Err(Error::InvalidInput(format!(
                "{} is both defined and marked obsolete",
                key
            )));
        }

        Ok(Schema {
            entries,
            obsolete: self.obsolete,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builtin_contents() {
        let schema = Schema::builtin();
        assert_eq!(schema.len(), 3);

        let offset = schema.lookup("camera_offset").unwrap();
        assert_eq!(offset.default, Some(json!(0.06)));
        assert!(offset.live);
        assert_eq!(offset.allowed_types, vec![ValueKind::Number]);

        assert!(schema.lookup("op_edit_live_mode").unwrap().hidden);
        assert_eq!(schema.obsolete_keys(), ["old_key_to_delete"]);
    }

    #[test]
    fn test_defaults_snapshot() {
        let schema = Schema::builtin();
        let defaults = schema.defaults_snapshot();

        assert_eq!(defaults.len(), 3);
        assert_eq!(defaults["camera_offset"], json!(0.06));
        assert_eq!(defaults["non_live_param"], json!(false));
        assert_eq!(defaults["op_edit_live_mode"], json!(false));
    }

    #[test]
    fn test_defaults_snapshot_skips_entries_without_default() {
        let schema = Schema::builder()
            .param(SchemaEntry::new("a", 1))
            .param(SchemaEntry::without_default("b"))
            .build()
            .unwrap();

        let defaults = schema.defaults_snapshot();
        assert!(defaults.contains_key("a"));
        assert!(!defaults.contains_key("b"));
    }

    #[test]
    fn test_lookup_unknown() {
        assert!(Schema::builtin().lookup("nope").is_none());
    }

    #[test]
    fn test_key_info_known() {
        let info = Schema::builtin().key_info("camera_offset");
        assert!(info.has_allowed_types);
        assert_eq!(info.allowed_types, vec![ValueKind::Number]);
        assert!(info.live);
        assert!(info.has_default);
        assert!(info.has_description);
        assert!(!info.hidden);
    }

    #[test]
    fn test_key_info_unknown_is_all_false() {
        assert_eq!(Schema::builtin().key_info("missing"), KeyInfo::default());
    }

    #[test]
    fn test_key_info_empty_allowed_types() {
        let schema = Schema::builder()
            .param(SchemaEntry::new("x", 1).allow(&[]))
            .build()
            .unwrap();
        assert!(!schema.key_info("x").has_allowed_types);
    }

    #[test]
    fn test_builder_rejects_duplicates() {
        let result = Schema::builder()
            .param(SchemaEntry::new("dup", 1))
            .param(SchemaEntry::new("dup", 2))
            .build();
        assert!(matches!(result, Err(Error::DuplicateKey(k)) if k == "dup"));
    }

    #[test]
    fn test_builder_rejects_defined_obsolete_key() {
        let result = Schema::builder()
            .param(SchemaEntry::new("k", 1))
            .obsolete("k")
            .build();
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_entry_accepts() {
        let entry = SchemaEntry::new("k", 1).allow(&[ValueKind::Number, ValueKind::Null]);
        assert!(entry.accepts(&json!(2.5)));
        assert!(entry.accepts(&json!(null)));
        assert!(!entry.accepts(&json!("2.5")));

        let open = SchemaEntry::new("k", 1);
        assert!(open.accepts(&json!({"any": "thing"})));
    }
}
