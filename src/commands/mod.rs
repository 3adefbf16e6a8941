//! Command implementations for the opedit CLI.
//!
//! Every command works on an open [`ParamStore`] and returns a result type
//! implementing [`Output`], which `main` prints as JSON or as human text.

use crate::config::ResolvedConfig;
use crate::edit::{self, parse_input, preview};
use crate::schema::{KeyInfo, Schema, SchemaEntry, kdl::load_schema_from_file};
use crate::store::{ParamStore, Refresh};
use crate::value::{Value, ValueKind};
use crate::{Error, Result};
use serde::Serialize;
use std::time::Duration;

/// Command results that can be serialized to JSON or formatted for humans.
pub trait Output {
    /// Serialize to JSON string.
    fn to_json(&self) -> String;

    /// Format for human-readable output.
    fn to_human(&self) -> String;
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
}

/// Open the store described by `resolved`, loading the schema file if one
/// is configured.
pub fn open_store(resolved: &ResolvedConfig) -> Result<ParamStore> {
    let schema = match resolved.schema_path() {
        Some(path) => load_schema_from_file(path)?,
        None => Schema::builtin(),
    };
    Ok(ParamStore::open(schema, resolved.store_config()))
}

// ==================== list ====================

/// One row of `opedit list`.
#[derive(Debug, Serialize)]
pub struct ParamRow {
    pub key: String,
    pub value: Value,
    pub live: bool,
}

#[derive(Debug, Serialize)]
pub struct ParamList {
    pub path: String,
    pub params: Vec<ParamRow>,
}

impl Output for ParamList {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        if self.params.is_empty() {
            return format!("No parameters in {}", self.path);
        }
        let mut lines = vec![format!("Parameters in {}:", self.path), String::new()];
        for (idx, row) in self.params.iter().enumerate() {
            let live = if row.live { "  (live!)" } else { "" };
            lines.push(format!("{}. {}: {}{}", idx + 1, row.key, preview(&row.value), live));
        }
        lines.join("\n")
    }
}

/// List parameters after a forced refresh.
///
/// Hidden parameters are skipped unless `all` is set; `live_only` keeps
/// only live parameters.
pub fn list(store: &mut ParamStore, live_only: bool, all: bool) -> ParamList {
    let snapshot = if all {
        store.get_all(Refresh::Force);
        store.snapshot().clone()
    } else {
        store.get_all(Refresh::Force)
    };

    let params = snapshot
        .into_iter()
        .map(|(key, value)| {
            let live = store.key_info(&key).live;
            ParamRow { key, value, live }
        })
        .filter(|row| !live_only || row.live)
        .collect();

    ParamList {
        path: store.path().display().to_string(),
        params,
    }
}

// ==================== get ====================

#[derive(Debug, Serialize)]
pub struct ParamValue {
    pub key: String,
    pub value: Value,
    #[serde(rename = "type")]
    pub kind: ValueKind,
}

impl Output for ParamValue {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        format!("{}: {} (type: {})", self.key, edit::render(&self.value), self.kind)
    }
}

/// Read one parameter the way a consumer would.
pub fn get(store: &mut ParamStore, key: &str, force: bool) -> Result<ParamValue> {
    let refresh = if force { Refresh::Force } else { Refresh::Auto };
    let value = store
        .get_with(key, refresh)
        .ok_or_else(|| Error::NotFound(key.to_string()))?;
    Ok(ParamValue {
        key: key.to_string(),
        kind: ValueKind::of(&value),
        value,
    })
}

// ==================== set / add ====================

#[derive(Debug, Serialize)]
pub struct SetResult {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    pub new: Value,
    #[serde(rename = "type")]
    pub kind: ValueKind,
}

impl Output for SetResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        if let Some(ref old) = self.old {
            lines.push(format!(
                "Old value: {} (type: {})",
                edit::render(old),
                ValueKind::of(old)
            ));
        }
        lines.push(format!(
            "Saved {} with value: {} (type: {})",
            self.key,
            edit::render(&self.new),
            self.kind
        ));
        lines.join("\n")
    }
}

/// Parse `raw`, check it against the schema and store it.
pub fn set(store: &mut ParamStore, key: &str, raw: &str) -> Result<SetResult> {
    let value = parse_input(raw);
    edit::validate(store.schema(), key, &value)?;
    store_value(store, key, value)
}

/// Parse `raw` and store it without schema validation.
pub fn add(store: &mut ParamStore, key: &str, raw: &str) -> Result<SetResult> {
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::InvalidInput("parameter name can't be empty".to_string()));
    }
    store_value(store, key, parse_input(raw))
}

fn store_value(store: &mut ParamStore, key: &str, value: Value) -> Result<SetResult> {
    let old = store.get_with(key, Refresh::Force);
    store.try_put(key, value.clone())?;
    Ok(SetResult {
        key: key.to_string(),
        old,
        kind: ValueKind::of(&value),
        new: value,
    })
}

// ==================== delete ====================

#[derive(Debug, Serialize)]
pub struct DeleteResult {
    pub key: String,
    pub value: Value,
}

impl Output for DeleteResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        format!("Deleted {} (was: {})", self.key, edit::render(&self.value))
    }
}

/// Delete a parameter; unknown keys are reported as not found.
pub fn delete(store: &mut ParamStore, key: &str) -> Result<DeleteResult> {
    store.get_all(Refresh::Force);
    let value = store
        .snapshot()
        .get(key)
        .cloned()
        .ok_or_else(|| Error::NotFound(key.to_string()))?;
    store.try_delete(key)?;
    Ok(DeleteResult {
        key: key.to_string(),
        value,
    })
}

// ==================== info ====================

#[derive(Debug, Serialize)]
pub struct InfoResult {
    pub key: String,
    pub known: bool,
    #[serde(flatten)]
    pub info: KeyInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Output for InfoResult {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = vec![format!("Parameter: {}", self.key)];
        if !self.known {
            lines.push(">>  Not defined in the schema".to_string());
        }
        if let Some(ref description) = self.description {
            lines.push(format!(
                ">>  Description: {}",
                description.replace('\n', "\n  > ")
            ));
        }
        if self.info.has_allowed_types {
            lines.push(format!(
                ">>  Allowed types: {}",
                crate::value::describe_kinds(&self.info.allowed_types)
            ));
        }
        if self.info.live {
            lines.push(">>  This parameter supports live tuning!".to_string());
        }
        if let Some(ref default) = self.default {
            lines.push(format!("Default value: {}", edit::render(default)));
        }
        match self.value {
            Some(ref value) => lines.push(format!(
                "Current value: {} (type: {})",
                edit::render(value),
                ValueKind::of(value)
            )),
            None => lines.push("Current value: (not set)".to_string()),
        }
        lines.join("\n")
    }
}

/// Describe a parameter: schema flags, help text, default and current value.
pub fn info(store: &mut ParamStore, key: &str) -> InfoResult {
    let value = store.get_with(key, Refresh::Force);
    let entry = store.schema().lookup(key);
    InfoResult {
        key: key.to_string(),
        known: entry.is_some(),
        info: store.key_info(key),
        description: entry.and_then(|e| e.description.clone()),
        default: entry.and_then(|e| e.default.clone()),
        value,
    }
}

// ==================== schema ====================

#[derive(Debug, Serialize)]
pub struct SchemaListing {
    pub params: Vec<SchemaEntry>,
    pub obsolete: Vec<String>,
}

impl Output for SchemaListing {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();
        for entry in &self.params {
            let mut flags = Vec::new();
            if entry.live {
                flags.push("live".to_string());
            }
            if entry.hidden {
                flags.push("hidden".to_string());
            }
            if entry.has_allowed_types() {
                flags.push(crate::value::describe_kinds(&entry.allowed_types));
            }
            let default = entry
                .default
                .as_ref()
                .map(edit::render)
                .unwrap_or_else(|| "-".to_string());
            let flags = if flags.is_empty() {
                String::new()
            } else {
                format!(" [{}]", flags.join("; "))
            };
            lines.push(format!("{} = {}{}", entry.key, default, flags));
            if let Some(ref description) = entry.description {
                lines.push(format!("    {}", description));
            }
        }
        if !self.obsolete.is_empty() {
            lines.push(format!("Obsolete: {}", self.obsolete.join(", ")));
        }
        lines.join("\n")
    }
}

/// List parameter definitions; hidden ones only with `all`.
pub fn schema(store: &ParamStore, all: bool) -> SchemaListing {
    SchemaListing {
        params: store
            .schema()
            .entries()
            .filter(|entry| all || !entry.hidden)
            .cloned()
            .collect(),
        obsolete: store.schema().obsolete_keys().to_vec(),
    }
}

// ==================== watch ====================

/// One observation made by `opedit watch`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WatchEvent {
    pub key: String,
    pub value: Option<Value>,
    pub at: chrono::DateTime<chrono::Utc>,
}

impl Output for WatchEvent {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        let value = self
            .value
            .as_ref()
            .map(edit::render)
            .unwrap_or_else(|| "(not set)".to_string());
        format!("[{}] {} = {}", self.at.format("%H:%M:%S%.3f"), self.key, value)
    }
}

/// Poll `key` every `interval` and report the initial value and each change.
///
/// Live parameters are read through the store's throttled refresh, exactly
/// as a consumer would see them; other parameters are force-refreshed.
/// Stops after `count` events, or never if `count` is `None`.
pub fn watch<F>(
    store: &mut ParamStore,
    key: &str,
    interval: Duration,
    count: Option<usize>,
    mut emit: F,
) -> usize
where
    F: FnMut(&WatchEvent),
{
    let refresh = if store.key_info(key).live {
        Refresh::Auto
    } else {
        Refresh::Force
    };

    let mut emitted = 0;
    let mut last: Option<Option<Value>> = None;
    loop {
        let value = store.get_with(key, refresh);
        if last.as_ref() != Some(&value) {
            emit(&WatchEvent {
                key: key.to_string(),
                value: value.clone(),
                at: chrono::Utc::now(),
            });
            emitted += 1;
            last = Some(value);
        }
        if count.is_some_and(|max| emitted >= max) {
            return emitted;
        }
        std::thread::sleep(interval);
    }
}

// ==================== config ====================

#[derive(Debug, Serialize)]
pub struct SettingRow {
    pub name: &'static str,
    pub value: String,
    pub source: String,
}

#[derive(Debug, Serialize)]
pub struct ConfigShow {
    pub settings: Vec<SettingRow>,
}

impl Output for ConfigShow {
    fn to_json(&self) -> String {
        to_json(self)
    }

    fn to_human(&self) -> String {
        self.settings
            .iter()
            .map(|row| format!("{}: {} ({})", row.name, row.value, row.source))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Report each resolved setting and where it came from.
pub fn config_show(resolved: &ResolvedConfig) -> ConfigShow {
    let mut settings = vec![
        SettingRow {
            name: "file",
            value: resolved.path.value.display().to_string(),
            source: resolved.path.source.to_string(),
        },
        SettingRow {
            name: "refresh_ms",
            value: resolved.refresh_interval.value.as_millis().to_string(),
            source: resolved.refresh_interval.source.to_string(),
        },
        SettingRow {
            name: "persistence",
            value: resolved.persistence_enabled.value.to_string(),
            source: resolved.persistence_enabled.source.to_string(),
        },
        SettingRow {
            name: "atomic_writes",
            value: resolved.atomic_writes.value.to_string(),
            source: resolved.atomic_writes.source.to_string(),
        },
    ];
    settings.push(match resolved.schema_path {
        Some(ref schema) => SettingRow {
            name: "schema",
            value: schema.value.display().to_string(),
            source: schema.source.to_string(),
        },
        None => SettingRow {
            name: "schema",
            value: "builtin".to_string(),
            source: "default".to_string(),
        },
    });
    ConfigShow { settings }
}
