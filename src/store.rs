//! The parameter store.
//!
//! [`ParamStore`] owns the in-memory snapshot of the params file. It is
//! constructed once per process and loads at construction:
//!
//! 1. Seed the snapshot with the schema defaults (guards against a corrupt file).
//! 2. If the file exists, read it. A failed read keeps the defaults and
//!    leaves the broken file untouched for inspection. A successful read is
//!    merged with the defaults (missing keys added, or every key reset when
//!    `force_update_on_load` is set) and obsolete keys are dropped.
//! 3. If the file is missing (first run) or the merge changed anything,
//!    write the snapshot back.
//!
//! Reads of live parameters re-read the file at most once per
//! `refresh_interval`; a forced refresh bypasses the interval. Values whose
//! type is outside the schema's `allowed_types` degrade to the default, then
//! to a zero value, and never surface as errors.
//!
//! The store is single-threaded: every refreshing call takes `&mut self`.
//! Other processes may edit the same file at any time without locking, so a
//! reader can observe a stale value for up to one refresh interval.

use crate::Result;
use crate::config::StoreConfig;
use crate::persist::{ParamsFile, ReadOutcome};
use crate::schema::{KeyInfo, Schema};
use crate::value::{Snapshot, Value, ValueKind, zero_value};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Whether a read may go to disk first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Refresh {
    /// Re-read only for live parameters, at most once per refresh interval
    #[default]
    Auto,
    /// Always re-read before answering
    Force,
}

/// Counters describing the store's disk activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Read attempts, including retries
    pub reads: u64,
    /// Read attempts that fell back to defaults
    pub failed_reads: u64,
    /// Write attempts that reached the disk layer
    pub writes: u64,
    pub failed_writes: u64,
    /// Wall-clock time of the last refresh from disk
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_refresh_at: Option<DateTime<Utc>>,
}

/// File-backed parameter store with schema defaults and live reload.
#[derive(Debug)]
pub struct ParamStore {
    schema: Schema,
    config: StoreConfig,
    file: ParamsFile,
    snapshot: Snapshot,
    last_refresh: Instant,
    stats: StoreStats,
}

impl ParamStore {
    /// Create a store and load the params file.
    ///
    /// Never fails: unreadable or unwritable files are logged and the store
    /// serves defaults.
    pub fn open(schema: Schema, config: StoreConfig) -> Self {
        let file = ParamsFile::new(&config);
        let mut store = Self {
            schema,
            config,
            file,
            snapshot: Snapshot::new(),
            last_refresh: Instant::now(),
            stats: StoreStats::default(),
        };
        store.load();
        store
    }

    /// Re-run the load and migration against the current file.
    pub fn reload(&mut self) {
        self.load();
    }

    fn load(&mut self) {
        self.snapshot = self.schema.defaults_snapshot();
        if !self.file.is_enabled() {
            return;
        }

        let mut dirty = false;
        if self.file.exists() {
            let defaults = self.snapshot.clone();
            let outcome = self.read_file(&defaults);
            if outcome.ok {
                self.snapshot = outcome.snapshot;
                dirty |= self.merge_defaults();
                dirty |= self.remove_obsolete();
            } else {
                // Leave the broken file alone so it can be inspected
                error!(
                    path = %self.file.path().display(),
                    "params file is unreadable, serving defaults without rewriting it"
                );
            }
        } else {
            debug!(path = %self.file.path().display(), "no params file yet, writing defaults");
            dirty = true;
        }

        if dirty {
            self.persist();
        }
    }

    /// Add missing defaults, or reset every schema key when
    /// `force_update_on_load` is set. Returns whether anything changed.
    fn merge_defaults(&mut self) -> bool {
        let mut changed = false;
        for entry in self.schema.entries() {
            let Some(default) = &entry.default else {
                continue;
            };
            let replace = match self.snapshot.get(&entry.key) {
                None => true,
                Some(current) => self.config.force_update_on_load && current != default,
            };
            if replace {
                self.snapshot.insert(entry.key.clone(), default.clone());
                changed = true;
            }
        }
        changed
    }

    /// Drop obsolete keys. Returns whether anything changed.
    fn remove_obsolete(&mut self) -> bool {
        let mut changed = false;
        for key in self.schema.obsolete_keys() {
            if self.snapshot.remove(key).is_some() {
                debug!(key = %key, "removed obsolete parameter");
                changed = true;
            }
        }
        changed
    }

    /// Get a parameter, re-reading the file first if it is live and the
    /// refresh interval has passed.
    ///
    /// Returns `None` for keys missing from the snapshot.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.get_with(key, Refresh::Auto)
    }

    /// Get a parameter with an explicit refresh policy.
    pub fn get_with(&mut self, key: &str, refresh: Refresh) -> Option<Value> {
        self.maybe_refresh(Some(key), refresh);
        let value = self.snapshot.get(key)?;
        Some(self.validated(key, value))
    }

    /// Get a parameter, or `default` if the key is missing.
    pub fn get_or(&mut self, key: &str, default: impl Into<Value>) -> Value {
        self.get(key).unwrap_or_else(|| default.into())
    }

    pub fn get_f64(&mut self, key: &str) -> Option<f64> {
        self.get(key)?.as_f64()
    }

    pub fn get_i64(&mut self, key: &str) -> Option<i64> {
        self.get(key)?.as_i64()
    }

    pub fn get_bool(&mut self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    pub fn get_string(&mut self, key: &str) -> Option<String> {
        self.get(key)?.as_str().map(String::from)
    }

    /// Get every parameter whose schema entry is not hidden.
    ///
    /// Only a forced refresh re-reads the file here.
    pub fn get_all(&mut self, refresh: Refresh) -> Snapshot {
        self.maybe_refresh(None, refresh);
        self.snapshot
            .iter()
            .filter(|(key, _)| !self.schema.key_info(key).hidden)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Apply the schema's allowed-type check to a stored value.
    fn validated(&self, key: &str, value: &Value) -> Value {
        let Some(entry) = self.schema.lookup(key) else {
            return value.clone();
        };
        if entry.accepts(value) {
            return value.clone();
        }

        warn!(
            key = %key,
            found = %ValueKind::of(value),
            "stored value has a type outside allowed_types, using fallback"
        );
        match &entry.default {
            Some(default) if entry.accepts(default) => default.clone(),
            _ => zero_value(&entry.allowed_types),
        }
    }

    /// Re-read the file if the refresh policy allows it.
    ///
    /// Returns whether a read happened.
    fn maybe_refresh(&mut self, key: Option<&str>, refresh: Refresh) -> bool {
        let forced = refresh == Refresh::Force;
        let live = key.is_some_and(|k| self.schema.key_info(k).live);
        if !(forced || live) || !self.file.is_enabled() {
            return false;
        }
        if !forced && self.last_refresh.elapsed() < self.config.refresh_interval {
            return false;
        }

        let defaults = self.schema.defaults_snapshot();
        let mut outcome = self.read_file(&defaults);
        if !outcome.ok {
            // The editor may be mid-write; give it a moment and retry once
            warn!(
                delay_ms = self.config.retry_delay.as_millis() as u64,
                "params read failed, retrying"
            );
            std::thread::sleep(self.config.retry_delay);
            outcome = self.read_file(&defaults);
        }

        self.snapshot = outcome.snapshot;
        self.last_refresh = Instant::now();
        self.stats.last_refresh_at = Some(Utc::now());
        true
    }

    fn read_file(&mut self, defaults: &Snapshot) -> ReadOutcome {
        let outcome = self.file.read(defaults);
        self.stats.reads += 1;
        if !outcome.ok {
            self.stats.failed_reads += 1;
        }
        outcome
    }

    /// Set a parameter and write the file. No type validation is applied.
    ///
    /// Write failures are logged; use [`try_put`](Self::try_put) to observe them.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if let Err(e) = self.try_put(key.clone(), value) {
            error!(key = %key, error = %e, "failed to persist parameter");
        }
    }

    /// Set a parameter and write the file, returning the write result.
    ///
    /// The in-memory value is updated even when the write fails.
    pub fn try_put(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        self.snapshot.insert(key.into(), value.into());
        self.write()
    }

    /// Remove a parameter and write the file.
    ///
    /// Returns whether the key was present; absent keys are a no-op.
    pub fn delete(&mut self, key: &str) -> bool {
        match self.try_delete(key) {
            Ok(removed) => removed,
            Err(e) => {
                error!(key = %key, error = %e, "failed to persist deletion");
                true
            }
        }
    }

    /// Remove a parameter and write the file, returning the write result.
    pub fn try_delete(&mut self, key: &str) -> Result<bool> {
        if self.snapshot.remove(key).is_none() {
            return Ok(false);
        }
        self.write()?;
        Ok(true)
    }

    fn persist(&mut self) {
        if let Err(e) = self.write() {
            error!(path = %self.file.path().display(), error = %e, "failed to write params file");
        }
    }

    fn write(&mut self) -> Result<()> {
        if !self.file.is_enabled() {
            return Ok(());
        }
        self.stats.writes += 1;
        let result = self.file.write(&self.snapshot);
        if result.is_err() {
            self.stats.failed_writes += 1;
        }
        result
    }

    /// Introspection flags for `key` from the schema.
    pub fn key_info(&self, key: &str) -> KeyInfo {
        self.schema.key_info(key)
    }

    /// Read-only access to the parameter definitions.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Current snapshot, without refreshing or validation.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }
}
