//! Precedence resolution for store configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables
//! 3. Built-in defaults
//!
//! ## Environment
//!
//! - `OPPARAMS_FILE` - params file path
//! - `OPPARAMS_REFRESH_MS` - refresh interval in milliseconds
//! - `OPPARAMS_NO_PERSIST` - truthy disables persistence
//! - `CI` / `TRAVIS` - truthy disables persistence (sandboxed runs)
//! - `OPPARAMS_ATOMIC` - truthy enables atomic writes
//! - `OPPARAMS_SCHEMA` - KDL schema file

use crate::config::StoreConfig;
use crate::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

pub const FILE_ENV: &str = "OPPARAMS_FILE";
pub const REFRESH_MS_ENV: &str = "OPPARAMS_REFRESH_MS";
pub const NO_PERSIST_ENV: &str = "OPPARAMS_NO_PERSIST";
pub const ATOMIC_ENV: &str = "OPPARAMS_ATOMIC";
pub const SCHEMA_ENV: &str = "OPPARAMS_SCHEMA";
pub const CI_ENV: &str = "CI";
pub const TRAVIS_ENV: &str = "TRAVIS";

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from environment variable
    EnvVar(String),
    /// Value from CLI flag
    CliFlag,
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Params file path from CLI flag
    pub path: Option<PathBuf>,
    /// Refresh interval from CLI flag
    pub refresh_interval: Option<Duration>,
    /// `--no-persist` flag
    pub no_persist: bool,
    /// `--atomic` flag
    pub atomic_writes: bool,
    /// Schema file from CLI flag
    pub schema_path: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set params file override.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set refresh interval override.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    /// Disable persistence.
    pub fn with_no_persist(mut self) -> Self {
        self.no_persist = true;
        self
    }

    /// Set schema file override.
    pub fn with_schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = Some(path.into());
        self
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub path: Resolved<PathBuf>,
    pub refresh_interval: Resolved<Duration>,
    pub persistence_enabled: Resolved<bool>,
    pub atomic_writes: Resolved<bool>,
    /// Schema file, if any; `None` means the built-in schema
    pub schema_path: Option<Resolved<PathBuf>>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        let defaults = StoreConfig::default();
        Self {
            path: Resolved::new(defaults.path, ValueSource::Default),
            refresh_interval: Resolved::new(defaults.refresh_interval, ValueSource::Default),
            persistence_enabled: Resolved::new(true, ValueSource::Default),
            atomic_writes: Resolved::new(false, ValueSource::Default),
            schema_path: None,
        }
    }
}

impl ResolvedConfig {
    /// Build the store config described by the resolved values.
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            path: self.path.value.clone(),
            refresh_interval: self.refresh_interval.value,
            persistence_enabled: self.persistence_enabled.value,
            atomic_writes: self.atomic_writes.value,
            ..StoreConfig::default()
        }
    }

    /// Get the schema file path, if set.
    pub fn schema_path(&self) -> Option<&PathBuf> {
        self.schema_path.as_ref().map(|r| &r.value)
    }
}

/// Interpret an environment flag value.
fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Resolve configuration from CLI overrides and the process environment.
pub fn resolve_config(overrides: &ConfigOverrides) -> Result<ResolvedConfig> {
    resolve_config_with(overrides, |name| std::env::var(name).ok())
}

/// Resolve configuration using `env` to look up environment variables.
///
/// Empty environment values are treated as unset.
pub fn resolve_config_with<F>(overrides: &ConfigOverrides, env: F) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());
    let mut result = ResolvedConfig::default();

    // Resolve path
    if let Some(ref path) = overrides.path {
        result.path = Resolved::new(path.clone(), ValueSource::CliFlag);
    } else if let Some(path) = env(FILE_ENV) {
        result.path = Resolved::new(PathBuf::from(path), ValueSource::EnvVar(FILE_ENV.to_string()));
    }

    // Resolve refresh interval
    if let Some(interval) = overrides.refresh_interval {
        result.refresh_interval = Resolved::new(interval, ValueSource::CliFlag);
    } else if let Some(raw) = env(REFRESH_MS_ENV) {
        let millis: u64 = raw.trim().parse().map_err(|_| {
            Error::InvalidInput(format!(
                "{} must be a whole number of milliseconds, got '{}'",
                REFRESH_MS_ENV, raw
            ))
        })?;
        result.refresh_interval = Resolved::new(
            Duration::from_millis(millis),
            ValueSource::EnvVar(REFRESH_MS_ENV.to_string()),
        );
    }

    // Resolve persistence
    if overrides.no_persist {
        result.persistence_enabled = Resolved::new(false, ValueSource::CliFlag);
    } else if let Some(name) = [NO_PERSIST_ENV, CI_ENV, TRAVIS_ENV]
        .into_iter()
        .find(|name: &&str| env(*name).is_some_and(|v| is_truthy(&v)))
    {
        result.persistence_enabled = Resolved::new(false, ValueSource::EnvVar(name.to_string()));
    }

    // Resolve atomic writes
    if overrides.atomic_writes {
        result.atomic_writes = Resolved::new(true, ValueSource::CliFlag);
    } else if let Some(raw) = env(ATOMIC_ENV) {
        result.atomic_writes =
            Resolved::new(is_truthy(&raw), ValueSource::EnvVar(ATOMIC_ENV.to_string()));
    }

    // Resolve schema path
    if let Some(ref path) = overrides.schema_path {
        result.schema_path = Some(Resolved::new(path.clone(), ValueSource::CliFlag));
    } else if let Some(path) = env(SCHEMA_ENV) {
        result.schema_path = Some(Resolved::new(
            PathBuf::from(path),
            ValueSource::EnvVar(SCHEMA_ENV.to_string()),
        ));
    }

    Ok(result)
}
