//! Store configuration.
//!
//! [`StoreConfig`] replaces process-wide globals: every store is constructed
//! with an explicit path, refresh interval and persistence mode.
//!
//! ## Precedence
//!
//! For every setting: CLI flag > environment variable > built-in default.
//!
//! Use the [`resolver`] module for precedence resolution with source tracking.

pub mod resolver;

pub use resolver::{
    ATOMIC_ENV, CI_ENV, ConfigOverrides, FILE_ENV, NO_PERSIST_ENV, REFRESH_MS_ENV, Resolved,
    ResolvedConfig, SCHEMA_ENV, TRAVIS_ENV, ValueSource, resolve_config, resolve_config_with,
};

use std::path::PathBuf;
use std::time::Duration;

/// Location of the params file when nothing else is configured.
pub const DEFAULT_PARAMS_PATH: &str = "/data/op_params.json";

/// Minimum time between two disk reads triggered by live parameters.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Pause before retrying a failed read, to let a concurrent writer finish.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(10);

/// Permissions applied to the params file after every write (Unix:
/// owner/group read-write, world read-only).
#[cfg(unix)]
pub const PARAMS_FILE_MODE: u32 = 0o664;

/// Configuration for a [`ParamStore`](crate::ParamStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path of the JSON params file
    pub path: PathBuf,

    /// Minimum time between throttled re-reads of live parameters
    pub refresh_interval: Duration,

    /// Pause before the single retry of a failed read
    pub retry_delay: Duration,

    /// When false the store never touches disk (sandbox/test mode)
    pub persistence_enabled: bool,

    /// Overwrite every schema key with its default on load, instead of only
    /// filling in missing keys
    pub force_update_on_load: bool,

    /// Write through a temporary file and rename it over the target
    pub atomic_writes: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_PARAMS_PATH),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            retry_delay: DEFAULT_RETRY_DELAY,
            persistence_enabled: true,
            force_update_on_load: false,
            atomic_writes: false,
        }
    }
}

impl StoreConfig {
    /// Default config for a params file at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Config for a store that lives only in memory.
    pub fn in_memory() -> Self {
        Self {
            persistence_enabled: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.path, PathBuf::from("/data/op_params.json"));
        assert_eq!(config.refresh_interval, Duration::from_secs(5));
        assert_eq!(config.retry_delay, Duration::from_millis(10));
        assert!(config.persistence_enabled);
        assert!(!config.force_update_on_load);
        assert!(!config.atomic_writes);
    }

    #[test]
    fn test_at_keeps_defaults() {
        let config = StoreConfig::at("/tmp/params.json");
        assert_eq!(config.path, PathBuf::from("/tmp/params.json"));
        assert_eq!(config.refresh_interval, DEFAULT_REFRESH_INTERVAL);
    }

    #[test]
    fn test_in_memory() {
        assert!(!StoreConfig::in_memory().persistence_enabled);
    }

    #[cfg(unix)]
    #[test]
    fn test_file_mode_not_world_writable() {
        assert_eq!(PARAMS_FILE_MODE, 0o664);
        assert_eq!(PARAMS_FILE_MODE & 0o002, 0);
    }
}
