//! opparams - a shared, file-backed parameter store.
//!
//! A long-running control process reads tunable constants through
//! [`ParamStore`] while an independent editor (the `opedit` binary, or any
//! other collaborator) changes the same JSON document on disk. Live
//! parameters are re-read at most once per refresh interval; values of the
//! wrong type degrade to the schema default instead of failing.
//!
//! ```no_run
//! use opparams::{ParamStore, Schema, StoreConfig};
//!
//! let mut store = ParamStore::open(Schema::builtin(), StoreConfig::default());
//! let offset = store.get_f64("camera_offset").unwrap_or(0.06);
//! # let _ = offset;
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod edit;
pub mod persist;
pub mod schema;
pub mod store;
pub mod value;

pub use config::StoreConfig;
pub use persist::{ParamsFile, ReadOutcome};
pub use schema::{KeyInfo, Schema, SchemaBuilder, SchemaEntry};
pub use store::{ParamStore, Refresh, StoreStats};
pub use value::{Snapshot, Value, ValueKind};

/// Test utilities for isolated test environments.
#[cfg(test)]
pub(crate) mod test_utils {
    use std::path::{Path, PathBuf};
    use std::time::Duration;
    use tempfile::TempDir;

    use crate::config::StoreConfig;

    /// Test environment with an isolated params directory.
    pub struct TestEnv {
        /// Directory holding the params file
        pub data_dir: TempDir,
    }

    impl TestEnv {
        pub fn new() -> Self {
            Self {
                data_dir: TempDir::new().unwrap(),
            }
        }

        /// Path of the params file inside the data directory.
        pub fn params_path(&self) -> PathBuf {
            self.data_dir.path().join("op_params.json")
        }

        pub fn data_path(&self) -> &Path {
            self.data_dir.path()
        }

        /// Store config pointing at this environment, with a short retry delay.
        pub fn config(&self) -> StoreConfig {
            StoreConfig {
                path: self.params_path(),
                retry_delay: Duration::from_millis(1),
                ..StoreConfig::default()
            }
        }

        /// Write raw content to the params file.
        pub fn write_raw(&self, content: &str) {
            std::fs::write(self.params_path(), content).unwrap();
        }

        /// Read the params file as a JSON object.
        pub fn read_json(&self) -> serde_json::Map<String, serde_json::Value> {
            let content = std::fs::read_to_string(self.params_path()).unwrap();
            serde_json::from_str(&content).unwrap()
        }
    }

    impl Default for TestEnv {
        fn default() -> Self {
            Self::new()
        }
    }
}

/// Library-level error type for parameter store operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema error: {0}")]
    Kdl(String),

    #[error("Parameter not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Duplicate parameter definition: {0}")]
    DuplicateKey(String),

    #[error("Type {found} is not allowed for {key} (allowed: {allowed})")]
    TypeNotAllowed {
        key: String,
        found: ValueKind,
        allowed: String,
    },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for parameter store operations.
pub type Result<T> = std::result::Result<T, Error>;
