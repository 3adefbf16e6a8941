//! Common test utilities for opedit integration tests.
//!
//! Provides `TestEnv` for isolated test environments that never touch
//! `/data/op_params.json`.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// A test environment with an isolated params file.
///
/// The `opedit()` method returns a `Command` that sets `OPPARAMS_FILE`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub data_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with an isolated directory.
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the opedit binary bound to this environment.
    ///
    /// CI markers are cleared so persistence stays enabled.
    pub fn opedit(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_opedit"));
        cmd.current_dir(self.data_dir.path());
        cmd.env("OPPARAMS_FILE", self.params_path());
        cmd.env_remove("OPPARAMS_SCHEMA");
        cmd.env_remove("OPPARAMS_NO_PERSIST");
        cmd.env_remove("OPPARAMS_REFRESH_MS");
        cmd.env_remove("OPPARAMS_ATOMIC");
        cmd.env_remove("CI");
        cmd.env_remove("TRAVIS");
        cmd
    }

    pub fn data_path(&self) -> &Path {
        self.data_dir.path()
    }

    pub fn params_path(&self) -> PathBuf {
        self.data_dir.path().join("op_params.json")
    }

    /// Write raw content to the params file.
    pub fn write_params(&self, content: &str) {
        std::fs::write(self.params_path(), content).expect("Failed to write params file");
    }

    /// Read the params file as a JSON object.
    pub fn read_params(&self) -> serde_json::Map<String, serde_json::Value> {
        let content = std::fs::read_to_string(self.params_path()).expect("Failed to read params");
        serde_json::from_str(&content).expect("Params file is not a JSON object")
    }

    /// Write a KDL schema file and return its path.
    pub fn write_schema(&self, content: &str) -> PathBuf {
        let path = self.data_dir.path().join("schema.kdl");
        std::fs::write(&path, content).expect("Failed to write schema file");
        path
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a command's stdout as JSON.
pub fn parse_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).expect("stdout is not valid JSON")
}
