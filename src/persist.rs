//! Persisted store adapter: the single JSON document on disk.
//!
//! The file is rewritten in full on every write, as a pretty-printed JSON
//! object with sorted keys so diffs are reproducible. Reads never fail:
//! any I/O or parse problem is logged and the caller's defaults are handed
//! back with `ok = false`.
//!
//! Writes overwrite the file in place unless `atomic_writes` is set, in
//! which case the document goes to a temporary file in the same directory
//! that is then renamed over the target. In-place writes leave a window in
//! which a concurrent reader can see a truncated document; the store's
//! retry-once read policy covers that case.

use crate::Result;
use crate::config::StoreConfig;
use crate::value::{Snapshot, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Result of reading the params file.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome {
    /// Parsed document, or the caller's defaults when `ok` is false
    pub snapshot: Snapshot,
    /// Whether the file was read and parsed successfully
    pub ok: bool,
}

/// Handle on the params file.
#[derive(Debug, Clone)]
pub struct ParamsFile {
    path: PathBuf,
    enabled: bool,
    atomic: bool,
}

impl ParamsFile {
    /// Create a handle for the file described by `config`.
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            path: config.path.clone(),
            enabled: config.persistence_enabled,
            atomic: config.atomic_writes,
        }
    }

    /// Get the path to the params file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether writes reach the disk.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Check if the params file exists.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Serialize `snapshot` to the params file.
    ///
    /// Does nothing when persistence is disabled. Creates the parent
    /// directory if needed and restricts permissions after writing.
    ///
    /// # Errors
    /// Returns an IO or JSON error if the document cannot be written.
    pub fn write(&self, snapshot: &Snapshot) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let mut contents = serde_json::to_string_pretty(snapshot)?;
        contents.push('\n');

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        if self.atomic {
            let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
            temp.write_all(contents.as_bytes())?;
            temp.as_file().sync_all()?;
            temp.persist(&self.path).map_err(|e| e.error)?;
        } else {
            let mut file = fs::File::create(&self.path)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
        }

        set_file_mode(&self.path)?;
        debug!(path = %self.path.display(), keys = snapshot.len(), "wrote params file");
        Ok(())
    }

    /// Read and parse the params file.
    ///
    /// On any failure, including a document whose top level is not an
    /// object, logs the error and returns `defaults` with `ok = false`.
    pub fn read(&self, defaults: &Snapshot) -> ReadOutcome {
        match self.try_read() {
            Ok(snapshot) => ReadOutcome { snapshot, ok: true },
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "can't read params file");
                ReadOutcome {
                    snapshot: defaults.clone(),
                    ok: false,
                }
            }
        }
    }

    fn try_read(&self) -> Result<Snapshot> {
        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(crate::Error::InvalidInput(format!(
                "expected a JSON object, found {}",
                crate::value::ValueKind::of(&other)
            ))),
        }
    }
}

#[cfg(unix)]
fn set_file_mode(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(
        path,
        fs::Permissions::from_mode(crate::config::PARAMS_FILE_MODE),
    )?;
    Ok(())
}

#[cfg(not(unix))]
fn set_file_mode(_path: &Path) -> Result<()> {
    Ok(())
}
