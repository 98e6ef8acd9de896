//! JSON-file backed [`KeyValueStore`].
//!
//! The whole map is rewritten on every change:
//! 1. Serialize to a temp file next to the target (PID suffix)
//! 2. fsync the temp file
//! 3. Rename over the target

use super::KeyValueStore;
use crate::{PetstoreError, Result};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, warn};

/// Directory name under the platform config dir.
const APP_DIR_NAME: &str = "petstore-admin";
/// File name of the persisted state.
const STATE_FILE_NAME: &str = "state.json";

/// `<config dir>/petstore-admin/state.json`.
pub fn default_state_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().ok_or_else(|| PetstoreError::Config {
        message: "Could not determine config directory".to_string(),
    })?;
    Ok(config_dir.join(APP_DIR_NAME).join(STATE_FILE_NAME))
}

/// Key/value store persisted as one JSON object.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, loading existing values.
    ///
    /// A missing file is an empty store. An unreadable or corrupt file is
    /// logged and treated as empty, so a damaged file never blocks startup.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match read_values(&path) {
            Ok(values) => values,
            Err(e) => {
                warn!("Ignoring unreadable state file {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Open the store at [`default_state_path`].
    pub fn open_default() -> Result<Self> {
        Self::open(default_state_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        change(&mut values);
        write_values(&self.path, &values)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|values| {
            values.remove(key);
        })
    }
}

fn read_values(path: &Path) -> Result<BTreeMap<String, String>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let contents =
        fs::read_to_string(path).map_err(|e| PetstoreError::io_with_path(e, path))?;
    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    Ok(serde_json::from_str(&contents)?)
}

fn write_values(path: &Path, values: &BTreeMap<String, String>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| PetstoreError::io_with_path(e, parent))?;
        }
    }

    let temp_path = path.with_extension(format!("json.{}.tmp", process::id()));
    let serialized = serde_json::to_string_pretty(values)?;

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| PetstoreError::io_with_path(e, &temp_path))?;
        file.write_all(serialized.as_bytes())
            .map_err(|e| PetstoreError::io_with_path(e, &temp_path))?;
        file.sync_all()
            .map_err(|e| PetstoreError::io_with_path(e, &temp_path))?;
    }

    // Session tokens live here.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))
            .map_err(|e| PetstoreError::io_with_path(e, &temp_path))?;
    }

    fs::rename(&temp_path, path).map_err(|e| PetstoreError::io_with_path(e, path))?;
    debug!("Wrote state file {}", path.display());
    Ok(())
}
