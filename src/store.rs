//! Persistent key-value store for the user's language preference.
//!
//! The engine only needs `get`/`set` over strings. Hosts supply whatever
//! backing they have (browser storage, app settings, a config service);
//! [`MemoryStore`] and [`FileStore`] cover tests and simple desktop hosts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::warn;

/// Opaque get/set string store.
///
/// `set` is infallible from the engine's point of view; implementations that
/// can fail should log and swallow the error, leaving the stored value as it
/// was.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// In-memory store, useful for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

/// Store backed by a small JSON map on disk.
///
/// The whole map is rewritten on every `set`; preference writes are rare
/// enough that this is fine.
pub struct FileStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open (or create on first write) the store at `path`.
    ///
    /// A missing file yields an empty store; an unreadable or malformed file
    /// is an error so a corrupted preference file is noticed rather than
    /// silently reset.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let values = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read preference store at {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| {
                format!("Preference store at {} is not a JSON map", path.display())
            })?
        } else {
            HashMap::new()
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    fn flush(&self, values: &HashMap<String, String>) -> Result<()> {
        let raw = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write preference store at {}", self.path.display()))
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.values.lock().unwrap();
        values.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&values) {
            warn!("Preference write failed: {e:#}");
        }
    }
}
