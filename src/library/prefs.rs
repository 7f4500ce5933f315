//! Preference storage for the library membership set.
//!
//! The store holds raw strings; encoding the values is the caller's job.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::warn;

use crate::cache::write_atomic;
use crate::error::Result;

/// Key/value string storage injected into `MembershipSet`.
pub trait PreferenceStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Write `value` under `key`. Visible to `get` once this returns.
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Make previous writes durable.
    fn flush(&self) -> Result<()>;
}

/// Process-local preferences; nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Preferences kept as one JSON object of strings in a file.
///
/// Writes land in memory; `flush` replaces the file atomically.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl FilePreferences {
    /// Load preferences from `path`. Starts empty on any I/O or parse error.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!("Ignoring malformed preferences {}: {}", path.display(), e);
                HashMap::new()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!("Ignoring unreadable preferences {}: {}", path.display(), e);
                HashMap::new()
            }
        };
        Self {
            path,
            values: RwLock::new(values),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.values.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&*self.values.read())?;
        write_atomic(&self.path, content.as_bytes())
    }
}
