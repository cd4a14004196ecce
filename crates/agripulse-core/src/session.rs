//! Session-marker persistence.
//!
//! The only state AgriPulse keeps between views is a handful of boolean
//! flags keyed by name (today just "splash already shown"). Stores are
//! injected so the lifetime of a flag is decided by the composition root.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{AgriPulseError, Result};

/// Boolean flags keyed by name.
pub trait SessionStore: Send + Sync {
    /// Read a flag. `Ok(None)` means the flag was never written.
    fn get(&self, key: &str) -> Result<Option<bool>>;

    /// Write a flag.
    fn set(&self, key: &str, value: bool) -> Result<()>;
}

/// In-memory store; flags live as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    flags: Mutex<BTreeMap<String, bool>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<bool>> {
        let flags = self
            .flags
            .lock()
            .map_err(|e| AgriPulseError::Session(format!("flag lock poisoned: {}", e)))?;
        Ok(flags.get(key).copied())
    }

    fn set(&self, key: &str, value: bool) -> Result<()> {
        let mut flags = self
            .flags
            .lock()
            .map_err(|e| AgriPulseError::Session(format!("flag lock poisoned: {}", e)))?;
        flags.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store backed by a small JSON object on disk.
///
/// The file is re-read on every `get` and rewritten on every `set`; a
/// missing file reads as empty.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, bool>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<bool>> {
        Ok(self.read_all()?.get(key).copied())
    }

    fn set(&self, key: &str, value: bool) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| AgriPulseError::Session(format!("write lock poisoned: {}", e)))?;
        let mut flags = self.read_all()?;
        flags.insert(key.to_string(), value);
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&flags)?)?;
        tracing::debug!(key, value, path = %self.path.display(), "Session flag written");
        Ok(())
    }
}
