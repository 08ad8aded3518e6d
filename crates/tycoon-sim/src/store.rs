//! Durable storage for the single save slot.

use crate::error::PersistError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// One save slot holding a JSON document.
pub trait SaveStore {
    fn write(&mut self, document: &str) -> Result<(), PersistError>;

    /// `Ok(None)` when nothing has been saved yet.
    fn read(&self) -> Result<Option<String>, PersistError>;

    fn clear(&mut self) -> Result<(), PersistError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Keeps the save in memory. An optional quota rejects oversized writes,
/// the way browser storage does.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    slot: Option<String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses documents longer than `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            slot: None,
            quota: Some(bytes),
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.slot.as_deref()
    }
}

impl SaveStore for MemoryStore {
    fn write(&mut self, document: &str) -> Result<(), PersistError> {
        if let Some(quota) = self.quota.filter(|&quota| document.len() > quota) {
            return Err(PersistError::Storage(format!(
                "document is {} bytes, quota is {quota}",
                document.len()
            )));
        }
        self.slot = Some(document.to_string());
        Ok(())
    }

    fn read(&self) -> Result<Option<String>, PersistError> {
        Ok(self.slot.clone())
    }

    fn clear(&mut self) -> Result<(), PersistError> {
        self.slot = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// File store
// ---------------------------------------------------------------------------

/// Keeps the save in a file. Writes go to a sibling temp file that is then
/// renamed over the target, so a failed write never truncates the old save.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SaveStore for FileStore {
    fn write(&mut self, document: &str) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let temp = self.temp_path();
        fs::write(&temp, document)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn read(&self) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&mut self) -> Result<(), PersistError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
