//! Data file plumbing for catalog and config files.
//!
//! A data file is `{base}.ron`, `{base}.toml` or `{base}.json`. This module
//! finds it, parses it, and provides the id checks the catalog runs while
//! resolving cross-references.

use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use tycoon_core::resource::ResourceKind;

// ===========================================================================
// Errors
// ===========================================================================

/// The kind of catalog entry an id names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Resource,
    Machine,
    Technology,
    Achievement,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntryKind::Resource => "resource",
            EntryKind::Machine => "machine",
            EntryKind::Technology => "technology",
            EntryKind::Achievement => "achievement",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    #[error("no {base_name}.ron, {base_name}.toml or {base_name}.json in {dir}")]
    NotFound { base_name: String, dir: PathBuf },

    #[error("{file} is not a .ron, .toml or .json data file")]
    UnsupportedFormat { file: PathBuf },

    /// The same data is defined twice under different extensions.
    #[error("{first} and {second} define the same data; remove one")]
    ConflictingFormats { first: PathBuf, second: PathBuf },

    #[error("could not parse {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// An id refers to an entry the catalog does not define.
    #[error("{file}: unknown {entry} '{id}'")]
    UnknownEntry {
        file: PathBuf,
        entry: EntryKind,
        id: String,
    },

    #[error("{file}: {entry} '{id}' is defined more than once")]
    DuplicateEntry {
        file: PathBuf,
        entry: EntryKind,
        id: String,
    },

    /// Well-formed but unusable content, such as a negative price.
    #[error("{file}: {detail}")]
    Invalid { file: PathBuf, detail: String },

    #[error("could not read data file: {0}")]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Formats and discovery
// ===========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    /// Lookup order when several extensions are possible.
    pub const ALL: [Format; 3] = [Format::Ron, Format::Toml, Format::Json];

    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }

    /// The format a file's extension names.
    pub fn of(path: &Path) -> Result<Self, DataLoadError> {
        let ext = path.extension().and_then(|e| e.to_str());
        Self::ALL
            .into_iter()
            .find(|format| Some(format.extension()) == ext)
            .ok_or_else(|| DataLoadError::UnsupportedFormat {
                file: path.to_path_buf(),
            })
    }
}

/// The single `{base_name}.*` file in `dir`, if any. Two files with the same
/// base name are a conflict.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut present = Format::ALL
        .into_iter()
        .map(|format| dir.join(format!("{base_name}.{}", format.extension())))
        .filter(|path| path.exists());

    let Some(first) = present.next() else {
        return Ok(None);
    };
    match present.next() {
        Some(second) => Err(DataLoadError::ConflictingFormats { first, second }),
        None => Ok(Some(first)),
    }
}

pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::NotFound {
        base_name: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Parsing
// ===========================================================================

/// Parse in-memory content. `origin` only appears in error messages.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    origin: &Path,
) -> Result<T, DataLoadError> {
    let parsed = match format {
        Format::Ron => ron::from_str(content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        Format::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|detail| DataLoadError::Parse {
        file: origin.to_path_buf(),
        detail,
    })
}

pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = Format::of(path)?;
    let content = std::fs::read_to_string(path)?;
    tracing::debug!(file = %path.display(), ?format, "reading data file");
    deserialize_str(&content, format, path)
}

// ===========================================================================
// Id checks
// ===========================================================================

/// Ids already declared in a catalog file, per entry kind.
#[derive(Debug)]
pub struct DeclaredIds<'a> {
    entry: EntryKind,
    file: &'a Path,
    ids: HashSet<String>,
}

impl<'a> DeclaredIds<'a> {
    pub fn new(entry: EntryKind, file: &'a Path) -> Self {
        Self {
            entry,
            file,
            ids: HashSet::new(),
        }
    }

    /// Record a new id. Declaring one twice is an error.
    pub fn declare(&mut self, id: &str) -> Result<(), DataLoadError> {
        if self.ids.insert(id.to_string()) {
            return Ok(());
        }
        Err(DataLoadError::DuplicateEntry {
            file: self.file.to_path_buf(),
            entry: self.entry,
            id: id.to_string(),
        })
    }

    /// Check that `id` was declared earlier.
    pub fn require(&self, id: &str) -> Result<(), DataLoadError> {
        if self.ids.contains(id) {
            return Ok(());
        }
        Err(unknown(self.entry, id, self.file))
    }
}

pub fn unknown(entry: EntryKind, id: &str, file: &Path) -> DataLoadError {
    DataLoadError::UnknownEntry {
        file: file.to_path_buf(),
        entry,
        id: id.to_string(),
    }
}

/// Resource names use the save-file spelling (`quantumChip`).
pub fn resolve_resource(name: &str, file: &Path) -> Result<ResourceKind, DataLoadError> {
    name.parse()
        .map_err(|_| unknown(EntryKind::Resource, name, file))
}

// ===========================================================================
// Tests
// ===========================================================================
