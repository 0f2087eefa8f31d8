//! Named saved indexes.
//!
//! The catalog is one JSON object mapping a user-chosen name to an index
//! document of the same shape the [`IndexStore`](crate::IndexStore) writes:
//!
//! ```json
//! {
//!   "photos": { "directory": "/home/me/photos", "files": [...], "timestamp": "..." },
//!   "work":   { "directory": "/srv/work", "files": [...], "timestamp": "..." }
//! }
//! ```

use crate::error::{Result, TrawlError};
use crate::persistence::write_json_atomic;
use crate::types::Index;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default file name of the catalog inside the data directory.
pub const CATALOG_FILE_NAME: &str = "trawl-catalog.json";

/// Summary line for one saved index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub directory: Option<String>,
    pub files: usize,
    pub timestamp: Option<String>,
}

/// A set of named indexes backed by one file.
#[derive(Debug, Clone)]
pub struct IndexCatalog {
    path: PathBuf,
    indexes: BTreeMap<String, Index>,
}

impl IndexCatalog {
    /// Open the catalog at `path`. A missing file is an empty catalog.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let indexes = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|e| TrawlError::malformed(&path, e.to_string()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Catalog not found, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(TrawlError::from_io(e, "read", &path)),
        };
        Ok(IndexCatalog { path, indexes })
    }

    /// Write the catalog back to its file.
    pub fn save(&self) -> Result<()> {
        info!(
            path = %self.path.display(),
            indexes = self.indexes.len(),
            "Saving index catalog"
        );
        write_json_atomic(&self.path, &self.indexes)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Saved names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.indexes.keys().map(String::as_str)
    }

    /// One summary per saved index, sorted by name.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.indexes
            .iter()
            .map(|(name, index)| CatalogEntry {
                name: name.clone(),
                directory: index.directory.clone(),
                files: index.len(),
                timestamp: index.timestamp_display(),
            })
            .collect()
    }

    /// Look up a saved index. Surrounding whitespace in `name` is ignored,
    /// as it is by [`insert`](Self::insert).
    pub fn get(&self, name: &str) -> Option<&Index> {
        self.indexes.get(name.trim())
    }

    /// Store `index` under `name`, replacing any previous entry of that name.
    ///
    /// Only a built index (one with a root directory) can be saved.
    pub fn insert(&mut self, name: &str, index: Index) -> Result<Option<Index>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrawlError::Config {
                reason: "index name must not be empty".to_string(),
            });
        }
        if index.directory.is_none() {
            return Err(TrawlError::Config {
                reason: "nothing to save: build an index first".to_string(),
            });
        }
        Ok(self.indexes.insert(name.to_string(), index))
    }

    /// Remove a saved index, returning it if it existed.
    pub fn remove(&mut self, name: &str) -> Option<Index> {
        self.indexes.remove(name.trim())
    }
}
