//! Persistence layer for the Trawl index.
//!
//! An index is stored as a single pretty-printed JSON document:
//!
//! ```text
//! {
//!   "directory": "/home/me/docs" | null,
//!   "files": ["/home/me/docs/a.txt", ...],
//!   "timestamp": "YYYY-MM-DD HH:MM:SS" | null
//! }
//! ```
//!
//! - A missing file loads as an empty index; that is the normal first-run state.
//! - Malformed content is reported as [`TrawlError::MalformedIndex`].
//! - Writes go to a temporary sibling file which is then renamed over the
//!   target, and the previous index is kept as a `.bak` next to it.

use crate::error::{Result, TrawlError};
use crate::types::Index;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default file name of the session index inside the data directory.
pub const INDEX_FILE_NAME: &str = "trawl-index.json";

/// Manages persistence of one index file.
///
/// ## Example
///
/// ```rust,no_run
/// use trawl_core::{Index, IndexStore};
///
/// let store = IndexStore::new("./data/trawl-index.json");
/// let index = store.load()?;
/// store.save(&index)?;
/// # Ok::<(), trawl_core::TrawlError>(())
/// ```
#[derive(Debug, Clone)]
pub struct IndexStore {
    /// Path of the index document
    path: PathBuf,
}

impl IndexStore {
    /// Create a store for the index document at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        IndexStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Create a store using the default file name inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        IndexStore::new(dir.as_ref().join(INDEX_FILE_NAME))
    }

    /// Get the path to the index file.
    pub fn index_path(&self) -> &Path {
        &self.path
    }

    /// Get the path to the backup index file.
    pub fn backup_path(&self) -> PathBuf {
        sibling_with_suffix(&self.path, ".bak")
    }

    /// Check if an index file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Save the index to disk.
    ///
    /// Any failure is returned to the caller; the previous index file is left
    /// in place if the temporary file cannot be written.
    pub fn save(&self, index: &Index) -> Result<()> {
        info!(
            path = %self.path.display(),
            files = index.len(),
            "Saving index to disk"
        );
        write_json_atomic(&self.path, index)?;
        debug!("Index saved successfully");
        Ok(())
    }

    /// Load the index from disk.
    ///
    /// A missing file yields an empty index.
    pub fn load(&self) -> Result<Index> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Index file not found, starting empty");
                return Ok(Index::new());
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(TrawlError::malformed(&self.path, e.to_string()));
            }
            Err(e) => return Err(TrawlError::from_io(e, "read", &self.path)),
        };

        let index: Index = serde_json::from_str(&contents)
            .map_err(|e| TrawlError::malformed(&self.path, e.to_string()))?;

        info!(
            path = %self.path.display(),
            files = index.len(),
            directory = index.directory.as_deref().unwrap_or("-"),
            "Index loaded"
        );
        Ok(index)
    }

    /// Delete the stored index and its backup.
    pub fn clear(&self) -> Result<()> {
        for path in [self.path.clone(), self.backup_path()] {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "Removed index file"),
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(TrawlError::from_io(e, "delete", &path)),
            }
        }
        Ok(())
    }

    /// Replace the index with its backup, e.g. after the main file was
    /// corrupted. The backup itself is kept.
    pub fn restore_from_backup(&self) -> Result<Index> {
        let backup_path = self.backup_path();
        if !backup_path.exists() {
            return Err(TrawlError::NotFound { path: backup_path });
        }

        // Parse first so a broken backup never replaces the current file
        let index = IndexStore::new(&backup_path).load()?;
        fs::copy(&backup_path, &self.path)
            .map_err(|e| TrawlError::from_io(e, "copy", &backup_path))?;
        info!(path = %self.path.display(), files = index.len(), "Index restored from backup");
        Ok(index)
    }
}

/// Load the index stored at `path`; a missing file yields an empty index.
pub fn load(path: impl AsRef<Path>) -> Result<Index> {
    IndexStore::new(path).load()
}

/// Save `index` to `path`.
pub fn save(index: &Index, path: impl AsRef<Path>) -> Result<()> {
    IndexStore::new(path).save(index)
}

/// Write `value` as pretty JSON to `path` through a temporary sibling file,
/// keeping the previous file as `<name>.bak`.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| TrawlError::from_io(e, "create", parent))?;
    }

    let temp_path = sibling_with_suffix(path, ".tmp");
    {
        let file =
            File::create(&temp_path).map_err(|e| TrawlError::from_io(e, "write", &temp_path))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer
            .flush()
            .map_err(|e| TrawlError::from_io(e, "write", &temp_path))?;
    }

    replace_keeping_backup(&temp_path, path)
}

/// Rename `temp_path` over `path`, keeping the previous `path` as `.bak`.
///
/// If the final rename fails, the previous document is moved back so that
/// `path` is never left missing.
fn replace_keeping_backup(temp_path: &Path, path: &Path) -> Result<()> {
    let backup_path = sibling_with_suffix(path, ".bak");
    let mut backed_up = false;
    if path.exists() {
        match fs::remove_file(&backup_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, path = %backup_path.display(), "Failed to remove old backup"),
        }
        match fs::rename(path, &backup_path) {
            Ok(()) => backed_up = true,
            Err(e) => warn!(error = %e, path = %path.display(), "Failed to keep backup"),
        }
    }

    if let Err(e) = fs::rename(temp_path, path) {
        if backed_up {
            if let Err(restore) = fs::rename(&backup_path, path) {
                warn!(error = %restore, path = %path.display(), "Failed to put previous file back");
            }
        }
        if let Err(cleanup) = fs::remove_file(temp_path) {
            debug!(error = %cleanup, path = %temp_path.display(), "Temporary file not removed");
        }
        return Err(TrawlError::from_io(e, "rename", path));
    }
    Ok(())
}

fn sibling_with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
