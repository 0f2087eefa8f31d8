//! Core data types for Trawl.
//!
//! An index is nothing more than an ordered list of file paths plus the root
//! it was built from and when. These types are serializable, and the JSON
//! shape of [`Index`] is the on-disk index format.

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Timestamp format used in persisted indexes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single file path as produced by enumeration.
///
/// Paths are stored as strings so that matching operates on exactly what
/// the user sees. Non-UTF-8 path components are converted lossily.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileEntry(pub String);

impl FileEntry {
    /// Create a new entry from anything string-like
    pub fn new(path: impl Into<String>) -> Self {
        FileEntry(path.into())
    }

    /// Create an entry from a filesystem path
    pub fn from_path(path: &Path) -> Self {
        FileEntry(path.to_string_lossy().into_owned())
    }

    /// Get the entry as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the entry as a filesystem path
    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// Final path component, if any
    pub fn file_name(&self) -> Option<&str> {
        self.as_path().file_name().and_then(|n| n.to_str())
    }
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FileEntry {
    fn from(s: String) -> Self {
        FileEntry(s)
    }
}

impl From<&str> for FileEntry {
    fn from(s: &str) -> Self {
        FileEntry(s.to_string())
    }
}

impl From<PathBuf> for FileEntry {
    fn from(p: PathBuf) -> Self {
        FileEntry::from_path(&p)
    }
}

impl AsRef<Path> for FileEntry {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

/// A snapshot of the files under a root directory.
///
/// ## Persisted form
///
/// ```json
/// {
///   "directory": "/home/me/docs",
///   "files": ["/home/me/docs/a.txt", "/home/me/docs/sub/b.md"],
///   "timestamp": "2024-05-01 12:30:00"
/// }
/// ```
///
/// The default value (no directory, no files, no timestamp) is the state of a
/// session that has never indexed anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Index {
    /// Root directory the files were enumerated from
    #[serde(default)]
    pub directory: Option<String>,

    /// File paths in enumeration order
    pub files: Vec<FileEntry>,

    /// When the index was built
    #[serde(default, with = "timestamp_serde")]
    pub timestamp: Option<NaiveDateTime>,
}

impl Index {
    /// Create an empty index
    pub fn new() -> Self {
        Index::default()
    }

    /// Build an index for `directory` from freshly enumerated files.
    ///
    /// The timestamp is the current local time truncated to whole seconds,
    /// matching the precision of the persisted form.
    pub fn build(directory: impl AsRef<Path>, files: Vec<FileEntry>) -> Self {
        let now = Local::now().naive_local();
        Index {
            directory: Some(directory.as_ref().to_string_lossy().into_owned()),
            files,
            timestamp: Some(now.with_nanosecond(0).unwrap_or(now)),
        }
    }

    /// Number of indexed files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the index holds no files
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Whether this index was built for the given root directory.
    pub fn covers(&self, root: impl AsRef<Path>) -> bool {
        self.directory
            .as_deref()
            .map(|d| Path::new(d) == root.as_ref())
            .unwrap_or(false)
    }

    /// Remove an entry. Returns true if it was present.
    pub fn remove(&mut self, entry: &FileEntry) -> bool {
        match self.files.iter().position(|f| f == entry) {
            Some(pos) => {
                self.files.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Replace `from` with `to` in place, keeping its position.
    /// Returns true if `from` was present.
    pub fn remap(&mut self, from: &FileEntry, to: FileEntry) -> bool {
        match self.files.iter_mut().find(|f| *f == from) {
            Some(slot) => {
                *slot = to;
                true
            }
            None => false,
        }
    }

    /// Human-readable timestamp, if any
    pub fn timestamp_display(&self) -> Option<String> {
        self.timestamp
            .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
    }
}

mod timestamp_serde {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(t) => serializer.serialize_some(&t.format(TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<NaiveDateTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) => parse_timestamp(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s))),
        }
    }

    fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok())
            .or_else(|| {
                chrono::DateTime::parse_from_rfc3339(s)
                    .ok()
                    .map(|t| t.naive_local())
            })
    }
}
