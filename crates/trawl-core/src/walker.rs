//! Recursive file enumeration.
//!
//! [`Walker`] visits every file below a root directory using `walkdir`.
//! Directories are traversed but never emitted. Symbolic links are not
//! followed, so a link cycle cannot make the walk run forever; a link that
//! points at a file is reported like a regular file.
//!
//! The walk can be stopped through a shared flag that is checked at every
//! directory and every file, which is what bounds cancellation latency in
//! the search worker.

use crate::error::{Result, TrawlError};
use crate::types::FileEntry;
use glob::Pattern;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument};
use walkdir::{DirEntry, WalkDir};

/// Configurable recursive walker over the files of one root directory.
#[derive(Debug, Clone)]
pub struct Walker {
    root: PathBuf,
    exclude: Vec<Pattern>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a walker for `root` with no exclusions and no cancellation.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Walker {
            root: root.as_ref().to_path_buf(),
            exclude: Vec::new(),
            cancel: None,
        }
    }

    /// Skip files and directories whose name matches any of the glob patterns.
    pub fn with_excludes<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        for raw in patterns {
            let raw = raw.as_ref();
            let pattern = Pattern::new(raw).map_err(|e| TrawlError::Config {
                reason: format!("invalid exclude pattern {:?}: {}", raw, e),
            })?;
            self.exclude.push(pattern);
        }
        Ok(self)
    }

    /// Stop the walk with [`TrawlError::Cancelled`] once `flag` becomes true.
    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// The root directory being walked
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check that the root exists, is a directory and can be listed.
    pub fn validate_root(&self) -> Result<()> {
        let meta =
            fs::metadata(&self.root).map_err(|e| TrawlError::from_io(e, "stat", &self.root))?;
        if !meta.is_dir() {
            return Err(TrawlError::NotADirectory {
                path: self.root.clone(),
            });
        }
        fs::read_dir(&self.root).map_err(|e| TrawlError::from_io(e, "list", &self.root))?;
        Ok(())
    }

    /// Visit every file below the root in traversal order.
    ///
    /// The callback may abort the walk by returning an error, which is
    /// propagated unchanged.
    pub fn for_each_file<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(FileEntry) -> Result<()>,
    {
        self.validate_root()?;

        let walk = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_excluded(e));

        for item in walk {
            self.check_cancelled()?;
            let entry = item.map_err(|e| walk_error(e, &self.root))?;
            if entry.depth() == 0 || !is_file_like(&entry) {
                continue;
            }
            visit(FileEntry::from_path(entry.path()))?;
        }

        Ok(())
    }

    /// Collect every file below the root.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn collect(&self) -> Result<Vec<FileEntry>> {
        let mut files = Vec::new();
        self.for_each_file(|entry| {
            files.push(entry);
            Ok(())
        })?;
        debug!(files = files.len(), "Enumeration complete");
        Ok(files)
    }

    /// Count the files below the root without keeping their paths.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn count(&self) -> Result<usize> {
        let mut count = 0usize;
        self.for_each_file(|_| {
            count += 1;
            Ok(())
        })?;
        debug!(files = count, "Counting pass complete");
        Ok(count)
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        self.exclude.iter().any(|p| p.matches(&name))
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Acquire) => Err(TrawlError::Cancelled),
            _ => Ok(()),
        }
    }
}

/// List every file below `root`.
///
/// Fails with `NotFound` if the root is missing and `PermissionDenied` if it
/// cannot be read.
pub fn enumerate(root: impl AsRef<Path>) -> Result<Vec<FileEntry>> {
    Walker::new(root).collect()
}

/// Count the files below `root`, stopping early if `cancel` is raised.
pub fn count_files(root: impl AsRef<Path>, cancel: Option<Arc<AtomicBool>>) -> Result<usize> {
    let mut walker = Walker::new(root);
    if let Some(flag) = cancel {
        walker = walker.with_cancel(flag);
    }
    walker.count()
}

fn is_file_like(entry: &DirEntry) -> bool {
    let ft = entry.file_type();
    if ft.is_dir() {
        return false;
    }
    // Links to directories are not descended into and are not files either.
    !(ft.is_symlink() && entry.path().is_dir())
}

fn walk_error(err: walkdir::Error, root: &Path) -> TrawlError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    match err.into_io_error() {
        Some(io_err) => TrawlError::from_io(io_err, "walk", &path),
        None => TrawlError::Io {
            operation: "walk".to_string(),
            path,
            source: io::Error::new(io::ErrorKind::Other, "filesystem loop detected"),
        },
    }
}
