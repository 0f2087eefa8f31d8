//! Batch file operations on search results.
//!
//! Copy, move and delete are best-effort over the whole batch: a failure on
//! one file is recorded in the [`OperationReport`] and the remaining files are
//! still attempted. A destination that already holds a file of the same name
//! is never overwritten; the source is reported as skipped instead. The check
//! and the write are one step in the [`FileSystem`], so a file that appears
//! at the destination mid-batch is not clobbered either.
//!
//! Move and delete keep the in-memory [`Index`] in step with the filesystem.

use crate::backend::FileSystem;
use crate::error::{Result, TrawlError};
use crate::types::{FileEntry, Index};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// A file that could not be processed, with the cause.
#[derive(Debug)]
pub struct FailedFile {
    pub path: FileEntry,
    pub error: TrawlError,
}

/// Outcome of a batch operation.
#[derive(Debug, Default)]
pub struct OperationReport {
    /// Sources that were fully processed
    pub succeeded: Vec<FileEntry>,

    /// Sources left alone because the destination name was taken
    pub skipped: Vec<FileEntry>,

    /// Sources that failed, with the reason
    pub failed: Vec<FailedFile>,
}

impl OperationReport {
    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    /// True when nothing failed (skips are not failures)
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn fail(&mut self, path: &FileEntry, error: TrawlError) {
        warn!(path = %path, error = %error, "File operation failed");
        self.failed.push(FailedFile {
            path: path.clone(),
            error,
        });
    }
}

impl fmt::Display for OperationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} skipped, {} failed",
            self.succeeded.len(),
            self.skipped.len(),
            self.failed.len()
        )
    }
}

/// Explicit acknowledgement that the user agreed to delete files.
///
/// Deleting requires one of these so a frontend cannot remove files without
/// having asked first.
#[derive(Debug, Clone, Copy)]
pub struct DeleteConfirmation(());

impl DeleteConfirmation {
    /// Record that the user confirmed the deletion.
    pub fn confirmed() -> Self {
        DeleteConfirmation(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Copy,
    Move,
}

/// Copy each source into `dest_dir`, skipping names that already exist there.
///
/// The index is not touched.
pub fn copy(fs: &dyn FileSystem, sources: &[FileEntry], dest_dir: &Path) -> Result<OperationReport> {
    transfer(fs, sources, dest_dir, Transfer::Copy, None)
}

/// Move each source into `dest_dir`, skipping names that already exist there.
///
/// Every moved file's index entry is remapped to its new location.
pub fn move_files(
    fs: &dyn FileSystem,
    sources: &[FileEntry],
    dest_dir: &Path,
    index: &mut Index,
) -> Result<OperationReport> {
    transfer(fs, sources, dest_dir, Transfer::Move, Some(index))
}

/// Delete each source from disk and from the index.
///
/// An entry whose file is already gone is dropped from the index as well and
/// reported as failed with `NotFound`.
#[instrument(skip_all, fields(count = sources.len()))]
pub fn delete(
    fs: &dyn FileSystem,
    sources: &[FileEntry],
    index: &mut Index,
    _confirmation: DeleteConfirmation,
) -> OperationReport {
    let mut report = OperationReport::default();

    for source in sources {
        match fs.delete_file(source.as_path()) {
            Ok(()) => {
                index.remove(source);
                report.succeeded.push(source.clone());
            }
            Err(e) => {
                if e.is_not_found() {
                    index.remove(source);
                }
                report.fail(source, e);
            }
        }
    }

    info!(%report, "Delete complete");
    report
}

#[instrument(skip_all, fields(op = ?op, count = sources.len(), dest = %dest_dir.display()))]
fn transfer(
    fs: &dyn FileSystem,
    sources: &[FileEntry],
    dest_dir: &Path,
    op: Transfer,
    mut index: Option<&mut Index>,
) -> Result<OperationReport> {
    fs.check_directory(dest_dir)?;

    let mut report = OperationReport::default();

    for source in sources {
        let target = match destination_for(source, dest_dir) {
            Some(target) => target,
            None => {
                report.fail(
                    source,
                    TrawlError::NotFound {
                        path: source.as_path().to_path_buf(),
                    },
                );
                continue;
            }
        };

        let result = match op {
            Transfer::Copy => fs.copy_file(source.as_path(), &target),
            Transfer::Move => fs.move_file(source.as_path(), &target),
        };

        match result {
            Ok(()) => {
                if let Some(index) = index.as_deref_mut() {
                    index.remap(source, FileEntry::from_path(&target));
                }
                report.succeeded.push(source.clone());
            }
            Err(e) if e.is_already_exists() => {
                info!(source = %source, target = %target.display(), "Destination exists, skipping");
                report.skipped.push(source.clone());
            }
            Err(e) => report.fail(source, e),
        }
    }

    info!(%report, "Transfer complete");
    Ok(report)
}

fn destination_for(source: &FileEntry, dest_dir: &Path) -> Option<PathBuf> {
    source.as_path().file_name().map(|name| dest_dir.join(name))
}
