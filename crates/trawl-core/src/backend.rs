//! Filesystem backend traits.
//!
//! The search worker, the session and the file operations reach the
//! filesystem only through [`FileSystem`]. [`LocalFileSystem`] is the real
//! implementation; tests substitute an in-memory one.

use crate::error::{Result, TrawlError};
use crate::types::FileEntry;
use crate::walker::Walker;
use crate::worker::CancelToken;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Abstract filesystem capabilities needed by Trawl.
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` so a single instance can be shared
/// between the session and a background worker.
///
/// ## Overwriting
///
/// `copy_file` and `move_file` never replace anything at `to`. When the
/// target name is taken, even by a dangling link, they fail with
/// [`TrawlError::AlreadyExists`] and leave both paths untouched.
pub trait FileSystem: Send + Sync {
    /// Absolute form of `path` with links resolved. Fails if it does not exist.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// Check that `path` exists, is a directory and can be listed.
    fn check_directory(&self, path: &Path) -> Result<()>;

    /// Visit every file below `root` in traversal order, skipping names that
    /// match one of the `exclude` globs.
    ///
    /// Stops with [`TrawlError::Cancelled`] once `cancel` is raised. An error
    /// returned by `visit` ends the walk and is propagated unchanged.
    fn for_each_file(
        &self,
        root: &Path,
        exclude: &[String],
        cancel: &CancelToken,
        visit: &mut dyn FnMut(FileEntry) -> Result<()>,
    ) -> Result<()>;

    /// Copy `from` to the new file path `to`.
    fn copy_file(&self, from: &Path, to: &Path) -> Result<()>;

    /// Move `from` to the new file path `to`.
    fn move_file(&self, from: &Path, to: &Path) -> Result<()>;

    /// Delete the file at `path`.
    fn delete_file(&self, path: &Path) -> Result<()>;

    /// Open `path` with the platform's default application.
    fn open_default(&self, path: &Path) -> Result<()>;

    /// Show `path` in the platform file manager.
    fn reveal_in_manager(&self, path: &Path) -> Result<()>;

    /// Whether anything, including a dangling link, exists at `path`.
    fn exists(&self, path: &Path) -> bool;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        LocalFileSystem
    }
}

impl FileSystem for LocalFileSystem {
    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).map_err(|e| TrawlError::from_io(e, "resolve", path))
    }

    fn check_directory(&self, path: &Path) -> Result<()> {
        Walker::new(path).validate_root()
    }

    fn for_each_file(
        &self,
        root: &Path,
        exclude: &[String],
        cancel: &CancelToken,
        visit: &mut dyn FnMut(FileEntry) -> Result<()>,
    ) -> Result<()> {
        Walker::new(root)
            .with_excludes(exclude)?
            .with_cancel(cancel.flag())
            .for_each_file(visit)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        let mut source = File::open(from).map_err(|e| TrawlError::from_io(e, "copy", from))?;
        let permissions = source
            .metadata()
            .map_err(|e| TrawlError::from_io(e, "copy", from))?
            .permissions();

        // create_new refuses any existing entry, dangling links included
        let mut target = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(to)
            .map_err(|e| TrawlError::from_io(e, "copy", to))?;

        let copied = io::copy(&mut source, &mut target).and_then(|_| target.set_permissions(permissions));
        if let Err(e) = copied {
            drop(target);
            discard_partial(to);
            return Err(TrawlError::from_io(e, "copy", from));
        }
        Ok(())
    }

    fn move_file(&self, from: &Path, to: &Path) -> Result<()> {
        // Linking fails on an existing target where rename would replace it
        match fs::hard_link(from, to) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(TrawlError::AlreadyExists {
                    path: to.to_path_buf(),
                });
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(TrawlError::from_io(e, "move", from));
            }
            Err(e) => {
                debug!(
                    from = %from.display(),
                    to = %to.display(),
                    error = %e,
                    "Cannot link across this boundary, copying"
                );
                self.copy_file(from, to)?;
            }
        }

        if let Err(e) = fs::remove_file(from) {
            // Do not leave two copies behind
            discard_partial(to);
            return Err(TrawlError::from_io(e, "delete", from));
        }
        Ok(())
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| TrawlError::from_io(e, "delete", path))
    }

    fn open_default(&self, path: &Path) -> Result<()> {
        open::that(path).map_err(|e| TrawlError::Launch {
            action: "default application".to_string(),
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn reveal_in_manager(&self, path: &Path) -> Result<()> {
        let launch_error = |reason: String| TrawlError::Launch {
            action: "file manager".to_string(),
            path: path.to_path_buf(),
            reason,
        };

        if cfg!(target_os = "windows") {
            let mut arg = std::ffi::OsString::from("/select,");
            arg.push(path.as_os_str());
            Command::new("explorer")
                .arg(arg)
                .spawn()
                .map_err(|e| launch_error(e.to_string()))?;
            Ok(())
        } else if cfg!(target_os = "macos") {
            Command::new("open")
                .arg("-R")
                .arg(path)
                .spawn()
                .map_err(|e| launch_error(e.to_string()))?;
            Ok(())
        } else {
            // No portable "select" on freedesktop; open the containing folder
            let folder = path.parent().unwrap_or(path);
            open::that(folder).map_err(|e| launch_error(e.to_string()))
        }
    }

    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }
}

fn discard_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "Could not remove incomplete target");
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_move_delete() {
        let dir = TempDir::new().unwrap();
        let fs_backend = LocalFileSystem::new();
        let src = dir.path().join("a.txt");
        fs::write(&src, b"hello").unwrap();

        let copy = dir.path().join("b.txt");
        fs_backend.copy_file(&src, &copy).unwrap();
        assert_eq!(fs::read(&copy).unwrap(), b"hello");

        let moved = dir.path().join("c.txt");
        fs_backend.move_file(&copy, &moved).unwrap();
        assert!(!copy.exists());
        assert_eq!(fs::read(&moved).unwrap(), b"hello");

        fs_backend.delete_file(&moved).unwrap();
        assert!(!moved.exists());
    }

    #[test]
    fn test_missing_source_reports_not_found() {
        let dir = TempDir::new().unwrap();
        let fs_backend = LocalFileSystem::new();
        let err = fs_backend.delete_file(&dir.path().join("ghost")).unwrap_err();
        assert!(err.is_not_found());

        let err = fs_backend
            .move_file(&dir.path().join("ghost"), &dir.path().join("moved"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_copy_and_move_never_overwrite() {
        let dir = TempDir::new().unwrap();
        let fs_backend = LocalFileSystem::new();
        let src = dir.path().join("a.txt");
        let taken = dir.path().join("taken.txt");
        fs::write(&src, b"new").unwrap();
        fs::write(&taken, b"old").unwrap();

        assert!(fs_backend.copy_file(&src, &taken).unwrap_err().is_already_exists());
        assert!(fs_backend.move_file(&src, &taken).unwrap_err().is_already_exists());
        assert_eq!(fs::read(&taken).unwrap(), b"old");
        assert_eq!(fs::read(&src).unwrap(), b"new");
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_link_blocks_target() {
        let dir = TempDir::new().unwrap();
        let fs_backend = LocalFileSystem::new();
        let src = dir.path().join("a.txt");
        fs::write(&src, b"data").unwrap();
        let link = dir.path().join("link.txt");
        let pointee = dir.path().join("pointee.txt");
        std::os::unix::fs::symlink(&pointee, &link).unwrap();

        assert!(fs_backend.exists(&link));
        assert!(fs_backend.copy_file(&src, &link).unwrap_err().is_already_exists());
        assert!(fs_backend.move_file(&src, &link).unwrap_err().is_already_exists());
        // Nothing was written through the link
        assert!(!pointee.exists());
        assert!(src.exists());
    }

    #[test]
    fn test_for_each_file_honors_excludes_and_cancel() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("x.md"), b"").unwrap();
        fs::write(dir.path().join("y.tmp"), b"").unwrap();
        let fs_backend = LocalFileSystem::new();

        let mut seen = Vec::new();
        fs_backend
            .for_each_file(
                dir.path(),
                &["*.tmp".to_string()],
                &CancelToken::new(),
                &mut |entry| {
                    seen.push(entry);
                    Ok(())
                },
            )
            .unwrap();
        assert_eq!(seen, vec![FileEntry::from_path(&dir.path().join("x.md"))]);

        let cancelled = CancelToken::new();
        cancelled.cancel();
        let err = fs_backend
            .for_each_file(dir.path(), &[], &cancelled, &mut |_| Ok(()))
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_check_directory_and_canonicalize() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("f.txt"), b"").unwrap();
        let fs_backend = LocalFileSystem::new();

        fs_backend.check_directory(dir.path()).unwrap();
        assert!(matches!(
            fs_backend.check_directory(&dir.path().join("f.txt")),
            Err(TrawlError::NotADirectory { .. })
        ));
        assert!(fs_backend.check_directory(&dir.path().join("nope")).unwrap_err().is_not_found());

        let resolved = fs_backend.canonicalize(&dir.path().join("sub/..")).unwrap();
        assert_eq!(resolved, fs::canonicalize(dir.path()).unwrap());
        assert!(fs_backend.canonicalize(&dir.path().join("nope")).unwrap_err().is_not_found());
    }
}
