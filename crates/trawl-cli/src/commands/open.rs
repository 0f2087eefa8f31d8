//! Open command - launch a file or show it in the file manager.

use std::path::Path;
use trawl_core::{FileSystem, LocalFileSystem};

/// Run the open command.
pub fn run(path: &Path, reveal: bool) -> anyhow::Result<()> {
    let fs = LocalFileSystem::new();

    if !fs.exists(path) {
        anyhow::bail!("{} does not exist", path.display());
    }

    if reveal {
        fs.reveal_in_manager(path)?;
    } else {
        fs.open_default(path)?;
    }
    Ok(())
}
