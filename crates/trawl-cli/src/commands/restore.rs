//! Restore command - put the backup of the index back in place.

use crate::app::confirm;
use trawl_core::{Config, IndexStore};

/// Run the restore command.
///
/// Works directly on the store, since the current index may not even load.
pub fn run(config: Config, skip_confirm: bool) -> anyhow::Result<()> {
    let store = IndexStore::new(config.index_path()?);

    if !store.backup_path().exists() {
        println!("No backup found at {}.", store.backup_path().display());
        return Ok(());
    }

    if !skip_confirm && !confirm("This will replace the index with its backup. Are you sure?")? {
        println!("Cancelled.");
        return Ok(());
    }

    let index = store.restore_from_backup()?;
    println!(
        "Restored {} files for {} from the backup.",
        index.len(),
        index.directory.as_deref().unwrap_or("no directory")
    );
    Ok(())
}
