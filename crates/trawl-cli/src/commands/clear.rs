//! Clear command - remove the index.

use crate::app::confirm;
use trawl_core::{Config, IndexStore};

/// Run the clear command.
///
/// Works directly on the store so that a corrupted index can be cleared too.
pub fn run(config: Config, skip_confirm: bool) -> anyhow::Result<()> {
    let store = IndexStore::new(config.index_path()?);

    if !store.exists() {
        println!("No index found. Nothing to clear.");
        return Ok(());
    }

    if !skip_confirm && !confirm("This will delete the index. Are you sure?")? {
        println!("Cancelled.");
        return Ok(());
    }

    store.clear()?;
    println!("Index cleared.");

    Ok(())
}
