//! Status command - show the current index.

use crate::app::App;
use trawl_core::Config;

/// Run the status command.
pub fn run(config: Config) -> anyhow::Result<()> {
    let app = App::new(config)?;
    let index = app.session.index();

    println!("Trawl Index Status");
    println!("==================");
    println!();

    if index.directory.is_none() {
        println!("No index. Run 'trawl index <dir>' to build one.");
    } else {
        println!("Summary:");
        println!("  Directory:    {}", index.directory.as_deref().unwrap_or("-"));
        println!("  Files:        {}", index.len());
        if let Some(updated) = index.timestamp_display() {
            println!("  Last updated: {}", updated);
        }
    }

    let catalog = app.catalog()?;
    println!();
    if catalog.is_empty() {
        println!("Saved indexes: none");
    } else {
        println!("Saved indexes:");
        for entry in catalog.entries() {
            println!(
                "  {} ({} files) {}",
                entry.name,
                entry.files,
                entry.directory.as_deref().unwrap_or("-")
            );
        }
    }

    println!();
    println!("Index file:   {}", app.session.store().index_path().display());
    println!("Catalog file: {}", catalog.path().display());

    Ok(())
}
