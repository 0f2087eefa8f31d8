//! Saved command - manage named saved indexes.

use crate::app::App;
use crate::SavedAction;
use trawl_core::Config;

/// Run the saved command.
pub fn run(config: Config, action: SavedAction) -> anyhow::Result<()> {
    let mut app = App::new(config)?;
    let mut catalog = app.catalog()?;

    match action {
        SavedAction::List => {
            if catalog.is_empty() {
                println!("No saved indexes.");
                return Ok(());
            }
            for entry in catalog.entries() {
                println!(
                    "{} ({}) - {} [{} files]",
                    entry.name,
                    entry.timestamp.as_deref().unwrap_or("unknown"),
                    entry.directory.as_deref().unwrap_or("-"),
                    entry.files
                );
            }
        }
        SavedAction::Save { name } => {
            app.session.save_to_catalog(&mut catalog, &name)?;
            println!("Index '{}' saved", name.trim());
        }
        SavedAction::Load { name } => {
            app.session.load_from_catalog(&catalog, &name)?;
            app.session.save_index()?;
            println!(
                "Loaded index '{}' with {} files",
                name,
                app.session.index().len()
            );
        }
        SavedAction::Remove { name } => {
            if catalog.remove(&name).is_none() {
                anyhow::bail!("no saved index named '{}'", name);
            }
            catalog.save()?;
            println!("Index '{}' removed", name);
        }
    }

    Ok(())
}
