//! Index command - build the file index for a directory.

use crate::app::App;
use std::path::Path;
use std::time::Instant;
use trawl_core::{CancelToken, Config, SearchOutcome};

/// Run the index command. Raising `interrupt` stops the walk.
pub fn run(
    config: Config,
    directory: &Path,
    progress: bool,
    interrupt: CancelToken,
) -> anyhow::Result<()> {
    let auto_save = config.general.auto_save_index;
    let mut app = App::new(config)?
        .with_progress(progress)
        .with_interrupt(interrupt);

    println!("Indexing {}...", directory.display());
    let start = Instant::now();

    app.session.start_indexing(directory)?;
    match app.wait() {
        Some(SearchOutcome::Completed { results, .. }) => {
            // An explicit index command always persists
            if !auto_save {
                app.session.save_index()?;
            }

            let elapsed = start.elapsed();
            println!();
            println!("Indexing complete!");
            println!("  Files: {}", results);
            println!("  Time:  {:.2}s", elapsed.as_secs_f64());
            println!("  Saved: {}", app.session.store().index_path().display());
            Ok(())
        }
        Some(SearchOutcome::Failed(e)) => Err(e.into()),
        Some(SearchOutcome::Cancelled) => {
            println!("Indexing cancelled.");
            Ok(())
        }
        Some(SearchOutcome::LargeDirectory(_)) | None => {
            anyhow::bail!("indexing did not run to completion")
        }
    }
}
