//! Copy, move and delete commands.

use crate::app::{confirm, App};
use std::path::{Path, PathBuf};
use trawl_core::{Config, DeleteConfirmation, FileEntry, OperationReport};

/// Run the copy command.
pub fn copy(config: Config, dest: &Path, paths: &[PathBuf]) -> anyhow::Result<()> {
    let mut app = App::new(config)?;
    let report = app.session.copy(&entries(paths), dest)?;
    print_report("Copied", &report);
    Ok(())
}

/// Run the move command.
pub fn move_files(config: Config, dest: &Path, paths: &[PathBuf]) -> anyhow::Result<()> {
    let mut app = App::new(config)?;
    let report = app.session.move_files(&entries(paths), dest)?;
    app.save_index_if_built()?;
    print_report("Moved", &report);
    Ok(())
}

/// Run the delete command.
pub fn delete(config: Config, paths: &[PathBuf], skip_confirm: bool) -> anyhow::Result<()> {
    let mut app = App::new(config)?;

    if !skip_confirm {
        for path in paths {
            println!("  {}", path.display());
        }
        let prompt = format!("Permanently delete {} file(s)?", paths.len());
        if !confirm(&prompt)? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let report = app
        .session
        .delete(&entries(paths), DeleteConfirmation::confirmed())?;
    app.save_index_if_built()?;
    print_report("Deleted", &report);
    Ok(())
}

/// Entries as typed; the session resolves them against the working directory.
fn entries(paths: &[PathBuf]) -> Vec<FileEntry> {
    paths.iter().map(|p| FileEntry::from_path(p)).collect()
}

fn print_report(verb: &str, report: &OperationReport) {
    for path in &report.succeeded {
        println!("{} {}", verb, path);
    }
    for path in &report.skipped {
        println!("Skipped {} (already exists at destination)", path);
    }
    for failed in &report.failed {
        eprintln!("Failed {}: {}", failed.path, failed.error);
    }
    println!("{}", report);
}
