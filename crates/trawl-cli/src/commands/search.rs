//! Search command - find files whose path contains a keyword.

use crate::app::App;
use crate::OutputFormat;
use std::path::PathBuf;
use std::time::Instant;
use trawl_core::{CancelToken, Config, LargeDirectoryChoice, SearchOutcome};

/// Options of one search invocation.
pub struct SearchArgs {
    pub directory: PathBuf,
    pub keyword: String,
    pub use_index: bool,
    pub build_index: bool,
    pub force_walk: bool,
    pub limit: Option<usize>,
    pub output: OutputFormat,
    pub progress: bool,
    /// Raised to stop the search
    pub interrupt: CancelToken,
}

/// Run the search command.
pub fn run(config: Config, args: SearchArgs) -> anyhow::Result<()> {
    let max_results = config.search.max_results;
    let mut app = App::new(config)?
        .with_progress(args.progress)
        .with_interrupt(args.interrupt.clone());

    let start = Instant::now();
    app.session
        .start_search(&args.directory, &args.keyword, args.use_index)?;

    let mut outcome = app.wait();
    if let Some(SearchOutcome::LargeDirectory(count)) = outcome {
        let choice = if args.build_index {
            LargeDirectoryChoice::BuildIndex
        } else if args.force_walk {
            LargeDirectoryChoice::ForceWalk
        } else {
            eprintln!(
                "{} holds {} files, too many to search without an index.",
                args.directory.display(),
                count
            );
            eprintln!("Re-run with --build-index to index it first, or --force-walk to walk it anyway.");
            return Ok(());
        };
        app.session.resolve_large_directory(choice)?;
        outcome = app.wait();
    }

    match outcome {
        Some(SearchOutcome::Completed { indexed, .. }) => {
            if indexed {
                // The worker only persists when auto-save is on
                if !app.session.config().general.auto_save_index {
                    app.save_index_if_built()?;
                }
                eprintln!(
                    "Indexed {} files into {}",
                    app.session.index().len(),
                    app.session.store().index_path().display()
                );
            }
        }
        Some(SearchOutcome::Failed(e)) => return Err(e.into()),
        Some(SearchOutcome::Cancelled) => {
            eprintln!("Search cancelled.");
            return Ok(());
        }
        Some(SearchOutcome::LargeDirectory(_)) | None => {
            anyhow::bail!("search did not run to completion")
        }
    }
    let elapsed = start.elapsed();

    let limit = match (args.limit, max_results) {
        (Some(limit), _) => limit,
        (None, 0) => usize::MAX,
        (None, max) => max,
    };
    let results = app.session.results();
    let shown = &results[..results.len().min(limit)];

    match args.output {
        OutputFormat::Text => {
            for path in shown {
                println!("{}", path);
            }

            eprintln!();
            if shown.len() < results.len() {
                eprintln!(
                    "Showing {} of {} results ({:.3}ms)",
                    shown.len(),
                    results.len(),
                    elapsed.as_secs_f64() * 1000.0
                );
            } else {
                eprintln!(
                    "Found {} results in {:.3}ms",
                    results.len(),
                    elapsed.as_secs_f64() * 1000.0
                );
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "directory": args.directory.to_string_lossy(),
                "keyword": &args.keyword,
                "total": results.len(),
                "results": shown,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}
