//! Application state management.

use anyhow::Context;
use std::io::{self, Write};
use std::sync::Arc;
use trawl_core::{CancelToken, Config, IndexCatalog, LocalFileSystem, SearchOutcome, Session};
use tracing::{info, warn};

/// Shared application state.
pub struct App {
    /// Session holding the index and the active worker
    pub session: Session,

    /// Print progress to stderr while a worker runs
    pub progress: bool,
}

impl App {
    /// Create a new application instance.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let index_path = config.index_path()?;
        let session = Session::open(config, Arc::new(LocalFileSystem)).with_context(|| {
            format!(
                "could not load index {} (run 'trawl restore' to use its backup or 'trawl clear' to start over)",
                index_path.display()
            )
        })?;

        info!(
            index = %index_path.display(),
            files = session.index().len(),
            "Application initialized"
        );

        Ok(App {
            session,
            progress: false,
        })
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Stop outstanding runs when `interrupt` is raised.
    pub fn with_interrupt(mut self, interrupt: CancelToken) -> Self {
        self.session.set_interrupt(interrupt);
        self
    }

    /// Open the named-index catalog from the configured location.
    pub fn catalog(&self) -> anyhow::Result<IndexCatalog> {
        let path = self.session.config().catalog_path()?;
        Ok(IndexCatalog::load(&path)?)
    }

    /// Block until the outstanding worker finishes.
    pub fn wait(&mut self) -> Option<SearchOutcome> {
        let show = self.progress;
        let mut shown = false;
        let outcome = self.session.wait(|processed, total| {
            if show {
                eprint!("\rScanned {}/{} files", processed, total);
                let _ = io::stderr().flush();
                shown = true;
            }
        });
        if shown {
            eprintln!();
        }
        outcome
    }

    /// Persist the index if it describes a directory.
    pub fn save_index_if_built(&self) -> anyhow::Result<()> {
        if self.session.index().directory.is_some() {
            self.session.save_index()?;
        }
        Ok(())
    }
}

/// Install a Ctrl-C handler and return the token it raises.
///
/// The first Ctrl-C asks the running search to stop; a second one exits.
pub fn interrupt_on_ctrl_c() -> CancelToken {
    let token = CancelToken::new();
    let handler_token = token.clone();
    let installed = ctrlc::set_handler(move || {
        if handler_token.is_cancelled() {
            std::process::exit(130);
        }
        handler_token.cancel();
    });
    if let Err(e) = installed {
        warn!(error = %e, "Could not install Ctrl-C handler");
    }
    token
}

/// Ask a yes/no question on stdin. Anything but "y" is a no.
pub fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
