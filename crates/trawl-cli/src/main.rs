//! # Trawl CLI
//!
//! Command-line interface for the Trawl file search tool.
//!
//! ## Commands
//!
//! - `trawl index <dir>` - Build the file index for a directory
//! - `trawl search <dir> <keyword>` - Search for files whose path contains a keyword
//! - `trawl status` - Show the current index
//! - `trawl copy|move <dest> <paths>...` - Copy or move files into a directory
//! - `trawl delete <paths>...` - Delete files and drop them from the index
//! - `trawl open <path>` - Open a file or reveal it in the file manager
//! - `trawl saved list|save|load|remove` - Manage named saved indexes
//! - `trawl clear` - Remove the index
//! - `trawl restore` - Replace the index with its backup
//!
//! Ctrl-C stops a running `index` or `search`; a second Ctrl-C exits.
//!
//! ## Example Usage
//!
//! ```bash
//! # Index a directory once, then search it without walking
//! trawl index ~/Documents
//! trawl search ~/Documents report
//!
//! # Search a huge tree without an index anyway
//! trawl search /srv/data invoice --no-index --force-walk
//! ```

mod app;
mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Trawl - Keyword file search over a directory or a saved index
#[derive(Parser)]
#[command(name = "trawl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "TRAWL_CONFIG")]
    config: Option<PathBuf>,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the file index for a directory
    Index {
        /// Directory to index
        directory: PathBuf,
    },

    /// Search a directory for files whose path contains a keyword
    #[command(alias = "s")]
    Search {
        /// Directory to search
        directory: PathBuf,

        /// Keyword (case and punctuation are ignored)
        #[arg(default_value = "")]
        keyword: String,

        /// Walk the directory even if an index for it exists
        #[arg(long)]
        no_index: bool,

        /// If the directory is too large to walk, index it first
        #[arg(long, conflicts_with = "force_walk")]
        build_index: bool,

        /// Walk the directory regardless of its size
        #[arg(long)]
        force_walk: bool,

        /// Maximum number of results to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Show the current index
    Status,

    /// Copy files into a directory, skipping names that already exist there
    Copy {
        /// Destination directory
        dest: PathBuf,

        /// Files to copy
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Move files into a directory, skipping names that already exist there
    Move {
        /// Destination directory
        dest: PathBuf,

        /// Files to move
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Delete files from disk and from the index
    Delete {
        /// Files to delete
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Open a file with its default application
    Open {
        /// File to open
        path: PathBuf,

        /// Show the file in the file manager instead
        #[arg(short, long)]
        reveal: bool,
    },

    /// Manage named saved indexes
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },

    /// Clear the index
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Replace the index with the backup kept by the previous save
    Restore {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum SavedAction {
    /// List saved indexes
    List,

    /// Save the current index under a name
    Save { name: String },

    /// Make a saved index the current one
    Load { name: String },

    /// Delete a saved index
    Remove { name: String },
}

#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => trawl_core::Config::load_from(path)?,
        None => trawl_core::Config::load()?,
    };

    // Setup logging
    let log_level = if cli.quiet {
        "error".to_string()
    } else {
        match cli.verbose {
            0 => config.general.log_level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .init();

    let progress = !cli.quiet;

    // Execute command
    match cli.command {
        Commands::Index { directory } => {
            commands::index::run(config, &directory, progress, app::interrupt_on_ctrl_c())
        }
        Commands::Search {
            directory,
            keyword,
            no_index,
            build_index,
            force_walk,
            limit,
            output,
        } => commands::search::run(
            config,
            commands::search::SearchArgs {
                directory,
                keyword,
                use_index: !no_index,
                build_index,
                force_walk,
                limit,
                output,
                progress,
                interrupt: app::interrupt_on_ctrl_c(),
            },
        ),
        Commands::Status => commands::status::run(config),
        Commands::Copy { dest, paths } => commands::ops::copy(config, &dest, &paths),
        Commands::Move { dest, paths } => commands::ops::move_files(config, &dest, &paths),
        Commands::Delete { paths, yes } => commands::ops::delete(config, &paths, yes),
        Commands::Open { path, reveal } => commands::open::run(&path, reveal),
        Commands::Saved { action } => commands::saved::run(config, action),
        Commands::Clear { yes } => commands::clear::run(config, yes),
        Commands::Restore { yes } => commands::restore::run(config, yes),
    }
}
