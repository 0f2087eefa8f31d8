//! # Trawl Core Library
//!
//! This crate provides the indexing, persistence, search and file operation
//! functionality for the Trawl file search tool. Frontends drive it through a
//! [`Session`]; enumeration and every file operation go through the
//! [`FileSystem`] trait.
//!
//! ## Architecture
//!
//! - **Normalize** (`normalize`): Canonical comparable form of a path or name
//! - **Walker** (`walker`): Recursive file enumeration with cancellation
//! - **Types** (`types`): File entries and the index snapshot
//! - **Persistence** (`persistence`): JSON storage of the session index
//! - **Catalog** (`catalog`): Named saved indexes
//! - **Search** (`search`): Keyword matching over candidate paths
//! - **Worker** (`worker`): Background search with progress and cancellation
//! - **Ops** (`ops`): Batch copy, move and delete
//! - **Backend** (`backend`): Filesystem capabilities
//! - **Session** (`session`): Index, last results and the active worker
//! - **Config** (`config`): Configuration management
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use trawl_core::{Config, LocalFileSystem, SearchOutcome, Session};
//!
//! let mut session = Session::open(Config::load()?, Arc::new(LocalFileSystem))?;
//! session.start_search("/home/me/docs", "report", true)?;
//! if let Some(SearchOutcome::Completed { .. }) = session.wait(|_, _| {}) {
//!     for path in session.results() {
//!         println!("{}", path);
//!     }
//! }
//! # Ok::<(), trawl_core::TrawlError>(())
//! ```

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod normalize;
pub mod ops;
pub mod persistence;
pub mod search;
pub mod session;
pub mod types;
pub mod walker;
pub mod worker;

// Re-export commonly used types
pub use backend::{FileSystem, LocalFileSystem};
pub use catalog::{CatalogEntry, IndexCatalog};
pub use config::Config;
pub use error::{Result, TrawlError};
pub use normalize::normalize;
pub use ops::{DeleteConfirmation, FailedFile, OperationReport};
pub use persistence::IndexStore;
pub use search::{search, Matcher, SearchQuery};
pub use session::{LargeDirectoryChoice, Poll, SearchOutcome, Session};
pub use types::{FileEntry, Index};
pub use walker::{enumerate, Walker};
pub use worker::{
    CancelToken, SearchMode, SearchRequest, SearchWorker, WorkerEvent, WorkerHandle,
    WorkerOptions, WorkerOutcome, WorkerState,
};
