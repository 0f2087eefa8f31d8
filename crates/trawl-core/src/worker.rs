//! Background search worker.
//!
//! A worker runs one search request off the interactive thread and reports
//! back over a channel:
//!
//! ```text
//!            spawn
//!   Idle ───────────▶ Running ──┬──▶ Completed
//!                               ├──▶ Failed
//!                               ├──▶ Cancelled
//!                               └──▶ LargeDirectoryPending
//! ```
//!
//! A request that carries a pre-built index is answered synchronously inside
//! [`SearchWorker::spawn`] and never touches the filesystem. Otherwise the
//! worker validates the root, counts its files, and either stops with
//! [`WorkerOutcome::LargeDirectory`] (too many files for an unindexed walk) or
//! walks and matches in one pass, sending [`WorkerEvent::Progress`] every
//! `progress_interval` files.
//!
//! All enumeration goes through the [`FileSystem`] the worker was spawned with.
//!
//! Cancellation is cooperative: [`WorkerHandle::cancel`] raises a shared flag
//! that the walk checks at every directory and every file.

use crate::backend::FileSystem;
use crate::config::Config;
use crate::error::{Result, TrawlError};
use crate::persistence::IndexStore;
use crate::search::{Matcher, SearchQuery};
use crate::types::{FileEntry, Index};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Lifecycle state of a worker run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
    LargeDirectoryPending,
}

impl WorkerState {
    /// Whether the run has ended
    pub fn is_terminal(&self) -> bool {
        !matches!(self, WorkerState::Idle | WorkerState::Running)
    }
}

/// How a live (unindexed) request should treat the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchMode {
    /// Refuse directories above the large-directory threshold
    Auto,

    /// Enumerate into a new index, optionally persist it, then search it
    BuildIndex { save_to: Option<PathBuf> },

    /// Walk regardless of size
    ForceWalk,
}

/// A query plus the mode it should run in.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: SearchQuery,
    pub mode: SearchMode,
}

impl SearchRequest {
    pub fn new(query: SearchQuery) -> Self {
        SearchRequest {
            query,
            mode: SearchMode::Auto,
        }
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Tuning for a worker run.
#[derive(Debug, Clone)]
pub struct WorkerOptions {
    pub large_directory_threshold: usize,
    pub progress_interval: usize,
    pub parallel_threshold: usize,
    pub exclude: Vec<String>,
}

impl Default for WorkerOptions {
    fn default() -> Self {
        WorkerOptions::from_config(&Config::default())
    }
}

impl WorkerOptions {
    pub fn from_config(config: &Config) -> Self {
        WorkerOptions {
            large_directory_threshold: config.search.large_directory_threshold,
            progress_interval: config.search.progress_interval.max(1),
            parallel_threshold: config.search.parallel_threshold,
            exclude: config.exclude.patterns.clone(),
        }
    }
}

/// Terminal result of a worker run.
#[derive(Debug)]
pub enum WorkerOutcome {
    /// Matches in enumeration order; `index` is set after an indexing pass
    Completed {
        results: Vec<FileEntry>,
        index: Option<Index>,
    },

    /// The run stopped on an error; partial results were discarded
    Failed(TrawlError),

    /// The run was stopped by the user
    Cancelled,

    /// The directory holds more files than the threshold allows; carries the count
    LargeDirectory(usize),
}

impl WorkerOutcome {
    /// Results of this run; empty unless the run completed.
    pub fn results(&self) -> &[FileEntry] {
        match self {
            WorkerOutcome::Completed { results, .. } => results,
            _ => &[],
        }
    }

    pub fn state(&self) -> WorkerState {
        match self {
            WorkerOutcome::Completed { .. } => WorkerState::Completed,
            WorkerOutcome::Failed(_) => WorkerState::Failed,
            WorkerOutcome::Cancelled => WorkerState::Cancelled,
            WorkerOutcome::LargeDirectory(_) => WorkerState::LargeDirectoryPending,
        }
    }
}

/// Messages sent by a worker.
///
/// Progress events arrive in increasing `processed` order, and exactly one
/// `Finished` event is sent last.
#[derive(Debug)]
pub enum WorkerEvent {
    Progress { processed: usize, total: usize },
    Finished(WorkerOutcome),
}

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}

/// Spawns search workers.
pub struct SearchWorker;

impl SearchWorker {
    /// Start a run for `request` over `fs`.
    pub fn spawn(
        request: SearchRequest,
        options: WorkerOptions,
        fs: Arc<dyn FileSystem>,
    ) -> WorkerHandle {
        Self::spawn_with_token(request, options, fs, CancelToken::new())
    }

    /// Start a run that observes an existing cancellation token.
    pub fn spawn_with_token(
        request: SearchRequest,
        options: WorkerOptions,
        fs: Arc<dyn FileSystem>,
        token: CancelToken,
    ) -> WorkerHandle {
        let (tx, rx) = unbounded::<WorkerEvent>();
        let state = Arc::new(Mutex::new(WorkerState::Running));

        let SearchRequest { query, mode } = request;

        if let Some(candidates) = query.candidates.as_ref() {
            // In-memory search: no I/O, so it runs here and cannot be cancelled
            let started = Instant::now();
            let results = query
                .matcher()
                .filter_with_threshold(candidates, options.parallel_threshold);
            debug!(
                candidates = candidates.len(),
                results = results.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Indexed search complete"
            );
            let outcome = WorkerOutcome::Completed {
                results,
                index: None,
            };
            *state.lock() = outcome.state();
            let _ = tx.send(WorkerEvent::Finished(outcome));
            return WorkerHandle {
                events: rx,
                token,
                state,
                thread: None,
            };
        }

        let thread_state = Arc::clone(&state);
        let thread_token = token.clone();
        let thread = thread::Builder::new()
            .name("trawl-search".to_string())
            .spawn(move || {
                let outcome = run_live(fs.as_ref(), &query, &mode, &options, &thread_token, &tx);
                *thread_state.lock() = outcome.state();
                let _ = tx.send(WorkerEvent::Finished(outcome));
            });

        let thread = match thread {
            Ok(handle) => Some(handle),
            Err(e) => {
                let outcome = WorkerOutcome::Failed(TrawlError::Io {
                    operation: "spawn worker".to_string(),
                    path: PathBuf::new(),
                    source: e,
                });
                *state.lock() = outcome.state();
                let (tx, rx) = unbounded();
                let _ = tx.send(WorkerEvent::Finished(outcome));
                return WorkerHandle {
                    events: rx,
                    token,
                    state,
                    thread: None,
                };
            }
        };

        WorkerHandle {
            events: rx,
            token,
            state,
            thread,
        }
    }
}

/// Handle to a running (or finished) worker.
///
/// Dropping the handle cancels the run and waits for the thread to exit.
pub struct WorkerHandle {
    events: Receiver<WorkerEvent>,
    token: CancelToken,
    state: Arc<Mutex<WorkerState>>,
    thread: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Channel of progress and completion events
    pub fn events(&self) -> &Receiver<WorkerEvent> {
        &self.events
    }

    /// Ask the worker to stop at its next check.
    pub fn cancel(&self) {
        debug!("Cancellation requested");
        self.token.cancel();
    }

    /// Current state of the run
    pub fn state(&self) -> WorkerState {
        *self.state.lock()
    }

    /// Whether the run has reached a terminal state
    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Block until the worker thread has exited and return the final state.
    ///
    /// Events stay queued on [`events`](Self::events).
    pub fn wait(&mut self) -> WorkerState {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Search worker panicked");
                *self.state.lock() = WorkerState::Failed;
            }
        }
        self.state()
    }

    /// Drain events until the run finishes, calling `on_progress` for each
    /// progress event, then wait for the thread.
    pub fn run_to_end<F>(mut self, mut on_progress: F) -> WorkerOutcome
    where
        F: FnMut(usize, usize),
    {
        let mut outcome = None;
        while let Ok(event) = self.events.recv() {
            match event {
                WorkerEvent::Progress { processed, total } => on_progress(processed, total),
                WorkerEvent::Finished(done) => {
                    outcome = Some(done);
                    break;
                }
            }
        }
        self.wait();
        outcome.unwrap_or_else(|| {
            WorkerOutcome::Failed(TrawlError::Io {
                operation: "search worker".to_string(),
                path: PathBuf::new(),
                source: std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "worker exited without a result",
                ),
            })
        })
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.token.cancel();
            self.wait();
        }
    }
}

fn run_live(
    fs: &dyn FileSystem,
    query: &SearchQuery,
    mode: &SearchMode,
    options: &WorkerOptions,
    token: &CancelToken,
    tx: &Sender<WorkerEvent>,
) -> WorkerOutcome {
    let started = Instant::now();
    info!(
        root = %query.root_directory.display(),
        keyword = %query.keyword,
        mode = ?mode,
        "Search worker started"
    );

    let outcome = match walk_and_match(fs, query, mode, options, token, tx) {
        Ok(outcome) => outcome,
        Err(TrawlError::Cancelled) => WorkerOutcome::Cancelled,
        Err(e) => WorkerOutcome::Failed(e),
    };

    match &outcome {
        WorkerOutcome::Completed { results, .. } => info!(
            results = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search worker completed"
        ),
        WorkerOutcome::Failed(e) => warn!(error = %e, "Search worker failed"),
        WorkerOutcome::Cancelled => info!("Search worker cancelled"),
        WorkerOutcome::LargeDirectory(count) => info!(
            files = count,
            threshold = options.large_directory_threshold,
            "Directory too large for an unindexed search"
        ),
    }
    outcome
}

fn walk_and_match(
    fs: &dyn FileSystem,
    query: &SearchQuery,
    mode: &SearchMode,
    options: &WorkerOptions,
    token: &CancelToken,
    tx: &Sender<WorkerEvent>,
) -> Result<WorkerOutcome> {
    let root = query.root_directory.as_path();
    fs.check_directory(root)?;

    let total = count(fs, root, options, token)?;
    if *mode == SearchMode::Auto && total > options.large_directory_threshold {
        return Ok(WorkerOutcome::LargeDirectory(total));
    }

    let matcher = query.matcher();
    let mut progress = Progress::new(total, options.progress_interval, tx);

    match mode {
        SearchMode::BuildIndex { save_to } => {
            let mut files = Vec::with_capacity(total);
            fs.for_each_file(root, &options.exclude, token, &mut |entry| {
                files.push(entry);
                progress.tick();
                Ok(())
            })?;

            let index = Index::build(root, files);
            if let Some(path) = save_to {
                IndexStore::new(path).save(&index)?;
            }
            let results = matcher.filter_with_threshold(&index.files, options.parallel_threshold);
            Ok(WorkerOutcome::Completed {
                results,
                index: Some(index),
            })
        }
        SearchMode::Auto | SearchMode::ForceWalk => {
            let results = interleaved(fs, root, options, token, &matcher, &mut progress)?;
            Ok(WorkerOutcome::Completed {
                results,
                index: None,
            })
        }
    }
}

fn count(fs: &dyn FileSystem, root: &Path, options: &WorkerOptions, token: &CancelToken) -> Result<usize> {
    let mut total = 0usize;
    fs.for_each_file(root, &options.exclude, token, &mut |_| {
        total += 1;
        Ok(())
    })?;
    debug!(files = total, "Counting pass complete");
    Ok(total)
}

fn interleaved(
    fs: &dyn FileSystem,
    root: &Path,
    options: &WorkerOptions,
    token: &CancelToken,
    matcher: &Matcher,
    progress: &mut Progress<'_>,
) -> Result<Vec<FileEntry>> {
    let mut results = Vec::new();
    fs.for_each_file(root, &options.exclude, token, &mut |entry| {
        if matcher.matches(&entry) {
            results.push(entry);
        }
        progress.tick();
        Ok(())
    })?;
    Ok(results)
}

struct Progress<'a> {
    processed: usize,
    total: usize,
    interval: usize,
    tx: &'a Sender<WorkerEvent>,
}

impl<'a> Progress<'a> {
    fn new(total: usize, interval: usize, tx: &'a Sender<WorkerEvent>) -> Self {
        Progress {
            processed: 0,
            total,
            interval: interval.max(1),
            tx,
        }
    }

    fn tick(&mut self) {
        self.processed += 1;
        if self.processed % self.interval == 0 {
            // Files may appear between the counting pass and the walk
            let total = self.total.max(self.processed);
            let _ = self.tx.send(WorkerEvent::Progress {
                processed: self.processed,
                total,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::MemoryFileSystem;
    use crate::backend::LocalFileSystem;
    use std::fs;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tempfile::TempDir;

    fn populate(dir: &Path, count: usize) {
        for i in 0..count {
            let sub = dir.join(format!("d{}", i % 10));
            fs::create_dir_all(&sub).unwrap();
            fs::write(sub.join(format!("file_{}.txt", i)), b"").unwrap();
        }
    }

    fn run(request: SearchRequest, options: WorkerOptions) -> (Vec<(usize, usize)>, WorkerOutcome) {
        let mut progress = Vec::new();
        let outcome = SearchWorker::spawn(request, options, Arc::new(LocalFileSystem))
            .run_to_end(|processed, total| progress.push((processed, total)));
        (progress, outcome)
    }

    #[test]
    fn test_indexed_search_is_synchronous() {
        let index = Index::build(
            "/nowhere",
            vec![FileEntry::new("/nowhere/a.txt"), FileEntry::new("/nowhere/b.md")],
        );
        let query = SearchQuery::new("/nowhere", "md").with_index(&index);
        let handle = SearchWorker::spawn(
            SearchRequest::new(query),
            WorkerOptions::default(),
            Arc::new(LocalFileSystem),
        );

        assert_eq!(handle.state(), WorkerState::Completed);
        let outcome = handle.run_to_end(|_, _| panic!("no progress expected"));
        assert_eq!(outcome.results(), &[FileEntry::new("/nowhere/b.md")]);
    }

    #[test]
    fn test_live_walk_with_progress() {
        let dir = TempDir::new().unwrap();
        populate(dir.path(), 250);

        let query = SearchQuery::new(dir.path(), "file_1");
        let (progress, outcome) = run(SearchRequest::new(query), WorkerOptions::default());

        assert_eq!(progress, vec![(100, 250), (200, 250)]);
        assert_eq!(outcome.state(), WorkerState::Completed);
        // file_1, file_10..19, file_100..199
        assert_eq!(outcome.results().len(), 1 + 10 + 100);
    }

    #[test]
    fn test_missing_root_fails() {
        let dir = TempDir::new().unwrap();
        let query = SearchQuery::new(dir.path().join("missing"), "x");
        let (_, outcome) = run(SearchRequest::new(query), WorkerOptions::default());

        match outcome {
            WorkerOutcome::Failed(e) => assert!(e.is_not_found()),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_cancel_reports_empty_result() {
        let dir = TempDir::new().unwrap();
        populate(dir.path(), 50);

        let token = CancelToken::new();
        token.cancel();
        let query = SearchQuery::new(dir.path(), "");
        let mut handle = SearchWorker::spawn_with_token(
            SearchRequest::new(query),
            WorkerOptions::default(),
            Arc::new(LocalFileSystem),
            token,
        );

        let started = Instant::now();
        assert_eq!(handle.wait(), WorkerState::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));

        let outcome = handle.run_to_end(|_, _| {});
        assert!(matches!(outcome, WorkerOutcome::Cancelled));
        assert!(outcome.results().is_empty());
    }

    /// Serves a fixed file list. The second pass (the walk after counting)
    /// parks after its first file until the run is cancelled.
    struct GatedFileSystem {
        files: Vec<FileEntry>,
        passes: AtomicUsize,
    }

    impl GatedFileSystem {
        fn new(count: usize) -> Self {
            GatedFileSystem {
                files: (0..count)
                    .map(|i| FileEntry::new(format!("/gated/file_{}.txt", i)))
                    .collect(),
                passes: AtomicUsize::new(0),
            }
        }
    }

    impl FileSystem for GatedFileSystem {
        fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
            Ok(path.to_path_buf())
        }

        fn check_directory(&self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn for_each_file(
            &self,
            _root: &Path,
            _exclude: &[String],
            cancel: &CancelToken,
            visit: &mut dyn FnMut(FileEntry) -> Result<()>,
        ) -> Result<()> {
            let pass = self.passes.fetch_add(1, Ordering::SeqCst);
            for (i, file) in self.files.iter().enumerate() {
                if cancel.is_cancelled() {
                    return Err(TrawlError::Cancelled);
                }
                visit(file.clone())?;
                if pass == 1 && i == 0 {
                    let deadline = Instant::now() + Duration::from_secs(5);
                    while !cancel.is_cancelled() && Instant::now() < deadline {
                        thread::sleep(Duration::from_millis(1));
                    }
                }
            }
            Ok(())
        }

        fn copy_file(&self, _from: &Path, _to: &Path) -> Result<()> {
            Err(TrawlError::InvalidState("read-only".to_string()))
        }

        fn move_file(&self, _from: &Path, _to: &Path) -> Result<()> {
            Err(TrawlError::InvalidState("read-only".to_string()))
        }

        fn delete_file(&self, _path: &Path) -> Result<()> {
            Err(TrawlError::InvalidState("read-only".to_string()))
        }

        fn open_default(&self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn reveal_in_manager(&self, _path: &Path) -> Result<()> {
            Ok(())
        }

        fn exists(&self, _path: &Path) -> bool {
            false
        }
    }

    #[test]
    fn test_cancel_mid_walk_reports_cancelled() {
        let options = WorkerOptions {
            progress_interval: 1,
            ..WorkerOptions::default()
        };
        let query = SearchQuery::new("/gated", "file");
        let handle = SearchWorker::spawn(
            SearchRequest::new(query),
            options,
            Arc::new(GatedFileSystem::new(20)),
        );

        // The walk is parked after its first file until the cancel lands
        let first = handle.events().recv().unwrap();
        assert!(matches!(first, WorkerEvent::Progress { processed: 1, total: 20 }));
        handle.cancel();

        let started = Instant::now();
        let outcome = handle.run_to_end(|_, _| {});
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(matches!(outcome, WorkerOutcome::Cancelled));
        assert!(outcome.results().is_empty());
    }

    #[test]
    fn test_enumeration_goes_through_backend() {
        let fs = MemoryFileSystem::new(
            &["/virtual"],
            &["/virtual/a.txt", "/virtual/sub/b.md", "/elsewhere/c.txt"],
        );
        let query = SearchQuery::new("/virtual", "txt");
        let outcome = SearchWorker::spawn(SearchRequest::new(query), WorkerOptions::default(), Arc::new(fs))
            .run_to_end(|_, _| {});
        assert_eq!(outcome.results(), &[FileEntry::new("/virtual/a.txt")]);

        let missing = SearchQuery::new("/virtual/a.txt", "");
        let outcome = SearchWorker::spawn(
            SearchRequest::new(missing),
            WorkerOptions::default(),
            Arc::new(MemoryFileSystem::new(&["/virtual"], &["/virtual/a.txt"])),
        )
        .run_to_end(|_, _| {});
        assert!(matches!(
            outcome,
            WorkerOutcome::Failed(TrawlError::NotADirectory { .. })
        ));
    }

    #[test]
    fn test_large_directory_threshold() {
        let dir = TempDir::new().unwrap();
        populate(dir.path(), 10_001);

        let query = SearchQuery::new(dir.path(), "file");
        let (progress, outcome) = run(SearchRequest::new(query.clone()), WorkerOptions::default());
        assert!(progress.is_empty());
        assert!(matches!(outcome, WorkerOutcome::LargeDirectory(10_001)));

        // Resuming as a forced walk ignores the threshold
        let request = SearchRequest::new(query).with_mode(SearchMode::ForceWalk);
        let (_, outcome) = run(request, WorkerOptions::default());
        assert_eq!(outcome.results().len(), 10_001);
    }

    #[test]
    fn test_exactly_threshold_proceeds() {
        let dir = TempDir::new().unwrap();
        populate(dir.path(), 10_000);

        let query = SearchQuery::new(dir.path(), "file_9999");
        let (progress, outcome) = run(SearchRequest::new(query), WorkerOptions::default());
        assert_eq!(progress.len(), 100);
        assert_eq!(outcome.results().len(), 1);
    }

    #[test]
    fn test_small_threshold_then_build_index() {
        let dir = TempDir::new().unwrap();
        populate(dir.path(), 30);
        let options = WorkerOptions {
            large_directory_threshold: 20,
            ..WorkerOptions::default()
        };

        let query = SearchQuery::new(dir.path(), "file_2");
        let (_, outcome) = run(SearchRequest::new(query.clone()), options.clone());
        assert_eq!(outcome.state(), WorkerState::LargeDirectoryPending);

        let saved = dir.path().join("saved.json");
        let request = SearchRequest::new(query).with_mode(SearchMode::BuildIndex {
            save_to: Some(saved.clone()),
        });
        let (_, outcome) = run(request, options);

        match outcome {
            WorkerOutcome::Completed { results, index } => {
                // file_2, file_20..29
                assert_eq!(results.len(), 11);
                let index = index.unwrap();
                assert_eq!(index.len(), 30);
                assert_eq!(IndexStore::new(&saved).load().unwrap(), index);
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_excludes_apply_to_count_and_walk() {
        let dir = TempDir::new().unwrap();
        populate(dir.path(), 20);
        let options = WorkerOptions {
            exclude: vec!["d0".to_string()],
            ..WorkerOptions::default()
        };

        let (_, outcome) = run(SearchRequest::new(SearchQuery::new(dir.path(), "")), options);
        assert_eq!(outcome.results().len(), 18);
    }
}
