//! Application session.
//!
//! A [`Session`] owns everything a frontend needs between user actions: the
//! current [`Index`], the results of the last search, and at most one
//! outstanding [`WorkerHandle`]. Only the session mutates the index, either
//! when it collects a worker's outcome or during a file operation, and it
//! refuses to start either while a worker is still outstanding.
//!
//! A worker stays outstanding until its outcome has been collected with
//! [`Session::poll`] or [`Session::wait`].
//!
//! Directory and file arguments are resolved to absolute paths before use,
//! so an index built from `.` records the directory it was really built
//! from and its entries compare equal to the paths later operations pass.

use crate::backend::FileSystem;
use crate::catalog::IndexCatalog;
use crate::config::Config;
use crate::error::{Result, TrawlError};
use crate::ops::{self, DeleteConfirmation, OperationReport};
use crate::persistence::IndexStore;
use crate::search::SearchQuery;
use crate::types::{FileEntry, Index};
use crate::worker::{
    CancelToken, SearchMode, SearchRequest, SearchWorker, WorkerEvent, WorkerHandle,
    WorkerOptions, WorkerOutcome,
};
use crossbeam_channel::TryRecvError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How to continue after a directory was reported as too large.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LargeDirectoryChoice {
    /// Build (and, if configured, save) an index, then search it
    BuildIndex,

    /// Walk the directory anyway
    ForceWalk,
}

/// What a finished run did to the session.
#[derive(Debug)]
pub enum SearchOutcome {
    /// Results were replaced; `indexed` is set when a new index was adopted
    Completed { results: usize, indexed: bool },

    /// Nothing changed; call [`Session::resolve_large_directory`] to continue
    LargeDirectory(usize),

    Cancelled,

    Failed(TrawlError),
}

/// Non-blocking view of the outstanding run.
#[derive(Debug)]
pub enum Poll {
    /// No run is outstanding
    Idle,

    /// Still running; carries the latest progress if any arrived
    Running(Option<(usize, usize)>),

    /// The run ended and its outcome has been applied
    Finished(SearchOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunKind {
    Search,
    Index,
}

struct ActiveRun {
    handle: WorkerHandle,
    query: SearchQuery,
    kind: RunKind,
}

/// One user's working state.
pub struct Session {
    config: Config,
    store: IndexStore,
    fs: Arc<dyn FileSystem>,
    index: Index,
    snapshot: Option<Arc<[FileEntry]>>,
    results: Vec<FileEntry>,
    active: Option<ActiveRun>,
    pending: Option<SearchQuery>,
    interrupt: Option<CancelToken>,
}

impl Session {
    /// Open a session, loading the index from the configured location.
    pub fn open(config: Config, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let store = IndexStore::new(config.index_path()?);
        let index = store.load()?;
        Ok(Self::with_index(config, store, fs, index))
    }

    /// Create a session around an already loaded index.
    pub fn with_index(
        config: Config,
        store: IndexStore,
        fs: Arc<dyn FileSystem>,
        index: Index,
    ) -> Self {
        Session {
            config,
            store,
            fs,
            index,
            snapshot: None,
            results: Vec::new(),
            active: None,
            pending: None,
            interrupt: None,
        }
    }

    /// Make every run started from now on observe `token` as well.
    ///
    /// The token is shared rather than reset per run: once it is raised,
    /// later runs end as cancelled straight away.
    pub fn set_interrupt(&mut self, token: CancelToken) {
        self.interrupt = Some(token);
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Results of the last completed search
    pub fn results(&self) -> &[FileEntry] {
        &self.results
    }

    /// Whether a worker is outstanding
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Root of a search that stopped at the large-directory check, if any
    pub fn pending_large_directory(&self) -> Option<&Path> {
        self.pending.as_ref().map(|q| q.root_directory.as_path())
    }

    /// Start a search of `root` for `keyword`.
    ///
    /// With `use_index`, a non-empty index built for exactly `root` is searched
    /// instead of walking the directory.
    pub fn start_search(
        &mut self,
        root: impl Into<PathBuf>,
        keyword: &str,
        use_index: bool,
    ) -> Result<()> {
        self.ensure_idle()?;
        let root: PathBuf = root.into();
        let root = self.resolve_dir(&root)?;

        let mut query = SearchQuery::new(&root, keyword);
        if use_index && !self.index.is_empty() && self.index.covers(&root) {
            debug!(files = self.index.len(), "Searching current index");
            query = query.with_candidates(self.snapshot());
        }

        self.spawn(SearchRequest::new(query), RunKind::Search);
        Ok(())
    }

    /// Start an indexing pass over `root`, replacing the current index on success.
    pub fn start_indexing(&mut self, root: impl Into<PathBuf>) -> Result<()> {
        self.ensure_idle()?;
        let root: PathBuf = root.into();
        let root = self.resolve_dir(&root)?;
        let query = SearchQuery::new(root, "");
        let request = SearchRequest::new(query).with_mode(self.build_index_mode());
        self.spawn(request, RunKind::Index);
        Ok(())
    }

    /// Continue a search that stopped at the large-directory check.
    pub fn resolve_large_directory(&mut self, choice: LargeDirectoryChoice) -> Result<()> {
        self.ensure_idle()?;
        let query = self.pending.take().ok_or_else(|| {
            TrawlError::InvalidState("no search is waiting on a large-directory decision".to_string())
        })?;

        let mode = match choice {
            LargeDirectoryChoice::BuildIndex => self.build_index_mode(),
            LargeDirectoryChoice::ForceWalk => SearchMode::ForceWalk,
        };
        info!(root = %query.root_directory.display(), ?choice, "Resuming large directory");
        self.spawn(SearchRequest::new(query).with_mode(mode), RunKind::Search);
        Ok(())
    }

    /// Ask the outstanding worker, if any, to stop.
    pub fn cancel(&self) {
        if let Some(active) = &self.active {
            active.handle.cancel();
        }
    }

    /// Drain pending worker events without blocking.
    pub fn poll(&mut self) -> Poll {
        let Some(active) = self.active.as_ref() else {
            return Poll::Idle;
        };

        let mut latest = None;
        loop {
            match active.handle.events().try_recv() {
                Ok(WorkerEvent::Progress { processed, total }) => latest = Some((processed, total)),
                Ok(WorkerEvent::Finished(outcome)) => return Poll::Finished(self.finish(outcome)),
                Err(TryRecvError::Empty) => return Poll::Running(latest),
                Err(TryRecvError::Disconnected) => {
                    let outcome = WorkerOutcome::Failed(TrawlError::InvalidState(
                        "search worker exited without a result".to_string(),
                    ));
                    return Poll::Finished(self.finish(outcome));
                }
            }
        }
    }

    /// Block until the outstanding run ends, reporting progress along the way.
    pub fn wait<F>(&mut self, on_progress: F) -> Option<SearchOutcome>
    where
        F: FnMut(usize, usize),
    {
        let active = self.active.take()?;
        let ActiveRun {
            handle,
            query,
            kind,
        } = active;
        let outcome = handle.run_to_end(on_progress);
        Some(self.apply(outcome, query, kind))
    }

    /// Copy files into `dest_dir`.
    ///
    /// Reports list the sources in their resolved, absolute form.
    pub fn copy(&mut self, sources: &[FileEntry], dest_dir: &Path) -> Result<OperationReport> {
        self.ensure_idle()?;
        let sources = self.resolve_files(sources)?;
        let dest_dir = self.resolve_dir(dest_dir)?;
        ops::copy(self.fs.as_ref(), &sources, &dest_dir)
    }

    /// Move files into `dest_dir`, keeping the index and results in step.
    pub fn move_files(&mut self, sources: &[FileEntry], dest_dir: &Path) -> Result<OperationReport> {
        self.ensure_idle()?;
        let sources = self.resolve_files(sources)?;
        let dest_dir = self.resolve_dir(dest_dir)?;
        let report = ops::move_files(self.fs.as_ref(), &sources, &dest_dir, &mut self.index)?;
        for moved in &report.succeeded {
            if let Some(name) = moved.as_path().file_name() {
                let target = FileEntry::from_path(&dest_dir.join(name));
                if let Some(slot) = self.results.iter_mut().find(|r| *r == moved) {
                    *slot = target;
                }
            }
        }
        self.snapshot = None;
        Ok(report)
    }

    /// Delete files from disk, the index and the results.
    pub fn delete(
        &mut self,
        sources: &[FileEntry],
        confirmation: DeleteConfirmation,
    ) -> Result<OperationReport> {
        self.ensure_idle()?;
        let sources = self.resolve_files(sources)?;
        let report = ops::delete(self.fs.as_ref(), &sources, &mut self.index, confirmation);
        let gone = |entry: &FileEntry| {
            report.succeeded.contains(entry)
                || report
                    .failed
                    .iter()
                    .any(|f| f.path == *entry && f.error.is_not_found())
        };
        self.results.retain(|r| !gone(r));
        self.snapshot = None;
        Ok(report)
    }

    /// Open a file with its default application.
    pub fn open_file(&self, path: &Path) -> Result<()> {
        self.fs.open_default(path)
    }

    /// Show a file in the platform file manager.
    pub fn reveal_file(&self, path: &Path) -> Result<()> {
        self.fs.reveal_in_manager(path)
    }

    /// Persist the current index to the session store.
    pub fn save_index(&self) -> Result<()> {
        self.store.save(&self.index)
    }

    /// Forget the current index and remove it from disk.
    pub fn clear_index(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.store.clear()?;
        self.set_index(Index::new());
        info!("Index cleared");
        Ok(())
    }

    /// Save the current index into `catalog` under `name`.
    pub fn save_to_catalog(&self, catalog: &mut IndexCatalog, name: &str) -> Result<()> {
        catalog.insert(name, self.index.clone())?;
        catalog.save()
    }

    /// Make the index saved as `name` the current one.
    pub fn load_from_catalog(&mut self, catalog: &IndexCatalog, name: &str) -> Result<()> {
        self.ensure_idle()?;
        let index = catalog.get(name).cloned().ok_or_else(|| TrawlError::NotFound {
            path: catalog.path().join(name),
        })?;
        info!(name, files = index.len(), "Loaded saved index");
        self.set_index(index);
        Ok(())
    }

    /// Absolute form of a directory argument, links resolved when it exists.
    ///
    /// A path that cannot be resolved is only made absolute; the worker or
    /// the operation then reports why it is unusable.
    fn resolve_dir(&self, path: &Path) -> Result<PathBuf> {
        match self.fs.canonicalize(path) {
            Ok(resolved) => Ok(resolved),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Path not resolved");
                absolute(path)
            }
        }
    }

    /// Absolute form of file arguments. Only the parent is resolved, so a
    /// link is acted on as the link itself.
    fn resolve_files(&self, sources: &[FileEntry]) -> Result<Vec<FileEntry>> {
        sources
            .iter()
            .map(|source| -> Result<FileEntry> {
                let path = source.as_path();
                let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
                let resolved = match (parent, path.file_name()) {
                    (Some(parent), Some(name)) => self.resolve_dir(parent)?.join(name),
                    (None, Some(name)) => self.resolve_dir(Path::new("."))?.join(name),
                    _ => self.resolve_dir(path)?,
                };
                Ok(FileEntry::from_path(&resolved))
            })
            .collect()
    }

    fn set_index(&mut self, index: Index) {
        self.index = index;
        self.snapshot = None;
    }

    fn snapshot(&mut self) -> Arc<[FileEntry]> {
        let files = &self.index.files;
        Arc::clone(
            self.snapshot
                .get_or_insert_with(|| Arc::from(files.as_slice())),
        )
    }

    fn build_index_mode(&self) -> SearchMode {
        let save_to = self
            .config
            .general
            .auto_save_index
            .then(|| self.store.index_path().to_path_buf());
        SearchMode::BuildIndex { save_to }
    }

    fn spawn(&mut self, request: SearchRequest, kind: RunKind) {
        self.pending = None;
        let query = request.query.clone();
        let options = WorkerOptions::from_config(&self.config);
        let fs = Arc::clone(&self.fs);
        let handle = match &self.interrupt {
            Some(token) => SearchWorker::spawn_with_token(request, options, fs, token.clone()),
            None => SearchWorker::spawn(request, options, fs),
        };
        self.active = Some(ActiveRun {
            handle,
            query,
            kind,
        });
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.active.is_some() {
            return Err(TrawlError::Busy("a search is still running".to_string()));
        }
        Ok(())
    }

    fn finish(&mut self, outcome: WorkerOutcome) -> SearchOutcome {
        match self.active.take() {
            Some(ActiveRun { mut handle, query, kind }) => {
                handle.wait();
                self.apply(outcome, query, kind)
            }
            None => SearchOutcome::Cancelled,
        }
    }

    fn apply(&mut self, outcome: WorkerOutcome, query: SearchQuery, kind: RunKind) -> SearchOutcome {
        match outcome {
            WorkerOutcome::Completed { results, index } => {
                let indexed = index.is_some();
                if let Some(index) = index {
                    self.set_index(index);
                }
                if kind == RunKind::Search {
                    self.results = results;
                }
                SearchOutcome::Completed {
                    results: if kind == RunKind::Search {
                        self.results.len()
                    } else {
                        self.index.len()
                    },
                    indexed,
                }
            }
            WorkerOutcome::LargeDirectory(count) => {
                self.pending = Some(query);
                SearchOutcome::LargeDirectory(count)
            }
            WorkerOutcome::Cancelled => SearchOutcome::Cancelled,
            WorkerOutcome::Failed(e) => {
                warn!(error = %e, "Search failed");
                SearchOutcome::Failed(e)
            }
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|e| TrawlError::from_io(e, "resolve", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::MemoryFileSystem;
    use crate::backend::LocalFileSystem;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        tree: PathBuf,
    }

    fn fixture(files: usize) -> Fixture {
        let dir = TempDir::new().unwrap();
        let tree = fs::canonicalize(dir.path()).unwrap().join("tree");
        fs::create_dir_all(tree.join("sub")).unwrap();
        for i in 0..files {
            fs::write(tree.join("sub").join(format!("note_{}.txt", i)), b"").unwrap();
        }
        Fixture { dir, tree }
    }

    fn session(fx: &Fixture, threshold: usize) -> Session {
        let mut config = Config::default();
        config.general.index_path = Some(fx.dir.path().join("index.json"));
        config.search.large_directory_threshold = threshold;
        Session::open(config, Arc::new(LocalFileSystem)).unwrap()
    }

    fn completed(outcome: Option<SearchOutcome>) -> (usize, bool) {
        match outcome {
            Some(SearchOutcome::Completed { results, indexed }) => (results, indexed),
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_live_search_sets_results() {
        let fx = fixture(12);
        let mut session = session(&fx, 10_000);

        session.start_search(&fx.tree, "note_1", true).unwrap();
        assert_eq!(completed(session.wait(|_, _| {})), (3, false));
        assert_eq!(session.results().len(), 3);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_busy_until_collected() {
        let fx = fixture(3);
        let mut session = session(&fx, 10_000);

        session.start_search(&fx.tree, "", false).unwrap();
        assert!(matches!(
            session.start_search(&fx.tree, "", false),
            Err(TrawlError::Busy(_))
        ));
        assert!(matches!(
            session.copy(&[], fx.dir.path()),
            Err(TrawlError::Busy(_))
        ));

        session.wait(|_, _| {});
        assert!(session.start_search(&fx.tree, "", false).is_ok());
    }

    #[test]
    fn test_poll_reaches_finished() {
        let fx = fixture(5);
        let mut session = session(&fx, 10_000);
        assert!(matches!(session.poll(), Poll::Idle));

        session.start_search(&fx.tree, "note", false).unwrap();
        let outcome = loop {
            match session.poll() {
                Poll::Finished(outcome) => break outcome,
                Poll::Running(_) => std::thread::sleep(std::time::Duration::from_millis(5)),
                Poll::Idle => panic!("run disappeared"),
            }
        };
        assert!(matches!(outcome, SearchOutcome::Completed { results: 5, .. }));
        assert!(matches!(session.poll(), Poll::Idle));
    }

    #[test]
    fn test_large_directory_then_index_and_reuse() {
        let fx = fixture(8);
        let mut session = session(&fx, 5);

        session.start_search(&fx.tree, "note_7", true).unwrap();
        match session.wait(|_, _| {}) {
            Some(SearchOutcome::LargeDirectory(8)) => {}
            other => panic!("expected large directory, got {:?}", other),
        }
        assert_eq!(session.pending_large_directory(), Some(fx.tree.as_path()));

        session
            .resolve_large_directory(LargeDirectoryChoice::BuildIndex)
            .unwrap();
        assert_eq!(completed(session.wait(|_, _| {})), (1, true));
        assert_eq!(session.index().len(), 8);
        assert!(session.store().exists());

        // The next search of the same root uses the index even in a large directory
        session.start_search(&fx.tree, "note", true).unwrap();
        assert_eq!(completed(session.wait(|_, _| {})), (8, false));
    }

    #[test]
    fn test_resolve_without_pending_fails() {
        let fx = fixture(1);
        let mut session = session(&fx, 10_000);
        assert!(matches!(
            session.resolve_large_directory(LargeDirectoryChoice::ForceWalk),
            Err(TrawlError::InvalidState(_))
        ));
    }

    #[test]
    fn test_indexing_keeps_results() {
        let fx = fixture(4);
        let mut session = session(&fx, 10_000);

        session.start_search(&fx.tree, "note_0", false).unwrap();
        session.wait(|_, _| {});
        assert_eq!(session.results().len(), 1);

        session.start_indexing(&fx.tree).unwrap();
        assert_eq!(completed(session.wait(|_, _| {})), (4, true));
        assert_eq!(session.results().len(), 1);
    }

    #[test]
    fn test_move_and_delete_update_index_and_results() {
        let fx = fixture(2);
        let dest = fx.dir.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        let mut session = session(&fx, 10_000);

        session.start_indexing(&fx.tree).unwrap();
        session.wait(|_, _| {});
        session.start_search(&fx.tree, "note", true).unwrap();
        session.wait(|_, _| {});

        let first = FileEntry::from_path(&fx.tree.join("sub/note_0.txt"));
        let second = FileEntry::from_path(&fx.tree.join("sub/note_1.txt"));
        let report = session.move_files(&[first.clone()], &dest).unwrap();
        assert_eq!(report.succeeded_count(), 1);

        let moved = FileEntry::from_path(&dest.join("note_0.txt"));
        assert!(session.index().files.contains(&moved));
        assert!(session.results().contains(&moved));

        session
            .delete(&[second.clone()], DeleteConfirmation::confirmed())
            .unwrap();
        assert!(!session.index().files.contains(&second));
        assert!(!session.results().contains(&second));
        assert_eq!(session.index().len(), 1);
    }

    #[test]
    fn test_catalog_round_trip_and_clear() {
        let fx = fixture(3);
        let mut session = session(&fx, 10_000);
        session.start_indexing(&fx.tree).unwrap();
        session.wait(|_, _| {});

        let mut catalog = IndexCatalog::load(fx.dir.path().join("catalog.json")).unwrap();
        session.save_to_catalog(&mut catalog, "notes").unwrap();

        session.clear_index().unwrap();
        assert!(session.index().is_empty());
        assert!(!session.store().exists());

        session.load_from_catalog(&catalog, "notes").unwrap();
        assert_eq!(session.index().len(), 3);
        assert!(session.load_from_catalog(&catalog, "missing").is_err());
    }

    #[test]
    fn test_unnormalized_root_is_resolved() {
        let fx = fixture(6);
        let mut session = session(&fx, 3);

        session.start_indexing(fx.tree.join("sub").join("..")).unwrap();
        assert_eq!(completed(session.wait(|_, _| {})), (6, true));
        assert_eq!(session.index().directory.as_deref(), Some(&*fx.tree.to_string_lossy()));
        assert!(session
            .index()
            .files
            .contains(&FileEntry::from_path(&fx.tree.join("sub/note_0.txt"))));

        // Above the threshold, only the index can answer without a prompt
        session.start_search(fx.tree.join(".").join("sub/.."), "note_5", true).unwrap();
        assert_eq!(completed(session.wait(|_, _| {})), (1, false));
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_root_is_made_absolute() {
        let fx = fixture(2);
        let mut session = session(&fx, 10_000);

        // Climb from the working directory to `/`, then descend to the tree
        let cwd = fs::canonicalize(std::env::current_dir().unwrap()).unwrap();
        let mut relative = PathBuf::new();
        for _ in cwd.components().skip(1) {
            relative.push("..");
        }
        let relative = relative.join(fx.tree.strip_prefix("/").unwrap());
        assert!(relative.is_relative());

        session.start_indexing(&relative).unwrap();
        session.wait(|_, _| {});
        let index = session.index();
        assert!(index.covers(&fx.tree));
        assert!(!index.covers(&relative));
        assert!(index.files.iter().all(|f| f.as_path().is_absolute()));
    }

    #[test]
    fn test_operations_resolve_their_paths() {
        let fx = fixture(2);
        let dest = fx.tree.join("dest");
        fs::create_dir_all(&dest).unwrap();
        let mut session = session(&fx, 10_000);
        session.start_indexing(&fx.tree).unwrap();
        session.wait(|_, _| {});

        let roundabout = FileEntry::from_path(&fx.tree.join("sub/../sub/note_0.txt"));
        let report = session
            .move_files(&[roundabout], &fx.tree.join("sub/../dest"))
            .unwrap();
        assert_eq!(report.succeeded, vec![FileEntry::from_path(&fx.tree.join("sub/note_0.txt"))]);
        assert!(session
            .index()
            .files
            .contains(&FileEntry::from_path(&dest.join("note_0.txt"))));

        let roundabout = FileEntry::from_path(&fx.tree.join("dest/../sub/note_1.txt"));
        session
            .delete(&[roundabout], DeleteConfirmation::confirmed())
            .unwrap();
        assert_eq!(session.index().files, vec![FileEntry::from_path(&dest.join("note_0.txt"))]);
    }

    #[test]
    fn test_substituted_backend_drives_session() {
        let dir = TempDir::new().unwrap();
        let fs = Arc::new(MemoryFileSystem::new(
            &["/mem", "/mem/out"],
            &["/mem/report.txt", "/mem/notes.md"],
        ));
        let mut session = Session::with_index(
            Config::default(),
            IndexStore::in_dir(dir.path()),
            fs.clone(),
            Index::new(),
        );

        session.start_search("/mem", "report", true).unwrap();
        assert_eq!(completed(session.wait(|_, _| {})), (1, false));
        assert_eq!(session.results(), &[FileEntry::new("/mem/report.txt")]);

        let report = session
            .copy(&[FileEntry::new("/mem/report.txt")], Path::new("/mem/out"))
            .unwrap();
        assert_eq!(report.succeeded_count(), 1);
        assert!(fs.files().contains(&FileEntry::new("/mem/out/report.txt")));
    }

    #[test]
    fn test_interrupt_cancels_runs() {
        let fx = fixture(3);
        let mut session = session(&fx, 10_000);
        session.start_search(&fx.tree, "note", false).unwrap();
        session.wait(|_, _| {});
        assert_eq!(session.results().len(), 3);

        let interrupt = CancelToken::new();
        session.set_interrupt(interrupt.clone());
        interrupt.cancel();

        session.start_search(&fx.tree, "note_0", false).unwrap();
        assert!(matches!(session.wait(|_, _| {}), Some(SearchOutcome::Cancelled)));
        // A cancelled run leaves the previous results alone
        assert_eq!(session.results().len(), 3);
        assert!(!session.is_busy());
    }
}
