//! Search functionality for Trawl.
//!
//! Matching is plain substring containment on normalized strings: the keyword
//! and every candidate path go through [`normalize`] first, then a candidate
//! matches if its normalized form contains the normalized keyword. There is
//! no fuzzy matching and no ranking; results keep candidate order.
//!
//! An empty normalized keyword matches everything.

use crate::normalize::normalize;
use crate::types::{FileEntry, Index};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;

/// Candidate count above which filtering runs on the rayon pool.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 10_000;

/// A pre-normalized keyword, reusable across many candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher {
    needle: String,
}

impl Matcher {
    /// Normalize `keyword` once for repeated matching.
    pub fn new(keyword: &str) -> Self {
        Matcher {
            needle: normalize(keyword),
        }
    }

    /// Returns true if every candidate matches (empty normalized keyword)
    pub fn matches_all(&self) -> bool {
        self.needle.is_empty()
    }

    /// The normalized keyword
    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Check a single candidate.
    pub fn matches(&self, entry: &FileEntry) -> bool {
        self.matches_all() || normalize(entry.as_str()).contains(&self.needle)
    }

    /// Filter `candidates`, keeping input order.
    pub fn filter(&self, candidates: &[FileEntry]) -> Vec<FileEntry> {
        self.filter_with_threshold(candidates, DEFAULT_PARALLEL_THRESHOLD)
    }

    /// Filter `candidates`, using parallel iteration above `parallel_threshold`.
    ///
    /// Order is preserved on both paths.
    pub fn filter_with_threshold(
        &self,
        candidates: &[FileEntry],
        parallel_threshold: usize,
    ) -> Vec<FileEntry> {
        if self.matches_all() {
            return candidates.to_vec();
        }

        if candidates.len() > parallel_threshold {
            candidates
                .par_iter()
                .filter(|e| self.matches(e))
                .cloned()
                .collect()
        } else {
            candidates
                .iter()
                .filter(|e| self.matches(e))
                .cloned()
                .collect()
        }
    }
}

/// Return every candidate whose normalized path contains the normalized keyword.
///
/// # Example
/// ```
/// use trawl_core::{search, FileEntry};
///
/// let files = vec![FileEntry::new("report_final.TXT"), FileEntry::new("readme.md")];
/// assert_eq!(search(&files, "final"), vec![FileEntry::new("report_final.TXT")]);
/// assert_eq!(search(&files, "").len(), 2);
/// ```
pub fn search(candidates: &[FileEntry], keyword: &str) -> Vec<FileEntry> {
    Matcher::new(keyword).filter(candidates)
}

/// A single search request.
///
/// With `candidates` set, the search runs over that snapshot and never
/// touches the filesystem; without it, `root_directory` is walked live.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Directory to search under
    pub root_directory: PathBuf,

    /// Raw keyword as typed by the user
    pub keyword: String,

    /// Immutable snapshot of indexed files to search instead of walking
    pub candidates: Option<Arc<[FileEntry]>>,
}

impl SearchQuery {
    /// Create a live-walk query.
    pub fn new(root_directory: impl Into<PathBuf>, keyword: impl Into<String>) -> Self {
        SearchQuery {
            root_directory: root_directory.into(),
            keyword: keyword.into(),
            candidates: None,
        }
    }

    /// Search a snapshot of the given index instead of walking the directory.
    pub fn with_index(self, index: &Index) -> Self {
        self.with_candidates(index.files.clone().into())
    }

    /// Search an existing snapshot.
    pub fn with_candidates(mut self, candidates: Arc<[FileEntry]>) -> Self {
        self.candidates = Some(candidates);
        self
    }

    /// Matcher for this query's keyword
    pub fn matcher(&self) -> Matcher {
        Matcher::new(&self.keyword)
    }
}
