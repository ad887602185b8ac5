//! Near-duplicate grouping by Jaccard similarity of normalized token sets.
//!
//! Every candidate pair whose similarity reaches the threshold is merged in a
//! disjoint-set; the connected components with two or more members are the
//! duplicate groups.
//!
//! # Pruning
//!
//! A pair that is not identical (`sim < 1.0`) is skipped when its overlap is
//! sparse: fewer shared tokens than `max(1, floor(ratio * min(|A|, |B|)))`.
//!
//! # Candidate pairs
//!
//! [`PairSource`] decides which pairs are compared. [`AllPairs`] is the
//! quadratic baseline; a locality-sensitive pre-filter can replace it without
//! touching the grouping rules.
//!
//! # Cancellation
//!
//! Long scans run on a [`DuplicateJob`]. The [`CancelToken`] and deadline are
//! checked before each pair. A cancelled or expired scan returns an error and
//! its partial disjoint-set is dropped with it.

use serde::Serialize;
use sift_core::Document;
use sift_core::config::DuplicateConfig;
use sift_core::error::ErrorCode;
use sift_core::text::token_set;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Errors and cancellation
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("{}: duplicate scan cancelled", ErrorCode::DuplicateScanCancelled.code())]
    Cancelled,
    #[error("{}: duplicate scan timed out after {elapsed:?}", ErrorCode::DuplicateScanTimedOut.code())]
    TimedOut { elapsed: Duration },
    #[error("{}: duplicate scan worker panicked", ErrorCode::InternalUnexpected.code())]
    WorkerPanicked,
}

impl ClusterError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Cancelled => ErrorCode::DuplicateScanCancelled,
            Self::TimedOut { .. } => ErrorCode::DuplicateScanTimedOut,
            Self::WorkerPanicked => ErrorCode::InternalUnexpected,
        }
    }
}

/// Shared flag asking a running scan to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Disjoint set
// ---------------------------------------------------------------------------

/// Union-find with path halving. `union(a, b)` attaches `b`'s root under
/// `a`'s root.
#[derive(Debug, Clone)]
pub struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    #[must_use]
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    pub fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[rb] = ra;
        }
    }
}

// ---------------------------------------------------------------------------
// Candidate pairs
// ---------------------------------------------------------------------------

/// Produces the `(i, j)` pairs (`i < j`) worth comparing.
pub trait PairSource: Send + Sync {
    fn candidate_pairs<'a>(
        &'a self,
        token_sets: &'a [BTreeSet<&'a str>],
    ) -> Box<dyn Iterator<Item = (usize, usize)> + 'a>;
}

/// Every unordered pair of non-empty token sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllPairs;

impl PairSource for AllPairs {
    fn candidate_pairs<'a>(
        &'a self,
        token_sets: &'a [BTreeSet<&'a str>],
    ) -> Box<dyn Iterator<Item = (usize, usize)> + 'a> {
        let n = token_sets.len();
        Box::new(
            (0..n)
                .filter(move |&i| !token_sets[i].is_empty())
                .flat_map(move |i| {
                    (i + 1..n)
                        .filter(move |&j| !token_sets[j].is_empty())
                        .map(move |j| (i, j))
                }),
        )
    }
}

// ---------------------------------------------------------------------------
// Clustering
// ---------------------------------------------------------------------------

/// Positions (into the clustered slice) of two or more near-identical documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub members: Vec<usize>,
}

impl DuplicateGroup {
    /// Resolve member positions against the slice that was clustered.
    #[must_use]
    pub fn documents<'a, D: AsRef<Document>>(&self, docs: &'a [D]) -> Vec<&'a Document> {
        self.members.iter().map(|&i| docs[i].as_ref()).collect()
    }
}

/// Jaccard similarity `|A ∩ B| / |A ∪ B|`, with the raw intersection size.
#[must_use]
pub fn jaccard(a: &BTreeSet<&str>, b: &BTreeSet<&str>) -> (f64, usize) {
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    if union == 0 {
        (0.0, inter)
    } else {
        (inter as f64 / union as f64, inter)
    }
}

#[derive(Debug, Clone)]
pub struct DuplicateClusterer<P = AllPairs> {
    threshold: f64,
    min_overlap_ratio: f64,
    pair_source: P,
}

impl Default for DuplicateClusterer {
    fn default() -> Self {
        Self::new(&DuplicateConfig::default())
    }
}

impl DuplicateClusterer {
    #[must_use]
    pub const fn new(config: &DuplicateConfig) -> Self {
        Self {
            threshold: config.threshold,
            min_overlap_ratio: config.min_overlap_ratio,
            pair_source: AllPairs,
        }
    }
}

impl<P: PairSource> DuplicateClusterer<P> {
    /// Replace the candidate-pair strategy.
    #[must_use]
    pub fn with_pair_source<Q: PairSource>(self, pair_source: Q) -> DuplicateClusterer<Q> {
        DuplicateClusterer {
            threshold: self.threshold,
            min_overlap_ratio: self.min_overlap_ratio,
            pair_source,
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Group `docs` without cancellation or deadline.
    #[must_use]
    pub fn cluster<D: AsRef<Document>>(&self, docs: &[D]) -> Vec<DuplicateGroup> {
        match self.cluster_with(docs, &CancelToken::new(), None) {
            Ok(groups) => groups,
            Err(err) => {
                warn!("duplicate scan aborted: {err}");
                Vec::new()
            }
        }
    }

    /// Group `docs`, stopping early if `cancel` fires or `deadline` passes.
    ///
    /// Groups list members in input order and are ordered by first member.
    ///
    /// # Errors
    ///
    /// Returns [`ClusterError::Cancelled`] or [`ClusterError::TimedOut`]; no
    /// partial grouping is returned in either case.
    pub fn cluster_with<D: AsRef<Document>>(
        &self,
        docs: &[D],
        cancel: &CancelToken,
        deadline: Option<Instant>,
    ) -> Result<Vec<DuplicateGroup>, ClusterError> {
        let n = docs.len();
        if n < 2 {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let token_sets: Vec<BTreeSet<&str>> = docs
            .iter()
            .map(|d| token_set(d.as_ref().normalized_text()))
            .collect();

        let mut set = DisjointSet::new(n);
        let mut compared = 0_usize;
        for (i, j) in self.pair_source.candidate_pairs(&token_sets) {
            if cancel.is_cancelled() {
                return Err(ClusterError::Cancelled);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(ClusterError::TimedOut {
                    elapsed: started.elapsed(),
                });
            }

            let (a, b) = (&token_sets[i], &token_sets[j]);
            if a.is_empty() || b.is_empty() {
                continue;
            }
            compared += 1;

            let (sim, inter) = jaccard(a, b);
            if sim < 1.0 && inter < self.min_overlap(a.len().min(b.len())) {
                continue;
            }
            if sim >= self.threshold {
                set.union(i, j);
            }
        }

        let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
        let mut components: Vec<Vec<usize>> = Vec::new();
        for i in 0..n {
            let root = set.find(i);
            let slot = *slot_of_root.entry(root).or_insert_with(|| {
                components.push(Vec::new());
                components.len() - 1
            });
            components[slot].push(i);
        }

        let groups: Vec<DuplicateGroup> = components
            .into_iter()
            .filter(|members| members.len() >= 2)
            .map(|members| DuplicateGroup { members })
            .collect();

        debug!(
            documents = n,
            compared,
            groups = groups.len(),
            elapsed_ms = started.elapsed().as_millis(),
            "duplicate scan finished"
        );
        Ok(groups)
    }

    fn min_overlap(&self, smaller: usize) -> usize {
        let scaled = (self.min_overlap_ratio * smaller as f64).floor();
        // Non-negative and bounded by `smaller`, so the cast is lossless.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let scaled = scaled.max(0.0) as usize;
        scaled.max(1)
    }
}

// ---------------------------------------------------------------------------
// Background job
// ---------------------------------------------------------------------------

/// Documents a job scanned, with the groups found among them.
#[derive(Debug, Clone)]
pub struct DuplicateScan {
    pub documents: Vec<Document>,
    pub groups: Vec<DuplicateGroup>,
}

impl DuplicateScan {
    /// Each group resolved to its documents.
    #[must_use]
    pub fn resolved(&self) -> Vec<Vec<&Document>> {
        self.groups
            .iter()
            .map(|g| g.documents(&self.documents))
            .collect()
    }
}

/// A duplicate scan running on its own thread.
#[derive(Debug)]
pub struct DuplicateJob {
    cancel: CancelToken,
    handle: JoinHandle<Result<DuplicateScan, ClusterError>>,
}

impl DuplicateJob {
    /// Start clustering `documents` in the background. `timeout` bounds the
    /// scan's wall-clock time.
    #[must_use]
    pub fn spawn<P>(
        documents: Vec<Document>,
        clusterer: DuplicateClusterer<P>,
        timeout: Option<Duration>,
    ) -> Self
    where
        P: PairSource + 'static,
    {
        let cancel = CancelToken::new();
        let worker_cancel = cancel.clone();
        let deadline = timeout.map(|t| Instant::now() + t);

        info!(documents = documents.len(), "starting duplicate scan");
        let handle = thread::spawn(move || {
            let groups = clusterer.cluster_with(&documents, &worker_cancel, deadline)?;
            Ok(DuplicateScan { documents, groups })
        });

        Self { cancel, handle }
    }

    /// Ask the worker to stop before its next pair.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the worker.
    ///
    /// # Errors
    ///
    /// Returns the scan's [`ClusterError`], or
    /// [`ClusterError::WorkerPanicked`] if the thread panicked.
    pub fn join(self) -> Result<DuplicateScan, ClusterError> {
        let outcome = self
            .handle
            .join()
            .unwrap_or(Err(ClusterError::WorkerPanicked));
        if let Err(err) = &outcome {
            warn!("duplicate scan failed: {err}");
        }
        outcome
    }
}
