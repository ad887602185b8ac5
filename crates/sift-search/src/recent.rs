//! Bounded history of past queries with snapshots of their top results.
//!
//! Persisted as one JSON document:
//!
//! ```text
//! {"recent": [{"query": "report", "time": "..."}], "cache": {"report": [...]}}
//! ```
//!
//! Writers inside a process are serialized by a mutex. Writers across
//! processes take an advisory lock on a sibling lock file, reload the file,
//! apply their change and replace it atomically. Persistence is best effort:
//! failures are logged and the in-memory state stays authoritative.

use crate::fusion::FusedResult;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sift_core::config::{DataPaths, RecentConfig};
use sift_core::lock::FileLock;
use sift_core::persist::{read_json_or_default, write_json_atomic};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// How long an insert waits for another process's write.
const LOCK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEntry {
    pub query: String,
    pub time: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RecentState {
    #[serde(default)]
    recent: Vec<RecentEntry>,
    #[serde(default)]
    cache: BTreeMap<String, Vec<FusedResult>>,
}

impl RecentState {
    fn record(&mut self, query: &str, results: &[FusedResult], config: &RecentConfig) {
        let folded = query.to_lowercase();
        let (replaced, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.recent)
            .into_iter()
            .partition(|e| e.query.to_lowercase() == folded);
        self.recent = kept;
        for old in replaced {
            self.cache.remove(&old.query);
        }

        self.recent.insert(
            0,
            RecentEntry {
                query: query.to_string(),
                time: Utc::now(),
            },
        );

        if self.recent.len() > config.max_items {
            for evicted in self.recent.drain(config.max_items..) {
                self.cache.remove(&evicted.query);
            }
        }

        // max_items == 0 evicts the new entry too
        if self.recent.first().is_some_and(|e| e.query == query) {
            let keep = results.len().min(config.max_results_per_query);
            self.cache.insert(query.to_string(), results[..keep].to_vec());
        }
    }
}

#[derive(Debug)]
struct Storage {
    file: PathBuf,
    lock: PathBuf,
}

/// Recent queries, newest first, each with a result snapshot.
#[derive(Debug)]
pub struct RecentSearchCache {
    state: Mutex<RecentState>,
    storage: Option<Storage>,
    config: RecentConfig,
}

impl RecentSearchCache {
    /// Cache that is never written to disk.
    #[must_use]
    pub fn in_memory(config: RecentConfig) -> Self {
        Self {
            state: Mutex::new(RecentState::default()),
            storage: None,
            config,
        }
    }

    /// Load the cache persisted under `paths`. An unreadable file starts an
    /// empty session.
    #[must_use]
    pub fn open(paths: &DataPaths, config: RecentConfig) -> Self {
        Self::open_at(&paths.recent_searches(), &paths.recent_lock(), config)
    }

    /// Load from explicit state and lock file paths.
    #[must_use]
    pub fn open_at(file: &Path, lock: &Path, config: RecentConfig) -> Self {
        let state = load_state(file).unwrap_or_else(|err| {
            warn!("starting with empty recent searches: {err:#}");
            RecentState::default()
        });
        debug!(queries = state.recent.len(), path = %file.display(), "loaded recent searches");

        Self {
            state: Mutex::new(state),
            storage: Some(Storage {
                file: file.to_path_buf(),
                lock: lock.to_path_buf(),
            }),
            config,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RecentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `query` (trimmed) with the first results of its fused list.
    ///
    /// A case-insensitive repeat replaces the older entry and its snapshot.
    /// Entries beyond `max_items` are evicted with their snapshots.
    pub fn insert(&self, query: &str, results: &[FusedResult]) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }

        let mut state = self.lock();
        let Some(storage) = &self.storage else {
            state.record(query, results, &self.config);
            return;
        };

        let _guard = match FileLock::exclusive(&storage.lock, LOCK_TIMEOUT) {
            Ok(guard) => guard,
            Err(err) => {
                warn!("recent searches not persisted: {err}");
                state.record(query, results, &self.config);
                return;
            }
        };

        match load_state(&storage.file) {
            Ok(on_disk) => *state = on_disk,
            Err(err) => warn!("reusing in-memory recent searches: {err:#}"),
        }
        state.record(query, results, &self.config);

        if let Err(err) = write_json_atomic(&storage.file, &*state) {
            warn!("recent searches not persisted: {err:#}");
        }
    }

    /// Snapshot stored for exactly `query` (trimmed); empty when absent.
    #[must_use]
    pub fn lookup(&self, query: &str) -> Vec<FusedResult> {
        self.lock()
            .cache
            .get(query.trim())
            .cloned()
            .unwrap_or_default()
    }

    /// Recent queries, newest first.
    #[must_use]
    pub fn queries(&self) -> Vec<RecentEntry> {
        self.lock().recent.clone()
    }
}

fn load_state(path: &Path) -> Result<RecentState> {
    read_json_or_default(path)
}
