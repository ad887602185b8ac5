//! Learned per-document relevance bias from explicit good/bad feedback.
//!
//! The store is owned by the caller and handed to each search by reference.
//! Counters live behind a mutex so concurrent searches and feedback writes
//! never race. By default the store lives for the process only; opening it
//! on a JSONL log makes feedback survive across runs:
//!
//! ```text
//! {"filename":"report.txt","relevance":1,"ts":"2025-06-01T12:00:00Z"}
//! ```

use crate::fusion::{FusedResult, sort_results};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// User judgement of one result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relevance {
    Good,
    Bad,
}

impl Relevance {
    #[must_use]
    pub const fn delta(self) -> i64 {
        match self {
            Self::Good => 1,
            Self::Bad => -1,
        }
    }

    const fn from_delta(delta: i64) -> Option<Self> {
        match delta {
            1 => Some(Self::Good),
            -1 => Some(Self::Bad),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FeedbackEvent {
    filename: String,
    relevance: i64,
    ts: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct FeedbackStore {
    scores: Mutex<HashMap<String, i64>>,
    log: Option<PathBuf>,
}

impl FeedbackStore {
    /// Empty store that forgets everything when dropped.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Replay `path` (if it exists) and append future feedback to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the log exists but cannot be read. Malformed lines
    /// are skipped with a warning.
    pub fn open(path: &Path) -> Result<Self> {
        let mut scores: HashMap<String, i64> = HashMap::new();

        if path.exists() {
            let file = fs::File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            for (line_no, line) in BufReader::new(file).lines().enumerate() {
                let line = line.with_context(|| {
                    format!("failed reading line {} in {}", line_no + 1, path.display())
                })?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<FeedbackEvent>(&line) {
                    Ok(event) if Relevance::from_delta(event.relevance).is_some() => {
                        *scores.entry(event.filename).or_insert(0) += event.relevance;
                    }
                    Ok(event) => {
                        warn!(
                            "skipping feedback with relevance {} at {}:{}",
                            event.relevance,
                            path.display(),
                            line_no + 1
                        );
                    }
                    Err(err) => {
                        warn!(
                            "skipping malformed feedback at {}:{}: {err}",
                            path.display(),
                            line_no + 1
                        );
                    }
                }
            }
            debug!(documents = scores.len(), "replayed feedback log");
        }

        Ok(Self {
            scores: Mutex::new(scores),
            log: Some(path.to_path_buf()),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, i64>> {
        self.scores.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add `relevance` to `filename`'s accumulator and, for a log-backed
    /// store, append the event.
    ///
    /// # Errors
    ///
    /// Returns an error if appending to the log fails. The in-memory counter
    /// is updated regardless.
    pub fn record(&self, filename: &str, relevance: Relevance) -> Result<()> {
        *self.lock().entry(filename.to_string()).or_insert(0) += relevance.delta();

        let Some(path) = &self.log else {
            return Ok(());
        };
        let event = FeedbackEvent {
            filename: filename.to_string(),
            relevance: relevance.delta(),
            ts: Utc::now(),
        };
        append_event(path, &event)
    }

    /// Accumulated score for `filename` (0 if never rated).
    #[must_use]
    pub fn score(&self, filename: &str) -> i64 {
        self.lock().get(filename).copied().unwrap_or(0)
    }

    /// Add `score(filename) * weight` to every result and re-sort.
    pub fn adjust(&self, results: &mut [FusedResult], weight: f64) {
        {
            let scores = self.lock();
            for result in results.iter_mut() {
                if let Some(&fb) = scores.get(&result.filename) {
                    result.score += fb as f64 * weight;
                }
            }
        }
        sort_results(results);
    }
}

fn append_event(path: &Path, event: &FeedbackEvent) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut line = serde_json::to_vec(event)
        .with_context(|| format!("failed to serialize feedback for {}", event.filename))?;
    line.push(b'\n');
    file.write_all(&line)
        .with_context(|| format!("failed to append to {}", path.display()))?;
    file.flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    Ok(())
}
