//! Fusion of exact, fuzzy, lexical and semantic signals into one ranked list.
//!
//! Each backend scores on its own scale. [`scoring::fuse`] rescales the
//! scored lists into fixed boost ranges, weights and sums them per filename,
//! adds a content boost for how the query relates to the filename or text,
//! then caps the list and applies learned feedback.

pub mod scoring;

pub use scoring::{FusionInputs, fuse};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// How the query relates to a result, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchInfo {
    /// Query equals the filename stem (case-insensitive).
    ExactFilename,
    /// Query is a substring of the filename stem.
    FilenameContains,
    /// Query is a substring of the document text.
    TextContains,
    /// Ranked on signal similarity alone.
    FuzzySemantic,
}

impl MatchInfo {
    /// Stable snake_case identifier, as serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExactFilename => "exact_filename",
            Self::FilenameContains => "filename_contains",
            Self::TextContains => "text_contains",
            Self::FuzzySemantic => "fuzzy_semantic",
        }
    }
}

impl fmt::Display for MatchInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ExactFilename => "Exact filename",
            Self::FilenameContains => "Filename contains",
            Self::TextContains => "Text contains",
            Self::FuzzySemantic => "Fuzzy / semantic match",
        };
        f.write_str(label)
    }
}

/// Raw (pre-rescale) backend scores for one filename; 0 when a backend did
/// not return it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalScores {
    #[serde(default)]
    pub fuzzy: f64,
    #[serde(default)]
    pub tfidf: f64,
    #[serde(default)]
    pub embed: f64,
}

/// One fused search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    pub filename: String,
    pub path: String,
    pub text: String,
    /// Accumulated signal contributions before the content boost.
    pub base_score: f64,
    /// Content boost from [`MatchInfo`].
    pub boost: f64,
    /// `base_score + boost`, plus any feedback adjustment.
    pub score: f64,
    pub match_info: MatchInfo,
    pub per_signal_scores: SignalScores,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

/// Ranking order: score descending, then filename ascending.
#[must_use]
pub fn compare_results(a: &FusedResult, b: &FusedResult) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.filename.cmp(&b.filename))
}

/// Sort in place by [`compare_results`].
pub fn sort_results(results: &mut [FusedResult]) {
    results.sort_by(compare_results);
}
