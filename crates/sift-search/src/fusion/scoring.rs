//! Weighted score fusion with content boosts.
//!
//! # Algorithm Overview
//!
//! 1. Rescale the fuzzy, TF-IDF and embedding lists independently with
//!    [`rescale`] into their boost ranges.
//! 2. Seed a filename-keyed accumulator with a fixed base score for every
//!    exact match.
//! 3. For each rescaled item add `scaled * weight`, plus a flat partial-text
//!    bonus when the trimmed, lowercased query occurs in the item's text.
//!    Contributions accumulate; a later signal never overrides an earlier one.
//! 4. Attach a content boost per entry:
//!
//! | Relation to query                    | Boost | [`MatchInfo`]        |
//! |--------------------------------------|-------|----------------------|
//! | filename stem equals query           | 1000  | `ExactFilename`      |
//! | filename stem contains query         | 800   | `FilenameContains`   |
//! | text contains query                  | 400   | `TextContains`       |
//! | otherwise                            | 0     | `FuzzySemantic`      |
//!
//! 5. Sort by score descending (filename ascending on ties) and keep the top
//!    `max_results`.
//! 6. Add `feedback * feedback_weight` and re-sort.
//!
//! Because the cap comes before feedback, feedback cannot promote an item that
//! missed the cap. Setting `feedback_before_truncation` swaps steps 5 and 6.
//!
//! All constants come from [`FusionConfig`].

use super::{FusedResult, MatchInfo, SignalScores, sort_results};
use crate::feedback::FeedbackStore;
use crate::normalize::rescale;
use crate::signal::SignalResult;
use sift_core::Document;
use sift_core::config::FusionConfig;
use sift_core::model::filename_stem;
use std::collections::{BTreeMap, HashMap};

/// The four per-backend lists for one query.
#[derive(Debug, Clone, Default)]
pub struct FusionInputs {
    pub exact: Vec<SignalResult>,
    pub fuzzy: Vec<SignalResult>,
    pub tfidf: Vec<SignalResult>,
    pub embed: Vec<SignalResult>,
}

#[derive(Debug)]
struct Entry {
    path: String,
    text: String,
    score: f64,
}

/// Fuse `inputs` for `query` into at most `config.max_results` results.
///
/// `docs` is the corpus slice the query ran against; it supplies tags.
/// Passing no feedback store skips step 6.
#[must_use]
pub fn fuse(
    query: &str,
    inputs: &FusionInputs,
    docs: &[&Document],
    config: &FusionConfig,
    feedback: Option<&FeedbackStore>,
) -> Vec<FusedResult> {
    let q = query.trim().to_lowercase();

    // Step 1
    let weighted = [
        (&inputs.fuzzy, config.fuzzy_boost, config.fuzzy_weight),
        (&inputs.tfidf, config.tfidf_boost, config.tfidf_weight),
        (&inputs.embed, config.embed_boost, config.embed_weight),
    ];

    // Step 2
    let mut acc: BTreeMap<String, Entry> = BTreeMap::new();
    for item in inputs.exact.iter().filter(|i| !i.filename.is_empty()) {
        acc.entry(item.filename.clone()).or_insert_with(|| Entry {
            path: item.path.clone(),
            text: item.text.clone(),
            score: config.exact_score,
        });
    }

    // Step 3
    for (list, boost, weight) in weighted {
        let raw: Vec<f64> = list.iter().map(SignalResult::raw_score).collect();
        let scaled = rescale(&raw, boost);

        for (item, scaled) in list.iter().zip(scaled) {
            if item.filename.is_empty() {
                continue;
            }
            let mut contribution = scaled * weight;
            if !q.is_empty() && item.text.to_lowercase().contains(&q) {
                contribution += config.partial_text_bonus;
            }
            acc.entry(item.filename.clone())
                .and_modify(|e| e.score += contribution)
                .or_insert_with(|| Entry {
                    path: item.path.clone(),
                    text: item.text.clone(),
                    score: contribution,
                });
        }
    }

    // Step 4
    let fuzzy_raw = raw_by_filename(&inputs.fuzzy);
    let tfidf_raw = raw_by_filename(&inputs.tfidf);
    let embed_raw = raw_by_filename(&inputs.embed);

    let mut by_filename: HashMap<&str, &Document> = HashMap::with_capacity(docs.len());
    for doc in docs {
        by_filename.entry(doc.filename.as_str()).or_insert(*doc);
    }

    let mut results: Vec<FusedResult> = acc
        .into_iter()
        .map(|(filename, entry)| {
            let (match_info, boost) = content_boost(&q, &filename, &entry.text, config);
            let per_signal_scores = SignalScores {
                fuzzy: fuzzy_raw.get(filename.as_str()).copied().unwrap_or(0.0),
                tfidf: tfidf_raw.get(filename.as_str()).copied().unwrap_or(0.0),
                embed: embed_raw.get(filename.as_str()).copied().unwrap_or(0.0),
            };
            let tags = by_filename
                .get(filename.as_str())
                .map(|d| d.tags.clone())
                .unwrap_or_default();

            FusedResult {
                path: entry.path,
                text: entry.text,
                base_score: entry.score,
                boost,
                score: entry.score + boost,
                match_info,
                per_signal_scores,
                tags,
                filename,
            }
        })
        .collect();

    // Steps 5 and 6
    sort_results(&mut results);
    if config.feedback_before_truncation {
        if let Some(store) = feedback {
            store.adjust(&mut results, config.feedback_weight);
        }
        results.truncate(config.max_results);
    } else {
        results.truncate(config.max_results);
        if let Some(store) = feedback {
            store.adjust(&mut results, config.feedback_weight);
        }
    }

    results
}

/// Classify how `q` (already trimmed and lowercased) relates to a result.
#[must_use]
pub fn content_boost(q: &str, filename: &str, text: &str, config: &FusionConfig) -> (MatchInfo, f64) {
    if q.is_empty() {
        return (MatchInfo::FuzzySemantic, 0.0);
    }

    let filename = filename.to_lowercase();
    let stem = filename_stem(&filename);
    if stem == q {
        (MatchInfo::ExactFilename, config.exact_filename_boost)
    } else if stem.contains(q) {
        (MatchInfo::FilenameContains, config.filename_contains_boost)
    } else if text.to_lowercase().contains(q) {
        (MatchInfo::TextContains, config.text_contains_boost)
    } else {
        (MatchInfo::FuzzySemantic, 0.0)
    }
}

/// First (best-ranked) raw score per filename.
fn raw_by_filename(list: &[SignalResult]) -> HashMap<&str, f64> {
    let mut out = HashMap::with_capacity(list.len());
    for item in list {
        out.entry(item.filename.as_str()).or_insert_with(|| item.raw_score());
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
