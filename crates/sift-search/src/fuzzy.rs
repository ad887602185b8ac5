//! Fuzzy ranking by best local alignment of the query inside each document.
//!
//! The similarity primitive sits behind [`PartialSimilarity`] so callers can
//! swap in another scorer. The built-in [`IndelPartialRatio`] slides the
//! shorter string across the longer one and keeps the best indel similarity
//! of any window, including windows that hang off either edge.

use crate::signal::SignalResult;
use rayon::prelude::*;
use sift_core::Document;
use sift_core::text::normalize;
use std::collections::HashSet;

/// Asymmetric string similarity in `0.0..=100.0`.
pub trait PartialSimilarity: Send + Sync {
    fn partial_similarity(&self, a: &str, b: &str) -> f64;
}

/// Partial ratio over indel (insert/delete) distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndelPartialRatio;

impl PartialSimilarity for IndelPartialRatio {
    fn partial_similarity(&self, a: &str, b: &str) -> f64 {
        partial_ratio(a, b)
    }
}

/// Indel similarity of two whole strings: `200 * lcs / (|a| + |b|)`.
#[must_use]
pub fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

/// Best [`ratio`] of the shorter string against any same-length window of
/// the longer one. Returns 0 if either string is empty.
#[must_use]
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let (needle, hay) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let m = needle.len();
    let n = hay.len();
    let alphabet: HashSet<char> = needle.iter().copied().collect();

    let mut best = 0.0_f64;
    let mut consider = |window: &[char]| {
        let score = ratio(&needle, window);
        if score > best {
            best = score;
        }
        best >= 100.0
    };

    // Windows hanging off the left edge end on a needle character.
    for end in 1..m {
        if alphabet.contains(&hay[end - 1]) && consider(&hay[..end]) {
            return 100.0;
        }
    }

    // Full windows start on a needle character.
    for start in 0..=n - m {
        if alphabet.contains(&hay[start]) && consider(&hay[start..start + m]) {
            return 100.0;
        }
    }

    // Windows hanging off the right edge start on a needle character.
    for start in (n - m + 1)..n {
        if alphabet.contains(&hay[start]) && consider(&hay[start..]) {
            return 100.0;
        }
    }

    best
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let mut row = vec![0_usize; short.len() + 1];
    for &lc in long {
        let mut diag = 0;
        for (j, &sc) in short.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if lc == sc {
                diag + 1
            } else {
                above.max(row[j])
            };
            diag = above;
        }
    }
    row[short.len()]
}

/// Ranks documents by partial similarity of normalized text.
#[derive(Debug, Clone, Default)]
pub struct FuzzyMatcher<S = IndelPartialRatio> {
    scorer: S,
}

impl<S: PartialSimilarity> FuzzyMatcher<S> {
    #[must_use]
    pub const fn with_scorer(scorer: S) -> Self {
        Self { scorer }
    }

    /// Score every document, sort descending (stable on ties so input order
    /// wins) and keep the best `top_n`.
    #[must_use]
    pub fn search(&self, query: &str, docs: &[&Document], top_n: usize) -> Vec<SignalResult> {
        if top_n == 0 {
            return Vec::new();
        }
        let needle = normalize(query);

        let mut scored: Vec<(usize, f64)> = docs
            .par_iter()
            .enumerate()
            .map(|(i, doc)| {
                (
                    i,
                    self.scorer
                        .partial_similarity(&needle, doc.normalized_text()),
                )
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_n);

        scored
            .into_iter()
            .map(|(i, score)| SignalResult::from_document(docs[i], score))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_and_contained_strings_score_100() {
        assert!((partial_ratio("report", "report") - 100.0).abs() < 1e-9);
        assert!((partial_ratio("report", "quarterly revenue report") - 100.0).abs() < 1e-9);
        assert!((partial_ratio("quarterly revenue report", "revenue") - 100.0).abs() < 1e-9);
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert!(partial_ratio("", "abc").abs() < f64::EPSILON);
        assert!(partial_ratio("abc", "").abs() < f64::EPSILON);
    }

    #[test]
    fn disjoint_alphabets_score_zero() {
        assert!(partial_ratio("xyz", "abcdef").abs() < f64::EPSILON);
    }

    #[test]
    fn near_miss_scores_high_but_below_100() {
        let score = partial_ratio("reprot", "quarterly revenue report");
        assert!(score > 60.0 && score < 100.0, "score = {score}");
    }

    #[test]
    fn edge_windows_are_considered() {
        // "abcd" overlaps the start of "cdxxxxxx" only via a partial window.
        let score = partial_ratio("abcd", "cdxxxxxx");
        assert!((score - (200.0 * 2.0 / 6.0)).abs() < 1e-9, "score = {score}");
    }

    #[test]
    fn ratio_matches_indel_formula() {
        let a: Vec<char> = "kitten".chars().collect();
        let b: Vec<char> = "sitting".chars().collect();
        // lcs("kitten", "sitting") = 4 ("ittn")
        assert!((ratio(&a, &b) - 800.0 / 13.0).abs() < 1e-9);
    }

    #[test]
    fn search_is_stable_and_truncated() {
        let docs = [
            Document::new("a.txt", "/a", "alpha"),
            Document::new("b.txt", "/b", "alpha"),
            Document::new("c.txt", "/c", "zzz"),
            Document::new("d.txt", "/d", "alpha"),
        ];
        let refs: Vec<&Document> = docs.iter().collect();
        let hits = FuzzyMatcher::<IndelPartialRatio>::default().search("Alpha!", &refs, 2);
        let names: Vec<&str> = hits.iter().map(|h| h.filename.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    struct FixedScore;

    impl PartialSimilarity for FixedScore {
        fn partial_similarity(&self, _a: &str, b: &str) -> f64 {
            b.len() as f64
        }
    }

    #[test]
    fn custom_scorer_is_used() {
        let docs = [
            Document::new("short.txt", "/s", "ab"),
            Document::new("long.txt", "/l", "abcdef"),
        ];
        let refs: Vec<&Document> = docs.iter().collect();
        let hits = FuzzyMatcher::with_scorer(FixedScore).search("q", &refs, 10);
        assert_eq!(hits[0].filename, "long.txt");
        assert!((hits[0].raw_score() - 6.0).abs() < f64::EPSILON);
    }
}
