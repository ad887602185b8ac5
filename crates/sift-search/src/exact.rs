//! Whole-word literal matching of the normalized query.

use crate::signal::SignalResult;
use regex::{Regex, RegexBuilder};
use sift_core::Document;
use sift_core::text::normalize;
use tracing::debug;

/// Fixed score assigned to every exact hit.
pub const EXACT_MATCH_SCORE: f64 = 100.0;

/// Compiled matcher for one query.
#[derive(Debug)]
pub struct ExactMatchFinder {
    needle: String,
    pattern: Option<Regex>,
}

impl ExactMatchFinder {
    /// Compile a word-boundary pattern from the normalized query. If the
    /// pattern cannot be built the finder degrades to substring containment.
    #[must_use]
    pub fn new(query: &str) -> Self {
        let needle = normalize(query);
        if needle.is_empty() {
            return Self {
                needle,
                pattern: None,
            };
        }

        let source = format!(r"\b{}\b", regex::escape(&needle));
        let pattern = match RegexBuilder::new(&source).case_insensitive(true).build() {
            Ok(re) => Some(re),
            Err(err) => {
                debug!("exact pattern rejected, using substring match: {err}");
                None
            }
        };

        Self { needle, pattern }
    }

    /// Whether the normalized query was empty (nothing can match).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        if self.needle.is_empty() {
            return false;
        }
        let haystack = doc.normalized_text();
        self.pattern.as_ref().map_or_else(
            || haystack.contains(&self.needle),
            |re| re.is_match(haystack),
        )
    }

    /// Every document containing the query as whole words, in input order.
    #[must_use]
    pub fn find(&self, docs: &[&Document]) -> Vec<SignalResult> {
        docs.iter()
            .filter(|doc| self.matches(doc))
            .map(|doc| SignalResult::from_document(doc, EXACT_MATCH_SCORE))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Document> {
        vec![
            Document::new("report.txt", "/report.txt", "Quarterly revenue REPORT."),
            Document::new("reporting.txt", "/reporting.txt", "reporting duties"),
            Document::new("notes.txt", "/notes.txt", "unrelated meeting notes"),
        ]
    }

    #[test]
    fn matches_whole_words_only() {
        let docs = corpus();
        let refs: Vec<&Document> = docs.iter().collect();
        let hits = ExactMatchFinder::new("report").find(&refs);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].filename, "report.txt");
        assert!((hits[0].raw_score() - EXACT_MATCH_SCORE).abs() < f64::EPSILON);
    }

    #[test]
    fn query_is_normalized_before_matching() {
        let docs = corpus();
        let refs: Vec<&Document> = docs.iter().collect();
        let hits = ExactMatchFinder::new("The Revenue, Report!").find(&refs);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn special_characters_are_literal() {
        let docs = [Document::new("c.txt", "/c.txt", "c++ and c# code")];
        let refs: Vec<&Document> = docs.iter().collect();
        // Punctuation is stripped on both sides: "c" then matches as a word.
        assert_eq!(ExactMatchFinder::new("c++").find(&refs).len(), 1);
        assert!(ExactMatchFinder::new("(unbalanced").find(&refs).is_empty());
    }

    #[test]
    fn empty_query_matches_nothing() {
        let docs = corpus();
        let refs: Vec<&Document> = docs.iter().collect();
        let finder = ExactMatchFinder::new("  the  ");
        assert!(finder.is_empty());
        assert!(finder.find(&refs).is_empty());
    }

    #[test]
    fn substring_fallback_still_matches() {
        let finder = ExactMatchFinder {
            needle: "revenue".to_string(),
            pattern: None,
        };
        let doc = Document::new("a", "a", "quarterly revenue report");
        assert!(finder.matches(&doc));
    }
}
