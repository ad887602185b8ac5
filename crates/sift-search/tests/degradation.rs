//! Graceful degradation: every unavailable backend contributes nothing and
//! the query still answers.
//!
//! # Scenarios covered
//!
//! 1. **No embedding provider**: lexical, fuzzy and exact signals still rank.
//! 2. **Provider that errors**: semantic index stays unfit, search proceeds.
//! 3. **Contentless corpus**: both indexes are unfit, no panic.
//! 4. **Regex metacharacters** in the query fall back to substring matching.
//! 5. **Empty corpus**.

use anyhow::{Result, bail};
use sift_core::config::SiftConfig;
use sift_core::{Corpus, CorpusFilter, Document};
use sift_search::semantic::EmbeddingProvider;
use sift_search::{MatchInfo, SearchEngine};
use std::sync::Arc;

struct Offline;

impl EmbeddingProvider for Offline {
    fn name(&self) -> &str {
        "offline"
    }

    fn dimensions(&self) -> usize {
        8
    }

    fn batch_encode(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        bail!("provider offline")
    }
}

fn corpus() -> Corpus {
    Corpus::new(vec![
        Document::new("invoice.pdf", "/a/invoice.pdf", "Invoice for consulting services"),
        Document::new("cv.docx", "/a/cv.docx", "Curriculum vitae software engineer"),
        Document::new("c++ notes.txt", "/a/c++ notes.txt", "templates in c++ are powerful"),
    ])
}

#[test]
fn search_without_provider() {
    let engine = SearchEngine::new(corpus(), &SiftConfig::default(), None);
    assert!(!engine.is_semantic_available());

    let results = engine.search("consulting", &CorpusFilter::default(), None);
    assert_eq!(results[0].filename, "invoice.pdf");
    assert_eq!(results[0].match_info, MatchInfo::TextContains);
}

#[test]
fn failing_provider_degrades_to_other_signals() {
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(Offline);
    let engine = SearchEngine::new(corpus(), &SiftConfig::default(), Some(provider));
    assert!(!engine.is_semantic_available());

    let results = engine.search("engineer", &CorpusFilter::default(), None);
    assert_eq!(results[0].filename, "cv.docx");
}

#[test]
fn contentless_corpus_does_not_panic() {
    let corpus = Corpus::new(vec![
        Document::new("a.txt", "/a.txt", ""),
        Document::new("b.txt", "/b.txt", "the and of"),
    ]);
    let engine = SearchEngine::new(corpus, &SiftConfig::default(), None);
    let results = engine.search("a", &CorpusFilter::default(), None);
    assert!(results.iter().all(|r| r.score.is_finite()));
}

#[test]
fn metacharacters_in_query_are_literal() {
    let engine = SearchEngine::new(corpus(), &SiftConfig::default(), None);
    for query in ["c++", "(unclosed", "[a-z", "*", "\\"] {
        let results = engine.search(query, &CorpusFilter::default(), None);
        assert!(results.len() <= 5, "query {query:?}");
    }
    let results = engine.search("c++", &CorpusFilter::default(), None);
    assert_eq!(results[0].filename, "c++ notes.txt");
}

#[test]
fn empty_corpus_answers_empty() {
    let engine = SearchEngine::new(Corpus::default(), &SiftConfig::default(), None);
    assert!(engine.search("anything", &CorpusFilter::default(), None).is_empty());
}
