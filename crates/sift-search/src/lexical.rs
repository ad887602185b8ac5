//! TF-IDF lexical index with cosine ranking.
//!
//! Weights follow the common smoothed formulation: raw term counts times
//! `ln((1 + n) / (1 + df)) + 1`, each document vector L2-normalized. Tokens
//! are runs of word characters at least two long, taken from the normalized
//! text. An index fitted on an empty or contentless corpus is *unfit* and
//! answers every query with an empty list.

use crate::signal::{DocRef, SignalResult};
use sift_core::Document;
use sift_core::text::normalize;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Sparse vector as `(term_id, weight)` pairs sorted by term id.
type SparseVec = Vec<(usize, f64)>;

#[derive(Debug)]
struct Fitted {
    vocab: HashMap<String, usize>,
    idf: Vec<f64>,
    vectors: Vec<SparseVec>,
    docs: Vec<DocRef>,
}

#[derive(Debug, Default)]
pub struct LexicalIndex {
    fitted: Option<Fitted>,
}

impl LexicalIndex {
    /// Build the index over `docs`. Leaves the index unfit when no document
    /// yields a token.
    #[must_use]
    pub fn fit(docs: &[Document]) -> Self {
        let tokenized: Vec<Vec<String>> = docs
            .iter()
            .map(|d| tokenize(d.normalized_text()))
            .collect();

        let mut df: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let mut seen: Vec<&str> = tokens.iter().map(String::as_str).collect();
            seen.sort_unstable();
            seen.dedup();
            for term in seen {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        if df.is_empty() {
            if !docs.is_empty() {
                warn!(documents = docs.len(), "lexical index unfit: no indexable terms");
            }
            return Self::default();
        }

        let n = docs.len() as f64;
        let mut vocab = HashMap::with_capacity(df.len());
        let mut idf = Vec::with_capacity(df.len());
        for (id, (term, count)) in df.iter().enumerate() {
            vocab.insert((*term).to_string(), id);
            idf.push(((1.0 + n) / (1.0 + *count as f64)).ln() + 1.0);
        }

        let vectors = tokenized
            .iter()
            .map(|tokens| weigh(tokens, &vocab, &idf))
            .collect();

        let docs = docs.iter().map(DocRef::of).collect();

        debug!(terms = idf.len(), "lexical index fitted");
        Self {
            fitted: Some(Fitted {
                vocab,
                idf,
                vectors,
                docs,
            }),
        }
    }

    #[must_use]
    pub const fn is_fit(&self) -> bool {
        self.fitted.is_some()
    }

    /// Top `top_k` documents by cosine similarity, similarities above 0 only.
    #[must_use]
    pub fn query(&self, text: &str, top_k: usize) -> Vec<SignalResult> {
        self.query_where(text, top_k, |_| true)
    }

    /// Like [`LexicalIndex::query`], restricted to document positions for
    /// which `keep` returns true. Ties keep fitted document order.
    pub fn query_where<F>(&self, text: &str, top_k: usize, keep: F) -> Vec<SignalResult>
    where
        F: Fn(usize) -> bool,
    {
        let Some(fitted) = &self.fitted else {
            return Vec::new();
        };
        if top_k == 0 {
            return Vec::new();
        }

        let query = weigh(&tokenize(&normalize(text)), &fitted.vocab, &fitted.idf);
        if query.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f64)> = fitted
            .vectors
            .iter()
            .enumerate()
            .filter(|(i, _)| keep(*i))
            .map(|(i, v)| (i, sparse_dot(&query, v)))
            .filter(|(_, sim)| *sim > 0.0)
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(i, sim)| fitted.docs[i].hit(sim))
            .collect()
    }
}

fn tokenize(normalized: &str) -> Vec<String> {
    normalized
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().nth(1).is_some())
        .map(str::to_string)
        .collect()
}

/// TF-IDF weights of `tokens`, L2-normalized. Unknown terms are dropped.
fn weigh(tokens: &[String], vocab: &HashMap<String, usize>, idf: &[f64]) -> SparseVec {
    let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
    for token in tokens {
        if let Some(&id) = vocab.get(token) {
            *counts.entry(id).or_insert(0.0) += 1.0;
        }
    }

    let mut vec: SparseVec = counts
        .into_iter()
        .map(|(id, tf)| (id, tf * idf[id]))
        .collect();

    let norm = vec.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, w) in &mut vec {
            *w /= norm;
        }
    }
    vec
}

fn sparse_dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<Document> {
        vec![
            Document::new("report.txt", "/report.txt", "quarterly revenue report"),
            Document::new("notes.txt", "/notes.txt", "unrelated meeting notes"),
            Document::new("budget.txt", "/budget.txt", "revenue forecast and budget"),
        ]
    }

    #[test]
    fn empty_corpus_is_unfit() {
        let index = LexicalIndex::fit(&[]);
        assert!(!index.is_fit());
        assert!(index.query("anything", 10).is_empty());
    }

    #[test]
    fn stop_word_only_corpus_is_unfit() {
        let index = LexicalIndex::fit(&[Document::new("a", "a", "the and of")]);
        assert!(!index.is_fit());
        assert!(index.query("the", 10).is_empty());
    }

    #[test]
    fn self_similarity_is_one() {
        let docs = docs();
        let index = LexicalIndex::fit(&docs);
        for doc in &docs {
            let hits = index.query(&doc.text, 1);
            assert_eq!(hits[0].filename, doc.filename);
            assert!((hits[0].raw_score() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn unseen_terms_contribute_nothing() {
        let index = LexicalIndex::fit(&docs());
        assert!(index.query("zebra xylophone", 10).is_empty());
        let hits = index.query("revenue zebra", 10);
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn ranks_descending_and_truncates() {
        let index = LexicalIndex::fit(&docs());
        let hits = index.query("quarterly revenue", 10);
        assert_eq!(hits[0].filename, "report.txt");
        assert!(hits.windows(2).all(|w| w[0].raw_score() >= w[1].raw_score()));
        assert_eq!(index.query("revenue", 1).len(), 1);
    }

    #[test]
    fn ties_break_by_document_order() {
        let docs = vec![
            Document::new("b.txt", "/b", "alpha beta"),
            Document::new("a.txt", "/a", "alpha beta"),
        ];
        let hits = LexicalIndex::fit(&docs).query("alpha", 10);
        assert_eq!(hits[0].filename, "b.txt");
        assert_eq!(hits[1].filename, "a.txt");
    }

    #[test]
    fn query_where_restricts_positions() {
        let index = LexicalIndex::fit(&docs());
        let hits = index.query_where("revenue", 10, |i| i != 0);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].filename, "budget.txt");
    }

    #[test]
    fn single_char_tokens_are_ignored() {
        assert_eq!(tokenize("x yz 9 10"), vec!["yz".to_string(), "10".to_string()]);
    }
}
