//! Dense-vector index over provider embeddings.

use super::provider::EmbeddingProvider;
use crate::signal::{DocRef, SignalResult};
use sha2::{Digest, Sha256};
use sift_core::Document;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Embeddings keyed by SHA-256 of the source text, scoped to one provider.
///
/// Kept across refits so unchanged documents are not re-encoded.
#[derive(Debug, Default)]
pub struct EmbeddingCache {
    provider: String,
    entries: HashMap<[u8; 32], Vec<f32>>,
}

impl EmbeddingCache {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn key(text: &str) -> [u8; 32] {
        Sha256::digest(text.as_bytes()).into()
    }

    fn bind(&mut self, provider: &str) {
        if self.provider != provider {
            self.entries.clear();
            self.provider = provider.to_string();
        }
    }
}

struct Fitted {
    provider: Arc<dyn EmbeddingProvider>,
    vectors: Vec<Vec<f32>>,
    docs: Vec<DocRef>,
}

/// Cosine-similarity index over L2-normalized document embeddings.
///
/// Without a provider, or when encoding fails, the index is unfit for this
/// corpus load and every query returns an empty list.
#[derive(Default)]
pub struct SemanticIndex {
    fitted: Option<Fitted>,
}

impl std::fmt::Debug for SemanticIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticIndex")
            .field("provider", &self.fitted.as_ref().map(|s| s.provider.name()))
            .field("documents", &self.fitted.as_ref().map_or(0, |s| s.docs.len()))
            .finish()
    }
}

impl SemanticIndex {
    /// Fit with a throwaway cache.
    #[must_use]
    pub fn fit(docs: &[Document], provider: Option<Arc<dyn EmbeddingProvider>>) -> Self {
        Self::fit_cached(docs, provider, &mut EmbeddingCache::default())
    }

    /// Embed every document text (reusing `cache` hits) and normalize.
    #[must_use]
    pub fn fit_cached(
        docs: &[Document],
        provider: Option<Arc<dyn EmbeddingProvider>>,
        cache: &mut EmbeddingCache,
    ) -> Self {
        let Some(provider) = provider else {
            warn!("semantic index unfit: no embedding provider");
            return Self::default();
        };
        if docs.is_empty() {
            return Self::default();
        }

        cache.bind(provider.name());

        let keys: Vec<[u8; 32]> = docs.iter().map(|d| EmbeddingCache::key(&d.text)).collect();
        let mut queued: HashSet<[u8; 32]> = HashSet::new();
        let mut missing: Vec<(usize, &str)> = Vec::new();
        for (i, key) in keys.iter().enumerate() {
            if !cache.entries.contains_key(key) && queued.insert(*key) {
                missing.push((i, docs[i].text.as_str()));
            }
        }

        if !missing.is_empty() {
            let texts: Vec<&str> = missing.iter().map(|(_, t)| *t).collect();
            match provider.batch_encode(&texts) {
                Ok(vectors) if vectors.len() == texts.len() => {
                    for ((i, _), v) in missing.iter().zip(vectors) {
                        cache.entries.insert(keys[*i], l2_normalize(v));
                    }
                }
                Ok(vectors) => {
                    warn!(
                        provider = provider.name(),
                        expected = texts.len(),
                        got = vectors.len(),
                        "semantic index unfit: provider returned wrong batch size"
                    );
                    return Self::default();
                }
                Err(err) => {
                    warn!(provider = provider.name(), "semantic index unfit: {err:#}");
                    return Self::default();
                }
            }
        }

        let vectors: Vec<Vec<f32>> = keys
            .iter()
            .filter_map(|k| cache.entries.get(k).cloned())
            .collect();
        let width = provider.dimensions();
        if vectors.len() != docs.len() || vectors.iter().any(|v| v.len() != width) {
            warn!(
                provider = provider.name(),
                width, "semantic index unfit: embedding width mismatch"
            );
            return Self::default();
        }

        debug!(
            provider = provider.name(),
            documents = docs.len(),
            encoded = missing.len(),
            "semantic index fitted"
        );

        Self {
            fitted: Some(Fitted {
                provider,
                vectors,
                docs: docs.iter().map(DocRef::of).collect(),
            }),
        }
    }

    #[must_use]
    pub const fn is_fit(&self) -> bool {
        self.fitted.is_some()
    }

    #[must_use]
    pub fn query(&self, text: &str, top_k: usize) -> Vec<SignalResult> {
        self.query_where(text, top_k, |_| true)
    }

    /// Top `top_k` documents by cosine similarity among positions accepted by
    /// `keep`; similarities above 0 only, ties in document order.
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

        let query = match fitted.provider.encode_one(text) {
            Ok(v) if v.len() == fitted.provider.dimensions() => l2_normalize(v),
            Ok(v) => {
                warn!(got = v.len(), "semantic query skipped: embedding width mismatch");
                return Vec::new();
            }
            Err(err) => {
                warn!("semantic query skipped: {err:#}");
                return Vec::new();
            }
        };

        let mut scored: Vec<(usize, f64)> = fitted
            .vectors
            .iter()
            .enumerate()
            .filter(|(i, _)| keep(*i))
            .map(|(i, v)| (i, f64::from(dot(&query, v))))
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

fn l2_normalize(mut v: Vec<f32>) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = if norm == 0.0 { 1.0 } else { norm };
    for x in &mut v {
        *x /= denom;
    }
    v
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::provider::HashingEmbedder;
    use anyhow::{Result, bail};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn docs() -> Vec<Document> {
        vec![
            Document::new("report.txt", "/report.txt", "quarterly revenue report"),
            Document::new("notes.txt", "/notes.txt", "unrelated meeting notes"),
        ]
    }

    fn hashing() -> Option<Arc<dyn EmbeddingProvider>> {
        Some(Arc::new(HashingEmbedder::new(128)))
    }

    struct Failing;

    impl EmbeddingProvider for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn dimensions(&self) -> usize {
            4
        }
        fn batch_encode(&self, _texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            bail!("model not loaded")
        }
    }

    struct Counting {
        inner: HashingEmbedder,
        encoded: AtomicUsize,
    }

    impl EmbeddingProvider for Counting {
        fn name(&self) -> &str {
            "counting"
        }
        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }
        fn batch_encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            self.encoded.fetch_add(texts.len(), Ordering::SeqCst);
            self.inner.batch_encode(texts)
        }
    }

    #[test]
    fn no_provider_is_unfit() {
        let index = SemanticIndex::fit(&docs(), None);
        assert!(!index.is_fit());
        assert!(index.query("report", 10).is_empty());
    }

    #[test]
    fn failing_provider_is_unfit() {
        let index = SemanticIndex::fit(&docs(), Some(Arc::new(Failing)));
        assert!(!index.is_fit());
        assert!(index.query("report", 10).is_empty());
    }

    #[test]
    fn ranks_by_shared_vocabulary() {
        let index = SemanticIndex::fit(&docs(), hashing());
        let hits = index.query("revenue report", 10);
        assert_eq!(hits[0].filename, "report.txt");
        let self_hit = index.query("quarterly revenue report", 1);
        assert!((self_hit[0].raw_score() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn zero_vectors_do_not_divide_by_zero() {
        let v = l2_normalize(vec![0.0, 0.0]);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn cache_skips_unchanged_documents() {
        let provider = Arc::new(Counting {
            inner: HashingEmbedder::new(64),
            encoded: AtomicUsize::new(0),
        });
        let dyn_provider: Arc<dyn EmbeddingProvider> = provider.clone();
        let mut cache = EmbeddingCache::default();

        let mut corpus = docs();
        let _ = SemanticIndex::fit_cached(&corpus, Some(dyn_provider.clone()), &mut cache);
        assert_eq!(provider.encoded.load(Ordering::SeqCst), 2);

        corpus.push(Document::new("new.txt", "/new.txt", "fresh content"));
        corpus.push(Document::new("copy.txt", "/copy.txt", "fresh content"));
        let index = SemanticIndex::fit_cached(&corpus, Some(dyn_provider), &mut cache);
        assert!(index.is_fit());
        assert_eq!(provider.encoded.load(Ordering::SeqCst), 3);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn query_where_restricts_positions() {
        let index = SemanticIndex::fit(&docs(), hashing());
        let hits = index.query_where("quarterly revenue report", 10, |i| i == 1);
        assert!(hits.iter().all(|h| h.filename == "notes.txt"));
    }
}
