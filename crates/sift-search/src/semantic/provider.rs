//! Embedding providers: the trait the semantic index consumes, plus a
//! dependency-free hashing fallback.

use anyhow::Result;
use sift_core::text::normalize;
use std::collections::BTreeMap;

/// Text-to-vector encoder. Implementations must return vectors of a fixed
/// width for every input.
pub trait EmbeddingProvider: Send + Sync {
    /// Short identifier used in logs and cache keys.
    fn name(&self) -> &str;

    fn dimensions(&self) -> usize;

    /// Encode many texts at once, one vector per input in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing model cannot encode the batch.
    fn batch_encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Encode a single text.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing model cannot encode the text.
    fn encode_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut out = self.batch_encode(&[text])?;
        out.pop()
            .ok_or_else(|| anyhow::anyhow!("{} returned no vector", self.name()))
    }
}

/// Feature-hashing embedder.
///
/// Normalized tokens are hashed into fixed-dimension buckets with FNV-1a and
/// weighted by term frequency, with longer terms weighted up slightly.
/// Deterministic and always available, but only captures shared vocabulary.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Create an embedder producing `dimensions`-wide vectors (at least 1).
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, term: &str) -> usize {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        for b in term.as_bytes() {
            h ^= u64::from(*b);
            h = h.wrapping_mul(0x0100_0000_01b3);
        }
        (h % self.dimensions as u64) as usize
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let normalized = normalize(text);
        let mut tf: BTreeMap<&str, f32> = BTreeMap::new();
        let mut total = 0.0_f32;
        for token in normalized.split_whitespace() {
            *tf.entry(token).or_default() += 1.0;
            total += 1.0;
        }

        let mut vec = vec![0.0_f32; self.dimensions];
        if total == 0.0 {
            return vec;
        }

        for (term, count) in &tf {
            let weight = 1.0 + (term.chars().count() as f32).ln();
            vec[self.bucket(term)] += (count / total) * weight;
        }

        let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in &mut vec {
                *v /= norm;
            }
        }
        vec
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn batch_encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }

    fn encode_one(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed(text))
    }
}
