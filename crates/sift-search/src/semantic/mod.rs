//! Semantic ranking over embeddings from a pluggable provider.

mod index;
pub mod provider;

pub use index::{EmbeddingCache, SemanticIndex};
pub use provider::{EmbeddingProvider, HashingEmbedder};
