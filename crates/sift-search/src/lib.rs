#![forbid(unsafe_code)]
//! sift-search library.
//!
//! Exact, fuzzy, TF-IDF and embedding signals fused into one ranking, plus
//! Jaccard duplicate grouping and the recent-search cache.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types; backends that cannot
//!   answer return an empty list and log why.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod duplicates;
pub mod engine;
pub mod exact;
pub mod feedback;
pub mod fusion;
pub mod fuzzy;
pub mod lexical;
pub mod normalize;
pub mod recent;
pub mod semantic;
pub mod signal;

pub use duplicates::{DuplicateClusterer, DuplicateGroup, DuplicateJob, DuplicateScan};
pub use engine::SearchEngine;
pub use feedback::{FeedbackStore, Relevance};
pub use fusion::{FusedResult, MatchInfo};
pub use recent::RecentSearchCache;
