#![forbid(unsafe_code)]
//! sift-core library.
//!
//! Document model, corpus storage and filtering, text normalization,
//! configuration and advisory locking shared by the search engine and CLI.
//!
//! # Conventions
//!
//! - **Errors**: Use `anyhow::Result` for return types; `thiserror` where
//!   callers match on variants.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod config;
pub mod corpus;
pub mod error;
pub mod lock;
pub mod model;
pub mod persist;
pub mod text;

pub use corpus::{AgeFilter, Corpus, CorpusFilter, ExtensionFilter, SizeFilter};
pub use model::Document;
