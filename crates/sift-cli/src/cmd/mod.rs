//! Command handlers for the `sift` binary.

pub mod dup;
pub mod feedback;
pub mod recent;
pub mod search;
pub mod tag;

use crate::output::{CliError, OutputMode, render_error};
use anyhow::Result;
use clap::Args;
use sift_core::config::{DataPaths, SiftConfig, load_config};
use sift_core::error::ErrorCode;
use sift_core::{AgeFilter, Corpus, CorpusFilter, ExtensionFilter, SizeFilter};
use sift_search::FeedbackStore;
use sift_search::semantic::{EmbeddingProvider, HashingEmbedder};
use std::path::PathBuf;
use std::sync::Arc;

/// Resolved locations and settings shared by every command.
#[derive(Debug)]
pub struct Context {
    pub paths: DataPaths,
    pub corpus_path: PathBuf,
    pub config: SiftConfig,
    pub output: OutputMode,
}

impl Context {
    /// Resolve the data directory and load `config.toml`.
    pub fn load(
        data_dir: Option<PathBuf>,
        corpus: Option<PathBuf>,
        output: OutputMode,
    ) -> Result<Self> {
        let paths = DataPaths::resolve(data_dir.as_deref())?;
        let config = match load_config(&paths) {
            Ok(config) => config,
            Err(err) => {
                render_error(
                    output,
                    &CliError::from_code(ErrorCode::ConfigParseError, format!("{err:#}")),
                )?;
                return Err(err);
            }
        };
        let corpus_path = corpus.unwrap_or_else(|| paths.corpus());
        Ok(Self {
            paths,
            corpus_path,
            config,
            output,
        })
    }

    /// Load the corpus, reporting a missing or malformed file.
    pub fn corpus(&self) -> Result<Corpus> {
        if !self.corpus_path.exists() {
            render_error(
                self.output,
                &CliError::from_code(
                    ErrorCode::CorpusNotFound,
                    format!("no corpus at {}", self.corpus_path.display()),
                ),
            )?;
            anyhow::bail!("corpus not found: {}", self.corpus_path.display());
        }
        match Corpus::load_json(&self.corpus_path) {
            Ok(corpus) => Ok(corpus),
            Err(err) => {
                render_error(
                    self.output,
                    &CliError::from_code(ErrorCode::CorpusParseError, format!("{err:#}")),
                )?;
                Err(err)
            }
        }
    }

    /// The configured embedding provider, if semantic ranking is enabled.
    pub fn provider(&self) -> Option<Arc<dyn EmbeddingProvider>> {
        if !self.config.semantic.enabled {
            return None;
        }
        Some(Arc::new(HashingEmbedder::new(self.config.semantic.dimensions)))
    }

    /// Feedback backed by the data directory's log, or in memory when
    /// persistence is disabled.
    pub fn feedback(&self) -> Result<FeedbackStore> {
        if self.config.feedback.persist {
            FeedbackStore::open(&self.paths.feedback_log())
        } else {
            Ok(FeedbackStore::in_memory())
        }
    }
}

/// Corpus filter flags shared by `search` and `dup`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// File type: `all`, `images`, or an extension such as `.pdf`.
    #[arg(long, value_name = "EXT")]
    pub ext: Option<ExtensionFilter>,

    /// Age window: `any`, `24h`, `7d`, `30d`, or `older`.
    #[arg(long, value_name = "AGE")]
    pub since: Option<AgeFilter>,

    /// Size band: `any`, `small` (<1MB), `medium` (1-10MB), or `large` (>10MB).
    #[arg(long, value_name = "SIZE")]
    pub size: Option<SizeFilter>,

    /// Only documents carrying this tag.
    #[arg(long)]
    pub tag: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> CorpusFilter {
        CorpusFilter {
            extension: self.ext.clone().unwrap_or_default(),
            age: self.since.unwrap_or_default(),
            size: self.size.unwrap_or_default(),
            tag: self.tag.clone().filter(|t| !t.trim().is_empty()),
        }
    }
}
