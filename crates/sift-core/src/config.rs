use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "SIFT_HOME";

const CONFIG_FILE: &str = "config.toml";
const CORPUS_FILE: &str = "corpus.json";
const RECENT_FILE: &str = "recent_searches.json";
const RECENT_LOCK_FILE: &str = "recent_searches.lock";
const FEEDBACK_FILE: &str = "feedback.jsonl";

/// All tunables, loaded from `<data_dir>/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiftConfig {
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub duplicates: DuplicateConfig,
    #[serde(default)]
    pub recent: RecentConfig,
    #[serde(default)]
    pub feedback: FeedbackConfig,
    #[serde(default)]
    pub semantic: SemanticConfig,
}

/// Signal weights, boost ranges and caps used by result fusion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Rescale range for fuzzy scores (default 40).
    #[serde(default = "default_fuzzy_boost")]
    pub fuzzy_boost: f64,
    /// Rescale range for TF-IDF scores (default 50).
    #[serde(default = "default_tfidf_boost")]
    pub tfidf_boost: f64,
    /// Rescale range for embedding scores (default 50).
    #[serde(default = "default_embed_boost")]
    pub embed_boost: f64,

    #[serde(default = "default_fuzzy_weight")]
    pub fuzzy_weight: f64,
    #[serde(default = "default_tfidf_weight")]
    pub tfidf_weight: f64,
    #[serde(default = "default_embed_weight")]
    pub embed_weight: f64,

    /// Base score seeded by an exact whole-word match (default 100).
    #[serde(default = "default_exact_score")]
    pub exact_score: f64,
    /// Flat bonus when the raw query occurs in a signal item's text (default 20).
    #[serde(default = "default_partial_text_bonus")]
    pub partial_text_bonus: f64,

    #[serde(default = "default_exact_filename_boost")]
    pub exact_filename_boost: f64,
    #[serde(default = "default_filename_contains_boost")]
    pub filename_contains_boost: f64,
    #[serde(default = "default_text_contains_boost")]
    pub text_contains_boost: f64,

    /// Number of fused results kept (default 5).
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Results requested from each signal backend before fusion (default 10).
    #[serde(default = "default_backend_top_n")]
    pub backend_top_n: usize,

    /// Score added per unit of accumulated feedback (default 0.1).
    #[serde(default = "default_feedback_weight")]
    pub feedback_weight: f64,
    /// Apply feedback before the result cap instead of after it.
    #[serde(default)]
    pub feedback_before_truncation: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            fuzzy_boost: default_fuzzy_boost(),
            tfidf_boost: default_tfidf_boost(),
            embed_boost: default_embed_boost(),
            fuzzy_weight: default_fuzzy_weight(),
            tfidf_weight: default_tfidf_weight(),
            embed_weight: default_embed_weight(),
            exact_score: default_exact_score(),
            partial_text_bonus: default_partial_text_bonus(),
            exact_filename_boost: default_exact_filename_boost(),
            filename_contains_boost: default_filename_contains_boost(),
            text_contains_boost: default_text_contains_boost(),
            max_results: default_max_results(),
            backend_top_n: default_backend_top_n(),
            feedback_weight: default_feedback_weight(),
            feedback_before_truncation: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateConfig {
    /// Minimum Jaccard similarity for two documents to be grouped.
    #[serde(default = "default_duplicate_threshold")]
    pub threshold: f64,
    /// Sparse-overlap pruning ratio against the smaller token set.
    #[serde(default = "default_min_overlap_ratio")]
    pub min_overlap_ratio: f64,
    /// Wall-clock budget for one scan; `0` disables the deadline.
    #[serde(default = "default_duplicate_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DuplicateConfig {
    fn default() -> Self {
        Self {
            threshold: default_duplicate_threshold(),
            min_overlap_ratio: default_min_overlap_ratio(),
            timeout_secs: default_duplicate_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentConfig {
    #[serde(default = "default_recent_max_items")]
    pub max_items: usize,
    #[serde(default = "default_recent_max_results")]
    pub max_results_per_query: usize,
}

impl Default for RecentConfig {
    fn default() -> Self {
        Self {
            max_items: default_recent_max_items(),
            max_results_per_query: default_recent_max_results(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackConfig {
    /// Persist feedback to `feedback.jsonl` so later runs see it.
    #[serde(default = "default_true")]
    pub persist: bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            persist: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Vector width of the built-in hashing embedder.
    #[serde(default = "default_semantic_dimensions")]
    pub dimensions: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            dimensions: default_semantic_dimensions(),
        }
    }
}

const fn default_true() -> bool {
    true
}

const fn default_fuzzy_boost() -> f64 {
    40.0
}

const fn default_tfidf_boost() -> f64 {
    50.0
}

const fn default_embed_boost() -> f64 {
    50.0
}

const fn default_fuzzy_weight() -> f64 {
    3.0
}

const fn default_tfidf_weight() -> f64 {
    4.0
}

const fn default_embed_weight() -> f64 {
    2.0
}

const fn default_exact_score() -> f64 {
    100.0
}

const fn default_partial_text_bonus() -> f64 {
    20.0
}

const fn default_exact_filename_boost() -> f64 {
    1000.0
}

const fn default_filename_contains_boost() -> f64 {
    800.0
}

const fn default_text_contains_boost() -> f64 {
    400.0
}

const fn default_max_results() -> usize {
    5
}

const fn default_backend_top_n() -> usize {
    10
}

const fn default_feedback_weight() -> f64 {
    0.1
}

const fn default_duplicate_threshold() -> f64 {
    0.95
}

const fn default_min_overlap_ratio() -> f64 {
    0.3
}

const fn default_duplicate_timeout_secs() -> u64 {
    30
}

const fn default_recent_max_items() -> usize {
    10
}

const fn default_recent_max_results() -> usize {
    5
}

const fn default_semantic_dimensions() -> usize {
    256
}

/// Well-known file locations inside a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the data directory: explicit override, then `SIFT_HOME`,
    /// then the OS data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if no override is given and the OS data directory
    /// cannot be determined.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self::new(path));
        }
        if let Some(home) = env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::new(PathBuf::from(home)));
        }
        let base = dirs::data_dir().context("unable to determine OS data directory")?;
        Ok(Self::new(base.join("sift")))
    }

    #[must_use]
    pub fn config(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    #[must_use]
    pub fn corpus(&self) -> PathBuf {
        self.root.join(CORPUS_FILE)
    }

    #[must_use]
    pub fn recent_searches(&self) -> PathBuf {
        self.root.join(RECENT_FILE)
    }

    #[must_use]
    pub fn recent_lock(&self) -> PathBuf {
        self.root.join(RECENT_LOCK_FILE)
    }

    #[must_use]
    pub fn feedback_log(&self) -> PathBuf {
        self.root.join(FEEDBACK_FILE)
    }
}

/// Load `config.toml` from the data directory, defaulting every missing field.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(paths: &DataPaths) -> Result<SiftConfig> {
    let path = paths.config();
    if !path.exists() {
        return Ok(SiftConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<SiftConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}
