//! Query orchestration over a loaded corpus.
//!
//! The engine fits the lexical and semantic indexes once per corpus load.
//! Each search then runs against the filtered selection:
//! - exact matching runs first on the calling thread
//! - fuzzy, lexical and semantic scoring run in parallel
//! - a backend that is unfit or fails contributes an empty list
//!
//! The four lists are fused and, when a feedback store is given, adjusted by
//! learned relevance.

use crate::duplicates::{DuplicateClusterer, DuplicateJob};
use crate::exact::ExactMatchFinder;
use crate::feedback::FeedbackStore;
use crate::fusion::{FusedResult, FusionInputs, fuse};
use crate::fuzzy::FuzzyMatcher;
use crate::lexical::LexicalIndex;
use crate::semantic::{EmbeddingCache, EmbeddingProvider, SemanticIndex};
use crate::signal::{Signal, SignalResult};
use chrono::{DateTime, Utc};
use sift_core::config::{DuplicateConfig, SiftConfig};
use sift_core::{Corpus, CorpusFilter, Document};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug)]
pub struct SearchEngine {
    corpus: Corpus,
    config: SiftConfig,
    fuzzy: FuzzyMatcher,
    lexical: LexicalIndex,
    semantic: SemanticIndex,
}

impl SearchEngine {
    /// Fit indexes over `corpus`. Without a provider the semantic signal is
    /// disabled for this engine.
    #[must_use]
    pub fn new(
        corpus: Corpus,
        config: &SiftConfig,
        provider: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Self {
        Self::with_cache(corpus, config, provider, &mut EmbeddingCache::default())
    }

    /// Like [`SearchEngine::new`], reusing embeddings from `cache`.
    #[must_use]
    pub fn with_cache(
        corpus: Corpus,
        config: &SiftConfig,
        provider: Option<Arc<dyn EmbeddingProvider>>,
        cache: &mut EmbeddingCache,
    ) -> Self {
        let lexical = LexicalIndex::fit(corpus.documents());
        let semantic = SemanticIndex::fit_cached(corpus.documents(), provider, cache);
        info!(
            documents = corpus.len(),
            lexical = lexical.is_fit(),
            semantic = semantic.is_fit(),
            "search engine ready"
        );

        Self {
            corpus,
            config: config.clone(),
            fuzzy: FuzzyMatcher::default(),
            lexical,
            semantic,
        }
    }

    #[must_use]
    pub const fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    #[must_use]
    pub const fn is_semantic_available(&self) -> bool {
        self.semantic.is_fit()
    }

    /// Ranked results for `query` over documents accepted by `filter`.
    #[must_use]
    pub fn search(
        &self,
        query: &str,
        filter: &CorpusFilter,
        feedback: Option<&FeedbackStore>,
    ) -> Vec<FusedResult> {
        self.search_at(query, filter, feedback, Utc::now())
    }

    /// [`SearchEngine::search`] with an explicit clock for age filters.
    #[must_use]
    pub fn search_at(
        &self,
        query: &str,
        filter: &CorpusFilter,
        feedback: Option<&FeedbackStore>,
        now: DateTime<Utc>,
    ) -> Vec<FusedResult> {
        if query.trim().is_empty() {
            return Vec::new();
        }

        let selection = self.corpus.select(filter, now);
        let docs: Vec<&Document> = selection
            .iter()
            .map(|&i| &self.corpus.documents()[i])
            .collect();
        if docs.is_empty() {
            debug!("no documents pass the filter");
            return Vec::new();
        }

        let mut allowed = vec![false; self.corpus.len()];
        for &i in &selection {
            allowed[i] = true;
        }
        let keep = |i: usize| allowed[i];
        let top_n = self.config.fusion.backend_top_n;

        let exact = ExactMatchFinder::new(query).find(&docs);
        let (fuzzy, (tfidf, embed)) = rayon::join(
            || self.fuzzy.search(query, &docs, top_n),
            || {
                rayon::join(
                    || self.lexical.query_where(query, top_n, keep),
                    || self.semantic.query_where(query, top_n, keep),
                )
            },
        );

        let inputs = FusionInputs {
            exact,
            fuzzy,
            tfidf,
            embed,
        };
        log_signals(&inputs);

        fuse(query, &inputs, &docs, &self.config.fusion, feedback)
    }

    /// Start a duplicate scan over the filtered documents that mention
    /// `query` (all of them when `query` is blank).
    #[must_use]
    pub fn duplicates(
        &self,
        query: &str,
        filter: &CorpusFilter,
        config: &DuplicateConfig,
    ) -> DuplicateJob {
        let selection = self.corpus.select(filter, Utc::now());
        let narrowed = self.corpus.narrow_for_duplicates(&selection, query);
        let documents: Vec<Document> = narrowed
            .iter()
            .map(|&i| self.corpus.documents()[i].clone())
            .collect();

        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));
        DuplicateJob::spawn(documents, DuplicateClusterer::new(config), timeout)
    }
}

fn log_signals(inputs: &FusionInputs) {
    let lists: [(Signal, &[SignalResult]); 4] = [
        (Signal::Exact, &inputs.exact),
        (Signal::Fuzzy, &inputs.fuzzy),
        (Signal::Tfidf, &inputs.tfidf),
        (Signal::Embed, &inputs.embed),
    ];
    for (signal, hits) in lists {
        debug!(signal = signal.as_str(), hits = hits.len(), "signal finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::MatchInfo;
    use crate::semantic::HashingEmbedder;
    use sift_core::ExtensionFilter;

    fn corpus() -> Corpus {
        Corpus::new(vec![
            Document::new("report.txt", "/docs/report.txt", "Quarterly revenue report"),
            Document::new("notes.txt", "/docs/notes.txt", "Meeting notes about the report"),
            Document::new("recipe.md", "/docs/recipe.md", "Flour sugar eggs butter"),
        ])
    }

    fn engine(provider: bool) -> SearchEngine {
        let provider: Option<Arc<dyn EmbeddingProvider>> = if provider {
            Some(Arc::new(HashingEmbedder::default()))
        } else {
            None
        };
        SearchEngine::new(corpus(), &SiftConfig::default(), provider)
    }

    #[test]
    fn blank_query_returns_nothing() {
        assert!(engine(true).search("  ", &CorpusFilter::default(), None).is_empty());
    }

    #[test]
    fn filename_match_ranks_first() {
        let results = engine(true).search("report", &CorpusFilter::default(), None);
        assert_eq!(results[0].filename, "report.txt");
        assert_eq!(results[0].match_info, MatchInfo::ExactFilename);
        assert_eq!(results[1].filename, "notes.txt");
        assert_eq!(results[1].match_info, MatchInfo::TextContains);
    }

    #[test]
    fn filter_restricts_every_signal() {
        let filter = CorpusFilter {
            extension: ExtensionFilter::Suffix(".md".to_string()),
            ..CorpusFilter::default()
        };
        let results = engine(true).search("report", &filter, None);
        assert!(results.iter().all(|r| r.filename == "recipe.md"));
    }

    #[test]
    fn works_without_semantic_provider() {
        let engine = engine(false);
        assert!(!engine.is_semantic_available());
        let results = engine.search("revenue", &CorpusFilter::default(), None);
        assert_eq!(results[0].filename, "report.txt");
        assert!(results.iter().all(|r| r.per_signal_scores.embed.abs() < f64::EPSILON));
    }

    #[test]
    fn duplicate_job_uses_narrowed_selection() {
        let corpus = Corpus::new(vec![
            Document::new("a.txt", "/a.txt", "alpha beta gamma delta"),
            Document::new("b.txt", "/b.txt", "alpha beta gamma delta"),
            Document::new("c.txt", "/c.txt", "unrelated words only"),
            Document::new("d.txt", "/d.txt", "unrelated words only"),
        ]);
        let engine = SearchEngine::new(corpus, &SiftConfig::default(), None);

        let scan = engine
            .duplicates("gamma", &CorpusFilter::default(), &DuplicateConfig::default())
            .join()
            .expect("scan");
        assert_eq!(scan.documents.len(), 2);
        assert_eq!(scan.groups.len(), 1);

        let all = engine
            .duplicates("", &CorpusFilter::default(), &DuplicateConfig::default())
            .join()
            .expect("scan");
        assert_eq!(all.groups.len(), 2);
    }
}
