//! The record every search backend produces and fusion consumes.

use serde::{Deserialize, Serialize};
use sift_core::Document;

/// One backend hit. Scores are validated on construction: anything
/// non-finite or negative becomes 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub filename: String,
    pub path: String,
    pub text: String,
    raw_score: f64,
}

impl SignalResult {
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        path: impl Into<String>,
        text: impl Into<String>,
        raw_score: f64,
    ) -> Self {
        Self {
            filename: filename.into(),
            path: path.into(),
            text: text.into(),
            raw_score: sanitize(raw_score),
        }
    }

    #[must_use]
    pub fn from_document(doc: &Document, raw_score: f64) -> Self {
        Self::new(&doc.filename, &doc.path, &doc.text, raw_score)
    }

    #[must_use]
    pub const fn raw_score(&self) -> f64 {
        self.raw_score
    }
}

fn sanitize(score: f64) -> f64 {
    if score.is_finite() && score > 0.0 { score } else { 0.0 }
}

/// Identity of a fitted document, kept by indexes so hits can be reported
/// without holding a borrow of the corpus.
#[derive(Debug, Clone)]
pub(crate) struct DocRef {
    filename: String,
    path: String,
    text: String,
}

impl DocRef {
    pub(crate) fn of(doc: &Document) -> Self {
        Self {
            filename: doc.filename.clone(),
            path: doc.path.clone(),
            text: doc.text.clone(),
        }
    }

    pub(crate) fn hit(&self, raw_score: f64) -> SignalResult {
        SignalResult::new(&self.filename, &self.path, &self.text, raw_score)
    }
}

/// Which backend produced a list of [`SignalResult`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Exact,
    Fuzzy,
    Tfidf,
    Embed,
}

impl Signal {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Fuzzy => "fuzzy",
            Self::Tfidf => "tfidf",
            Self::Embed => "embed",
        }
    }
}
