//! The loaded document collection: JSON storage, filters and tag edits.
//!
//! A [`Corpus`] is loaded once from `corpus.json` (written by the external
//! extraction layer) and replaced wholesale on reload. The only in-place
//! mutation is [`Corpus::set_tags`].

use crate::model::{Document, normalize_path};
use crate::persist::{read_json_or_default, write_json_atomic};
use anyhow::{Result, bail};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

const MIB: u64 = 1024 * 1024;
const DAY_SECS: f64 = 24.0 * 3600.0;
const IMAGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".bmp", ".tiff"];

#[derive(Debug, Clone, Default)]
pub struct Corpus {
    docs: Vec<Document>,
}

impl Corpus {
    #[must_use]
    pub const fn new(docs: Vec<Document>) -> Self {
        Self { docs }
    }

    /// Load a corpus from a JSON array of documents. A missing file is an
    /// empty corpus.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is unreadable or not a JSON
    /// array of document records.
    pub fn load_json(path: &Path) -> Result<Self> {
        let docs: Vec<Document> = read_json_or_default(path)?;
        debug!(path = %path.display(), documents = docs.len(), "loaded corpus");
        Ok(Self { docs })
    }

    /// Write the corpus back as pretty JSON, atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, &self.docs)
    }

    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    #[must_use]
    pub fn find_by_filename(&self, filename: &str) -> Option<&Document> {
        self.docs.iter().find(|d| d.filename == filename)
    }

    /// First document stored at `path`, compared after path normalization.
    #[must_use]
    pub fn find_by_path(&self, path: &str) -> Option<&Document> {
        let target = normalize_path(path);
        self.docs.iter().find(|d| normalize_path(&d.path) == target)
    }

    /// Distinct trimmed non-empty tags, sorted case-insensitively.
    #[must_use]
    pub fn all_tags(&self) -> Vec<String> {
        let distinct: BTreeSet<&str> = self
            .docs
            .iter()
            .flat_map(|d| d.tags.iter())
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();

        let mut tags: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        tags.sort_by_cached_key(|t| t.to_lowercase());
        tags
    }

    /// Replace the tags of every document stored at `path`. Returns the
    /// number of documents updated.
    pub fn set_tags<I, S>(&mut self, path: &str, tags: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags: BTreeSet<String> = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        let target = normalize_path(path);

        let mut updated = 0;
        for doc in self
            .docs
            .iter_mut()
            .filter(|d| normalize_path(&d.path) == target)
        {
            doc.tags.clone_from(&tags);
            updated += 1;
        }
        updated
    }

    /// Indices of documents passing `filter`, in corpus order.
    #[must_use]
    pub fn select(&self, filter: &CorpusFilter, now: DateTime<Utc>) -> Vec<usize> {
        let now_secs = now.timestamp_millis() as f64 / 1000.0;
        self.docs
            .iter()
            .enumerate()
            .filter(|(_, d)| filter.matches(d, now_secs))
            .map(|(i, _)| i)
            .collect()
    }

    /// Narrow `within` to documents mentioning `query` in their filename or
    /// normalized text. An empty query keeps everything.
    #[must_use]
    pub fn narrow_for_duplicates(&self, within: &[usize], query: &str) -> Vec<usize> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return within.to_vec();
        }
        within
            .iter()
            .copied()
            .filter(|&i| {
                let doc = &self.docs[i];
                doc.filename.to_lowercase().contains(&needle)
                    || doc.normalized_text().contains(&needle)
            })
            .collect()
    }
}

/// Extension restriction on filenames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExtensionFilter {
    #[default]
    All,
    Images,
    /// A specific suffix such as `.pdf`.
    Suffix(String),
}

impl ExtensionFilter {
    fn matches(&self, filename: &str) -> bool {
        let lower = filename.to_lowercase();
        match self {
            Self::All => true,
            Self::Images => IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)),
            Self::Suffix(ext) => lower.ends_with(&ext.to_lowercase()),
        }
    }
}

impl FromStr for ExtensionFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "" | "all" => Ok(Self::All),
            "images" | "image" => Ok(Self::Images),
            lower if lower.starts_with('.') && lower.len() > 1 => Ok(Self::Suffix(lower.to_string())),
            lower if lower.chars().all(char::is_alphanumeric) => Ok(Self::Suffix(format!(".{lower}"))),
            _ => bail!("invalid extension filter '{s}': expected all, images or .ext"),
        }
    }
}

/// Age restriction by modification time (falling back to creation time).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AgeFilter {
    #[default]
    Any,
    Last24Hours,
    Last7Days,
    Last30Days,
    OlderThan30Days,
}

impl AgeFilter {
    fn matches(self, age_secs: f64) -> bool {
        match self {
            Self::Any => true,
            Self::Last24Hours => age_secs <= DAY_SECS,
            Self::Last7Days => age_secs <= 7.0 * DAY_SECS,
            Self::Last30Days => age_secs <= 30.0 * DAY_SECS,
            Self::OlderThan30Days => age_secs > 30.0 * DAY_SECS,
        }
    }
}

impl FromStr for AgeFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "any" => Ok(Self::Any),
            "24h" | "1d" | "day" => Ok(Self::Last24Hours),
            "7d" | "week" => Ok(Self::Last7Days),
            "30d" | "month" => Ok(Self::Last30Days),
            "older" | "older-30d" => Ok(Self::OlderThan30Days),
            other => bail!("invalid age filter '{other}': expected any, 24h, 7d, 30d or older"),
        }
    }
}

/// Size bins in MiB. Documents without a size count as 0 bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizeFilter {
    #[default]
    Any,
    UnderOneMb,
    OneToTenMb,
    OverTenMb,
}

impl SizeFilter {
    const fn matches(self, size: u64) -> bool {
        match self {
            Self::Any => true,
            Self::UnderOneMb => size < MIB,
            Self::OneToTenMb => size >= MIB && size <= 10 * MIB,
            Self::OverTenMb => size > 10 * MIB,
        }
    }
}

impl FromStr for SizeFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "any" => Ok(Self::Any),
            "small" | "<1mb" => Ok(Self::UnderOneMb),
            "medium" | "1-10mb" => Ok(Self::OneToTenMb),
            "large" | ">10mb" => Ok(Self::OverTenMb),
            other => bail!("invalid size filter '{other}': expected any, small, medium or large"),
        }
    }
}

/// The combination of filters defining the "current filtered corpus".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusFilter {
    pub extension: ExtensionFilter,
    pub age: AgeFilter,
    pub size: SizeFilter,
    /// Case-insensitive tag requirement; `None` keeps everything.
    pub tag: Option<String>,
}

impl CorpusFilter {
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.extension == ExtensionFilter::All
            && self.age == AgeFilter::Any
            && self.size == SizeFilter::Any
            && self.tag.as_deref().is_none_or(|t| t.trim().is_empty())
    }

    /// Whether `doc` passes every filter at wall-clock time `now_secs`.
    #[must_use]
    pub fn matches(&self, doc: &Document, now_secs: f64) -> bool {
        if !self.extension.matches(&doc.filename) {
            return false;
        }

        let age_ok = doc
            .effective_time()
            .is_none_or(|t| self.age.matches(now_secs - t));
        if !age_ok {
            return false;
        }

        if !self.size.matches(doc.size_bytes.unwrap_or(0)) {
            return false;
        }

        match self.tag.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(wanted) => {
                let wanted = wanted.to_lowercase();
                doc.tags.iter().any(|t| t.trim().to_lowercase() == wanted)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn doc(filename: &str, path: &str, text: &str) -> Document {
        Document::new(filename, path, text)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).single().expect("valid date")
    }

    fn now_secs() -> f64 {
        now().timestamp() as f64
    }

    #[test]
    fn extension_filters() {
        let corpus = Corpus::new(vec![
            doc("shot.PNG", "/a/shot.PNG", ""),
            doc("letter.pdf", "/a/letter.pdf", ""),
            doc("notes.txt", "/a/notes.txt", ""),
        ]);

        let images = CorpusFilter {
            extension: ExtensionFilter::Images,
            ..CorpusFilter::default()
        };
        assert_eq!(corpus.select(&images, now()), vec![0]);

        let pdf = CorpusFilter {
            extension: "pdf".parse().expect("parse"),
            ..CorpusFilter::default()
        };
        assert_eq!(corpus.select(&pdf, now()), vec![1]);
        assert_eq!(corpus.select(&CorpusFilter::default(), now()), vec![0, 1, 2]);
    }

    #[test]
    fn age_filter_uses_modified_then_created() {
        let mut fresh = doc("fresh.txt", "/fresh.txt", "");
        fresh.modified_time = Some(now_secs() - 3600.0);
        let mut old = doc("old.txt", "/old.txt", "");
        old.created_time = Some(now_secs() - 40.0 * DAY_SECS);
        let undated = doc("undated.txt", "/undated.txt", "");
        let corpus = Corpus::new(vec![fresh, old, undated]);

        let recent = CorpusFilter {
            age: AgeFilter::Last24Hours,
            ..CorpusFilter::default()
        };
        assert_eq!(corpus.select(&recent, now()), vec![0, 2]);

        let older = CorpusFilter {
            age: AgeFilter::OlderThan30Days,
            ..CorpusFilter::default()
        };
        assert_eq!(corpus.select(&older, now()), vec![1, 2]);
    }

    #[test]
    fn size_bins_are_mebibytes() {
        let sizes = [None, Some(MIB - 1), Some(MIB), Some(10 * MIB), Some(10 * MIB + 1)];
        let docs = sizes
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let mut d = doc(&format!("{i}.bin"), &format!("/{i}.bin"), "");
                d.size_bytes = *s;
                d
            })
            .collect();
        let corpus = Corpus::new(docs);

        let pick = |size| CorpusFilter {
            size,
            ..CorpusFilter::default()
        };
        assert_eq!(corpus.select(&pick(SizeFilter::UnderOneMb), now()), vec![0, 1]);
        assert_eq!(corpus.select(&pick(SizeFilter::OneToTenMb), now()), vec![2, 3]);
        assert_eq!(corpus.select(&pick(SizeFilter::OverTenMb), now()), vec![4]);
    }

    #[test]
    fn tag_filter_is_case_insensitive() {
        let mut tagged = doc("a.txt", "/a.txt", "");
        tagged.tags.insert(" Work ".to_string());
        let corpus = Corpus::new(vec![tagged, doc("b.txt", "/b.txt", "")]);

        let filter = CorpusFilter {
            tag: Some("work".to_string()),
            ..CorpusFilter::default()
        };
        assert_eq!(corpus.select(&filter, now()), vec![0]);
        assert!(!filter.is_unrestricted());
    }

    #[test]
    fn set_tags_propagates_by_normalized_path() {
        let mut corpus = Corpus::new(vec![
            doc("a.png", r"C:\shots\a.png", ""),
            doc("a.png", "C:/shots/./a.png", ""),
            doc("b.png", "C:/shots/b.png", ""),
        ]);

        let changed = corpus.set_tags("C:/shots/a.png", ["receipts", "  ", "tax"]);
        assert_eq!(changed, 2);
        assert_eq!(corpus.documents()[0].tags.len(), 2);
        assert_eq!(corpus.documents()[0].tags, corpus.documents()[1].tags);
        assert!(corpus.documents()[2].tags.is_empty());

        let found = corpus.find_by_path(r"C:\shots\a.png").expect("found");
        assert!(found.tags.contains("tax"));
        assert!(corpus.find_by_path("C:/shots/c.png").is_none());
    }

    #[test]
    fn all_tags_sorted_case_insensitively() {
        let mut a = doc("a", "/a", "");
        a.tags = ["beta", "Alpha"].iter().map(ToString::to_string).collect();
        let mut b = doc("b", "/b", "");
        b.tags = ["alpha2", " "].iter().map(ToString::to_string).collect();
        let corpus = Corpus::new(vec![a, b]);

        assert_eq!(corpus.all_tags(), vec!["Alpha", "alpha2", "beta"]);
    }

    #[test]
    fn narrowing_matches_filename_or_text() {
        let corpus = Corpus::new(vec![
            doc("Invoice-March.pdf", "/1", "payment due"),
            doc("scan.png", "/2", "Invoice number 42"),
            doc("other.txt", "/3", "nothing here"),
        ]);
        let all = vec![0, 1, 2];
        assert_eq!(corpus.narrow_for_duplicates(&all, " INVOICE "), vec![0, 1]);
        assert_eq!(corpus.narrow_for_duplicates(&all, ""), all);
        assert_eq!(corpus.narrow_for_duplicates(&[2], "invoice"), Vec::<usize>::new());
    }

    #[test]
    fn save_and_reload_preserves_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("corpus.json");
        let mut d = doc("a.txt", "/a.txt", "alpha");
        d.size_bytes = Some(12);
        d.tags.insert("x".to_string());
        Corpus::new(vec![d]).save_json(&path).expect("save");

        let back = Corpus::load_json(&path).expect("load");
        assert_eq!(back.len(), 1);
        let d = &back.documents()[0];
        assert_eq!(d.text, "alpha");
        assert_eq!(d.size_bytes, Some(12));
        assert!(d.tags.contains("x"));
        assert!(Corpus::load_json(&dir.path().join("absent.json")).expect("load").is_empty());
    }
}
