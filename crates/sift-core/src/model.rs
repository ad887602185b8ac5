//! Document records as supplied by the extraction layer.

use crate::text::normalize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// One extracted document or screenshot.
///
/// `filename` is the dedup key across search signals for a single corpus
/// load. Two documents sharing a filename but not a path are merged by
/// fusion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    pub filename: String,
    pub path: String,
    #[serde(default, alias = "raw_text")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    /// Creation time as float epoch seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<f64>,
    /// Modification time as float epoch seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_time: Option<f64>,
    #[serde(default)]
    pub tags: BTreeSet<String>,

    #[serde(skip)]
    normalized: OnceLock<String>,
}

impl Document {
    #[must_use]
    pub fn new(filename: impl Into<String>, path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            path: path.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// Canonicalized text, computed on first use and cached.
    #[must_use]
    pub fn normalized_text(&self) -> &str {
        self.normalized.get_or_init(|| normalize(&self.text))
    }

    /// Filename without its final extension, ignoring leading dots
    /// (`.bashrc` has no extension, `archive.tar.gz` has stem `archive.tar`).
    #[must_use]
    pub fn stem(&self) -> &str {
        filename_stem(&self.filename)
    }

    /// Most recent known timestamp: modification time, else creation time.
    #[must_use]
    pub fn effective_time(&self) -> Option<f64> {
        self.modified_time
            .filter(|t| *t != 0.0)
            .or(self.created_time)
    }
}

impl AsRef<Self> for Document {
    fn as_ref(&self) -> &Self {
        self
    }
}

/// Stem of a bare filename; see [`Document::stem`].
#[must_use]
pub fn filename_stem(filename: &str) -> &str {
    let name_start = filename.len() - filename.trim_start_matches('.').len();
    match filename[name_start..].rfind('.') {
        Some(dot) => &filename[..name_start + dot],
        None => filename,
    }
}

/// Canonical form of a path for tag propagation: separators unified and
/// redundant `.` segments removed, case preserved.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => {}
            ".." if parts.last().is_some_and(|last| *last != "..") => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if absolute { format!("/{joined}") } else { joined }
}
