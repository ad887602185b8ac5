//! Text canonicalization shared by every comparison in sift.
//!
//! [`normalize`] lowercases, strips ASCII punctuation, splits on whitespace,
//! drops English stop-words and rejoins with single spaces. The result is
//! what exact matching, fuzzy matching, TF-IDF and duplicate detection all
//! compare against, so two texts that differ only in case, punctuation or
//! filler words compare equal.

use std::collections::BTreeSet;

/// Canonicalize `text` for comparison.
///
/// Total and idempotent: `normalize(&normalize(x)) == normalize(x)`.
///
/// ```
/// use sift_core::text::normalize;
///
/// assert_eq!(normalize("Hello, World!"), normalize("hello world"));
/// assert_eq!(normalize("The quarterly REPORT."), "quarterly report");
/// ```
#[must_use]
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();

    stripped
        .split_whitespace()
        .filter(|token| !is_stop_word(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Distinct tokens of an already-normalized string.
#[must_use]
pub fn token_set(normalized: &str) -> BTreeSet<&str> {
    normalized.split_whitespace().collect()
}

/// English stop-word list (the NLTK corpus, minus apostrophe forms which
/// can never survive punctuation stripping).
#[must_use]
pub fn is_stop_word(word: &str) -> bool {
    matches!(
        word,
        "i" | "me"
            | "my"
            | "myself"
            | "we"
            | "our"
            | "ours"
            | "ourselves"
            | "you"
            | "your"
            | "yours"
            | "yourself"
            | "yourselves"
            | "he"
            | "him"
            | "his"
            | "himself"
            | "she"
            | "her"
            | "hers"
            | "herself"
            | "it"
            | "its"
            | "itself"
            | "they"
            | "them"
            | "their"
            | "theirs"
            | "themselves"
            | "what"
            | "which"
            | "who"
            | "whom"
            | "this"
            | "that"
            | "these"
            | "those"
            | "am"
            | "is"
            | "are"
            | "was"
            | "were"
            | "be"
            | "been"
            | "being"
            | "have"
            | "has"
            | "had"
            | "having"
            | "do"
            | "does"
            | "did"
            | "doing"
            | "a"
            | "an"
            | "the"
            | "and"
            | "but"
            | "if"
            | "or"
            | "because"
            | "as"
            | "until"
            | "while"
            | "of"
            | "at"
            | "by"
            | "for"
            | "with"
            | "about"
            | "against"
            | "between"
            | "into"
            | "through"
            | "during"
            | "before"
            | "after"
            | "above"
            | "below"
            | "to"
            | "from"
            | "up"
            | "down"
            | "in"
            | "out"
            | "on"
            | "off"
            | "over"
            | "under"
            | "again"
            | "further"
            | "then"
            | "once"
            | "here"
            | "there"
            | "when"
            | "where"
            | "why"
            | "how"
            | "all"
            | "any"
            | "both"
            | "each"
            | "few"
            | "more"
            | "most"
            | "other"
            | "some"
            | "such"
            | "no"
            | "nor"
            | "not"
            | "only"
            | "own"
            | "same"
            | "so"
            | "than"
            | "too"
            | "very"
            | "s"
            | "t"
            | "can"
            | "will"
            | "just"
            | "don"
            | "should"
            | "now"
            | "d"
            | "ll"
            | "m"
            | "o"
            | "re"
            | "ve"
            | "y"
            | "ain"
            | "aren"
            | "couldn"
            | "didn"
            | "doesn"
            | "hadn"
            | "hasn"
            | "haven"
            | "isn"
            | "ma"
            | "mightn"
            | "mustn"
            | "needn"
            | "shan"
            | "shouldn"
            | "wasn"
            | "weren"
            | "won"
            | "wouldn"
    )
}
