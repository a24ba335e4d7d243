//! Text canonicalization for scraped status text.
//!
//! Vendor pages mix non-breaking spaces, full-width glyphs and inconsistent
//! casing into otherwise identical labels. Everything the classifier compares
//! goes through [`normalize`] first.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

// `\s` is Unicode-aware, so NBSP and friends are included.
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// NFKC-normalize, collapse whitespace runs to one ASCII space, and trim.
///
/// Case is preserved; use [`normalize_folded`] for comparisons.
pub fn normalize(raw: &str) -> String {
    let composed: String = raw.nfkc().collect();
    WHITESPACE_RUN
        .replace_all(composed.trim(), " ")
        .into_owned()
}

/// [`normalize`] followed by lowercasing.
pub fn normalize_folded(raw: &str) -> String {
    normalize(raw).to_lowercase()
}

/// True if both strings are equal after normalization, ignoring case.
pub fn matches_exactly(observed: &str, marker: &str) -> bool {
    normalize_folded(observed) == normalize_folded(marker)
}

/// True if `marker` occurs in `observed` after normalization, ignoring case.
///
/// An empty marker never matches.
pub fn contains_marker(observed: &str, marker: &str) -> bool {
    let marker = normalize_folded(marker);
    !marker.is_empty() && normalize_folded(observed).contains(&marker)
}
