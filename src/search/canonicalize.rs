//! Query text canonicalization.
//!
//! Every field matcher reads the same canonical forms of the query, so that
//! matching is independent of Unicode composition, stray whitespace and
//! Indian-style digit grouping.
//!
//! # Forms
//!
//! 1. **`text`** - NFC-normalized, whitespace runs collapsed, trimmed
//! 2. **`lower`** - `text` lower-cased
//! 3. **`compact`** - `lower` with `,` removed ("50,00,000" → "5000000")

use unicode_normalization::UnicodeNormalization;

/// A query in the forms the matchers read. Built once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalQuery {
    pub text: String,
    pub lower: String,
    pub compact: String,
}

impl CanonicalQuery {
    pub fn new(raw: &str) -> Self {
        let text = canonicalize_query(raw);
        let lower = text.to_lowercase();
        let compact = lower.replace(',', "");
        Self {
            text,
            lower,
            compact,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// NFC-normalize and collapse whitespace.
pub fn canonicalize_query(raw: &str) -> String {
    let normalized: String = raw.nfc().collect();
    normalize_whitespace(&normalized)
}

fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
