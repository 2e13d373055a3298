//! Intent extraction: free-text query → [`StructuredFilter`].
//!
//! Each field has its own [`FieldMatcher`]. Matchers read the full canonical
//! query (never a remainder left over by another matcher), so overlapping
//! matches across fields are expected: in "2BHK under 80 lakh" the digits
//! are seen by both the BHK and the budget matcher, and each decides on its
//! own pattern. Vocabulary lookups (known cities and project titles) come
//! from the listings table.

use std::cmp::Reverse;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::debug;

use crate::model::types::{Budget, Possession, StructuredFilter};
use crate::search::canonicalize::CanonicalQuery;
use crate::search::units::normalize_token;
use crate::storage::Vocabulary;

const NUM: &str = r"(\d+(?:\.\d+)?)";
const UNIT: &str = r"(crores?|cr|lakhs?|lacs?|l)";
const CURRENCY: &str = r"(?:₹|\brs\.?)";

static BHK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*bhk").expect("bhk regex"));

static CEILING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?:\bunder|\bbelow|<|\bupto|\bup\s+to)\s*{CURRENCY}?\s*{NUM}\s*{UNIT}?\b"
    ))
    .expect("budget ceiling regex")
});

static RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\bbetween\s*{CURRENCY}?\s*{NUM}\s*{UNIT}?\s*(?:and|-)\s*{CURRENCY}?\s*{NUM}\s*{UNIT}?\b"
    ))
    .expect("budget range regex")
});

static BARE_AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"{CURRENCY}\s*{NUM}\s*{UNIT}?\b|{NUM}\s*{UNIT}\b"
    ))
    .expect("bare amount regex")
});

static CITY_FALLBACK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bin\s+([a-z][a-z\-]*)").expect("city fallback regex"));

static PREPOSITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:in|near|around|at)\s+").expect("locality preposition regex")
});

static UC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\buc\b").expect("uc token regex"));

/// A currency word, a unit word, or a number carrying its unit ("80lakh", "1.5cr").
static AMOUNT_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(?:rs|{NUM}?{UNIT})$")).expect("amount token regex")
});

static UNIT_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^{UNIT}$")).expect("unit token regex"));

/// Words that end a locality phrase.
const LOCALITY_STOP_WORDS: &[&str] = &[
    "in", "near", "around", "at", "under", "below", "upto", "up", "between", "within", "and",
    "for", "with", "ready", "budget",
];

/// Tokens kept from a locality phrase.
const LOCALITY_MAX_TOKENS: usize = 3;

/// Attempts to extract one field from a query.
pub trait FieldMatcher {
    type Value;

    /// Field name, for logs.
    const FIELD: &'static str;

    fn extract(&self, query: &CanonicalQuery, vocabulary: &Vocabulary) -> Option<Self::Value>;
}

/// Known city names by containment (longest first); otherwise the word
/// after "in".
#[derive(Debug, Default, Clone, Copy)]
pub struct CityMatcher;

impl FieldMatcher for CityMatcher {
    type Value = String;
    const FIELD: &'static str = "city";

    fn extract(&self, query: &CanonicalQuery, vocabulary: &Vocabulary) -> Option<String> {
        vocabulary
            .cities
            .iter()
            .filter(|city| query.lower.contains(&city.to_lowercase()))
            .min_by_key(|city| Reverse(city.chars().count()))
            .cloned()
            .or_else(|| {
                CITY_FALLBACK_RE
                    .captures(&query.text)
                    .map(|caps| capitalize(&caps[1]))
            })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BhkMatcher;

impl FieldMatcher for BhkMatcher {
    type Value = u32;
    const FIELD: &'static str = "bhk";

    fn extract(&self, query: &CanonicalQuery, _vocabulary: &Vocabulary) -> Option<u32> {
        BHK_RE
            .captures(&query.lower)
            .and_then(|caps| caps[1].parse().ok())
    }
}

/// Budget rules in priority order: ceiling ("under 1.2 cr"), range
/// ("between 50 lakh and 1 cr"), then a bare amount ("₹90 lakh", "2cr").
#[derive(Debug, Default, Clone, Copy)]
pub struct BudgetMatcher;

impl BudgetMatcher {
    fn ceiling(text: &str) -> Option<Budget> {
        let caps = CEILING_RE.captures(text)?;
        amount(&caps, 1, 2).map(Budget::Ceiling)
    }

    fn range(text: &str) -> Option<Budget> {
        let caps = RANGE_RE.captures(text)?;
        Some(Budget::Range {
            min: amount(&caps, 1, 2)?,
            max: amount(&caps, 3, 4)?,
        })
    }

    fn bare(text: &str) -> Option<Budget> {
        let caps = BARE_AMOUNT_RE.captures(text)?;
        amount(&caps, 1, 2)
            .or_else(|| amount(&caps, 3, 4))
            .map(Budget::Ceiling)
    }
}

impl FieldMatcher for BudgetMatcher {
    type Value = Budget;
    const FIELD: &'static str = "budget";

    fn extract(&self, query: &CanonicalQuery, _vocabulary: &Vocabulary) -> Option<Budget> {
        let text = &query.compact;
        Self::ceiling(text)
            .or_else(|| Self::range(text))
            .or_else(|| Self::bare(text))
    }
}

fn amount(caps: &Captures<'_>, num_group: usize, unit_group: usize) -> Option<u64> {
    let value: f64 = caps.get(num_group)?.as_str().parse().ok()?;
    let unit = caps.get(unit_group).map(|m| m.as_str());
    Some(normalize_token(value, unit))
}

/// "ready" wins over "under construction" when both appear.
#[derive(Debug, Default, Clone, Copy)]
pub struct PossessionMatcher;

impl FieldMatcher for PossessionMatcher {
    type Value = Possession;
    const FIELD: &'static str = "possession";

    fn extract(&self, query: &CanonicalQuery, _vocabulary: &Vocabulary) -> Option<Possession> {
        let text = &query.lower;
        if text.contains("ready") {
            Some(Possession::Ready)
        } else if text.contains("under construction")
            || text.contains("under-construction")
            || UC_RE.is_match(text)
        {
            Some(Possession::UnderConstruction)
        } else {
            None
        }
    }
}

/// Phrase after in/near/around/at, cut at the first stop word or budget
/// amount and capped at three tokens. A phrase naming the query's city is a city clue, not a
/// locality, and is skipped in favour of the next candidate.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalityMatcher;

impl FieldMatcher for LocalityMatcher {
    type Value = String;
    const FIELD: &'static str = "locality";

    fn extract(&self, query: &CanonicalQuery, vocabulary: &Vocabulary) -> Option<String> {
        let city = CityMatcher
            .extract(query, vocabulary)
            .map(|c| c.to_lowercase());
        let text = &query.text;

        PREPOSITION_RE.find_iter(text).find_map(|m| {
            let words: Vec<&str> = leading_phrase(&text[m.end()..]).split_whitespace().collect();
            let tokens: Vec<&str> = words
                .iter()
                .enumerate()
                .take_while(|(idx, word)| !ends_locality(word, words.get(idx + 1).copied()))
                .map(|(_, word)| *word)
                .take(LOCALITY_MAX_TOKENS)
                .collect();
            if tokens.is_empty() {
                return None;
            }
            let candidate = tokens.join(" ");
            let lowered = candidate.to_lowercase();
            let names_city = city.as_deref().is_some_and(|c| {
                lowered == c || lowered.starts_with(&format!("{c} "))
            });
            (!names_city).then_some(candidate)
        })
    }
}

/// Stop words end a locality, and so does the start of an amount: a unit or
/// currency word, a number with its unit attached, or a number followed by a
/// unit word. A bare number ("Phase 2") stays part of the phrase.
fn ends_locality(word: &str, next: Option<&str>) -> bool {
    let lower = word.to_lowercase();
    LOCALITY_STOP_WORDS.contains(&lower.as_str())
        || AMOUNT_TOKEN_RE.is_match(&lower)
        || (lower.starts_with(|c: char| c.is_ascii_digit())
            && next.is_some_and(|n| UNIT_TOKEN_RE.is_match(&n.to_lowercase())))
}

/// Longest run of letters, digits, hyphens, whitespace and decimal points
/// at the start of `text`.
fn leading_phrase(text: &str) -> &str {
    let mut chars = text.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        let decimal_point = c == '.' && chars.peek().is_some_and(|(_, n)| n.is_ascii_digit());
        if !(c.is_ascii_alphanumeric() || c == '-' || c.is_whitespace() || decimal_point) {
            return &text[..idx];
        }
    }
    text
}

/// Known project title contained in the query. The longest title wins;
/// equal lengths keep table order.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProjectNameMatcher;

impl FieldMatcher for ProjectNameMatcher {
    type Value = String;
    const FIELD: &'static str = "project_name";

    fn extract(&self, query: &CanonicalQuery, vocabulary: &Vocabulary) -> Option<String> {
        vocabulary
            .project_titles
            .iter()
            .filter(|title| query.lower.contains(&title.to_lowercase()))
            .min_by_key(|title| Reverse(title.chars().count()))
            .cloned()
    }
}

/// Runs every field matcher over one query.
#[derive(Debug, Clone, Copy)]
pub struct IntentExtractor<'a> {
    vocabulary: &'a Vocabulary,
}

impl<'a> IntentExtractor<'a> {
    pub fn new(vocabulary: &'a Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Never fails: fields that cannot be resolved stay unset.
    pub fn extract(&self, query: &str) -> StructuredFilter {
        self.extract_canonical(&CanonicalQuery::new(query))
    }

    pub fn extract_canonical(&self, query: &CanonicalQuery) -> StructuredFilter {
        let filter = StructuredFilter {
            city: self.run(&CityMatcher, query),
            bhk: self.run(&BhkMatcher, query),
            budget: self.run(&BudgetMatcher, query),
            possession: self.run(&PossessionMatcher, query),
            locality: self.run(&LocalityMatcher, query),
            project_name: self.run(&ProjectNameMatcher, query),
        };
        debug!(
            query = %query.text,
            city = ?filter.city,
            bhk = ?filter.bhk,
            budget = ?filter.budget,
            possession = ?filter.possession,
            locality = ?filter.locality,
            project_name = ?filter.project_name,
            "filters_extracted"
        );
        filter
    }

    fn run<M: FieldMatcher>(&self, matcher: &M, query: &CanonicalQuery) -> Option<M::Value> {
        let value = matcher.extract(query, self.vocabulary);
        if value.is_none() {
            tracing::trace!(field = M::FIELD, "field unresolved");
        }
        value
    }
}

/// Extract a filter for `query` against `vocabulary`.
pub fn extract(query: &str, vocabulary: &Vocabulary) -> StructuredFilter {
    IntentExtractor::new(vocabulary).extract(query)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
