//! Natural-language summary over a matched result set.
//!
//! Everything said here is computed from the matched rows themselves: counts,
//! the most common localities and amenities, the possession mix and the price
//! span. Nothing is inferred beyond the data.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::types::{Listing, StructuredFilter};
use crate::search::units::{CRORE, LAKH};

static AMENITY_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[|,;.]").expect("amenity delimiter regex"));

/// Entries reported for localities and amenities.
const TOP_N: usize = 3;

const FALLBACK_HINT: &str = "Try broadening the search (remove locality or increase budget).";

/// Aggregates over a matched subset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryStats {
    pub count: usize,
    /// Up to three `(landmark, rows)` pairs, most frequent first.
    pub top_localities: Vec<(String, usize)>,
    /// Up to three lower-cased amenity tokens with their counts.
    pub top_amenities: Vec<(String, usize)>,
    /// Every distinct `status` with its row count, most frequent first.
    pub possession_breakdown: Vec<(String, usize)>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl SummaryStats {
    pub fn compute(matched: &[&Listing]) -> Self {
        let localities = matched
            .iter()
            .filter_map(|row| non_empty(row.landmark.as_deref()))
            .map(str::to_string);
        let amenities = matched
            .iter()
            .filter_map(|row| row.about_property.as_deref())
            .flat_map(|text| AMENITY_SPLIT_RE.split(text))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_lowercase);
        let statuses = matched
            .iter()
            .filter_map(|row| non_empty(row.status.as_deref()))
            .map(str::to_string);

        let prices = || matched.iter().filter_map(|row| row.price);

        let mut top_localities = rank_by_frequency(localities);
        top_localities.truncate(TOP_N);
        let mut top_amenities = rank_by_frequency(amenities);
        top_amenities.truncate(TOP_N);

        Self {
            count: matched.len(),
            top_localities,
            top_amenities,
            possession_breakdown: rank_by_frequency(statuses),
            min_price: prices().min_by(f64::total_cmp),
            max_price: prices().max_by(f64::total_cmp),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Count occurrences, most frequent first. Ties keep first-seen order.
fn rank_by_frequency(items: impl Iterator<Item = String>) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for item in items {
        match index.get(&item) {
            Some(&pos) => ranked[pos].1 += 1,
            None => {
                index.insert(item.clone(), ranked.len());
                ranked.push((item, 1));
            }
        }
    }
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
}

/// Render the summary for `matched` under `filter`.
///
/// Empty results produce a fallback that echoes the city, BHK and scalar
/// budget constraints. Otherwise up to four sentences: count, top
/// localities, common amenities, price range.
pub fn summarize(matched: &[&Listing], filter: &StructuredFilter) -> String {
    summarize_stats(&SummaryStats::compute(matched), filter)
}

/// [`summarize`] over stats that were already computed.
pub fn summarize_stats(stats: &SummaryStats, filter: &StructuredFilter) -> String {
    let constraints = echo_constraints(filter);
    if stats.count == 0 {
        return format!("No matching properties found{constraints}. {FALLBACK_HINT}");
    }

    let noun = if stats.count == 1 { "listing" } else { "listings" };
    let mut sentences = vec![format!("{} matching {noun}{constraints}.", stats.count)];

    if !stats.top_localities.is_empty() {
        let localities = stats
            .top_localities
            .iter()
            .map(|(name, count)| format!("{name} ({count})"))
            .collect::<Vec<_>>()
            .join(", ");
        sentences.push(format!("Top localities: {localities}."));
    }
    if !stats.top_amenities.is_empty() {
        let amenities = stats
            .top_amenities
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        sentences.push(format!("Common amenities include {amenities}."));
    }
    sentences.push(format!(
        "Prices range from {} to {}.",
        price_or_na(stats.min_price),
        price_or_na(stats.max_price)
    ));
    sentences.join(" ")
}

fn echo_constraints(filter: &StructuredFilter) -> String {
    let mut out = String::new();
    if let Some(city) = &filter.city {
        out.push_str(&format!(" in {city}"));
    }
    if let Some(bhk) = filter.bhk {
        out.push_str(&format!(" for {bhk}BHK"));
    }
    if let Some(ceiling) = filter.budget_ceiling() {
        out.push_str(&format!(" under {}", price_or_na(Some(ceiling as f64))));
    }
    out
}

fn price_or_na(amount: Option<f64>) -> String {
    format_currency(amount).unwrap_or_else(|| "N/A".to_string())
}

/// Format a rupee amount: `₹X.XX Cr` from one crore, `₹X.XX L` from one
/// lakh, whole rupees below that. Unknown amounts stay `None`.
pub fn format_currency(amount: Option<f64>) -> Option<String> {
    let value = amount.filter(|v| v.is_finite())?;
    let formatted = if value >= CRORE {
        format!("₹{} Cr", two_decimals(value / CRORE))
    } else if value >= LAKH {
        format!("₹{} L", two_decimals(value / LAKH))
    } else {
        format!("₹{}", value.trunc() as i64)
    };
    Some(formatted)
}

/// Round to two decimals, dropping trailing zeros but keeping one decimal.
fn two_decimals(value: f64) -> String {
    let fixed = format!("{:.2}", (value * 100.0).round() / 100.0);
    let trimmed = fixed.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::Budget;

    fn listing(landmark: Option<&str>, about: Option<&str>, status: Option<&str>, price: Option<f64>) -> Listing {
        Listing {
            id: "p".into(),
            landmark: landmark.map(Into::into),
            about_property: about.map(Into::into),
            status: status.map(Into::into),
            price,
            ..Default::default()
        }
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(Some(12_345_678.0)).as_deref(), Some("₹1.23 Cr"));
        assert_eq!(format_currency(Some(250_000.0)).as_deref(), Some("₹2.5 L"));
        assert_eq!(format_currency(Some(10_000_000.0)).as_deref(), Some("₹1.0 Cr"));
        assert_eq!(format_currency(Some(7_500_000.0)).as_deref(), Some("₹75.0 L"));
        assert_eq!(format_currency(Some(99_999.9)).as_deref(), Some("₹99999"));
        assert_eq!(format_currency(None), None);
        assert_eq!(format_currency(Some(f64::NAN)), None);
    }

    #[test]
    fn fallback_echoes_city_bhk_and_scalar_budget() {
        let filter = StructuredFilter {
            city: Some("Pune".into()),
            bhk: Some(3),
            budget: Some(Budget::Ceiling(12_000_000)),
            locality: Some("Wakad".into()),
            ..Default::default()
        };
        assert_eq!(
            summarize(&[], &filter),
            "No matching properties found in Pune for 3BHK under ₹1.2 Cr. \
             Try broadening the search (remove locality or increase budget)."
        );
    }

    #[test]
    fn fallback_skips_range_budget() {
        let filter = StructuredFilter {
            bhk: Some(2),
            budget: Some(Budget::Range {
                min: 5_000_000,
                max: 10_000_000,
            }),
            ..Default::default()
        };
        assert_eq!(
            summarize(&[], &filter),
            "No matching properties found for 2BHK. \
             Try broadening the search (remove locality or increase budget)."
        );
    }

    #[test]
    fn four_sentence_summary() {
        let rows = [
            listing(Some("Wakad"), Some("Gym | Pool. Clubhouse"), Some("Ready"), Some(7_500_000.0)),
            listing(Some("Baner"), Some("gym, Garden"), Some("Ready"), Some(12_500_000.0)),
            listing(Some("Wakad"), Some("pool; gym"), Some("Under Construction"), None),
        ];
        let matched: Vec<&Listing> = rows.iter().collect();
        let filter = StructuredFilter {
            city: Some("Pune".into()),
            ..Default::default()
        };
        assert_eq!(
            summarize(&matched, &filter),
            "3 matching listings in Pune. \
             Top localities: Wakad (2), Baner (1). \
             Common amenities include gym, pool, clubhouse. \
             Prices range from ₹75.0 L to ₹1.25 Cr."
        );
    }

    #[test]
    fn optional_sentences_are_omitted() {
        let rows = [listing(None, None, None, None)];
        let matched: Vec<&Listing> = rows.iter().collect();
        assert_eq!(
            summarize(&matched, &StructuredFilter::default()),
            "1 matching listing. Prices range from N/A to N/A."
        );
    }

    #[test]
    fn stats_rank_statuses_and_prices() {
        let rows = [
            listing(None, None, Some("Under Construction"), Some(3.0)),
            listing(None, None, Some("Ready"), Some(1.0)),
            listing(None, None, Some("Ready"), None),
        ];
        let matched: Vec<&Listing> = rows.iter().collect();
        let stats = SummaryStats::compute(&matched);
        assert_eq!(stats.count, 3);
        assert_eq!(
            stats.possession_breakdown,
            vec![("Ready".to_string(), 2), ("Under Construction".to_string(), 1)]
        );
        assert_eq!(stats.min_price, Some(1.0));
        assert_eq!(stats.max_price, Some(3.0));
    }
}
