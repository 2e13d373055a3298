use std::cmp::Ordering;
use std::sync::Arc;

use itertools::Itertools;

use crate::model::types::{Budget, Listing, StructuredFilter};
use crate::search::card::to_card;
use crate::search::intent::IntentExtractor;
use crate::search::request::{SearchRequest, SearchResponse};
use crate::search::summary::{SummaryStats, summarize_stats};
use crate::storage::ListingTable;

/// Apply `filter` to `table`, then dedup, order by price and truncate.
///
/// Unset filter fields impose no constraint. Duplicate `(id, configurationId)`
/// keys keep their first occurrence in table order. Unknown prices sort ahead
/// of every known price; the sort is stable.
pub fn select<'a>(
    filter: &StructuredFilter,
    table: &'a ListingTable,
    limit: usize,
) -> Vec<&'a Listing> {
    let mut rows: Vec<&Listing> = table
        .rows()
        .iter()
        .filter(|row| matches(filter, row))
        .unique_by(|row| row.key())
        .collect();
    rows.sort_by(|a, b| compare_price(a.price, b.price));
    rows.truncate(limit);
    rows
}

/// Whether one row satisfies every set field of `filter`.
pub fn matches(filter: &StructuredFilter, row: &Listing) -> bool {
    if let Some(city) = &filter.city
        && !row
            .city_name
            .as_deref()
            .is_some_and(|name| name.to_lowercase() == city.to_lowercase())
    {
        return false;
    }
    if let Some(project) = &filter.project_name
        && !contains_ci(Some(row.title()), project)
    {
        return false;
    }
    if let Some(locality) = &filter.locality
        && !(contains_ci(row.landmark.as_deref(), locality)
            || contains_ci(Some(row.title()), locality))
    {
        return false;
    }
    if let Some(bhk) = filter.bhk
        && !contains_ci(row.custom_bhk.as_deref(), &bhk.to_string())
    {
        return false;
    }
    if let Some(possession) = filter.possession
        && !contains_ci(row.status.as_deref(), possession.label())
    {
        return false;
    }
    match filter.budget {
        None => true,
        // Unknown prices count as zero against a ceiling.
        Some(Budget::Ceiling(max)) => row.price.unwrap_or(0.0) <= max as f64,
        Some(Budget::Range { min, max }) => row
            .price
            .is_some_and(|price| min as f64 <= price && price <= max as f64),
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

fn compare_price(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.total_cmp(&b),
    }
}

/// Query entry point over an injected, read-only listings table.
#[derive(Debug, Clone)]
pub struct SearchClient {
    table: Arc<ListingTable>,
}

impl SearchClient {
    pub fn new(table: Arc<ListingTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ListingTable {
        &self.table
    }

    pub fn extract(&self, query: &str) -> StructuredFilter {
        IntentExtractor::new(self.table.vocabulary()).extract(query)
    }

    /// Rows matching `filter`, already deduplicated, ordered and truncated.
    pub fn select(&self, filter: &StructuredFilter, limit: usize) -> Vec<&Listing> {
        select(filter, &self.table, limit)
    }

    /// Extract → select → summarize → cards.
    pub fn search(&self, request: &SearchRequest) -> SearchResponse {
        self.search_with_stats(request).0
    }

    /// [`Self::search`], also returning the aggregates behind the summary.
    pub fn search_with_stats(&self, request: &SearchRequest) -> (SearchResponse, SummaryStats) {
        tracing::info!(
            backend = "memory",
            query = request.query.as_str(),
            limit = request.max_results,
            rows = self.table.len(),
            "search_start"
        );
        let filter = self.extract(&request.query);
        self.run_filter(&filter, request.max_results)
    }

    /// Run the pipeline for an already-extracted filter.
    pub fn search_with_filter(&self, filter: &StructuredFilter, limit: usize) -> SearchResponse {
        self.run_filter(filter, limit).0
    }

    fn run_filter(&self, filter: &StructuredFilter, limit: usize) -> (SearchResponse, SummaryStats) {
        let matched = self.select(filter, limit);
        let stats = SummaryStats::compute(&matched);
        let summary = summarize_stats(&stats, filter);
        let results: Vec<_> = matched.iter().map(|row| to_card(row)).collect();
        tracing::info!(
            total_results = results.len(),
            fallback = results.is_empty(),
            "search_complete"
        );
        let response = SearchResponse {
            summary,
            total_results: results.len(),
            results,
        };
        (response, stats)
    }
}
