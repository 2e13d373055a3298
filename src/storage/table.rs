//! Immutable, process-resident listings table.

use std::collections::HashSet;

use crate::model::types::Listing;

/// Lookup vocabularies derived from the table once at construction.
///
/// Both lists keep table order and the first-seen spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    /// Distinct, non-empty city names.
    pub cities: Vec<String>,
    /// Distinct (case-insensitively) non-empty project titles.
    pub project_titles: Vec<String>,
}

impl Vocabulary {
    pub fn from_listings(rows: &[Listing]) -> Self {
        let mut cities = Vec::new();
        let mut seen_cities = HashSet::new();
        let mut project_titles = Vec::new();
        let mut seen_titles = HashSet::new();

        for row in rows {
            if let Some(city) = row.city_name.as_deref().map(str::trim)
                && !city.is_empty()
                && seen_cities.insert(city.to_string())
            {
                cities.push(city.to_string());
            }
            let title = row.title().trim();
            if !title.is_empty() && seen_titles.insert(title.to_lowercase()) {
                project_titles.push(title.to_string());
            }
        }

        Self {
            cities,
            project_titles,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty() && self.project_titles.is_empty()
    }
}

/// The listings the engine filters over.
///
/// Built once by a provider and shared read-only (typically behind an
/// `Arc`); nothing in the crate mutates it after construction.
#[derive(Debug, Clone, Default)]
pub struct ListingTable {
    rows: Vec<Listing>,
    vocabulary: Vocabulary,
}

impl ListingTable {
    /// Take ownership of rows, coercing invalid prices to unknown.
    pub fn new(mut rows: Vec<Listing>) -> Self {
        for row in &mut rows {
            if row.price.is_some_and(|p| !p.is_finite() || p < 0.0) {
                row.price = None;
            }
        }
        let vocabulary = Vocabulary::from_listings(&rows);
        Self { rows, vocabulary }
    }

    pub fn rows(&self) -> &[Listing] {
        &self.rows
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
