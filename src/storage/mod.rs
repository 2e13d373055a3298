//! Listings table providers.
//!
//! The search core only ever sees an immutable [`ListingTable`]. This module
//! builds one, either from a pre-joined listings file ([`json`]) or by
//! joining the four source project tables ([`csv_join`]).

pub mod csv_join;
pub mod json;
pub mod table;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::model::types::Listing;

pub use table::{ListingTable, Vocabulary};

/// City code → display name.
pub type CityMap = BTreeMap<String, String>;

/// Error from loading a listings table.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid listing JSON in {path} ({at}): {source}")]
    Json {
        path: PathBuf,
        at: json::RecordPosition,
        source: serde_json::Error,
    },
    #[error("Failed to parse CSV table {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
    #[error("Source table not found: {0}")]
    MissingTable(PathBuf),
    #[error("Table {table} has no `{column}` column")]
    MissingColumn { table: String, column: String },
    #[error("No listings source configured (set --listings or --tables-dir)")]
    NoSource,
}

/// Where the listings table comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingSource {
    /// JSON array or JSON Lines file of pre-joined rows.
    Listings(PathBuf),
    /// Directory holding the four source CSV tables.
    Tables(PathBuf),
}

impl ListingSource {
    pub fn path(&self) -> &Path {
        match self {
            Self::Listings(p) | Self::Tables(p) => p,
        }
    }
}

/// Load and freeze a listings table.
pub fn load_table(source: &ListingSource, cities: &CityMap) -> Result<ListingTable, LoadError> {
    let rows = match source {
        ListingSource::Listings(path) => json::load_listings(path, cities)?,
        ListingSource::Tables(dir) => csv_join::load_project_tables(dir, cities)?,
    };
    let table = ListingTable::new(rows);
    info!(
        source = %source.path().display(),
        rows = table.len(),
        cities = table.vocabulary().cities.len(),
        projects = table.vocabulary().project_titles.len(),
        "listings_loaded"
    );
    Ok(table)
}

/// Fill `cityName` from `cityId` when the provider left it unresolved.
pub(crate) fn resolve_city(listing: &mut Listing, cities: &CityMap) {
    if listing.city_name.is_none()
        && let Some(code) = listing.city_id.as_deref()
    {
        listing.city_name = cities.get(code).cloned();
    }
}

/// City codes known to ship with the project tables.
pub fn default_city_map() -> CityMap {
    [
        ("cmf6nu3ru000gvcxspxarll3v", "Pune"),
        ("cmf50r5a00000vcj0k1iuocuu", "Mumbai"),
    ]
    .into_iter()
    .map(|(code, name)| (code.to_string(), name.to_string()))
    .collect()
}
