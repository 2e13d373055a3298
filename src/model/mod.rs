//! Listing and filter data model shared by storage and search.

pub mod types;

pub use types::{Budget, Listing, ListingKey, Possession, StructuredFilter};
