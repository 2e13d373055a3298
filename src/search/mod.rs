//! Search layer facade.
//!
//! A query flows through these modules in order:
//!
//! - **[`canonicalize`]**: NFC + whitespace normalization into the forms every matcher reads.
//! - **[`intent`]**: Field matchers that turn query text into a `StructuredFilter`.
//! - **[`units`]**: Crore/lakh magnitude normalization used by the budget matcher.
//! - **[`query`]**: Filtering, dedup and price ordering over the listings table; `SearchClient`.
//! - **[`summary`]**: Aggregate statistics, the summary text and currency formatting.
//! - **[`card`]**: Display cards for matched listings.
//! - **[`request`]**: Request validation and the response payload.

pub mod canonicalize;
pub mod card;
pub mod intent;
pub mod query;
pub mod request;
pub mod summary;
pub mod units;

pub use query::SearchClient;
pub use request::{SearchRequest, SearchResponse};
