//! Request validation and the response payload.
//!
//! Requests arrive as loosely typed JSON. [`RawSearchRequest::validate`] is
//! the only place malformed input is rejected; everything past it works on a
//! well-typed [`SearchRequest`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::search::card::ListingCard;

/// Page size used when a request does not name one.
pub const DEFAULT_MAX_RESULTS: usize = 10;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("`query` must be a string")]
    QueryNotText,
    #[error("`max_results` must be a non-negative integer, got {0}")]
    InvalidMaxResults(String),
}

/// A request body exactly as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchRequest {
    #[serde(default)]
    pub query: Option<Value>,
    #[serde(default)]
    pub max_results: Option<Value>,
}

impl RawSearchRequest {
    pub fn validate(self, default_max_results: usize) -> Result<SearchRequest, RequestError> {
        let query = match self.query {
            Some(Value::String(query)) => query,
            _ => return Err(RequestError::QueryNotText),
        };
        let max_results = match self.max_results {
            None | Some(Value::Null) => default_max_results,
            Some(value) => value
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| RequestError::InvalidMaxResults(value.to_string()))?,
        };
        Ok(SearchRequest { query, max_results })
    }
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub max_results: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, max_results: usize) -> Self {
        Self {
            query: query.into(),
            max_results,
        }
    }

    /// Parse and validate a JSON request body.
    pub fn from_json(body: &str, default_max_results: usize) -> Result<Self, RequestError> {
        let raw: RawSearchRequest = serde_json::from_str(body)?;
        raw.validate(default_max_results)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResponse {
    pub summary: String,
    /// Number of cards in `results`.
    pub total_results: usize,
    pub results: Vec<ListingCard>,
}
