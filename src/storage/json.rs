//! Pre-joined listings in JSON (array) or JSON Lines form.

use std::fmt;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use super::{CityMap, LoadError, resolve_city};
use crate::model::types::Listing;

/// Where a bad record sits in a listings file. Both positions are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordPosition {
    Line(usize),
    /// Index into a top-level JSON array.
    Element(usize),
}

impl fmt::Display for RecordPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(n) => write!(f, "line {n}"),
            Self::Element(n) => write!(f, "element {n}"),
        }
    }
}

/// Read a listings file. A document starting with `[` is a JSON array;
/// anything else is treated as one JSON object per line.
pub fn load_listings(path: &Path, cities: &CityMap) -> Result<Vec<Listing>, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_listings(&content, cities).map_err(|(at, source)| LoadError::Json {
        path: path.to_path_buf(),
        at,
        source,
    })
}

/// Parse listing rows from text. Errors carry the position of the bad record.
pub fn parse_listings(
    content: &str,
    cities: &CityMap,
) -> Result<Vec<Listing>, (RecordPosition, serde_json::Error)> {
    let values: Vec<(RecordPosition, Value)> = if content.trim_start().starts_with('[') {
        let array: Vec<Value> = serde_json::from_str(content)
            .map_err(|e| (RecordPosition::Line(e.line()), e))?;
        array
            .into_iter()
            .enumerate()
            .map(|(idx, v)| (RecordPosition::Element(idx + 1), v))
            .collect()
    } else {
        let mut values = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let at = RecordPosition::Line(idx + 1);
            let value = serde_json::from_str(line).map_err(|e| (at, e))?;
            values.push((at, value));
        }
        values
    };

    let mut rows = Vec::with_capacity(values.len());
    for (at, value) in values {
        if !has_id(&value) {
            warn!(%at, "skipping listing row without id");
            continue;
        }
        let mut listing: Listing = serde_json::from_value(value).map_err(|e| (at, e))?;
        resolve_city(&mut listing, cities);
        rows.push(listing);
    }
    debug!(rows = rows.len(), "parsed listing rows");
    Ok(rows)
}

fn has_id(value: &Value) -> bool {
    match value.get("id") {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Number(_)) => true,
        _ => false,
    }
}
