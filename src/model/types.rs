//! Normalized entity structs.

use serde::{Deserialize, Deserializer, Serialize};

/// One row of the denormalized listings table: a project joined with its
/// address, a configuration and a configuration variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    /// Parent project id. Not unique per row.
    #[serde(deserialize_with = "lenient_required_text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub configuration_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub city_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub city_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub project_name: Option<String>,
    /// Locality proxy.
    #[serde(default, deserialize_with = "lenient_text")]
    pub landmark: Option<String>,
    /// Bedroom descriptor as written by the source ("2", "2BHK", "2.5 BHK").
    #[serde(rename = "customBHK", default, deserialize_with = "lenient_text")]
    pub custom_bhk: Option<String>,
    /// Possession descriptor ("Ready", "Under Construction").
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub about_property: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub lift: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub parking_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub slug: Option<String>,
}

/// Deduplication key. Rows without a configuration share `(id, None)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingKey {
    pub id: String,
    pub configuration_id: Option<String>,
}

impl Listing {
    pub fn key(&self) -> ListingKey {
        ListingKey {
            id: self.id.clone(),
            configuration_id: self.configuration_id.clone(),
        }
    }

    /// Project name, or empty when the source row has none.
    pub fn title(&self) -> &str {
        self.project_name.as_deref().unwrap_or("")
    }

    pub fn locality(&self) -> &str {
        self.landmark.as_deref().unwrap_or("")
    }
}

/// Budget constraint: a ceiling or an inclusive range, in rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Budget {
    Range { min: u64, max: u64 },
    Ceiling(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Possession {
    Ready,
    #[serde(rename = "Under Construction")]
    UnderConstruction,
}

impl Possession {
    /// Label matched (case-insensitively) against a listing's `status`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::UnderConstruction => "Under Construction",
        }
    }
}

impl std::fmt::Display for Possession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Structured constraints extracted from one free-text query.
///
/// Every field is optional; an unset field imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredFilter {
    pub city: Option<String>,
    pub bhk: Option<u32>,
    pub budget: Option<Budget>,
    pub possession: Option<Possession>,
    pub locality: Option<String>,
    pub project_name: Option<String>,
}

impl StructuredFilter {
    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.bhk.is_none()
            && self.budget.is_none()
            && self.possession.is_none()
            && self.locality.is_none()
            && self.project_name.is_none()
    }

    /// Scalar budget ceiling, if the budget is one. Ranges return `None`.
    pub fn budget_ceiling(&self) -> Option<u64> {
        match self.budget {
            Some(Budget::Ceiling(max)) => Some(max),
            _ => None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl RawScalar {
    fn into_text(self) -> Option<String> {
        let text = match self {
            RawScalar::Text(s) => s,
            RawScalar::Int(n) => n.to_string(),
            RawScalar::Float(f) => f.to_string(),
            RawScalar::Bool(b) => if b { "True" } else { "False" }.to_string(),
        };
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawScalar>::deserialize(deserializer)?.and_then(RawScalar::into_text))
}

fn lenient_required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_text(deserializer)?.ok_or_else(|| serde::de::Error::custom("listing id is empty"))
}

fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawScalar>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawScalar::Int(n)) => Some(n as f64),
        Some(RawScalar::Float(f)) => Some(f),
        Some(RawScalar::Text(s)) => parse_price(&s),
        Some(RawScalar::Bool(_)) | None => None,
    })
}

/// Coerce a textual price cell to a number. Anything non-numeric is unknown.
pub fn parse_price(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}
