//! Layered configuration: built-in defaults, then a TOML file, then
//! `PROPSEARCH_*` environment variables (a `.env` file is honoured).
//!
//! ```toml
//! listings = "/srv/propsearch/listings.jsonl"
//! # or: tables_dir = "/srv/propsearch/tables"
//! max_results = 10
//!
//! [cities]
//! cmf6nu3ru000gvcxspxarll3v = "Pune"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::search::request::DEFAULT_MAX_RESULTS;
use crate::storage::{CityMap, ListingSource, LoadError, default_city_map};

pub const ENV_LISTINGS: &str = "PROPSEARCH_LISTINGS";
pub const ENV_TABLES_DIR: &str = "PROPSEARCH_TABLES_DIR";
pub const ENV_MAX_RESULTS: &str = "PROPSEARCH_MAX_RESULTS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pre-joined listings file (JSON array or JSON Lines).
    pub listings: Option<PathBuf>,
    /// Directory holding the four source CSV tables.
    pub tables_dir: Option<PathBuf>,
    /// Page size for requests that do not name one.
    pub max_results: usize,
    /// City code → name. File entries extend the built-in map.
    pub cities: CityMap,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listings: None,
            tables_dir: None,
            max_results: DEFAULT_MAX_RESULTS,
            cities: default_city_map(),
        }
    }
}

impl Config {
    /// Load from `explicit` (which must exist) or the platform config file
    /// (used only if present), then apply environment overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::load_file(path)?,
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::load_file(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(content)?;
        let mut cities = default_city_map();
        cities.append(&mut config.cities);
        config.cities = cities;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| dotenvy::var(key).ok());
    }

    /// Apply overrides from `lookup`. Empty or unparsable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = lookup(ENV_LISTINGS) {
            self.listings = Some(PathBuf::from(path));
        }
        if let Some(dir) = lookup(ENV_TABLES_DIR) {
            self.tables_dir = Some(PathBuf::from(dir));
        }
        if let Some(raw) = lookup(ENV_MAX_RESULTS) {
            match raw.trim().parse::<usize>() {
                Ok(n) => self.max_results = n,
                Err(_) => warn!(
                    key = ENV_MAX_RESULTS,
                    value = %raw,
                    "ignoring invalid max_results override"
                ),
            }
        }
    }

    /// The configured listings source; a listings file wins over a tables dir.
    pub fn source(&self) -> Result<ListingSource, LoadError> {
        match (&self.listings, &self.tables_dir) {
            (Some(path), _) => Ok(ListingSource::Listings(path.clone())),
            (None, Some(dir)) => Ok(ListingSource::Tables(dir.clone())),
            (None, None) => Err(LoadError::NoSource),
        }
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "propsearch", "propsearch")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
