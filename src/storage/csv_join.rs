//! Denormalize the four source project tables into listing rows.
//!
//! ```text
//! project.csv (+cityName)
//!   ⟕ ProjectAddress.csv               on id = projectId            suffix _addr
//!   ⟕ ProjectConfiguration.csv         on id = projectId            suffix _conf
//!   ⟕ ProjectConfigurationVariant.csv  on id_conf = configurationId suffix _var
//! ```
//!
//! Joins are left joins: a project with several configurations fans out into
//! several rows, and a project with none keeps a single row with the right
//! side missing. Right-hand columns whose name already exists on the left get
//! the join's suffix.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, warn};

use super::{CityMap, LoadError, resolve_city};
use crate::model::types::{Listing, parse_price};

pub const PROJECT_TABLE: &str = "project.csv";
pub const ADDRESS_TABLE: &str = "ProjectAddress.csv";
pub const CONFIGURATION_TABLE: &str = "ProjectConfiguration.csv";
pub const VARIANT_TABLE: &str = "ProjectConfigurationVariant.csv";

/// A CSV table with its column order. Empty cells are absent from the row map.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl Table {
    pub fn read(path: &Path) -> Result<Self, LoadError> {
        if !path.exists() {
            return Err(LoadError::MissingTable(path.to_path_buf()));
        }
        let csv_err = |source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(csv_err)?;
        let columns: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            let row = columns
                .iter()
                .zip(record.iter())
                .filter(|(_, cell)| !cell.trim().is_empty())
                .map(|(col, cell)| (col.clone(), cell.to_string()))
                .collect();
            rows.push(row);
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!(table = %name, rows = rows.len(), "read source table");
        Ok(Self {
            name,
            columns,
            rows,
        })
    }

    fn require_column(&self, column: &str) -> Result<(), LoadError> {
        if self.columns.iter().any(|c| c == column) {
            Ok(())
        } else {
            Err(LoadError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
        }
    }
}

/// Left-join `right` onto `left`.
pub fn left_join(
    left: Table,
    right: &Table,
    left_key: &str,
    right_key: &str,
    suffix: &str,
) -> Result<Table, LoadError> {
    left.require_column(left_key)?;
    right.require_column(right_key)?;

    let left_columns: HashSet<&str> = left.columns.iter().map(String::as_str).collect();
    let renamed: HashMap<&str, String> = right
        .columns
        .iter()
        .map(|col| {
            let name = if left_columns.contains(col.as_str()) {
                format!("{col}{suffix}")
            } else {
                col.clone()
            };
            (col.as_str(), name)
        })
        .collect();

    let mut index: HashMap<&str, Vec<&HashMap<String, String>>> = HashMap::new();
    for row in &right.rows {
        if let Some(key) = row.get(right_key) {
            index.entry(key.as_str()).or_default().push(row);
        }
    }

    let mut columns = left.columns.clone();
    columns.extend(right.columns.iter().map(|c| renamed[c.as_str()].clone()));

    let mut rows = Vec::with_capacity(left.rows.len());
    for row in left.rows {
        let matches = row
            .get(left_key)
            .and_then(|key| index.get(key.as_str()))
            .filter(|m| !m.is_empty());
        match matches {
            None => rows.push(row),
            Some(matches) => {
                for right_row in matches {
                    let mut merged = row.clone();
                    for (col, value) in right_row.iter() {
                        merged.insert(renamed[col.as_str()].clone(), value.clone());
                    }
                    rows.push(merged);
                }
            }
        }
    }

    Ok(Table {
        name: format!("{}+{}", left.name, right.name),
        columns,
        rows,
    })
}

/// Read and join the source tables in `dir` into listing rows.
pub fn load_project_tables(dir: &Path, cities: &CityMap) -> Result<Vec<Listing>, LoadError> {
    let mut project = Table::read(&dir.join(PROJECT_TABLE))?;
    let address = Table::read(&dir.join(ADDRESS_TABLE))?;
    let configuration = Table::read(&dir.join(CONFIGURATION_TABLE))?;
    let variant = Table::read(&dir.join(VARIANT_TABLE))?;

    add_city_names(&mut project, cities);

    let merged = left_join(project, &address, "id", "projectId", "_addr")?;
    let merged = left_join(merged, &configuration, "id", "projectId", "_conf")?;
    let merged = left_join(merged, &variant, "id_conf", "configurationId", "_var")?;

    let mut listings = Vec::with_capacity(merged.rows.len());
    for row in &merged.rows {
        match listing_from_row(row) {
            Some(mut listing) => {
                resolve_city(&mut listing, cities);
                listings.push(listing);
            }
            None => warn!(table = %merged.name, "skipping joined row without id"),
        }
    }
    Ok(listings)
}

fn add_city_names(project: &mut Table, cities: &CityMap) {
    if !project.columns.iter().any(|c| c == "cityName") {
        project.columns.push("cityName".to_string());
    }
    for row in &mut project.rows {
        match row.get("cityId").and_then(|code| cities.get(code)) {
            Some(name) => {
                row.insert("cityName".to_string(), name.clone());
            }
            None => {
                row.remove("cityName");
            }
        }
    }
}

fn listing_from_row(row: &HashMap<String, String>) -> Option<Listing> {
    let text = |col: &str| row.get(col).cloned();
    Some(Listing {
        id: text("id")?,
        configuration_id: text("configurationId"),
        city_id: text("cityId"),
        city_name: text("cityName"),
        project_name: text("projectName"),
        landmark: text("landmark"),
        custom_bhk: text("customBHK"),
        status: text("status"),
        price: row.get("price").and_then(|p| parse_price(p)),
        about_property: text("aboutProperty"),
        lift: text("lift"),
        parking_type: text("parkingType"),
        slug: text("slug"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::default_city_map;
    use std::fs;
    use tempfile::TempDir;

    fn write_tables(dir: &Path) -> anyhow::Result<()> {
        fs::write(
            dir.join(PROJECT_TABLE),
            "id,projectName,cityId,slug,status\n\
             p1,Skyline Heights,cmf6nu3ru000gvcxspxarll3v,skyline-heights,Ready to move\n\
             p2,Harbour View,cmf50r5a00000vcj0k1iuocuu,,Under Construction\n\
             p3,Lonely Plot,unknown-city,,\n",
        )?;
        fs::write(
            dir.join(ADDRESS_TABLE),
            "id,projectId,landmark\n\
             a1,p1,Wakad\n\
             a2,p2,Bandra West\n",
        )?;
        fs::write(
            dir.join(CONFIGURATION_TABLE),
            "id,projectId,customBHK\n\
             c1,p1,2BHK\n\
             c2,p1,3BHK\n\
             c3,p2,1BHK\n",
        )?;
        fs::write(
            dir.join(VARIANT_TABLE),
            "id,configurationId,price,aboutProperty,lift,parkingType\n\
             v1,c1,7500000,Gym | Pool,True,Covered\n\
             v2,c2,12500000,Clubhouse,,Open\n\
             v3,c3,not-a-price,,,\n",
        )?;
        Ok(())
    }

    #[test]
    fn joins_fan_out_and_keep_unmatched_projects() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        write_tables(dir.path())?;

        let rows = load_project_tables(dir.path(), &default_city_map())?;
        assert_eq!(rows.len(), 4);

        let p1: Vec<_> = rows.iter().filter(|r| r.id == "p1").collect();
        assert_eq!(p1.len(), 2);
        assert_eq!(p1[0].configuration_id.as_deref(), Some("c1"));
        assert_eq!(p1[0].custom_bhk.as_deref(), Some("2BHK"));
        assert_eq!(p1[0].landmark.as_deref(), Some("Wakad"));
        assert_eq!(p1[0].city_name.as_deref(), Some("Pune"));
        assert_eq!(p1[0].price, Some(7_500_000.0));
        assert_eq!(p1[0].lift.as_deref(), Some("True"));
        assert_eq!(p1[1].configuration_id.as_deref(), Some("c2"));

        let p2 = rows.iter().find(|r| r.id == "p2").expect("p2 row");
        assert_eq!(p2.city_name.as_deref(), Some("Mumbai"));
        assert_eq!(p2.price, None);
        assert_eq!(p2.slug, None);

        let p3 = rows.iter().find(|r| r.id == "p3").expect("p3 row");
        assert_eq!(p3.city_name, None);
        assert_eq!(p3.configuration_id, None);
        assert_eq!(p3.landmark, None);
        Ok(())
    }

    #[test]
    fn overlapping_right_columns_get_suffixed() -> anyhow::Result<()> {
        let left = Table {
            name: "l".into(),
            columns: vec!["id".into(), "name".into()],
            rows: vec![HashMap::from([
                ("id".to_string(), "1".to_string()),
                ("name".to_string(), "left".to_string()),
            ])],
        };
        let right = Table {
            name: "r".into(),
            columns: vec!["ref".into(), "name".into()],
            rows: vec![HashMap::from([
                ("ref".to_string(), "1".to_string()),
                ("name".to_string(), "right".to_string()),
            ])],
        };
        let joined = left_join(left, &right, "id", "ref", "_r")?;
        assert_eq!(joined.columns, vec!["id", "name", "ref", "name_r"]);
        assert_eq!(joined.rows[0]["name"], "left");
        assert_eq!(joined.rows[0]["name_r"], "right");
        Ok(())
    }

    #[test]
    fn missing_table_and_column_are_reported() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let err = load_project_tables(dir.path(), &CityMap::new()).unwrap_err();
        assert!(matches!(err, LoadError::MissingTable(_)));

        let left = Table {
            name: "l".into(),
            columns: vec!["id".into()],
            rows: vec![],
        };
        let err = left_join(left, &Table::default(), "id", "projectId", "_x").unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { .. }));
        Ok(())
    }
}
