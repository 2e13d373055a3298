use property_search::model::types::Listing;
use property_search::storage::ListingTable;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Captures tracing output for tests.
#[allow(dead_code)]
pub struct TestTracing {
    buffer: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl TestTracing {
    pub fn new() -> Self {
        Self {
            buffer: std::sync::Arc::new(std::sync::Mutex::new(Vec::new())),
        }
    }

    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.buffer.clone();
        let make_writer = move || TestWriter(writer.clone());
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(make_writer)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn output(&self) -> String {
        let buf = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Assert that the captured log output contains the provided substring.
    pub fn assert_contains(&self, needle: &str) {
        let out = self.output();
        assert!(
            out.contains(needle),
            "expected logs to contain `{needle}`, got:\n{out}"
        );
    }

    /// Return captured log lines (trimmed of trailing newline) for fine-grained checks.
    pub fn lines(&self) -> Vec<String> {
        self.output()
            .lines()
            .map(std::string::ToString::to_string)
            .collect()
    }
}

struct TestWriter(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for TestWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut guard = self.0.lock().unwrap();
        guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Builder for one listing row with readable defaults.
#[derive(Debug, Clone)]
pub struct ListingFixture {
    listing: Listing,
}

#[allow(dead_code)]
impl ListingFixture {
    pub fn new(id: &str, configuration_id: &str) -> Self {
        Self {
            listing: Listing {
                id: id.to_string(),
                configuration_id: Some(configuration_id.to_string()),
                ..Default::default()
            },
        }
    }

    pub fn city(mut self, city: &str) -> Self {
        self.listing.city_name = Some(city.to_string());
        self
    }

    pub fn project(mut self, name: &str) -> Self {
        self.listing.project_name = Some(name.to_string());
        self
    }

    pub fn landmark(mut self, landmark: &str) -> Self {
        self.listing.landmark = Some(landmark.to_string());
        self
    }

    pub fn bhk(mut self, bhk: &str) -> Self {
        self.listing.custom_bhk = Some(bhk.to_string());
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.listing.status = Some(status.to_string());
        self
    }

    pub fn price(mut self, price: f64) -> Self {
        self.listing.price = Some(price);
        self
    }

    pub fn about(mut self, about: &str) -> Self {
        self.listing.about_property = Some(about.to_string());
        self
    }

    pub fn build(self) -> Listing {
        self.listing
    }
}

/// Small Pune/Mumbai catalog used across the integration tests.
///
/// Row 7 repeats the `(p2, c3)` key of row 3 with a lower price; dedup must
/// keep row 3.
#[allow(dead_code)]
pub fn sample_listings() -> Vec<Listing> {
    vec![
        ListingFixture::new("p1", "c1")
            .city("Pune")
            .project("Skyline Heights")
            .landmark("Wakad")
            .bhk("2BHK")
            .status("Ready to move")
            .price(7_500_000.0)
            .about("Gym | Pool")
            .build(),
        ListingFixture::new("p1", "c2")
            .city("Pune")
            .project("Skyline Heights")
            .landmark("Wakad")
            .bhk("3BHK")
            .status("Under Construction")
            .price(11_500_000.0)
            .build(),
        ListingFixture::new("p2", "c3")
            .city("Pune")
            .project("Green Acres")
            .landmark("Baner")
            .bhk("3BHK")
            .status("Ready")
            .price(9_500_000.0)
            .about("Clubhouse, Gym")
            .build(),
        ListingFixture::new("p3", "c4")
            .city("Pune")
            .project("Riverfront")
            .landmark("Kharadi")
            .bhk("3 BHK")
            .status("Under Construction")
            .build(),
        ListingFixture::new("p4", "c5")
            .city("Mumbai")
            .project("Harbour View")
            .landmark("Bandra West")
            .bhk("2BHK")
            .status("Ready")
            .price(8_500_000.0)
            .build(),
        ListingFixture::new("p5", "c6")
            .city("Mumbai")
            .project("Sea Breeze")
            .landmark("Andheri")
            .bhk("1BHK")
            .status("Under Construction")
            .price(6_000_000.0)
            .build(),
        ListingFixture::new("p2", "c3")
            .city("Pune")
            .project("Green Acres")
            .landmark("Baner")
            .bhk("3BHK")
            .status("Ready")
            .price(9_400_000.0)
            .build(),
        ListingFixture::new("p6", "c7")
            .city("Mumbai")
            .project("Palm Grove")
            .landmark("Powai")
            .bhk("3BHK")
            .status("Ready")
            .price(13_000_000.0)
            .build(),
    ]
}

#[allow(dead_code)]
pub fn sample_table() -> ListingTable {
    ListingTable::new(sample_listings())
}

/// Temp dir holding on-disk listings fixtures.
#[allow(dead_code)]
pub struct TempFixtureDir {
    pub dir: TempDir,
}

#[allow(dead_code)]
impl TempFixtureDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("tempdir"),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Write `rows` as JSON Lines and return the file path.
    pub fn write_listings(&self, rows: &[Listing]) -> PathBuf {
        let path = self.dir.path().join("listings.jsonl");
        let body: String = rows
            .iter()
            .map(|row| serde_json::to_string(row).expect("serialize listing") + "\n")
            .collect();
        fs::write(&path, body).expect("write listings");
        path
    }

    /// Write the four source CSV tables and return their directory.
    pub fn write_source_tables(&self) -> PathBuf {
        let dir = self.dir.path().join("tables");
        fs::create_dir_all(&dir).expect("create tables dir");
        write_source_tables(&dir);
        dir
    }

    /// Write an empty config file so tests never read the user's config.
    pub fn empty_config(&self) -> PathBuf {
        let path = self.dir.path().join("config.toml");
        fs::write(&path, "").expect("write config");
        path
    }
}

fn write_source_tables(dir: &Path) {
    let tables = [
        (
            "project.csv",
            "id,projectName,cityId,slug,status\n\
             p1,Skyline Heights,cmf6nu3ru000gvcxspxarll3v,skyline-heights,Ready to move\n\
             p2,Harbour View,cmf50r5a00000vcj0k1iuocuu,,Under Construction\n",
        ),
        (
            "ProjectAddress.csv",
            "id,projectId,landmark\n\
             a1,p1,Wakad\n\
             a2,p2,Bandra West\n",
        ),
        (
            "ProjectConfiguration.csv",
            "id,projectId,customBHK\n\
             c1,p1,2BHK\n\
             c2,p1,3BHK\n\
             c3,p2,2BHK\n",
        ),
        (
            "ProjectConfigurationVariant.csv",
            "id,configurationId,price,aboutProperty,lift,parkingType\n\
             v1,c1,7500000,Gym | Pool,True,Covered\n\
             v2,c2,12500000,Clubhouse,,Open\n\
             v3,c3,9900000,,,\n",
        ),
    ];
    for (name, body) in tables {
        fs::write(dir.join(name), body).expect("write source table");
    }
}
