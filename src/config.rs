use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GazetteerError, Result};
use crate::source::SourceDocument;
use crate::store::TableNames;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://georef.db?mode=rwc";
pub const DEFAULT_BATCH_SIZE: usize = 50;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub sources: SourcesConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Directory holding `<dialect>/<table>.sql` files. The embedded schema is used when unset.
    pub schema_dir: Option<PathBuf>,
    pub tables: TableNames,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SourcesConfig {
    pub country_codes: SourceDocument,
    pub admin_codes: SourceDocument,
    pub feature_codes: SourceDocument,
    pub places: SourceDocument,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct IngestConfig {
    pub batch_size: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 4,
            schema_dir: None,
            tables: TableNames::default(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            country_codes: SourceDocument::Bundled("country-codes.json".to_string()),
            admin_codes: SourceDocument::Bundled("admin1CodesASCII.txt".to_string()),
            feature_codes: SourceDocument::Bundled("featureCodes_en.txt".to_string()),
            places: SourceDocument::Bundled("CA.txt".to_string()),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            GazetteerError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| GazetteerError::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.ingest.batch_size == 0 {
            return Err(GazetteerError::Config(
                "ingest.batch_size must be at least 1".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(GazetteerError::Config(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        self.database.tables.validate()
    }
}
