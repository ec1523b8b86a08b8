//! Table definitions for the reference tables.
//!
//! Each loader owns one schema resource. Resources are DDL templates with
//! `{table}` style tokens that are replaced by the configured table names,
//! so the same files serve any naming. The dialect's templates are embedded
//! at compile time; `database.schema_dir` overrides them from disk.

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use super::Dialect;
use crate::error::{GazetteerError, Result};

const SQLITE_COUNTRY_CODES: &str = include_str!("../../schema/sqlite/country_codes.sql");
const SQLITE_ADMIN_CODES: &str = include_str!("../../schema/sqlite/admin_codes.sql");
const SQLITE_FEATURE_CODES: &str = include_str!("../../schema/sqlite/feature_codes.sql");
const SQLITE_PLACES: &str = include_str!("../../schema/sqlite/places.sql");

const POSTGRES_COUNTRY_CODES: &str = include_str!("../../schema/postgres/country_codes.sql");
const POSTGRES_ADMIN_CODES: &str = include_str!("../../schema/postgres/admin_codes.sql");
const POSTGRES_FEATURE_CODES: &str = include_str!("../../schema/postgres/feature_codes.sql");
const POSTGRES_PLACES: &str = include_str!("../../schema/postgres/places.sql");

/// Names of the reference tables.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TableNames {
    pub country_codes: String,
    pub admin_codes: String,
    pub feature_codes: String,
    pub places: String,
    pub alternate_names: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            country_codes: "country_codes".to_string(),
            admin_codes: "admin1_codes".to_string(),
            feature_codes: "feature_codes".to_string(),
            places: "place_lookup".to_string(),
            alternate_names: "place_lookup_alt_names".to_string(),
        }
    }
}

impl TableNames {
    /// Table names are spliced into SQL, so only plain identifiers are accepted.
    pub fn validate(&self) -> Result<()> {
        let names = [
            &self.country_codes,
            &self.admin_codes,
            &self.feature_codes,
            &self.places,
            &self.alternate_names,
        ];
        for name in names {
            if !is_identifier(name) {
                return Err(GazetteerError::Config(format!(
                    "invalid table name: {:?}",
                    name
                )));
            }
        }
        Ok(())
    }

    fn substitute(&self, template: &str) -> String {
        template
            .replace("{country_codes}", &self.country_codes)
            .replace("{admin_codes}", &self.admin_codes)
            .replace("{feature_codes}", &self.feature_codes)
            .replace("{alternate_names}", &self.alternate_names)
            .replace("{places}", &self.places)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// The schema resource a loader owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaResource {
    CountryCodes,
    AdminCodes,
    FeatureCodes,
    Places,
}

impl SchemaResource {
    pub fn file_name(&self) -> &'static str {
        match self {
            SchemaResource::CountryCodes => "country_codes.sql",
            SchemaResource::AdminCodes => "admin_codes.sql",
            SchemaResource::FeatureCodes => "feature_codes.sql",
            SchemaResource::Places => "places.sql",
        }
    }

    fn embedded(&self, dialect: Dialect) -> &'static str {
        match (dialect, self) {
            (Dialect::Sqlite, SchemaResource::CountryCodes) => SQLITE_COUNTRY_CODES,
            (Dialect::Sqlite, SchemaResource::AdminCodes) => SQLITE_ADMIN_CODES,
            (Dialect::Sqlite, SchemaResource::FeatureCodes) => SQLITE_FEATURE_CODES,
            (Dialect::Sqlite, SchemaResource::Places) => SQLITE_PLACES,
            (Dialect::Postgres, SchemaResource::CountryCodes) => POSTGRES_COUNTRY_CODES,
            (Dialect::Postgres, SchemaResource::AdminCodes) => POSTGRES_ADMIN_CODES,
            (Dialect::Postgres, SchemaResource::FeatureCodes) => POSTGRES_FEATURE_CODES,
            (Dialect::Postgres, SchemaResource::Places) => POSTGRES_PLACES,
        }
    }
}

/// Tables owned by one loader. The first table is the one whose row count
/// decides whether a load is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSpec {
    pub resource: SchemaResource,
    pub tables: Vec<String>,
}

impl TableSpec {
    pub fn primary(&self) -> &str {
        &self.tables[0]
    }
}

/// Resolves table names and DDL for one dialect.
#[derive(Debug, Clone)]
pub struct SchemaSet {
    dialect: Dialect,
    names: TableNames,
    schema_dir: Option<PathBuf>,
}

impl SchemaSet {
    pub fn new(dialect: Dialect, names: TableNames, schema_dir: Option<PathBuf>) -> Result<Self> {
        names.validate()?;
        Ok(Self {
            dialect,
            names,
            schema_dir,
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn names(&self) -> &TableNames {
        &self.names
    }

    pub fn spec(&self, resource: SchemaResource) -> TableSpec {
        let tables = match resource {
            SchemaResource::CountryCodes => vec![self.names.country_codes.clone()],
            SchemaResource::AdminCodes => vec![self.names.admin_codes.clone()],
            SchemaResource::FeatureCodes => vec![self.names.feature_codes.clone()],
            SchemaResource::Places => vec![
                self.names.places.clone(),
                self.names.alternate_names.clone(),
            ],
        };
        TableSpec { resource, tables }
    }

    /// DDL statements for `resource`, with table names substituted.
    pub fn statements(&self, resource: SchemaResource) -> Result<Vec<String>> {
        let template = match &self.schema_dir {
            Some(dir) => {
                let path = dir.join(self.dialect.name()).join(resource.file_name());
                fs::read_to_string(&path).map_err(|e| {
                    GazetteerError::SourceNotFound(format!("{}: {}", path.display(), e))
                })?
            }
            None => resource.embedded(self.dialect).to_string(),
        };
        Ok(split_sql_statements(&self.names.substitute(&template)))
    }
}

/// Split a DDL script on `;`, dropping `--` comments and blank statements.
fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut buf = String::new();

    for line in sql.lines() {
        let line = match line.find("--") {
            Some(pos) => &line[..pos],
            None => line,
        };
        for (i, part) in line.split(';').enumerate() {
            if i > 0 {
                let stmt = buf.trim();
                if !stmt.is_empty() {
                    out.push(stmt.to_string());
                }
                buf.clear();
            }
            buf.push_str(part);
        }
        buf.push('\n');
    }

    let stmt = buf.trim();
    if !stmt.is_empty() {
        out.push(stmt.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sql_statements() {
        let sql = "-- header\nCREATE TABLE a (x INTEGER); -- trailing\n\nCREATE INDEX a_x ON a (x);\n";
        let statements = split_sql_statements(sql);
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE a (x INTEGER)".to_string(),
                "CREATE INDEX a_x ON a (x)".to_string()
            ]
        );
    }

    #[test]
    fn test_embedded_schema_uses_configured_names() {
        let names = TableNames {
            places: "ca_places".to_string(),
            alternate_names: "ca_place_names".to_string(),
            ..TableNames::default()
        };
        let schema = SchemaSet::new(Dialect::Sqlite, names, None).unwrap();
        let statements = schema.statements(SchemaResource::Places).unwrap();
        assert!(statements
            .iter()
            .any(|s| s.starts_with("CREATE TABLE IF NOT EXISTS ca_places ")));
        assert!(statements
            .iter()
            .any(|s| s.starts_with("CREATE TABLE IF NOT EXISTS ca_place_names ")));
        assert!(statements.iter().all(|s| !s.contains('{')));

        let spec = schema.spec(SchemaResource::Places);
        assert_eq!(spec.primary(), "ca_places");
        assert_eq!(spec.tables.len(), 2);
    }

    #[test]
    fn test_every_embedded_resource_substitutes() {
        for dialect in [Dialect::Sqlite, Dialect::Postgres] {
            let schema = SchemaSet::new(dialect, TableNames::default(), None).unwrap();
            for resource in [
                SchemaResource::CountryCodes,
                SchemaResource::AdminCodes,
                SchemaResource::FeatureCodes,
                SchemaResource::Places,
            ] {
                let statements = schema.statements(resource).unwrap();
                assert!(!statements.is_empty());
                assert!(statements.iter().all(|s| !s.contains('{')));
            }
        }
    }

    #[test]
    fn test_invalid_table_name_rejected() {
        let names = TableNames {
            places: "places; DROP TABLE x".to_string(),
            ..TableNames::default()
        };
        assert!(SchemaSet::new(Dialect::Sqlite, names, None).is_err());
    }

    #[test]
    fn test_schema_dir_override() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sqlite")).unwrap();
        fs::write(
            dir.path().join("sqlite").join("admin_codes.sql"),
            "CREATE TABLE IF NOT EXISTS {admin_codes} (country_code TEXT, code TEXT, name TEXT);",
        )
        .unwrap();

        let schema = SchemaSet::new(
            Dialect::Sqlite,
            TableNames::default(),
            Some(dir.path().to_path_buf()),
        )
        .unwrap();
        let statements = schema.statements(SchemaResource::AdminCodes).unwrap();
        assert_eq!(
            statements,
            vec![
                "CREATE TABLE IF NOT EXISTS admin1_codes (country_code TEXT, code TEXT, name TEXT)"
                    .to_string()
            ]
        );
        assert!(matches!(
            schema.statements(SchemaResource::Places),
            Err(GazetteerError::SourceNotFound(_))
        ));
    }
}
