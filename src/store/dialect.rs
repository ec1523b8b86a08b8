//! Per-dialect SQL fragments.

use url::Url;

use crate::error::{GazetteerError, Result};

/// Target database for SQL generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

impl Dialect {
    /// Infer the dialect from a connection URL's scheme.
    pub fn from_url(database_url: &str) -> Result<Self> {
        let url = Url::parse(database_url).map_err(|e| {
            GazetteerError::Config(format!("invalid database url {}: {}", database_url, e))
        })?;
        match url.scheme() {
            "sqlite" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            other => Err(GazetteerError::Config(format!(
                "unsupported database scheme: {}",
                other
            ))),
        }
    }

    /// Directory name of this dialect's schema resources.
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
        }
    }

    /// Placeholder for the 1-based parameter `index`.
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Sqlite => "?".to_string(),
            Dialect::Postgres => format!("${}", index),
        }
    }

    /// Most parameters a single statement may bind.
    pub fn max_bind_params(&self) -> usize {
        match self {
            Dialect::Sqlite => 32766,
            Dialect::Postgres => 65535,
        }
    }

    /// A parenthesized row of `count` placeholders starting after `offset` bound values.
    pub fn row_placeholders(&self, offset: usize, count: usize) -> String {
        let params: Vec<String> = (1..=count)
            .map(|i| self.placeholder(offset + i))
            .collect();
        format!("({})", params.join(", "))
    }

    /// Counts tables named by the first parameter; 0 or 1.
    pub fn table_exists_sql(&self) -> String {
        match self {
            Dialect::Sqlite => {
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?".to_string()
            }
            Dialect::Postgres => "SELECT COUNT(*) FROM information_schema.tables \
                 WHERE table_schema = current_schema() AND table_name = $1"
                .to_string(),
        }
    }

    pub fn truncate_sql(&self, table: &str) -> String {
        match self {
            Dialect::Sqlite => format!("DELETE FROM {}", table),
            Dialect::Postgres => format!("TRUNCATE TABLE {}", table),
        }
    }

    pub fn count_rows_sql(&self, table: &str) -> String {
        format!("SELECT COUNT(*) FROM {}", table)
    }
}
