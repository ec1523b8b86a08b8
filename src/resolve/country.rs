use sqlx::Row;
use std::sync::Arc;

use crate::error::{GazetteerError, Result};
use crate::loaders::CountryCodeLoader;
use crate::models::CountryCode;
use crate::store::Statement;

/// Country name to ISO codes, by exact case-insensitive name.
pub struct CountryResolver {
    loader: Arc<CountryCodeLoader>,
    select_sql: String,
}

impl CountryResolver {
    pub fn new(loader: Arc<CountryCodeLoader>) -> Self {
        let dialect = loader.table().store().dialect();
        let select_sql = format!(
            "SELECT name, capital, continent, iso_alpha2, iso_alpha3, iso_numeric FROM {} \
             WHERE LOWER(name) = {} ORDER BY iso_alpha2 LIMIT 1",
            loader.table().name(),
            dialect.placeholder(1)
        );
        Self { loader, select_sql }
    }

    pub async fn resolve(&self, name: &str) -> Result<CountryCode> {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(GazetteerError::EmptyInput("country name"));
        }
        self.loader.ensure_loaded().await?;

        let stmt = Statement {
            sql: self.select_sql.clone(),
            values: vec![name.as_str().into()],
        };
        let row = self
            .loader
            .table()
            .store()
            .fetch_optional(&stmt)
            .await?
            .ok_or(GazetteerError::CountryNotFound(name))?;

        Ok(CountryCode {
            name: row.try_get("name")?,
            capital: row.try_get("capital")?,
            continent: row.try_get("continent")?,
            iso_alpha2: row.try_get("iso_alpha2")?,
            iso_alpha3: row.try_get("iso_alpha3")?,
            iso_numeric: row.try_get("iso_numeric")?,
        })
    }
}
