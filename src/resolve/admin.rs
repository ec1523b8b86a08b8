use std::sync::Arc;

use crate::error::{GazetteerError, Result};
use crate::loaders::AdminCodeLoader;
use crate::store::Statement;

/// (country code, province name) to first-order admin code.
pub struct AdminCodeResolver {
    loader: Arc<AdminCodeLoader>,
    select_sql: String,
}

impl AdminCodeResolver {
    pub fn new(loader: Arc<AdminCodeLoader>) -> Self {
        let dialect = loader.table().store().dialect();
        let select_sql = format!(
            "SELECT code FROM {} WHERE LOWER(country_code) = {} AND LOWER(name) = {} \
             ORDER BY code LIMIT 1",
            loader.table().name(),
            dialect.placeholder(1),
            dialect.placeholder(2)
        );
        Self { loader, select_sql }
    }

    pub async fn resolve(&self, country_code: &str, province: &str) -> Result<String> {
        let country_code = country_code.trim().to_lowercase();
        let province = province.trim().to_lowercase();
        if country_code.is_empty() {
            return Err(GazetteerError::EmptyInput("country code"));
        }
        if province.is_empty() {
            return Err(GazetteerError::EmptyInput("province name"));
        }
        self.loader.ensure_loaded().await?;

        let stmt = Statement {
            sql: self.select_sql.clone(),
            values: vec![country_code.as_str().into(), province.as_str().into()],
        };
        let codes = self.loader.table().store().fetch_strings(&stmt, "code").await?;
        codes
            .into_iter()
            .next()
            .ok_or(GazetteerError::AdminCodeNotFound {
                country: country_code,
                province,
            })
    }
}
