//! Feature class/code vocabulary (`featureCodes_en.txt`).

use sqlx::Row;
use std::io::Read;
use tracing::warn;

use super::tsv_records;
use crate::error::{GazetteerError, Result};
use crate::models::{FeatureCode, MAX_DESCRIPTION_CHARS};
use crate::source::SourceDocument;
use crate::store::{
    BatchInsert, Dialect, LoadPlan, ReferenceStore, ReferenceTable, SchemaResource, Statement,
};

const COLUMNS: &[&str] = &["feature_class", "code", "name", "description"];

pub struct FeatureCodeLoader {
    table: ReferenceTable,
    batch_size: usize,
    lookup_sql: String,
}

impl FeatureCodeLoader {
    pub fn new(store: ReferenceStore, source: SourceDocument, batch_size: usize) -> Self {
        let table = ReferenceTable::new(store, SchemaResource::FeatureCodes, source);
        let dialect = table.store().dialect();
        let lookup_sql = format!(
            "SELECT feature_class, code, name, description FROM {} \
             WHERE feature_class = {} AND code = {} ORDER BY name LIMIT 1",
            table.name(),
            dialect.placeholder(1),
            dialect.placeholder(2)
        );
        Self {
            table,
            batch_size,
            lookup_sql,
        }
    }

    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    pub async fn ensure_loaded(&self) -> Result<()> {
        let prepare = self.planner();
        self.table.ensure_loaded(prepare).await
    }

    pub async fn reset(&self) -> Result<()> {
        let prepare = self.planner();
        self.table.reset(prepare).await
    }

    /// Vocabulary entry for a class/code pair, e.g. (`P`, `PPLA`).
    pub async fn lookup(&self, feature_class: &str, code: &str) -> Result<Option<FeatureCode>> {
        self.ensure_loaded().await?;

        let stmt = Statement {
            sql: self.lookup_sql.clone(),
            values: vec![feature_class.trim().into(), code.trim().into()],
        };
        let Some(row) = self.table.store().fetch_optional(&stmt).await? else {
            return Ok(None);
        };
        Ok(Some(FeatureCode {
            feature_class: row.try_get("feature_class")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        }))
    }

    fn planner(&self) -> impl FnOnce(SourceDocument) -> Result<LoadPlan> + Send + 'static {
        let dialect = self.table.store().dialect();
        let table = self.table.name().to_string();
        let batch_size = self.batch_size;
        move |source| {
            let features = parse_feature_codes(source.open()?, &source.to_string())?;
            Ok(build_plan(features, dialect, table, batch_size))
        }
    }
}

/// Parse `<class>.<code>\t<name>[\t<description>]` lines.
///
/// A first field without a `.` only skips that line. Descriptions are cut to
/// [`MAX_DESCRIPTION_CHARS`].
pub fn parse_feature_codes<R: Read>(reader: R, source_name: &str) -> Result<Vec<FeatureCode>> {
    let mut features = Vec::new();

    for result in tsv_records(reader) {
        let (line, record) = result?;
        if record.len() < 2 {
            return Err(GazetteerError::malformed(
                source_name,
                line,
                format!("expected at least 2 fields, found {}", record.len()),
            ));
        }
        let Some((feature_class, code)) = record[0].split_once('.') else {
            warn!(
                "Skipping line {} of {}: cannot split {:?} into class and code",
                line, source_name, &record[0]
            );
            continue;
        };

        let description = match record.get(2).map(str::trim) {
            Some(d) if !d.is_empty() => Some(truncate_description(feature_class, code, d)),
            _ => None,
        };

        features.push(FeatureCode {
            feature_class: feature_class.trim().to_string(),
            code: code.trim().to_string(),
            name: record[1].trim().to_string(),
            description,
        });
    }

    Ok(features)
}

fn truncate_description(feature_class: &str, code: &str, description: &str) -> String {
    let length = description.chars().count();
    if length <= MAX_DESCRIPTION_CHARS {
        return description.to_string();
    }
    warn!(
        "Feature {}.{} has description length of {}, truncating to {}",
        feature_class, code, length, MAX_DESCRIPTION_CHARS
    );
    description.chars().take(MAX_DESCRIPTION_CHARS).collect()
}

fn build_plan(
    features: Vec<FeatureCode>,
    dialect: Dialect,
    table: String,
    batch_size: usize,
) -> LoadPlan {
    let mut batch = BatchInsert::new(dialect, table, COLUMNS, batch_size);
    for feature in features {
        batch.add(vec![
            feature.feature_class.into(),
            feature.code.into(),
            feature.name.into(),
            feature.description.into(),
        ]);
    }
    let mut plan = LoadPlan::new();
    plan.push(batch.finish());
    plan
}
