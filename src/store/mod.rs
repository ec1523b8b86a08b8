//! Relational store for the reference tables.

pub mod batch;
pub mod dialect;
pub mod schema;
pub mod table;

pub use batch::{BatchInsert, InsertBatches, LoadPlan, SqlValue, Statement};
pub use dialect::Dialect;
pub use schema::{SchemaResource, SchemaSet, TableNames, TableSpec};
pub use table::{LoadGate, ReferenceTable};

use sqlx::any::{AnyArguments, AnyPoolOptions, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyPool, Row};
use std::sync::Arc;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::Result;

/// Shared handle to the database holding the reference tables.
#[derive(Clone)]
pub struct ReferenceStore {
    pool: AnyPool,
    schema: Arc<SchemaSet>,
}

impl ReferenceStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let dialect = Dialect::from_url(&config.url)?;
        let schema = SchemaSet::new(dialect, config.tables.clone(), config.schema_dir.clone())?;

        sqlx::any::install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await?;

        info!("Connected to {} reference store", dialect.name());
        Ok(Self {
            pool,
            schema: Arc::new(schema),
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.schema.dialect()
    }

    pub fn schema(&self) -> &SchemaSet {
        &self.schema
    }

    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        let sql = self.dialect().table_exists_sql();
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(table)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn count_rows(&self, table: &str) -> Result<i64> {
        let sql = self.dialect().count_rows_sql(table);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    /// Create the tables of `spec` unless they all exist already.
    pub async fn ensure_tables(&self, spec: &TableSpec) -> Result<()> {
        let mut missing = false;
        for table in &spec.tables {
            if !self.table_exists(table).await? {
                missing = true;
                break;
            }
        }
        if !missing {
            return Ok(());
        }

        info!("Creating table {}", spec.primary());
        for stmt in self.schema.statements(spec.resource)? {
            sqlx::query(&stmt).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Execute `plan` in one transaction.
    pub async fn load(&self, plan: &LoadPlan) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let rows = execute_plan(&mut tx, plan).await?;
        tx.commit().await?;
        Ok(rows)
    }

    /// Empty every table of `spec` and execute `plan`, in one transaction.
    /// A failure rolls back to the previous contents.
    pub async fn replace(&self, spec: &TableSpec, plan: &LoadPlan) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for table in spec.tables.iter().rev() {
            let sql = self.dialect().truncate_sql(table);
            sqlx::query(&sql).execute(&mut *tx).await?;
        }
        let rows = execute_plan(&mut tx, plan).await?;
        tx.commit().await?;
        Ok(rows)
    }

    pub async fn fetch_optional(&self, stmt: &Statement) -> Result<Option<AnyRow>> {
        let row = bind_values(sqlx::query(&stmt.sql), &stmt.values)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn fetch_all(&self, stmt: &Statement) -> Result<Vec<AnyRow>> {
        let rows = bind_values(sqlx::query(&stmt.sql), &stmt.values)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn fetch_strings(&self, stmt: &Statement, column: &str) -> Result<Vec<String>> {
        self.fetch_all(stmt)
            .await?
            .iter()
            .map(|row| row.try_get::<String, _>(column).map_err(Into::into))
            .collect()
    }
}

async fn execute_plan(tx: &mut sqlx::Transaction<'_, Any>, plan: &LoadPlan) -> Result<u64> {
    for batches in &plan.inserts {
        for stmt in &batches.statements {
            bind_values(sqlx::query(&stmt.sql), &stmt.values)
                .execute(&mut **tx)
                .await?;
        }
        info!("Loaded {} records into table {}", batches.rows, batches.table);
    }
    Ok(plan.total_rows())
}

fn bind_values<'q>(
    mut query: Query<'q, Any, AnyArguments<'q>>,
    values: &'q [SqlValue],
) -> Query<'q, Any, AnyArguments<'q>> {
    for value in values {
        query = match value {
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Real(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.as_str()),
            SqlValue::OptText(v) => query.bind(v.as_deref()),
        };
    }
    query
}
