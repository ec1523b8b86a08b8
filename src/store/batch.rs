//! Batched multi-row inserts.

use tracing::debug;

use super::Dialect;

/// A value bound to a statement parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Real(f64),
    Text(String),
    OptText(Option<String>),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<Option<String>> for SqlValue {
    fn from(v: Option<String>) -> Self {
        SqlValue::OptText(v)
    }
}

/// SQL text with its bound values, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Rows destined for one table, already split into statements.
#[derive(Debug, Clone)]
pub struct InsertBatches {
    pub table: String,
    pub statements: Vec<Statement>,
    pub rows: u64,
}

/// Everything a loader writes, in execution order.
#[derive(Debug, Clone, Default)]
pub struct LoadPlan {
    pub inserts: Vec<InsertBatches>,
}

impl LoadPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, batches: InsertBatches) {
        self.inserts.push(batches);
    }

    pub fn total_rows(&self) -> u64 {
        self.inserts.iter().map(|b| b.rows).sum()
    }
}

/// Buffers rows and turns every `batch_size` of them into one
/// `INSERT ... VALUES (..), (..)` statement. The batch size is lowered when
/// a statement would bind more values than the dialect allows.
pub struct BatchInsert {
    dialect: Dialect,
    table: String,
    columns: &'static [&'static str],
    batch_size: usize,
    buffer: Vec<Vec<SqlValue>>,
    statements: Vec<Statement>,
    rows: u64,
}

impl BatchInsert {
    pub fn new(
        dialect: Dialect,
        table: impl Into<String>,
        columns: &'static [&'static str],
        batch_size: usize,
    ) -> Self {
        let table: String = table.into();
        let limit = (dialect.max_bind_params() / columns.len().max(1)).max(1);
        if batch_size > limit {
            debug!(
                "Batch size {} for {} exceeds the bind limit, using {}",
                batch_size, table, limit
            );
        }
        let batch_size = batch_size.clamp(1, limit);
        Self {
            dialect,
            table,
            columns,
            batch_size,
            buffer: Vec::with_capacity(batch_size),
            statements: Vec::new(),
            rows: 0,
        }
    }

    /// Add a row to the buffer, flushing if the batch is full.
    pub fn add(&mut self, row: Vec<SqlValue>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.buffer.push(row);

        if self.buffer.len() >= self.batch_size {
            self.flush();
        }
    }

    pub fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let rows = std::mem::take(&mut self.buffer);
        let width = self.columns.len();
        let mut groups = Vec::with_capacity(rows.len());
        let mut values = Vec::with_capacity(rows.len() * width);

        for row in rows {
            groups.push(self.dialect.row_placeholders(values.len(), width));
            values.extend(row);
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.table,
            self.columns.join(", "),
            groups.join(", ")
        );

        debug!("Batched {} rows for {}", groups.len(), self.table);
        self.rows += groups.len() as u64;
        self.statements.push(Statement { sql, values });
        self.buffer = Vec::with_capacity(self.batch_size);
    }

    pub fn finish(mut self) -> InsertBatches {
        self.flush();
        InsertBatches {
            table: self.table,
            statements: self.statements,
            rows: self.rows,
        }
    }
}
