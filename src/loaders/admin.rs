//! First-order administrative division codes (`admin1CodesASCII.txt`).

use std::io::Read;

use super::tsv_records;
use crate::error::{GazetteerError, Result};
use crate::models::AdminCode;
use crate::source::SourceDocument;
use crate::store::{BatchInsert, Dialect, LoadPlan, ReferenceStore, ReferenceTable, SchemaResource};

const COLUMNS: &[&str] = &["country_code", "code", "name"];

pub struct AdminCodeLoader {
    table: ReferenceTable,
    batch_size: usize,
}

impl AdminCodeLoader {
    pub fn new(store: ReferenceStore, source: SourceDocument, batch_size: usize) -> Self {
        Self {
            table: ReferenceTable::new(store, SchemaResource::AdminCodes, source),
            batch_size,
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

    fn planner(&self) -> impl FnOnce(SourceDocument) -> Result<LoadPlan> + Send + 'static {
        let dialect = self.table.store().dialect();
        let table = self.table.name().to_string();
        let batch_size = self.batch_size;
        move |source| {
            let codes = parse_admin_codes(source.open()?, &source.to_string())?;
            Ok(build_plan(codes, dialect, table, batch_size))
        }
    }
}

/// Parse `<country>.<code>\t<name>\t...` lines. Any malformed line aborts the parse.
pub fn parse_admin_codes<R: Read>(reader: R, source_name: &str) -> Result<Vec<AdminCode>> {
    let mut codes = Vec::new();

    for result in tsv_records(reader) {
        let (line, record) = result?;
        if record.len() < 2 {
            return Err(GazetteerError::malformed(
                source_name,
                line,
                format!("expected at least 2 fields, found {}", record.len()),
            ));
        }
        let (country, code) = record[0].split_once('.').ok_or_else(|| {
            GazetteerError::malformed(
                source_name,
                line,
                format!("expected <country>.<code>, found {:?}", &record[0]),
            )
        })?;

        codes.push(AdminCode {
            country_code: country.trim().to_string(),
            code: code.trim().to_string(),
            name: record[1].to_string(),
        });
    }

    Ok(codes)
}

fn build_plan(codes: Vec<AdminCode>, dialect: Dialect, table: String, batch_size: usize) -> LoadPlan {
    let mut batch = BatchInsert::new(dialect, table, COLUMNS, batch_size);
    for admin in codes {
        batch.add(vec![
            admin.country_code.into(),
            admin.code.into(),
            admin.name.into(),
        ]);
    }
    let mut plan = LoadPlan::new();
    plan.push(batch.finish());
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::temp_store;
    use std::sync::Arc;

    #[test]
    fn test_parse_admin_codes() {
        let data = "CA.03\tManitoba\tManitoba\t6065171\nUS.MN\tMinnesota\tMinnesota\t5037779\n";
        let codes = parse_admin_codes(data.as_bytes(), "admin").unwrap();
        assert_eq!(
            codes[0],
            AdminCode {
                country_code: "CA".to_string(),
                code: "03".to_string(),
                name: "Manitoba".to_string(),
            }
        );
        assert_eq!(codes[1].code, "MN");
    }

    #[test]
    fn test_missing_separator_is_fatal() {
        let data = "CA.03\tManitoba\nCA01\tAlberta\nCA.02\tBritish Columbia\n";
        let err = parse_admin_codes(data.as_bytes(), "admin").unwrap_err();
        match err {
            GazetteerError::MalformedSource { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_error_line_counts_blank_lines() {
        let data = "CA.03\tManitoba\n\n\nCA01\tAlberta\n";
        match parse_admin_codes(data.as_bytes(), "admin").unwrap_err() {
            GazetteerError::MalformedSource { line, .. } => assert_eq!(line, 4),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_single_field_is_fatal() {
        let data = "CA.03\n";
        assert!(matches!(
            parse_admin_codes(data.as_bytes(), "admin"),
            Err(GazetteerError::MalformedSource { .. })
        ));
    }

    #[test]
    fn test_bundled_source_parses() {
        let source = SourceDocument::Bundled("admin1CodesASCII.txt".to_string());
        let codes = parse_admin_codes(source.open().unwrap(), "admin").unwrap();
        assert!(codes
            .iter()
            .any(|c| c.country_code == "CA" && c.code == "03" && c.name == "Manitoba"));
    }

    #[tokio::test]
    async fn test_ensure_loaded_is_idempotent() {
        let (_dir, store) = temp_store().await;
        let loader = AdminCodeLoader::new(
            store.clone(),
            SourceDocument::Bundled("admin1CodesASCII.txt".to_string()),
            50,
        );

        loader.ensure_loaded().await.unwrap();
        let once = loader.table().row_count().await.unwrap();
        assert!(once > 0);

        for _ in 0..3 {
            loader.ensure_loaded().await.unwrap();
        }
        assert_eq!(loader.table().row_count().await.unwrap(), once);

        // A fresh loader over the same store sees a populated table.
        let second = AdminCodeLoader::new(
            store,
            SourceDocument::Bundled("admin1CodesASCII.txt".to_string()),
            50,
        );
        second.ensure_loaded().await.unwrap();
        assert_eq!(second.table().row_count().await.unwrap(), once);
    }

    #[tokio::test]
    async fn test_concurrent_first_loads_load_once() {
        let (_dir, store) = temp_store().await;
        let loader = Arc::new(AdminCodeLoader::new(
            store,
            SourceDocument::Bundled("admin1CodesASCII.txt".to_string()),
            3,
        ));
        let expected = parse_admin_codes(
            SourceDocument::Bundled("admin1CodesASCII.txt".to_string())
                .open()
                .unwrap(),
            "admin",
        )
        .unwrap()
        .len() as i64;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let loader = loader.clone();
            handles.push(tokio::spawn(async move { loader.ensure_loaded().await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(loader.table().row_count().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_malformed_source_leaves_table_empty() {
        let (dir, store) = temp_store().await;
        let path = dir.path().join("admin.txt");
        std::fs::write(&path, "CA.03\tManitoba\nbroken line\n").unwrap();

        let loader = AdminCodeLoader::new(store, SourceDocument::File(path.clone()), 50);
        assert!(matches!(
            loader.ensure_loaded().await,
            Err(GazetteerError::MalformedSource { .. })
        ));
        assert_eq!(loader.table().row_count().await.unwrap(), 0);

        // Fixing the source makes the next call succeed.
        std::fs::write(&path, "CA.03\tManitoba\n").unwrap();
        loader.ensure_loaded().await.unwrap();
        assert_eq!(loader.table().row_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reset_reloads_from_source() {
        let (dir, store) = temp_store().await;
        let path = dir.path().join("admin.txt");
        std::fs::write(&path, "CA.03\tManitoba\n").unwrap();

        let loader = AdminCodeLoader::new(store, SourceDocument::File(path.clone()), 50);
        loader.ensure_loaded().await.unwrap();
        assert_eq!(loader.table().row_count().await.unwrap(), 1);

        std::fs::write(&path, "CA.01\tAlberta\nCA.03\tManitoba\n").unwrap();
        loader.reset().await.unwrap();
        assert_eq!(loader.table().row_count().await.unwrap(), 2);
        loader.reset().await.unwrap();
        assert_eq!(loader.table().row_count().await.unwrap(), 2);

        // A failed reset keeps the previous rows.
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            loader.reset().await,
            Err(GazetteerError::SourceNotFound(_))
        ));
        assert_eq!(loader.table().row_count().await.unwrap(), 2);
    }
}
