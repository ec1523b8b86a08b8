//! Country names and ISO codes (`country-codes.json`).

use std::io::Read;

use crate::error::Result;
use crate::models::{CountryCode, CountryRecord};
use crate::source::SourceDocument;
use crate::store::{BatchInsert, Dialect, LoadPlan, ReferenceStore, ReferenceTable, SchemaResource};

const COLUMNS: &[&str] = &[
    "name",
    "capital",
    "continent",
    "iso_alpha2",
    "iso_alpha3",
    "iso_numeric",
];

pub struct CountryCodeLoader {
    table: ReferenceTable,
    batch_size: usize,
}

impl CountryCodeLoader {
    pub fn new(store: ReferenceStore, source: SourceDocument, batch_size: usize) -> Self {
        Self {
            table: ReferenceTable::new(store, SchemaResource::CountryCodes, source),
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
            let countries = parse_country_codes(source.open()?)?;
            Ok(build_plan(countries, dialect, table, batch_size))
        }
    }
}

/// Parse the JSON array of country objects, dropping entries without a name.
pub fn parse_country_codes<R: Read>(reader: R) -> Result<Vec<CountryCode>> {
    let records: Vec<CountryRecord> = serde_json::from_reader(reader)?;
    Ok(records
        .into_iter()
        .filter_map(CountryRecord::into_country)
        .collect())
}

fn build_plan(
    countries: Vec<CountryCode>,
    dialect: Dialect,
    table: String,
    batch_size: usize,
) -> LoadPlan {
    let mut batch = BatchInsert::new(dialect, table, COLUMNS, batch_size);
    for country in countries {
        batch.add(vec![
            country.name.into(),
            country.capital.into(),
            country.continent.into(),
            country.iso_alpha2.into(),
            country.iso_alpha3.into(),
            country.iso_numeric.into(),
        ]);
    }
    let mut plan = LoadPlan::new();
    plan.push(batch.finish());
    plan
}
