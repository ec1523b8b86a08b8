//! GeoNames place records (`CA.txt`, `allCountries.txt`, ...).
//!
//! Each line has 19 tab-separated fields:
//!
//! ```text
//! geonameid  name  asciiname  alternatenames  latitude  longitude
//! feature class  feature code  country code  cc2  admin1 code  admin2 code
//! admin3 code  admin4 code  population  elevation  dem  timezone
//! modification date
//! ```
//!
//! `cc2` is discarded. The comma-separated alternate names become rows of a
//! second table, written after every place row.

use chrono::{Local, NaiveDate};
use std::io::Read;

use super::tsv_records;
use crate::error::{GazetteerError, Result};
use crate::models::{AlternateName, Place};
use crate::source::SourceDocument;
use crate::store::{
    BatchInsert, Dialect, LoadPlan, ReferenceStore, ReferenceTable, SchemaResource, Statement,
};

const FIELD_COUNT: usize = 19;

const PLACE_COLUMNS: &[&str] = &[
    "id",
    "name",
    "ascii_name",
    "latitude",
    "longitude",
    "feature_class",
    "feature_code",
    "country_code",
    "admin_code1",
    "admin_code2",
    "admin_code3",
    "admin_code4",
    "population",
    "elevation",
    "dem",
    "timezone",
    "modified_date",
];

const ALTERNATE_NAME_COLUMNS: &[&str] = &["place_id", "name"];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Places and alternate names parsed from one source document.
#[derive(Debug, Default)]
pub struct ParsedPlaces {
    pub places: Vec<Place>,
    pub alternate_names: Vec<AlternateName>,
}

pub struct PlaceLoader {
    table: ReferenceTable,
    batch_size: usize,
    alternate_names_sql: String,
}

impl PlaceLoader {
    pub fn new(store: ReferenceStore, source: SourceDocument, batch_size: usize) -> Self {
        let table = ReferenceTable::new(store, SchemaResource::Places, source);
        let alternate_names_sql = format!(
            "SELECT name FROM {} WHERE place_id = {} ORDER BY id",
            table.store().schema().names().alternate_names,
            table.store().dialect().placeholder(1)
        );
        Self {
            table,
            batch_size,
            alternate_names_sql,
        }
    }

    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    pub async fn ensure_loaded(&self) -> Result<()> {
        let prepare = self.planner();
        self.table.ensure_loaded(prepare).await
    }

    /// Truncate both the place and alternate-name tables and reload them.
    pub async fn reset(&self) -> Result<()> {
        let prepare = self.planner();
        self.table.reset(prepare).await
    }

    /// Alternate names of a place, in source order.
    pub async fn alternate_names(&self, place_id: i64) -> Result<Vec<String>> {
        self.ensure_loaded().await?;
        let stmt = Statement {
            sql: self.alternate_names_sql.clone(),
            values: vec![place_id.into()],
        };
        self.table.store().fetch_strings(&stmt, "name").await
    }

    fn planner(&self) -> impl FnOnce(SourceDocument) -> Result<LoadPlan> + Send + 'static {
        let dialect = self.table.store().dialect();
        let places_table = self.table.name().to_string();
        let alternate_names_table = self.table.store().schema().names().alternate_names.clone();
        let batch_size = self.batch_size;
        move |source| {
            let parsed = parse_places(source.open()?, &source.to_string())?;
            Ok(build_plan(
                parsed,
                dialect,
                places_table,
                alternate_names_table,
                batch_size,
            ))
        }
    }
}

/// Parse every line of a GeoNames dump. Any malformed line aborts the parse.
pub fn parse_places<R: Read>(reader: R, source_name: &str) -> Result<ParsedPlaces> {
    let today = Local::now().date_naive();
    let mut parsed = ParsedPlaces::default();

    for result in tsv_records(reader) {
        let (line, record) = result?;
        if record.len() < FIELD_COUNT {
            return Err(GazetteerError::malformed(
                source_name,
                line,
                format!("expected {} fields, found {}", FIELD_COUNT, record.len()),
            ));
        }

        let field = |i: usize| record[i].trim();
        let number = |i: usize, what: &str| -> Result<i64> {
            match field(i) {
                "" => Ok(0),
                value => value.parse().map_err(|_| {
                    GazetteerError::malformed(source_name, line, format!("invalid {}: {:?}", what, value))
                }),
            }
        };
        let coordinate = |i: usize, what: &str| -> Result<f64> {
            field(i).parse().map_err(|_| {
                GazetteerError::malformed(source_name, line, format!("invalid {}: {:?}", what, field(i)))
            })
        };

        let id: i64 = field(0).parse().map_err(|_| {
            GazetteerError::malformed(source_name, line, format!("invalid id: {:?}", field(0)))
        })?;
        let modified_date = match field(18) {
            "" => today,
            value => NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
                GazetteerError::malformed(
                    source_name,
                    line,
                    format!("invalid modification date: {:?}", value),
                )
            })?,
        };

        parsed.places.push(Place {
            id,
            name: field(1).to_string(),
            ascii_name: field(2).to_string(),
            latitude: coordinate(4, "latitude")?,
            longitude: coordinate(5, "longitude")?,
            feature_class: field(6).to_string(),
            feature_code: field(7).to_string(),
            country_code: field(8).to_string(),
            admin_code1: field(10).to_string(),
            admin_code2: field(11).to_string(),
            admin_code3: field(12).to_string(),
            admin_code4: field(13).to_string(),
            population: number(14, "population")?,
            elevation: number(15, "elevation")?,
            dem: number(16, "dem")?,
            timezone: field(17).to_string(),
            modified_date,
        });

        parsed.alternate_names.extend(
            field(3)
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| AlternateName {
                    place_id: id,
                    name: name.to_string(),
                }),
        );
    }

    Ok(parsed)
}

fn build_plan(
    parsed: ParsedPlaces,
    dialect: Dialect,
    places_table: String,
    alternate_names_table: String,
    batch_size: usize,
) -> LoadPlan {
    let mut places = BatchInsert::new(dialect, places_table, PLACE_COLUMNS, batch_size);
    for place in parsed.places {
        places.add(vec![
            place.id.into(),
            place.name.into(),
            place.ascii_name.into(),
            place.latitude.into(),
            place.longitude.into(),
            place.feature_class.into(),
            place.feature_code.into(),
            place.country_code.into(),
            place.admin_code1.into(),
            place.admin_code2.into(),
            place.admin_code3.into(),
            place.admin_code4.into(),
            place.population.into(),
            place.elevation.into(),
            place.dem.into(),
            place.timezone.into(),
            place.modified_date.format(DATE_FORMAT).to_string().into(),
        ]);
    }

    let mut alternate_names = BatchInsert::new(
        dialect,
        alternate_names_table,
        ALTERNATE_NAME_COLUMNS,
        batch_size,
    );
    for alternate in parsed.alternate_names {
        alternate_names.add(vec![alternate.place_id.into(), alternate.name.into()]);
    }

    let mut plan = LoadPlan::new();
    plan.push(places.finish());
    plan.push(alternate_names.finish());
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::temp_store;

    const WINNIPEG: &str = "6183235\tWinnipeg\tWinnipeg\tVinnipeg,Winnipeg,YWG,Виннипег\t49.8844\t-97.14704\tP\tPPLA\tCA\t\t03\t4611\t\t\t749607\t\t239\tAmerica/Winnipeg\t2022-02-22\n";

    #[test]
    fn test_parse_place_line() {
        let parsed = parse_places(WINNIPEG.as_bytes(), "places").unwrap();
        assert_eq!(parsed.places.len(), 1);

        let place = &parsed.places[0];
        assert_eq!(place.id, 6183235);
        assert_eq!(place.name, "Winnipeg");
        assert_eq!(place.latitude, 49.8844);
        assert_eq!(place.longitude, -97.14704);
        assert_eq!(place.feature_code, "PPLA");
        assert_eq!(place.admin_code1, "03");
        assert_eq!(place.admin_code2, "4611");
        assert_eq!(place.population, 749607);
        assert_eq!(place.elevation, 0);
        assert_eq!(place.dem, 239);
        assert_eq!(place.timezone, "America/Winnipeg");
        assert_eq!(
            place.modified_date,
            NaiveDate::from_ymd_opt(2022, 2, 22).unwrap()
        );

        let names: Vec<&str> = parsed
            .alternate_names
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(names, vec!["Vinnipeg", "Winnipeg", "YWG", "Виннипег"]);
        assert!(parsed.alternate_names.iter().all(|a| a.place_id == 6183235));
    }

    #[test]
    fn test_blank_numbers_and_date_default() {
        let line = "6077243\tOakbank\tOakbank\t\t49.93\t-96.85\tP\tPPL\tCA\t\t03\t\t\t\t\t\t\tAmerica/Winnipeg\t\n";
        let parsed = parse_places(line.as_bytes(), "places").unwrap();
        let place = &parsed.places[0];
        assert_eq!(place.population, 0);
        assert_eq!(place.elevation, 0);
        assert_eq!(place.dem, 0);
        assert_eq!(place.modified_date, Local::now().date_naive());
        assert!(parsed.alternate_names.is_empty());
    }

    #[test]
    fn test_short_line_is_fatal() {
        let data = format!("{}6077243\tOakbank\tOakbank\n", WINNIPEG);
        match parse_places(data.as_bytes(), "places") {
            Err(GazetteerError::MalformedSource { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {:?}", other.map(|p| p.places.len())),
        }
    }

    #[test]
    fn test_bad_latitude_is_fatal() {
        let data = WINNIPEG.replace("49.8844", "north");
        assert!(matches!(
            parse_places(data.as_bytes(), "places"),
            Err(GazetteerError::MalformedSource { .. })
        ));
    }

    #[test]
    fn test_plan_writes_places_before_alternate_names() {
        let parsed = parse_places(WINNIPEG.as_bytes(), "places").unwrap();
        let plan = build_plan(
            parsed,
            Dialect::Sqlite,
            "place_lookup".to_string(),
            "place_lookup_alt_names".to_string(),
            50,
        );
        assert_eq!(plan.inserts[0].table, "place_lookup");
        assert_eq!(plan.inserts[0].rows, 1);
        assert_eq!(plan.inserts[1].table, "place_lookup_alt_names");
        assert_eq!(plan.inserts[1].rows, 4);
    }

    #[tokio::test]
    async fn test_alternate_names_round_trip_through_store() {
        let (_dir, store) = temp_store().await;
        let loader = PlaceLoader::new(store, SourceDocument::Bundled("CA.txt".to_string()), 7);

        let names = loader.alternate_names(6183235).await.unwrap();
        assert_eq!(names, vec!["Vinnipeg", "Winnipeg", "YWG", "Виннипег"]);
        assert!(loader.alternate_names(-1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reset_truncates_both_tables() {
        let (dir, store) = temp_store().await;
        let path = dir.path().join("places.txt");
        std::fs::write(&path, WINNIPEG).unwrap();

        let loader = PlaceLoader::new(store.clone(), SourceDocument::File(path.clone()), 50);
        loader.ensure_loaded().await.unwrap();
        loader.reset().await.unwrap();
        loader.reset().await.unwrap();

        assert_eq!(store.count_rows("place_lookup").await.unwrap(), 1);
        assert_eq!(store.count_rows("place_lookup_alt_names").await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_large_batch_size_still_loads() {
        let (dir, store) = temp_store().await;
        let path = dir.path().join("places.txt");
        let data: String = (0..2000)
            .map(|i| WINNIPEG.replacen("6183235", &(6_000_000 + i).to_string(), 1))
            .collect();
        std::fs::write(&path, data).unwrap();

        let loader = PlaceLoader::new(store.clone(), SourceDocument::File(path), 2000);
        loader.ensure_loaded().await.unwrap();

        assert_eq!(store.count_rows("place_lookup").await.unwrap(), 2000);
        assert_eq!(store.count_rows("place_lookup_alt_names").await.unwrap(), 8000);
    }
}
