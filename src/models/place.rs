//! GeoNames place records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Geographic point in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: i64,
    pub name: String,
    pub ascii_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub feature_class: String,
    pub feature_code: String,
    pub country_code: String,
    pub admin_code1: String,
    pub admin_code2: String,
    pub admin_code3: String,
    pub admin_code4: String,
    pub population: i64,
    pub elevation: i64,
    /// Digital elevation model value.
    pub dem: i64,
    pub timezone: String,
    pub modified_date: NaiveDate,
}

/// One alternate spelling of a place name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlternateName {
    pub place_id: i64,
    pub name: String,
}
