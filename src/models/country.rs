//! Country names and ISO codes.

use serde::{Deserialize, Serialize};

/// One row of the country table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryCode {
    pub name: String,
    pub capital: Option<String>,
    pub continent: Option<String>,
    pub iso_alpha2: Option<String>,
    pub iso_alpha3: Option<String>,
    pub iso_numeric: Option<String>,
}

/// An entry of the country-codes JSON document. Keys not listed here are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CountryRecord {
    #[serde(rename = "CLDR display name")]
    pub name: Option<String>,
    #[serde(rename = "Capital")]
    pub capital: Option<String>,
    #[serde(rename = "Continent")]
    pub continent: Option<String>,
    #[serde(rename = "ISO3166-1-Alpha-2")]
    pub iso_alpha2: Option<String>,
    #[serde(rename = "ISO3166-1-Alpha-3")]
    pub iso_alpha3: Option<String>,
    #[serde(rename = "ISO3166-1-numeric")]
    pub iso_numeric: Option<String>,
}

impl CountryRecord {
    /// Records without a display name cannot be looked up and are dropped.
    pub fn into_country(self) -> Option<CountryCode> {
        Some(CountryCode {
            name: self.name?,
            capital: self.capital,
            continent: self.continent,
            iso_alpha2: self.iso_alpha2,
            iso_alpha3: self.iso_alpha3,
            iso_numeric: self.iso_numeric,
        })
    }
}
