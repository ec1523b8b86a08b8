//! Partial place description supplied by callers.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{GazetteerError, Result};

/// A hierarchical location, any part of which may be missing.
///
/// Every part is trimmed when it is set, whether through the setters or
/// through deserialization. `county` and `city_section` are carried and
/// fingerprinted but do not narrow the lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRequest {
    #[serde(default, deserialize_with = "trimmed", skip_serializing_if = "Option::is_none")]
    country: Option<String>,
    #[serde(default, deserialize_with = "trimmed", skip_serializing_if = "Option::is_none")]
    province: Option<String>,
    #[serde(default, deserialize_with = "trimmed", skip_serializing_if = "Option::is_none")]
    county: Option<String>,
    #[serde(default, deserialize_with = "trimmed", skip_serializing_if = "Option::is_none")]
    city: Option<String>,
    #[serde(default, deserialize_with = "trimmed", skip_serializing_if = "Option::is_none")]
    city_section: Option<String>,
}

fn trimmed<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|s| s.trim().to_string()))
}

impl LocationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_country(mut self, country: impl AsRef<str>) -> Self {
        self.set_country(country);
        self
    }

    pub fn with_province(mut self, province: impl AsRef<str>) -> Self {
        self.set_province(province);
        self
    }

    pub fn with_county(mut self, county: impl AsRef<str>) -> Self {
        self.set_county(county);
        self
    }

    pub fn with_city(mut self, city: impl AsRef<str>) -> Self {
        self.set_city(city);
        self
    }

    pub fn with_city_section(mut self, city_section: impl AsRef<str>) -> Self {
        self.set_city_section(city_section);
        self
    }

    pub fn set_country(&mut self, country: impl AsRef<str>) {
        self.country = Some(country.as_ref().trim().to_string());
    }

    pub fn set_province(&mut self, province: impl AsRef<str>) {
        self.province = Some(province.as_ref().trim().to_string());
    }

    pub fn set_county(&mut self, county: impl AsRef<str>) {
        self.county = Some(county.as_ref().trim().to_string());
    }

    pub fn set_city(&mut self, city: impl AsRef<str>) {
        self.city = Some(city.as_ref().trim().to_string());
    }

    pub fn set_city_section(&mut self, city_section: impl AsRef<str>) {
        self.city_section = Some(city_section.as_ref().trim().to_string());
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    pub fn province(&self) -> Option<&str> {
        self.province.as_deref()
    }

    pub fn county(&self) -> Option<&str> {
        self.county.as_deref()
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn city_section(&self) -> Option<&str> {
        self.city_section.as_deref()
    }

    /// Present parts in hierarchy order: country, province, county, city, city section.
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        [
            &self.country,
            &self.province,
            &self.county,
            &self.city,
            &self.city_section,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
    }

    /// Present parts tagged with the field they came from, in hierarchy order.
    pub fn tagged_parts(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("country", &self.country),
            ("province", &self.province),
            ("county", &self.county),
            ("city", &self.city),
            ("citySection", &self.city_section),
        ]
        .into_iter()
        .filter_map(|(field, part)| part.as_deref().map(|value| (field, value)))
    }

    /// A request must name at least a country, a province or a city.
    pub fn validate(&self) -> Result<()> {
        if self.country.is_none() && self.province.is_none() && self.city.is_none() {
            return Err(GazetteerError::InvalidRequest(
                "you must provide at least one of 'country', 'province' or 'city'".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> LocationRequest {
        LocationRequest::new()
            .with_country("canada")
            .with_province("manitoba")
            .with_county("rm of springfield")
            .with_city("oakbank")
            .with_city_section("northside")
    }

    #[test]
    fn test_deserialize_trims_and_renames() {
        let request: LocationRequest = serde_json::from_str(
            r#"{"country": " Canada ", "city": "Winnipeg\t", "citySection": " Exchange District"}"#,
        )
        .unwrap();
        assert_eq!(request.country(), Some("Canada"));
        assert_eq!(request.city(), Some("Winnipeg"));
        assert_eq!(request.city_section(), Some("Exchange District"));
        assert_eq!(request.province(), None);
        assert_eq!(request.county(), None);
    }

    #[test]
    fn test_serialize_skips_absent_parts() {
        let request = LocationRequest::new().with_city("Oakbank").with_city_section("Northside");
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"city":"Oakbank","citySection":"Northside"}"#
        );
    }

    #[test]
    fn test_setters_trim() {
        let mut request = LocationRequest::new();
        request.set_province("  Manitoba ");
        assert_eq!(request.province(), Some("Manitoba"));
    }

    #[test]
    fn test_any_one_of_country_province_city_is_enough() {
        let mut no_country = full_request();
        no_country.country = None;
        assert!(no_country.validate().is_ok());

        let mut no_province = full_request();
        no_province.province = None;
        assert!(no_province.validate().is_ok());

        let mut no_city = full_request();
        no_city.city = None;
        assert!(no_city.validate().is_ok());

        let mut no_county = full_request();
        no_county.county = None;
        assert!(no_county.validate().is_ok());

        let mut no_city_section = full_request();
        no_city_section.city_section = None;
        assert!(no_city_section.validate().is_ok());
    }

    #[test]
    fn test_county_and_city_section_alone_are_invalid() {
        let request = LocationRequest::new()
            .with_county("rm of springfield")
            .with_city_section("northside");
        let err = request.validate().unwrap_err();
        assert!(matches!(err, GazetteerError::InvalidRequest(_)));
        assert!(LocationRequest::new().validate().is_err());
    }

    #[test]
    fn test_tagged_parts_name_their_field() {
        let request = LocationRequest::new().with_country("Canada").with_county("Winnipeg");
        let tagged: Vec<(&str, &str)> = request.tagged_parts().collect();
        assert_eq!(tagged, vec![("country", "Canada"), ("county", "Winnipeg")]);
    }

    #[test]
    fn test_parts_order() {
        let request = full_request();
        let parts: Vec<&str> = request.parts().collect();
        assert_eq!(
            parts,
            vec!["canada", "manitoba", "rm of springfield", "oakbank", "northside"]
        );
    }
}
