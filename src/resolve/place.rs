//! Hierarchical place matching.
//!
//! A request is narrowed in a fixed order: the country (when given) limits
//! the search to its ISO code; a city name wins over a province name and
//! must match a populated place (`P` class: `PPL`, `PPLC` or any `PPLA*`);
//! when country and province are both given the province is turned into an
//! admin code and the city must lie in it; a province name alone must match
//! an administrative division (`A` class, `ADM*`). County and city section
//! never narrow the search. Ties go to the lowest place id.

use sqlx::Row;
use std::sync::Arc;
use tracing::debug;

use super::{AdminCodeResolver, CountryResolver};
use crate::error::{GazetteerError, Result};
use crate::loaders::PlaceLoader;
use crate::models::{Coordinates, LocationRequest};
use crate::store::{Dialect, SqlValue, Statement};

const CITY_FILTER: &str = "feature_class = 'P' \
     AND (feature_code IN ('PPL', 'PPLC') OR feature_code LIKE 'PPLA%')";
const PROVINCE_FILTER: &str = "feature_class = 'A' AND feature_code LIKE 'ADM%'";

/// One shape of place lookup. Names are already lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceQuery {
    City {
        name: String,
        country: Option<String>,
        /// Only set together with `country`.
        admin1: Option<String>,
    },
    Province {
        name: String,
        country: Option<String>,
    },
    Country {
        country: String,
    },
}

/// Prepared SQL for every [`PlaceQuery`] shape.
struct PlaceStatements {
    city: String,
    city_in_country: String,
    city_in_admin1: String,
    province: String,
    province_in_country: String,
    country: String,
}

impl PlaceStatements {
    fn new(dialect: Dialect, table: &str) -> Self {
        let select = |clauses: &[String]| {
            format!(
                "SELECT id, latitude, longitude FROM {} WHERE {} ORDER BY id LIMIT 1",
                table,
                clauses.join(" AND ")
            )
        };
        let name = |i| format!("LOWER(name) = {}", dialect.placeholder(i));
        let country = |i| format!("country_code = {}", dialect.placeholder(i));
        let admin1 = |i| format!("admin_code1 = {}", dialect.placeholder(i));
        let city = || CITY_FILTER.to_string();
        let province = || PROVINCE_FILTER.to_string();

        Self {
            city: select(&[name(1), city()]),
            city_in_country: select(&[country(1), name(2), city()]),
            city_in_admin1: select(&[country(1), name(2), city(), admin1(3)]),
            province: select(&[name(1), province()]),
            province_in_country: select(&[country(1), name(2), province()]),
            country: select(&[country(1)]),
        }
    }

    fn render(&self, query: &PlaceQuery) -> Statement {
        let text = |v: &String| SqlValue::Text(v.clone());
        let (sql, values) = match query {
            PlaceQuery::City {
                name,
                country: Some(country),
                admin1: Some(admin1),
            } => (
                &self.city_in_admin1,
                vec![text(country), text(name), text(admin1)],
            ),
            PlaceQuery::City {
                name,
                country: Some(country),
                admin1: None,
            } => (&self.city_in_country, vec![text(country), text(name)]),
            PlaceQuery::City {
                name,
                country: None,
                ..
            } => (&self.city, vec![text(name)]),
            PlaceQuery::Province {
                name,
                country: Some(country),
            } => (&self.province_in_country, vec![text(country), text(name)]),
            PlaceQuery::Province {
                name,
                country: None,
            } => (&self.province, vec![text(name)]),
            PlaceQuery::Country { country } => (&self.country, vec![text(country)]),
        };
        Statement {
            sql: sql.clone(),
            values,
        }
    }
}

pub struct PlaceResolver {
    places: Arc<PlaceLoader>,
    countries: CountryResolver,
    admin_codes: AdminCodeResolver,
    statements: PlaceStatements,
}

impl PlaceResolver {
    pub fn new(
        places: Arc<PlaceLoader>,
        countries: CountryResolver,
        admin_codes: AdminCodeResolver,
    ) -> Self {
        let statements = PlaceStatements::new(places.table().store().dialect(), places.table().name());
        Self {
            places,
            countries,
            admin_codes,
            statements,
        }
    }

    /// Validate the request and return the coordinates of its best match.
    pub async fn resolve(&self, request: &LocationRequest) -> Result<Coordinates> {
        request.validate()?;
        let query = self.plan(request).await?;
        debug!("Resolving {:?}", query);

        self.places.ensure_loaded().await?;
        let row = self
            .places
            .table()
            .store()
            .fetch_optional(&self.statements.render(&query))
            .await?
            .ok_or(GazetteerError::LocationNotFound)?;

        Ok(Coordinates {
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
        })
    }

    /// Pick the query shape from the parts present on the request.
    pub async fn plan(&self, request: &LocationRequest) -> Result<PlaceQuery> {
        let country = match request.country() {
            Some(name) => {
                let resolved = self.countries.resolve(name).await?;
                let code = resolved
                    .iso_alpha2
                    .ok_or_else(|| GazetteerError::CountryNotFound(name.to_lowercase()))?;
                Some(code)
            }
            None => None,
        };

        let query = match (request.city(), request.province(), country) {
            (Some(city), province, country) => {
                let admin1 = match (&country, province) {
                    (Some(code), Some(province)) => {
                        Some(self.admin_codes.resolve(code, province).await?)
                    }
                    _ => None,
                };
                PlaceQuery::City {
                    name: city.to_lowercase(),
                    country,
                    admin1,
                }
            }
            (None, Some(province), country) => PlaceQuery::Province {
                name: province.to_lowercase(),
                country,
            },
            (None, None, Some(country)) => PlaceQuery::Country { country },
            (None, None, None) => {
                return Err(GazetteerError::InvalidRequest(
                    "nothing to resolve".to_string(),
                ))
            }
        };
        Ok(query)
    }
}
