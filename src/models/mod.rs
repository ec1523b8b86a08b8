//! Core data models for the gazetteer.

pub mod admin;
pub mod country;
pub mod feature;
pub mod place;
pub mod request;

pub use admin::AdminCode;
pub use country::{CountryCode, CountryRecord};
pub use feature::{FeatureCode, MAX_DESCRIPTION_CHARS};
pub use place::{AlternateName, Coordinates, Place};
pub use request::LocationRequest;
