//! Name-to-code and name-to-coordinate resolution over the reference tables.

pub mod admin;
pub mod country;
pub mod place;

pub use admin::AdminCodeResolver;
pub use country::CountryResolver;
pub use place::{PlaceQuery, PlaceResolver};
