//! Georef - resolves partial place descriptions to coordinates using a
//! GeoNames gazetteer held in a relational store.
//!
//! This library provides shared types and modules for the ingest and query binaries.

pub mod config;
pub mod error;
pub mod fingerprint;
pub mod gazetteer;
pub mod loaders;
pub mod models;
pub mod resolve;
pub mod source;
pub mod store;

pub use config::Config;
pub use error::{ErrorKind, GazetteerError, Result};
pub use gazetteer::{Gazetteer, TableStats};
pub use models::{Coordinates, LocationRequest};
