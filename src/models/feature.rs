//! GeoNames feature classes and codes.

use serde::{Deserialize, Serialize};

/// Longest description stored for a feature code, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCode {
    /// Single-letter class, e.g. `P` for populated places.
    pub feature_class: String,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
}
