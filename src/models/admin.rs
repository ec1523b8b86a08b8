//! First-order administrative divisions.

use serde::{Deserialize, Serialize};

/// A province/state code, e.g. `CA.03` for Manitoba.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCode {
    pub country_code: String,
    pub code: String,
    pub name: String,
}
