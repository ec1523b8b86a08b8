//! Error taxonomy for lookups and reference-data ingestion.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GazetteerError>;

/// The three outcomes a caller can tell apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is unusable; fix the input.
    InvalidRequest,
    /// Nothing in the reference data matches.
    NotFound,
    /// Store, source or configuration fault; operator-facing.
    Internal,
}

#[derive(Debug, Error)]
pub enum GazetteerError {
    #[error("invalid location request: {0}")]
    InvalidRequest(String),

    #[error("{0} cannot be empty")]
    EmptyInput(&'static str),

    #[error("country ({0}) not found")]
    CountryNotFound(String),

    #[error("no admin code for province ({province}) in country ({country})")]
    AdminCodeNotFound { country: String, province: String },

    #[error("could not find a location to match the request")]
    LocationNotFound,

    #[error("source document not found: {0}")]
    SourceNotFound(String),

    #[error("malformed line {line} in {source_name}: {reason}")]
    MalformedSource {
        source_name: String,
        line: u64,
        reason: String,
    },

    #[error("ingestion failed: {0}")]
    Ingestion(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl GazetteerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GazetteerError::InvalidRequest(_) | GazetteerError::EmptyInput(_) => {
                ErrorKind::InvalidRequest
            }
            GazetteerError::CountryNotFound(_)
            | GazetteerError::AdminCodeNotFound { .. }
            | GazetteerError::LocationNotFound => ErrorKind::NotFound,
            GazetteerError::SourceNotFound(_)
            | GazetteerError::MalformedSource { .. }
            | GazetteerError::Ingestion(_)
            | GazetteerError::Config(_)
            | GazetteerError::Database(_)
            | GazetteerError::Io(_)
            | GazetteerError::Json(_)
            | GazetteerError::Csv(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn malformed(source_name: &str, line: u64, reason: impl Into<String>) -> Self {
        GazetteerError::MalformedSource {
            source_name: source_name.to_string(),
            line,
            reason: reason.into(),
        }
    }
}
