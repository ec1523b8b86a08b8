//! Source documents for the reference tables.
//!
//! A source is either bundled into the binary (`bundled:<name>`) or read
//! from the filesystem (`file:<path>`, or a bare path). Gzipped files are
//! decompressed on the fly.

use flate2::read::GzDecoder;
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::{GazetteerError, Result};

const BUNDLED_PREFIX: &str = "bundled:";
const FILE_PREFIX: &str = "file:";

/// Documents compiled into the binary.
const BUNDLED: &[(&str, &[u8])] = &[
    (
        "admin1CodesASCII.txt",
        include_bytes!("../data/admin1CodesASCII.txt"),
    ),
    (
        "featureCodes_en.txt",
        include_bytes!("../data/featureCodes_en.txt"),
    ),
    (
        "country-codes.json",
        include_bytes!("../data/country-codes.json"),
    ),
    ("CA.txt", include_bytes!("../data/CA.txt")),
];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum SourceDocument {
    Bundled(String),
    File(PathBuf),
}

impl SourceDocument {
    /// Parse a `bundled:`/`file:` location string.
    pub fn parse(location: &str) -> Result<Self> {
        let location = location.trim();
        if location.is_empty() {
            return Err(GazetteerError::Config(
                "source location cannot be blank".to_string(),
            ));
        }
        if let Some(name) = location.strip_prefix(BUNDLED_PREFIX) {
            if bundled_bytes(name).is_none() {
                return Err(GazetteerError::Config(format!(
                    "no bundled source named {}",
                    name
                )));
            }
            return Ok(SourceDocument::Bundled(name.to_string()));
        }
        let path = location.strip_prefix(FILE_PREFIX).unwrap_or(location);
        Ok(SourceDocument::File(PathBuf::from(path)))
    }

    /// Open the document for reading.
    pub fn open(&self) -> Result<Box<dyn Read + Send>> {
        match self {
            SourceDocument::Bundled(name) => {
                let bytes = bundled_bytes(name).ok_or_else(|| {
                    GazetteerError::SourceNotFound(format!("{}{}", BUNDLED_PREFIX, name))
                })?;
                Ok(Box::new(bytes))
            }
            SourceDocument::File(path) => open_file(path),
        }
    }
}

impl fmt::Display for SourceDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDocument::Bundled(name) => write!(f, "{}{}", BUNDLED_PREFIX, name),
            SourceDocument::File(path) => write!(f, "{}{}", FILE_PREFIX, path.display()),
        }
    }
}

impl TryFrom<String> for SourceDocument {
    type Error = GazetteerError;

    fn try_from(value: String) -> Result<Self> {
        SourceDocument::parse(&value)
    }
}

fn bundled_bytes(name: &str) -> Option<&'static [u8]> {
    BUNDLED
        .iter()
        .find(|(bundled, _)| *bundled == name)
        .map(|(_, bytes)| *bytes)
}

fn open_file(path: &Path) -> Result<Box<dyn Read + Send>> {
    let file = File::open(path).map_err(|e| {
        GazetteerError::SourceNotFound(format!("{}: {}", path.display(), e))
    })?;
    let reader = BufReader::new(file);

    if path.extension().map_or(false, |e| e == "gz") {
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}
