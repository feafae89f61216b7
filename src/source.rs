// source.rs
use crate::domain::RawListingRecord;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse raw listings: {0}")]
    Json(#[from] serde_json::Error),
}

/// Supplies the raw listing table. How the rows were scraped is not this
/// crate's concern.
pub trait RawRecordSource {
    fn load(&self) -> Result<Vec<RawListingRecord>, SourceError>;
}

/// A JSON array of raw listing objects on disk, as dumped by the scraper.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RawRecordSource for JsonFileSource {
    fn load(&self) -> Result<Vec<RawListingRecord>, SourceError> {
        let file = File::open(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        let rows = serde_json::from_reader(BufReader::new(file))?;
        Ok(rows)
    }
}
