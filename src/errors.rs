// errors.rs
use crate::db::SinkError;
use crate::geocode::GeocodeFailure;
use crate::pipeline::WriteError;
use crate::source::SourceError;
use thiserror::Error;

/// Failures that end a whole run. Per-row problems never surface here.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("could not set up geocoder: {0}")]
    Geocoder(#[from] GeocodeFailure),
    #[error("could not open listings store: {0}")]
    Sink(#[from] SinkError),
    #[error(transparent)]
    Write(#[from] WriteError),
}
