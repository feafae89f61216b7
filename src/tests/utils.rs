use crate::db::{Database, SqliteSink};
use crate::domain::{GeocodeResult, RawListingRecord};
use crate::geocode::{GeocodeClient, GeocodeFailure, Geocoder};
use crate::pipeline::Geoprocessor;
use std::collections::HashMap;
use std::time::Duration;

/// Geocoder backed by a fixed lookup table. Unknown addresses fail with
/// `NotFound`.
#[derive(Default)]
pub struct FakeGeocoder {
    known: HashMap<String, GeocodeResult>,
}

impl FakeGeocoder {
    pub fn with(mut self, raw: &str, canonical: &str, lat: f64, lng: f64) -> Self {
        self.known.insert(
            raw.to_string(),
            GeocodeResult {
                address: canonical.to_string(),
                latitude: lat,
                longitude: lng,
            },
        );
        self
    }
}

impl Geocoder for FakeGeocoder {
    fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeFailure> {
        self.known
            .get(address)
            .cloned()
            .ok_or_else(|| GeocodeFailure::NotFound(address.to_string()))
    }
}

/// Geoprocessor with no pacing, so tests run fast.
pub fn geoprocessor(geocoder: FakeGeocoder) -> Geoprocessor<FakeGeocoder> {
    Geoprocessor::new(GeocodeClient::new(geocoder, Duration::ZERO))
}

pub fn reference_row() -> RawListingRecord {
    RawListingRecord::new(
        "123 Main St",
        "$450,000",
        "3 bd",
        "2 ba",
        Some("1200"),
        "2024-01-01",
    )
}

pub fn reference_geocoder() -> FakeGeocoder {
    FakeGeocoder::default().with("123 Main St", "123 Main Street, City", 49.88, -119.49)
}

/// Opens (or creates) a SQLite listings store for the test area.
pub fn sqlite_sink(path: &std::path::Path) -> SqliteSink {
    SqliteSink::new(Database::open(path).unwrap(), "kelowna").unwrap()
}
