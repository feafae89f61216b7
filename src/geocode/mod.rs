mod client;
mod geocode_error;
mod opencage;

pub use client::{GeocodeClient, Geocoder};
pub use geocode_error::GeocodeFailure;
pub use opencage::{OpenCageGeocoder, DEFAULT_OPENCAGE_URL};
