// opencage.rs
use crate::domain::GeocodeResult;
use crate::geocode::{GeocodeFailure, Geocoder};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const DEFAULT_OPENCAGE_URL: &str = "https://api.opencagedata.com/";

const USER_AGENT: &str = concat!("listings_geoprocessor/", env!("CARGO_PKG_VERSION"));

// response
//  ├── status
//  │    ├── code
//  │    └── message
//  └── results[]
//       ├── formatted
//       └── geometry
//            ├── lat
//            └── lng

#[derive(Debug, Deserialize)]
struct ForwardResponse {
    #[serde(default)]
    results: Vec<ForwardResult>,
    status: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct ForwardResult {
    formatted: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct Status {
    message: Option<String>,
}

/// Forward geocoding against the OpenCage API.
pub struct OpenCageGeocoder {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl OpenCageGeocoder {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self, GeocodeFailure> {
        let endpoint = Url::parse(base_url)
            .and_then(|base| base.join("geocode/v1/json"))
            .map_err(|e| GeocodeFailure::Network(format!("bad geocoder url {base_url}: {e}")))?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GeocodeFailure::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

impl Geocoder for OpenCageGeocoder {
    fn geocode(&self, address: &str) -> Result<GeocodeResult, GeocodeFailure> {
        let resp = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("q", address),
                ("key", self.api_key.as_str()),
                ("limit", "1"),
                ("no_annotations", "1"),
            ])
            .send()
            .map_err(|e| GeocodeFailure::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| GeocodeFailure::Network(e.to_string()))?;

        parse_response(status, &body, address)
    }
}

/// Maps an OpenCage HTTP status + body onto a result or a typed failure.
fn parse_response(status: u16, body: &str, query: &str) -> Result<GeocodeResult, GeocodeFailure> {
    let parsed = serde_json::from_str::<ForwardResponse>(body);

    if !(200..300).contains(&status) {
        let message = parsed
            .ok()
            .and_then(|r| r.status)
            .and_then(|s| s.message)
            .unwrap_or_else(|| format!("HTTP {status}"));

        return Err(match status {
            402 => GeocodeFailure::QuotaExceeded(message),
            401 | 403 => GeocodeFailure::InvalidKey(message),
            429 => GeocodeFailure::RateLimited(message),
            _ => GeocodeFailure::UnexpectedResponse(message),
        });
    }

    let parsed = parsed.map_err(|e| GeocodeFailure::UnexpectedResponse(e.to_string()))?;

    let first = parsed
        .results
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeFailure::NotFound(query.to_string()))?;

    Ok(GeocodeResult {
        address: first.formatted,
        latitude: first.geometry.lat,
        longitude: first.geometry.lng,
    })
}
