// src/domain/listing.rs

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One scraped listing, exactly as the source handed it over.
/// Nothing here is trusted: duplicates across runs are expected and every
/// field is still free text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawListingRecord {
    #[serde(alias = "Address")]
    pub address: String,
    #[serde(alias = "Price", default, deserialize_with = "loose_text")]
    pub price: Option<String>,
    #[serde(alias = "Bedrooms", default, deserialize_with = "loose_text")]
    pub bedrooms: Option<String>,
    #[serde(alias = "Bathrooms", default, deserialize_with = "loose_text")]
    pub bathrooms: Option<String>,
    #[serde(alias = "Size", default, deserialize_with = "loose_text")]
    pub size: Option<String>,
    #[serde(alias = "Date", default, deserialize_with = "loose_text")]
    pub date: Option<String>,
}

impl RawListingRecord {
    /// Convenience constructor, mostly for tests and fixtures.
    pub fn new(
        address: &str,
        price: &str,
        bedrooms: &str,
        bathrooms: &str,
        size: Option<&str>,
        date: &str,
    ) -> Self {
        Self {
            address: address.to_string(),
            price: Some(price.to_string()),
            bedrooms: Some(bedrooms.to_string()),
            bathrooms: Some(bathrooms.to_string()),
            size: size.map(str::to_string),
            date: Some(date.to_string()),
        }
    }
}

/// Scraped exports mix strings and numbers in the same column, so accept
/// either and keep it as text. `null` stays `None`.
fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// What the geocoding provider hands back for one address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A listing after geoprocessing. `address` is the provider-canonical form
/// and is the primary key downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedListingRecord {
    pub address: String,
    pub price: f64,
    pub bedrooms: f64,
    pub bathrooms: f64,
    pub size: Option<f64>,
    pub date: NaiveDate,
    pub latitude: f64,
    pub longitude: f64,
}
