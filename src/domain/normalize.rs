// src/domain/normalize.rs

//! Field-by-field cleaning of raw listing text.
//!
//! Every function here is pure. A row either comes out as a
//! `CleanedListingRecord` or is rejected with a `NormalizationDrop`, which
//! is expected data noise rather than an error.
//!
//! Bedroom/bathroom policy: every character that is not a digit or `.` is
//! stripped, and an empty remainder means 0. That makes word-only values
//! ("Studio", "Not specified") and missing-value markers ("NaN", "NULL",
//! empty, absent) all count as 0 rather than unknown. Leftovers that still
//! do not parse (a stray "." or "1.2.3") are 0 as well, so a count never
//! drops a row. It is coarse, and it is the defined behaviour.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::listing::{CleanedListingRecord, GeocodeResult, RawListingRecord};

/// Literal price strings meaning "no price given". Matched exactly,
/// case-sensitive.
pub const PRICE_SENTINELS: &[&str] = &["contact for price", "Please Contact"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizationDrop {
    #[error("price unknown")]
    PriceUnknown,
    #[error("price is not a number: {0:?}")]
    PriceMalformed(String),
    #[error("size is not a number: {0:?}")]
    SizeMalformed(String),
    #[error("date missing")]
    DateMissing,
    #[error("date is not a calendar date: {0:?}")]
    DateMalformed(String),
}

impl NormalizationDrop {
    /// Short stable label, used as the key in run reports.
    pub fn reason(&self) -> &'static str {
        match self {
            NormalizationDrop::PriceUnknown => "price_unknown",
            NormalizationDrop::PriceMalformed(_) => "price_malformed",
            NormalizationDrop::SizeMalformed(_) => "size_malformed",
            NormalizationDrop::DateMissing => "date_missing",
            NormalizationDrop::DateMalformed(_) => "date_malformed",
        }
    }
}

/// Builds the cleaned record from a raw row and its geocode.
/// Address and coordinates always come from the geocode, never the raw text.
pub fn normalize(
    raw: &RawListingRecord,
    geocode: &GeocodeResult,
) -> Result<CleanedListingRecord, NormalizationDrop> {
    let price = normalize_price(raw.price.as_deref())?;
    let bedrooms = normalize_count(raw.bedrooms.as_deref());
    let bathrooms = normalize_count(raw.bathrooms.as_deref());
    let size = normalize_size(raw.size.as_deref())?;
    let date = normalize_date(raw.date.as_deref())?;

    Ok(CleanedListingRecord {
        address: geocode.address.clone(),
        price,
        bedrooms,
        bathrooms,
        size,
        date,
        latitude: geocode.latitude,
        longitude: geocode.longitude,
    })
}

pub fn is_price_sentinel(raw: &str) -> bool {
    PRICE_SENTINELS.contains(&raw)
}

/// "$450,000" -> 450000.0. Only `$`, `,` and whitespace are removed; anything
/// else left over ("1.5M", "2 lots for ...") or a negative amount is
/// `PriceMalformed`. Sentinels and absent prices are `PriceUnknown`.
pub fn normalize_price(raw: Option<&str>) -> Result<f64, NormalizationDrop> {
    let raw = raw.ok_or(NormalizationDrop::PriceUnknown)?;
    if is_price_sentinel(raw) {
        return Err(NormalizationDrop::PriceUnknown);
    }

    let amount: String = raw
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();

    // "1e5", "inf" and "NaN" parse as floats but are not prices
    if !amount.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-') {
        return Err(NormalizationDrop::PriceMalformed(raw.to_string()));
    }

    match amount.parse::<f64>() {
        Ok(price) if price >= 0.0 => Ok(price),
        _ => Err(NormalizationDrop::PriceMalformed(raw.to_string())),
    }
}

/// Bedroom/bathroom counts. See the module docs for the 0 policy.
pub fn normalize_count(raw: Option<&str>) -> f64 {
    let digits: String = raw
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    digits.parse::<f64>().unwrap_or(0.0)
}

/// Size is optional. Present values must be a plain number; thousands
/// separators are tolerated.
pub fn normalize_size(raw: Option<&str>) -> Result<Option<f64>, NormalizationDrop> {
    let trimmed = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(s) => s,
    };

    match trimmed.replace(',', "").parse::<f64>() {
        Ok(size) if size.is_finite() && size >= 0.0 => Ok(Some(size)),
        _ => Err(NormalizationDrop::SizeMalformed(trimmed.to_string())),
    }
}

pub fn normalize_date(raw: Option<&str>) -> Result<NaiveDate, NormalizationDrop> {
    let trimmed = match raw.map(str::trim) {
        None | Some("") => return Err(NormalizationDrop::DateMissing),
        Some(s) => s,
    };

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| NormalizationDrop::DateMalformed(trimmed.to_string()))
}
