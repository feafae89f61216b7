//! Geocodes, cleans and stores scraped real-estate listings, one row per
//! canonical address.

pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod geocode;
pub mod logging;
pub mod pipeline;
pub mod source;

#[cfg(test)]
mod tests;
