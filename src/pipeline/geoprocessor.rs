// src/pipeline/geoprocessor.rs

use crate::domain::normalize::normalize;
use crate::domain::{CleanedListingRecord, RawListingRecord};
use crate::geocode::{GeocodeClient, Geocoder};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// Cleaned listings in source order, looked up by canonical address.
///
/// Two raw rows can geocode to the same canonical address; both are kept
/// here and the sink's key decides which one survives (the first).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CleanedTable {
    rows: Vec<CleanedListingRecord>,
    // canonical address -> position of its first row
    index: HashMap<String, usize>,
}

impl CleanedTable {
    fn from_rows(rows: Vec<CleanedListingRecord>) -> Self {
        let mut index = HashMap::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            index.entry(row.address.clone()).or_insert(i);
        }
        Self { rows, index }
    }

    pub fn get(&self, address: &str) -> Option<&CleanedListingRecord> {
        self.index.get(address).map(|&i| &self.rows[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &CleanedListingRecord> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<CleanedListingRecord> for CleanedTable {
    fn from_iter<I: IntoIterator<Item = CleanedListingRecord>>(iter: I) -> Self {
        Self::from_rows(iter.into_iter().collect())
    }
}

impl IntoIterator for CleanedTable {
    type Item = CleanedListingRecord;
    type IntoIter = std::vec::IntoIter<CleanedListingRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GeoprocessReport {
    pub rows_in: usize,
    pub geocode_failures: usize,
    /// Normalization drops, keyed by `NormalizationDrop::reason`.
    pub dropped: BTreeMap<&'static str, usize>,
    pub cleaned: usize,
}

impl GeoprocessReport {
    pub fn total_dropped(&self) -> usize {
        self.dropped.values().sum()
    }
}

/// Geocodes and normalizes a raw table, one row at a time in source order.
pub struct Geoprocessor<G: Geocoder> {
    client: GeocodeClient<G>,
}

impl<G: Geocoder> Geoprocessor<G> {
    pub fn new(client: GeocodeClient<G>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GeocodeClient<G> {
        &self.client
    }

    /// Every row costs exactly one geocode call. A failed geocode or a
    /// failed normalization drops that row and the batch carries on.
    pub fn run(&mut self, records: &[RawListingRecord]) -> (CleanedTable, GeoprocessReport) {
        let mut report = GeoprocessReport {
            rows_in: records.len(),
            ..Default::default()
        };
        let mut rows = Vec::with_capacity(records.len());

        for (i, raw) in records.iter().enumerate() {
            let geocode = match self.client.resolve(&raw.address) {
                Ok(g) => g,
                Err(e) => {
                    warn!(
                        row = i,
                        address = %raw.address,
                        error = %e,
                        "geocode failed, dropping row"
                    );
                    report.geocode_failures += 1;
                    continue;
                }
            };

            match normalize(raw, &geocode) {
                Ok(cleaned) => rows.push(cleaned),
                Err(why) => {
                    warn!(row = i, address = %geocode.address, reason = %why, "dropping row");
                    *report.dropped.entry(why.reason()).or_default() += 1;
                }
            }
        }

        report.cleaned = rows.len();
        info!(
            rows_in = report.rows_in,
            cleaned = report.cleaned,
            geocode_failures = report.geocode_failures,
            dropped = report.total_dropped(),
            "geoprocessing finished"
        );

        (CleanedTable::from_rows(rows), report)
    }
}
