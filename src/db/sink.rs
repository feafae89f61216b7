// sink.rs
use crate::domain::CleanedListingRecord;
use std::collections::BTreeMap;
use thiserror::Error;

/// Result of a successful insert-if-absent call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// A row with this address was already present; nothing was written.
    AlreadyExists,
}

/// Failures other than "key already present".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SinkError {
    /// The store refused this one row (constraint, type mismatch, ...).
    #[error("row rejected: {0}")]
    Rejected(String),
    /// The store itself is unreachable or locked.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("schema error: {0}")]
    Schema(String),
}

impl SinkError {
    /// True when the failure is about the store, not the row.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, SinkError::Unavailable(_))
    }
}

/// A persistence target keyed by canonical address.
pub trait KeyedSink {
    /// Creates the keyed table if it does not exist. Idempotent.
    fn ensure_schema(&mut self) -> Result<(), SinkError>;

    fn exists(&self, address: &str) -> Result<bool, SinkError>;

    /// Inserts the row unless its address is already present. Existing rows
    /// are never overwritten.
    fn insert_if_absent(&mut self, row: &CleanedListingRecord) -> Result<InsertOutcome, SinkError>;
}

/// Map-backed sink used for dry runs and tests. Specific addresses can be
/// made to fail to exercise the writer's error paths.
#[derive(Debug, Default)]
pub struct InMemorySink {
    rows: BTreeMap<String, CleanedListingRecord>,
    schema_ready: bool,
    schema_calls: usize,
    schema_failure: Option<SinkError>,
    insert_calls: usize,
    failures: BTreeMap<String, SinkError>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every insert of `address` will fail with `error`.
    pub fn fail_on(mut self, address: &str, error: SinkError) -> Self {
        self.failures.insert(address.to_string(), error);
        self
    }

    /// `ensure_schema` will fail with `error`.
    pub fn fail_schema(mut self, error: SinkError) -> Self {
        self.schema_failure = Some(error);
        self
    }

    /// Number of insert attempts, successful or not.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls
    }

    pub fn rows(&self) -> impl Iterator<Item = &CleanedListingRecord> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn schema_calls(&self) -> usize {
        self.schema_calls
    }
}

impl KeyedSink for InMemorySink {
    fn ensure_schema(&mut self) -> Result<(), SinkError> {
        self.schema_calls += 1;
        if let Some(err) = &self.schema_failure {
            return Err(err.clone());
        }
        self.schema_ready = true;
        Ok(())
    }

    fn exists(&self, address: &str) -> Result<bool, SinkError> {
        Ok(self.rows.contains_key(address))
    }

    fn insert_if_absent(&mut self, row: &CleanedListingRecord) -> Result<InsertOutcome, SinkError> {
        self.insert_calls += 1;
        if !self.schema_ready {
            return Err(SinkError::Schema("listings table does not exist".into()));
        }
        if let Some(err) = self.failures.get(&row.address) {
            return Err(err.clone());
        }
        if self.rows.contains_key(&row.address) {
            return Ok(InsertOutcome::AlreadyExists);
        }

        self.rows.insert(row.address.clone(), row.clone());
        Ok(InsertOutcome::Inserted)
    }
}
