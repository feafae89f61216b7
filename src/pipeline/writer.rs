// src/pipeline/writer.rs

use crate::db::{InsertOutcome, KeyedSink, SinkError};
use crate::pipeline::CleanedTable;
use thiserror::Error;
use tracing::{debug, error, info};

/// Per-row lifecycle: `Pending -> Attempted -> Committed | Skipped`.
#[derive(Debug, Clone, PartialEq)]
pub enum RowState {
    Pending,
    Attempted,
    Committed,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The address is already in the store. Normal on re-runs.
    AlreadyExists,
    Failed(SinkError),
}

impl RowState {
    fn settle(self, outcome: Result<InsertOutcome, SinkError>) -> RowState {
        debug_assert_eq!(self, RowState::Attempted);
        match outcome {
            Ok(InsertOutcome::Inserted) => RowState::Committed,
            Ok(InsertOutcome::AlreadyExists) => RowState::Skipped(SkipReason::AlreadyExists),
            Err(e) => RowState::Skipped(SkipReason::Failed(e)),
        }
    }
}

/// What the writer does when an insert fails for a reason other than the
/// key already existing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WritePolicy {
    /// Stop the batch when the store is unreachable instead of skipping
    /// every remaining row one by one. Row-level rejections always skip.
    pub abort_on_unavailable: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteReport {
    /// Final state of every row, in the order they were handed in.
    pub rows: Vec<(String, RowState)>,
}

impl WriteReport {
    fn count(&self, pred: impl Fn(&RowState) -> bool) -> usize {
        self.rows.iter().filter(|(_, s)| pred(s)).count()
    }

    pub fn committed(&self) -> usize {
        self.count(|s| *s == RowState::Committed)
    }

    pub fn skipped_existing(&self) -> usize {
        self.count(|s| *s == RowState::Skipped(SkipReason::AlreadyExists))
    }

    pub fn skipped_failed(&self) -> usize {
        self.count(|s| matches!(s, RowState::Skipped(SkipReason::Failed(_))))
    }

    /// Rows never attempted because the batch was aborted.
    pub fn pending(&self) -> usize {
        self.count(|s| *s == RowState::Pending)
    }
}

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("could not ensure listings schema: {0}")]
    Schema(#[source] SinkError),
    #[error("store unavailable, batch aborted: {error}")]
    Aborted {
        report: WriteReport,
        #[source]
        error: SinkError,
    },
}

/// Commits cleaned listings into a `KeyedSink`, at most one row per address.
pub struct ListingWriter<S: KeyedSink> {
    sink: S,
    policy: WritePolicy,
    schema_ready: bool,
}

impl<S: KeyedSink> ListingWriter<S> {
    pub fn new(sink: S, policy: WritePolicy) -> Self {
        Self {
            sink,
            policy,
            schema_ready: false,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Runs the sink's schema-ensure once for the lifetime of this writer.
    pub fn ensure_schema(&mut self) -> Result<(), WriteError> {
        if !self.schema_ready {
            self.sink.ensure_schema().map_err(WriteError::Schema)?;
            self.schema_ready = true;
        }
        Ok(())
    }

    /// Writes every row in order. Conflicts and row failures are skipped;
    /// only a schema failure, or an unreachable store under
    /// `abort_on_unavailable`, ends the batch early.
    pub fn write_all(&mut self, table: &CleanedTable) -> Result<WriteReport, WriteError> {
        self.ensure_schema()?;

        let mut report = WriteReport {
            rows: table
                .iter()
                .map(|r| (r.address.clone(), RowState::Pending))
                .collect(),
        };

        for (i, row) in table.iter().enumerate() {
            let state = RowState::Attempted.settle(self.sink.insert_if_absent(row));

            match &state {
                RowState::Committed => debug!(address = %row.address, "committed"),
                RowState::Skipped(SkipReason::AlreadyExists) => {
                    debug!(address = %row.address, "already stored, skipping")
                }
                RowState::Skipped(SkipReason::Failed(e)) => {
                    error!(address = %row.address, error = %e, "insert failed, skipping")
                }
                RowState::Pending | RowState::Attempted => {}
            }

            let abort_with = match &state {
                RowState::Skipped(SkipReason::Failed(e))
                    if self.policy.abort_on_unavailable && e.is_connectivity() =>
                {
                    Some(e.clone())
                }
                _ => None,
            };
            report.rows[i].1 = state;

            if let Some(error) = abort_with {
                return Err(WriteError::Aborted { report, error });
            }
        }

        info!(
            committed = report.committed(),
            skipped_existing = report.skipped_existing(),
            skipped_failed = report.skipped_failed(),
            "write pass finished"
        );
        Ok(report)
    }
}
