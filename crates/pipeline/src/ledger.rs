//! Append-only per-run step ledger.
//!
//! Records are keyed by run identity, so concurrent runs never
//! contend over each other's entries. Closing a record that was never
//! opened is a documented no-op, not an error: audit logging is
//! best-effort by design and must never abort generation.
//!
//! Records are retained until [`StepLedger::remove_run`] is called;
//! long-lived processes driving many runs must evict finished runs
//! once their records have been read out.

use std::collections::HashMap;

use tokio::sync::RwLock;

use fabula_core::steps::{StepKind, StepRecord};
use fabula_core::types::RunId;

/// In-memory step ledger for all runs of this process.
#[derive(Default)]
pub struct StepLedger {
    records: RwLock<HashMap<RunId, Vec<StepRecord>>>,
}

impl StepLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a `processing` record for a step, stamped now.
    pub async fn begin(&self, run_id: RunId, step: StepKind) {
        let mut records = self.records.write().await;
        records
            .entry(run_id)
            .or_default()
            .push(StepRecord::begin(step));
    }

    /// Transition the most recent open record of `step` to
    /// `completed` with a result payload. Silent no-op when no open
    /// record exists.
    pub async fn complete(&self, run_id: RunId, step: StepKind, result: serde_json::Value) {
        let mut records = self.records.write().await;
        match Self::last_open(&mut records, run_id, step) {
            Some(record) => record.complete(result),
            None => {
                tracing::debug!(run_id = %run_id, step = %step, "No open record to complete");
            }
        }
    }

    /// Transition the most recent open record of `step` to `failed`.
    /// Silent no-op when no open record exists.
    pub async fn fail(&self, run_id: RunId, step: StepKind, error: &str) {
        self.fail_with_data(run_id, step, error, None).await;
    }

    /// Like [`StepLedger::fail`], but keeps partial result data the
    /// step produced before failing.
    pub async fn fail_with_data(
        &self,
        run_id: RunId,
        step: StepKind,
        error: &str,
        partial_result: Option<serde_json::Value>,
    ) {
        let mut records = self.records.write().await;
        match Self::last_open(&mut records, run_id, step) {
            Some(record) => record.fail(error, partial_result),
            None => {
                tracing::debug!(run_id = %run_id, step = %step, "No open record to fail");
            }
        }
    }

    /// Drop all records of a finished run, returning them ordered by
    /// start time. Evicting an unknown run yields an empty vec.
    pub async fn remove_run(&self, run_id: RunId) -> Vec<StepRecord> {
        let mut records = self.records.write().await;
        let mut out = records.remove(&run_id).unwrap_or_default();
        out.sort_by_key(|r| r.started_at);
        out
    }

    /// All records for a run, ordered by start time.
    pub async fn records_for(&self, run_id: RunId) -> Vec<StepRecord> {
        let records = self.records.read().await;
        let mut out = records.get(&run_id).cloned().unwrap_or_default();
        out.sort_by_key(|r| r.started_at);
        out
    }

    /// The most recent (by append order) open record of a step kind.
    fn last_open(
        records: &mut HashMap<RunId, Vec<StepRecord>>,
        run_id: RunId,
        step: StepKind,
    ) -> Option<&mut StepRecord> {
        records
            .get_mut(&run_id)?
            .iter_mut()
            .rev()
            .find(|r| r.step == step && r.is_open())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
