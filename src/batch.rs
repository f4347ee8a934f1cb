//! Atomic batch ingestion
//!
//! All-or-nothing semantics via staged apply: every payload is validated
//! before any counter moves, and the staged events are committed only after
//! the whole batch passes. The failure kind for a rejected batch is exactly
//! what a single write would have raised for the first offending element.

use crate::error::{Error, Result};
use crate::state::LedgerState;
use crate::types::{Principal, RecordCreated};

/// Applies caller-supplied batches against the ledger state
#[derive(Debug, Clone, Copy)]
pub struct BatchCoordinator {
    /// Upper bound on batch length, bounds per-call resource consumption
    max_batch_size: usize,
}

impl BatchCoordinator {
    /// Create a coordinator with the configured bound
    pub fn new(max_batch_size: usize) -> Self {
        Self { max_batch_size }
    }

    /// Configured bound
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Stage a batch of record writes
    ///
    /// On success the returned events carry strictly increasing sequence
    /// indices relative to the current state; commit them with
    /// [`LedgerState::commit_records`]. On failure nothing was staged.
    pub fn stage(
        &self,
        state: &LedgerState,
        caller: &Principal,
        payloads: Vec<Vec<u8>>,
    ) -> Result<Vec<RecordCreated>> {
        state.require_active()?;

        if payloads.is_empty() {
            return Err(Error::InvalidInput("empty batch".to_string()));
        }
        if payloads.len() > self.max_batch_size {
            return Err(Error::BatchTooLarge {
                len: payloads.len(),
                max: self.max_batch_size,
            });
        }
        if let Some(index) = payloads.iter().position(|p| p.is_empty()) {
            return Err(Error::InvalidInput(format!(
                "empty payload at batch index {}",
                index
            )));
        }

        let base = state.total_operations();
        Ok(payloads
            .into_iter()
            .enumerate()
            .map(|(i, payload)| RecordCreated::new(caller.clone(), payload, base + 1 + i as u64))
            .collect())
    }
}
