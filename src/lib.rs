//! Record Ledger
//!
//! Append-only record ledger with owner-gated access control and atomic
//! batch ingestion.
//!
//! # Architecture
//!
//! - **Event Sourcing**: Every accepted write emits one immutable event;
//!   the event log is the durable record of history
//! - **Single Writer**: One logical writer task eliminates race conditions
//! - **Staged Apply**: Batches are validated in full before any counter
//!   moves, so a rejected call leaves no trace
//! - **Capability Guards**: Owner and pause checks are composable guard
//!   objects, checked at the start of each gated operation
//!
//! # Invariants
//!
//! - Counter conservation: `total_operations == Σ user_operations[caller]`
//! - Append-only: Events never modified or deleted
//! - Atomic rejection: A failed call changes no state and emits nothing
//! - Linearizable: Total ordering of all writes

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod access;
pub mod actor;
pub mod batch;
pub mod config;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod pause;
pub mod state;
pub mod storage;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use ledger::Ledger;
pub use storage::Storage;
pub use types::{LedgerEvent, Principal, RecordCreated, RecordReceipt};
