//! Error types for the ledger

use crate::types::Principal;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
///
/// The first six variants are the caller-facing rejection taxonomy. All of
/// them are synchronous, typed, and non-retryable; a rejected call leaves
/// ledger state exactly as it was. The remaining variants surface failures
/// of the persistence and actor layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Empty payload or empty target identity
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Non-owner calling an owner-gated operation
    #[error("unauthorized access: {caller} is not the owner")]
    UnauthorizedAccess {
        /// The rejected caller
        caller: Principal,
    },

    /// Write attempted while the ledger is paused
    #[error("contract is paused")]
    ContractPaused,

    /// `pause()` called while already paused
    #[error("already paused")]
    AlreadyPaused,

    /// `unpause()` called while already active
    #[error("already active")]
    AlreadyActive,

    /// Batch exceeds the configured bound
    #[error("batch of {len} records exceeds maximum of {max}")]
    BatchTooLarge {
        /// Submitted batch length
        len: usize,
        /// Configured bound
        max: usize,
    },

    /// Storage error (RocksDB)
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
