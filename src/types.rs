//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Content addressing (SHA-256 payload hashes)

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

/// Caller identity supplied by the hosting execution environment
///
/// An opaque principal string. The empty string is the null identity and is
/// never a valid owner or transfer target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal(String);

impl Principal {
    /// Create new principal
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check for the null/empty identity
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An accepted record write, as it appears in the event log
///
/// Record payloads are not retained in queryable state; this event is the
/// durable form of the record, and downstream consumers reconstruct record
/// history purely from the emitted event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordCreated {
    /// Unique record ID (UUIDv7 for time-ordering)
    pub record_id: Uuid,

    /// Caller that submitted the record
    pub caller: Principal,

    /// Global sequence index: the value of `total_operations` immediately
    /// after this write was accepted
    pub sequence: u64,

    /// Opaque record payload (non-empty)
    #[serde(with = "serde_bytes")]
    pub payload: Vec<u8>,

    /// SHA-256 content hash of the payload
    pub payload_hash: [u8; 32],

    /// Acceptance timestamp (nanoseconds since Unix epoch)
    pub timestamp_nanos: i64,
}

impl RecordCreated {
    /// Build the event for a payload accepted at the given sequence index
    pub fn new(caller: Principal, payload: Vec<u8>, sequence: u64) -> Self {
        let payload_hash = hash_payload(&payload);
        Self {
            record_id: Uuid::now_v7(),
            caller,
            sequence,
            payload,
            payload_hash,
            timestamp_nanos: now_nanos(),
        }
    }
}

/// Durable event emitted by the ledger
///
/// One entry per committed state transition. The persisted event log is
/// append-only and immutable once committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A record write was accepted
    RecordCreated(RecordCreated),

    /// The ledger was paused by the owner
    Paused {
        /// Owner that paused the ledger
        by: Principal,
        /// Timestamp (nanoseconds since Unix epoch)
        timestamp_nanos: i64,
    },

    /// The ledger was unpaused by the owner
    Unpaused {
        /// Owner that unpaused the ledger
        by: Principal,
        /// Timestamp (nanoseconds since Unix epoch)
        timestamp_nanos: i64,
    },

    /// Ownership moved to a new principal
    OwnershipTransferred {
        /// Previous owner
        previous_owner: Principal,
        /// New owner
        new_owner: Principal,
        /// Timestamp (nanoseconds since Unix epoch)
        timestamp_nanos: i64,
    },
}

impl LedgerEvent {
    /// Event kind name (for logging and metrics labels)
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerEvent::RecordCreated(_) => "record_created",
            LedgerEvent::Paused { .. } => "paused",
            LedgerEvent::Unpaused { .. } => "unpaused",
            LedgerEvent::OwnershipTransferred { .. } => "ownership_transferred",
        }
    }
}

/// Receipt returned to the caller for an accepted record write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordReceipt {
    /// Record ID from the emitted event
    pub record_id: Uuid,

    /// Global sequence index of the write
    pub sequence: u64,

    /// SHA-256 content hash of the payload
    pub payload_hash: [u8; 32],

    /// Acceptance timestamp (nanoseconds since Unix epoch)
    pub timestamp_nanos: i64,
}

impl From<&RecordCreated> for RecordReceipt {
    fn from(event: &RecordCreated) -> Self {
        Self {
            record_id: event.record_id,
            sequence: event.sequence,
            payload_hash: event.payload_hash,
            timestamp_nanos: event.timestamp_nanos,
        }
    }
}

/// Hash a payload using SHA-256
pub fn hash_payload(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Current time in nanoseconds since Unix epoch
pub(crate) fn now_nanos() -> i64 {
    chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0)
}
