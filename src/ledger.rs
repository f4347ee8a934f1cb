//! Main ledger orchestration layer
//!
//! Ties together storage, state, and actor components into a high-level API
//! for record ingestion and administration.
//!
//! # Example
//!
//! ```no_run
//! use record_ledger::{Config, Ledger, Principal};
//!
//! #[tokio::main]
//! async fn main() -> record_ledger::Result<()> {
//!     let config = Config::default();
//!     let ledger = Ledger::open(config, Principal::new("deployer")).await?;
//!
//!     let receipt = ledger
//!         .create_record(Principal::new("alice"), b"test data".to_vec())
//!         .await?;
//!     assert_eq!(receipt.sequence, 1);
//!
//!     ledger.shutdown().await?;
//!     Ok(())
//! }
//! ```

use crate::{
    actor::{spawn_ledger_actor, LedgerHandle},
    batch::BatchCoordinator,
    metrics::Metrics,
    state::LedgerState,
    types::{LedgerEvent, Principal, RecordReceipt},
    Config, Result, Storage,
};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Main ledger interface
pub struct Ledger {
    /// Actor handle for state-mutating operations and queries
    handle: LedgerHandle,

    /// Direct storage access (for event log reads)
    storage: Arc<Storage>,

    /// Live event feed
    events_tx: broadcast::Sender<LedgerEvent>,

    /// Metrics collector
    metrics: Metrics,
}

impl Ledger {
    /// Open the ledger
    ///
    /// A fresh data directory is initialized with `deployer` as owner and
    /// zero counters. An existing directory restores its persisted owner,
    /// paused flag, and counters; the `deployer` argument is then ignored.
    pub async fn open(config: Config, deployer: Principal) -> Result<Self> {
        let storage = Arc::new(Storage::open(&config)?);

        let (state, log_head) = match storage.load_state()? {
            Some(persisted) => {
                tracing::info!(
                    owner = %persisted.owner,
                    total_operations = persisted.total_operations,
                    "Restored ledger state"
                );
                (
                    LedgerState::restore(
                        persisted.owner,
                        persisted.paused,
                        persisted.total_operations,
                        persisted.user_operations,
                    ),
                    persisted.log_head,
                )
            }
            None => {
                if deployer.is_null() {
                    return Err(crate::Error::InvalidInput(
                        "deployer is the null identity".to_string(),
                    ));
                }
                storage.init_genesis(&deployer)?;
                (LedgerState::new(deployer), 0)
            }
        };

        let metrics = Metrics::new()
            .map_err(|e| crate::Error::Config(format!("Failed to create metrics: {}", e)))?;
        metrics.set_paused(state.is_paused());

        let (events_tx, _) = broadcast::channel(config.event_channel_capacity);
        let handle = spawn_ledger_actor(
            storage.clone(),
            state,
            BatchCoordinator::new(config.batch.max_batch_size),
            log_head,
            events_tx.clone(),
            metrics.clone(),
        );

        Ok(Self {
            handle,
            storage,
            events_tx,
            metrics,
        })
    }

    /// Append a single record
    ///
    /// Fails with `InvalidInput` for an empty payload and `ContractPaused`
    /// while paused. On success both counters advance by one and one
    /// `RecordCreated` event is committed and broadcast.
    pub async fn create_record(&self, caller: Principal, payload: Vec<u8>) -> Result<RecordReceipt> {
        self.handle.create_record(caller, payload).await
    }

    /// Append a batch of records, all-or-nothing
    ///
    /// A rejected batch leaves no counter change and emits nothing. On
    /// success the receipts carry strictly increasing sequence indices.
    pub async fn batch_create_records(
        &self,
        caller: Principal,
        payloads: Vec<Vec<u8>>,
    ) -> Result<Vec<RecordReceipt>> {
        self.handle.batch_create_records(caller, payloads).await
    }

    /// Pause the ledger (owner only)
    pub async fn pause(&self, caller: Principal) -> Result<()> {
        self.handle.pause(caller).await
    }

    /// Unpause the ledger (owner only)
    pub async fn unpause(&self, caller: Principal) -> Result<()> {
        self.handle.unpause(caller).await
    }

    /// Transfer ownership to a non-null principal (owner only)
    pub async fn transfer_ownership(&self, caller: Principal, new_owner: Principal) -> Result<()> {
        self.handle.transfer_ownership(caller, new_owner).await
    }

    /// Current owner
    pub async fn owner(&self) -> Result<Principal> {
        self.handle.owner().await
    }

    /// Current paused state
    pub async fn paused(&self) -> Result<bool> {
        self.handle.paused().await
    }

    /// Global write counter
    pub async fn total_operations(&self) -> Result<u64> {
        self.handle.total_operations().await
    }

    /// Write counter for one caller (zero if the caller never wrote)
    pub async fn user_operations(&self, caller: Principal) -> Result<u64> {
        self.handle.user_operations(caller).await
    }

    /// Subscribe to the live event feed
    ///
    /// Receivers observe every event committed after subscription, in commit
    /// order. Wrap with `tokio_stream::wrappers::BroadcastStream` for stream
    /// consumers.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events_tx.subscribe()
    }

    /// Replay committed events from the durable log, starting at `from`
    ///
    /// Record history is reconstructible purely from this log; nothing else
    /// retains payloads.
    pub fn replay(&self, from: u64) -> Result<Vec<LedgerEvent>> {
        self.storage.read_events(from)
    }

    /// Metrics collector for this ledger
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Shutdown ledger
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger").finish_non_exhaustive()
    }
}
