//! Actor-based concurrency for the ledger
//!
//! Single-writer pattern using Tokio actors: one task owns the mutable
//! [`LedgerState`] and the storage handle, so no two writes ever interleave.
//! Each message is processed to completion before the next, and every
//! accepted call is persisted in one atomic `WriteBatch` before the
//! in-memory state moves.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                External callers                       │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │   stage → Storage::commit (WriteBatch) → commit       │
//! │                  → broadcast events                   │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::batch::BatchCoordinator;
use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::state::LedgerState;
use crate::storage::{CommitMeta, Storage};
use crate::types::{LedgerEvent, Principal, RecordReceipt};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Message sent to the ledger actor
#[derive(Debug)]
pub enum LedgerMessage {
    /// Append a single record
    CreateRecord {
        /// Submitting caller
        caller: Principal,
        /// Record payload
        payload: Vec<u8>,
        /// Reply channel
        response: oneshot::Sender<Result<RecordReceipt>>,
    },

    /// Append a batch of records atomically
    BatchCreateRecords {
        /// Submitting caller
        caller: Principal,
        /// Record payloads, applied all-or-nothing
        payloads: Vec<Vec<u8>>,
        /// Reply channel
        response: oneshot::Sender<Result<Vec<RecordReceipt>>>,
    },

    /// Pause the ledger (owner only)
    Pause {
        /// Calling principal
        caller: Principal,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Unpause the ledger (owner only)
    Unpause {
        /// Calling principal
        caller: Principal,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Transfer ownership (owner only)
    TransferOwnership {
        /// Calling principal
        caller: Principal,
        /// Transfer target
        new_owner: Principal,
        /// Reply channel
        response: oneshot::Sender<Result<()>>,
    },

    /// Query current owner
    GetOwner {
        /// Reply channel
        response: oneshot::Sender<Principal>,
    },

    /// Query paused flag
    GetPaused {
        /// Reply channel
        response: oneshot::Sender<bool>,
    },

    /// Query global write counter
    GetTotalOperations {
        /// Reply channel
        response: oneshot::Sender<u64>,
    },

    /// Query one caller's write counter
    GetUserOperations {
        /// Queried principal
        caller: Principal,
        /// Reply channel
        response: oneshot::Sender<u64>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes ledger messages
pub struct LedgerActor {
    /// Storage backend
    storage: Arc<Storage>,

    /// Mutable ledger state (single owner)
    state: LedgerState,

    /// Batch staging with the configured bound
    coordinator: BatchCoordinator,

    /// Next free event log index
    log_head: u64,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,

    /// Live event feed for subscribers
    events_tx: broadcast::Sender<LedgerEvent>,

    /// Metrics collector
    metrics: Metrics,
}

impl LedgerActor {
    /// Create new actor
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        storage: Arc<Storage>,
        state: LedgerState,
        coordinator: BatchCoordinator,
        log_head: u64,
        mailbox: mpsc::Receiver<LedgerMessage>,
        events_tx: broadcast::Sender<LedgerEvent>,
        metrics: Metrics,
    ) -> Self {
        Self {
            storage,
            state,
            coordinator,
            log_head,
            mailbox,
            events_tx,
            metrics,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                LedgerMessage::Shutdown => break,
                other => self.handle_message(other),
            }
        }
        tracing::info!("Ledger actor stopped");
    }

    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::CreateRecord {
                caller,
                payload,
                response,
            } => {
                let started = Instant::now();
                let result = self.apply_create(&caller, payload);
                self.observe_write(&started, result.as_ref().map(|_| 1));
                let _ = response.send(result);
            }

            LedgerMessage::BatchCreateRecords {
                caller,
                payloads,
                response,
            } => {
                let started = Instant::now();
                let result = self.apply_batch(&caller, payloads);
                self.observe_write(&started, result.as_ref().map(Vec::len));
                let _ = response.send(result);
            }

            LedgerMessage::Pause { caller, response } => {
                let _ = response.send(self.apply_pause(&caller));
            }

            LedgerMessage::Unpause { caller, response } => {
                let _ = response.send(self.apply_unpause(&caller));
            }

            LedgerMessage::TransferOwnership {
                caller,
                new_owner,
                response,
            } => {
                let _ = response.send(self.apply_transfer(&caller, new_owner));
            }

            LedgerMessage::GetOwner { response } => {
                let _ = response.send(self.state.owner().clone());
            }

            LedgerMessage::GetPaused { response } => {
                let _ = response.send(self.state.is_paused());
            }

            LedgerMessage::GetTotalOperations { response } => {
                let _ = response.send(self.state.total_operations());
            }

            LedgerMessage::GetUserOperations { caller, response } => {
                let _ = response.send(self.state.user_operations(&caller));
            }

            LedgerMessage::Shutdown => {
                // Handled in main loop
            }
        }
    }

    fn observe_write<E>(&self, started: &Instant, outcome: std::result::Result<usize, E>) {
        self.metrics
            .record_append_duration(started.elapsed().as_secs_f64());
        match outcome {
            Ok(count) => self.metrics.record_accepted(count),
            Err(_) => self.metrics.record_rejection(),
        }
    }

    fn apply_create(&mut self, caller: &Principal, payload: Vec<u8>) -> Result<RecordReceipt> {
        let record = self.state.stage_record(caller, payload)?;
        let receipt = RecordReceipt::from(&record);
        let event = LedgerEvent::RecordCreated(record.clone());

        self.log_head = self.storage.commit(
            self.log_head,
            std::slice::from_ref(&event),
            CommitMeta {
                total_operations: Some(record.sequence),
                counter: Some((caller, self.state.user_operations(caller) + 1)),
                ..Default::default()
            },
        )?;
        self.state.commit_records(std::slice::from_ref(&record));

        tracing::debug!(
            caller = %caller,
            sequence = record.sequence,
            "Record accepted"
        );

        let _ = self.events_tx.send(event);
        Ok(receipt)
    }

    fn apply_batch(
        &mut self,
        caller: &Principal,
        payloads: Vec<Vec<u8>>,
    ) -> Result<Vec<RecordReceipt>> {
        let records = self.coordinator.stage(&self.state, caller, payloads)?;
        let receipts: Vec<RecordReceipt> = records.iter().map(RecordReceipt::from).collect();
        let events: Vec<LedgerEvent> = records
            .iter()
            .cloned()
            .map(LedgerEvent::RecordCreated)
            .collect();

        let new_total = self.state.total_operations() + records.len() as u64;
        let new_counter = self.state.user_operations(caller) + records.len() as u64;
        self.log_head = self.storage.commit(
            self.log_head,
            &events,
            CommitMeta {
                total_operations: Some(new_total),
                counter: Some((caller, new_counter)),
                ..Default::default()
            },
        )?;
        self.state.commit_records(&records);

        tracing::debug!(
            caller = %caller,
            count = records.len(),
            total_operations = new_total,
            "Batch accepted"
        );

        for event in events {
            let _ = self.events_tx.send(event);
        }
        Ok(receipts)
    }

    fn apply_pause(&mut self, caller: &Principal) -> Result<()> {
        let event = self.state.stage_pause(caller)?;
        self.log_head = self.storage.commit(
            self.log_head,
            std::slice::from_ref(&event),
            CommitMeta {
                paused: Some(true),
                ..Default::default()
            },
        )?;
        self.state.commit_pause();
        self.metrics.set_paused(true);

        tracing::info!(by = %caller, "Ledger paused");

        let _ = self.events_tx.send(event);
        Ok(())
    }

    fn apply_unpause(&mut self, caller: &Principal) -> Result<()> {
        let event = self.state.stage_unpause(caller)?;
        self.log_head = self.storage.commit(
            self.log_head,
            std::slice::from_ref(&event),
            CommitMeta {
                paused: Some(false),
                ..Default::default()
            },
        )?;
        self.state.commit_unpause();
        self.metrics.set_paused(false);

        tracing::info!(by = %caller, "Ledger unpaused");

        let _ = self.events_tx.send(event);
        Ok(())
    }

    fn apply_transfer(&mut self, caller: &Principal, new_owner: Principal) -> Result<()> {
        let event = self.state.stage_transfer(caller, &new_owner)?;
        self.log_head = self.storage.commit(
            self.log_head,
            std::slice::from_ref(&event),
            CommitMeta {
                owner: Some(&new_owner),
                ..Default::default()
            },
        )?;
        self.state.commit_transfer(new_owner.clone());

        tracing::info!(previous = %caller, new = %new_owner, "Ownership transferred");

        let _ = self.events_tx.send(event);
        Ok(())
    }
}

impl std::fmt::Debug for LedgerActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerActor")
            .field("log_head", &self.log_head)
            .finish_non_exhaustive()
    }
}

/// Handle for sending messages to the actor
#[derive(Debug, Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> LedgerMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(make(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Append a single record
    pub async fn create_record(
        &self,
        caller: Principal,
        payload: Vec<u8>,
    ) -> Result<RecordReceipt> {
        self.request(|response| LedgerMessage::CreateRecord {
            caller,
            payload,
            response,
        })
        .await?
    }

    /// Append a batch of records atomically
    pub async fn batch_create_records(
        &self,
        caller: Principal,
        payloads: Vec<Vec<u8>>,
    ) -> Result<Vec<RecordReceipt>> {
        self.request(|response| LedgerMessage::BatchCreateRecords {
            caller,
            payloads,
            response,
        })
        .await?
    }

    /// Pause the ledger (owner only)
    pub async fn pause(&self, caller: Principal) -> Result<()> {
        self.request(|response| LedgerMessage::Pause { caller, response })
            .await?
    }

    /// Unpause the ledger (owner only)
    pub async fn unpause(&self, caller: Principal) -> Result<()> {
        self.request(|response| LedgerMessage::Unpause { caller, response })
            .await?
    }

    /// Transfer ownership (owner only)
    pub async fn transfer_ownership(&self, caller: Principal, new_owner: Principal) -> Result<()> {
        self.request(|response| LedgerMessage::TransferOwnership {
            caller,
            new_owner,
            response,
        })
        .await?
    }

    /// Query current owner
    pub async fn owner(&self) -> Result<Principal> {
        self.request(|response| LedgerMessage::GetOwner { response })
            .await
    }

    /// Query paused flag
    pub async fn paused(&self) -> Result<bool> {
        self.request(|response| LedgerMessage::GetPaused { response })
            .await
    }

    /// Query global write counter
    pub async fn total_operations(&self) -> Result<u64> {
        self.request(|response| LedgerMessage::GetTotalOperations { response })
            .await
    }

    /// Query one caller's write counter
    pub async fn user_operations(&self, caller: Principal) -> Result<u64> {
        self.request(|response| LedgerMessage::GetUserOperations { caller, response })
            .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(
    storage: Arc<Storage>,
    state: LedgerState,
    coordinator: BatchCoordinator,
    log_head: u64,
    events_tx: broadcast::Sender<LedgerEvent>,
    metrics: Metrics,
) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(1000); // Bounded channel for backpressure
    let actor = LedgerActor::new(storage, state, coordinator, log_head, rx, events_tx, metrics);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}
