//! Ledger state owned by the single writer
//!
//! One explicit struct holds everything mutable: the owner guard, the pause
//! switch, and both write counters. There are no ambient globals; the actor
//! owns the only instance.
//!
//! Operations follow a stage/commit split. `stage_*` validates preconditions
//! and produces the event that would be emitted, without touching state.
//! `commit_*` applies a staged transition and cannot fail. The actor persists
//! staged events before committing, so memory never runs ahead of storage
//! and a rejected call leaves no trace.

use crate::access::AccessGuard;
use crate::error::Result;
use crate::pause::PauseSwitch;
use crate::types::{now_nanos, LedgerEvent, Principal, RecordCreated};
use std::collections::HashMap;

/// Mutable ledger state: owner, pause flag, and write counters
#[derive(Debug, Clone)]
pub struct LedgerState {
    /// Owner capability guard
    access: AccessGuard,

    /// Write gate
    pause: PauseSwitch,

    /// Global write counter, +1 per accepted record
    total_operations: u64,

    /// Per-caller write counters
    user_operations: HashMap<Principal, u64>,
}

impl LedgerState {
    /// Fresh state at construction: counters zero, active, owner = deployer
    pub fn new(owner: Principal) -> Self {
        Self {
            access: AccessGuard::new(owner),
            pause: PauseSwitch::default(),
            total_operations: 0,
            user_operations: HashMap::new(),
        }
    }

    /// Restore state from persisted values
    pub fn restore(
        owner: Principal,
        paused: bool,
        total_operations: u64,
        user_operations: HashMap<Principal, u64>,
    ) -> Self {
        Self {
            access: AccessGuard::new(owner),
            pause: PauseSwitch::with_state(paused),
            total_operations,
            user_operations,
        }
    }

    /// Current owner
    pub fn owner(&self) -> &Principal {
        self.access.owner()
    }

    /// Current paused state
    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    /// Global write counter
    pub fn total_operations(&self) -> u64 {
        self.total_operations
    }

    /// Write counter for one caller (zero if the caller never wrote)
    pub fn user_operations(&self, caller: &Principal) -> u64 {
        self.user_operations.get(caller).copied().unwrap_or(0)
    }

    /// Fail with `ContractPaused` unless writes are legal
    pub fn require_active(&self) -> Result<()> {
        self.pause.require_active()
    }

    /// Stage a single record write
    ///
    /// Preconditions: not paused, payload non-empty. The staged event carries
    /// the sequence index the write will have once committed.
    pub fn stage_record(&self, caller: &Principal, payload: Vec<u8>) -> Result<RecordCreated> {
        self.pause.require_active()?;
        if payload.is_empty() {
            return Err(crate::Error::InvalidInput("empty payload".to_string()));
        }
        Ok(RecordCreated::new(
            caller.clone(),
            payload,
            self.total_operations + 1,
        ))
    }

    /// Commit staged record writes, advancing both counters
    pub fn commit_records(&mut self, events: &[RecordCreated]) {
        for event in events {
            debug_assert_eq!(event.sequence, self.total_operations + 1);
            self.total_operations += 1;
            *self.user_operations.entry(event.caller.clone()).or_insert(0) += 1;
        }
        debug_assert!(self.invariant_holds());
    }

    /// Stage a pause (owner only, fails if already paused)
    pub fn stage_pause(&self, caller: &Principal) -> Result<LedgerEvent> {
        self.access.require_owner(caller)?;
        self.pause.validate_engage()?;
        Ok(LedgerEvent::Paused {
            by: caller.clone(),
            timestamp_nanos: now_nanos(),
        })
    }

    /// Commit a staged pause
    pub fn commit_pause(&mut self) {
        self.pause.set_paused(true);
    }

    /// Stage an unpause (owner only, fails if already active)
    pub fn stage_unpause(&self, caller: &Principal) -> Result<LedgerEvent> {
        self.access.require_owner(caller)?;
        self.pause.validate_release()?;
        Ok(LedgerEvent::Unpaused {
            by: caller.clone(),
            timestamp_nanos: now_nanos(),
        })
    }

    /// Commit a staged unpause
    pub fn commit_unpause(&mut self) {
        self.pause.set_paused(false);
    }

    /// Stage an ownership transfer (owner only, non-null target)
    pub fn stage_transfer(&self, caller: &Principal, new_owner: &Principal) -> Result<LedgerEvent> {
        self.access.validate_transfer(caller, new_owner)?;
        Ok(LedgerEvent::OwnershipTransferred {
            previous_owner: self.access.owner().clone(),
            new_owner: new_owner.clone(),
            timestamp_nanos: now_nanos(),
        })
    }

    /// Commit a staged ownership transfer
    pub fn commit_transfer(&mut self, new_owner: Principal) {
        self.access.set_owner(new_owner);
    }

    /// Counter conservation: total equals the sum over all callers
    pub fn invariant_holds(&self) -> bool {
        self.total_operations == self.user_operations.values().sum::<u64>()
    }
}
