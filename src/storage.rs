//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `events` - Append-only event log (key: big-endian log index)
//! - `counters` - Per-caller write counters (key: principal bytes)
//! - `meta` - Owner, paused flag, global counter, log head
//!
//! All writes for one ledger call go through a single `WriteBatch`, so a
//! call is either fully persisted or not at all.

use crate::{
    config::Config,
    error::{Error, Result},
    types::{LedgerEvent, Principal},
};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, Direction, IteratorMode, Options, WriteBatch, DB};
use std::collections::HashMap;
use std::sync::Arc;

/// Column family names
const CF_EVENTS: &str = "events";
const CF_COUNTERS: &str = "counters";
const CF_META: &str = "meta";

/// Meta keys
const META_OWNER: &[u8] = b"owner";
const META_PAUSED: &[u8] = b"paused";
const META_TOTAL_OPERATIONS: &[u8] = b"total_operations";
const META_LOG_HEAD: &[u8] = b"log_head";

/// Ledger state reloaded from an existing data directory
#[derive(Debug, Clone)]
pub struct PersistedState {
    /// Persisted owner
    pub owner: Principal,
    /// Persisted paused flag
    pub paused: bool,
    /// Persisted global write counter
    pub total_operations: u64,
    /// Persisted per-caller counters
    pub user_operations: HashMap<Principal, u64>,
    /// Next free event log index
    pub log_head: u64,
}

/// State columns touched by one atomic commit
#[derive(Debug, Default)]
pub struct CommitMeta<'a> {
    /// New global write counter, if it moved
    pub total_operations: Option<u64>,
    /// New per-caller counter, if one moved
    pub counter: Option<(&'a Principal, u64)>,
    /// New paused flag, if it flipped
    pub paused: Option<bool>,
    /// New owner, if ownership moved
    pub owner: Option<&'a Principal>,
}

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage").finish_non_exhaustive()
    }
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        // Create directory if not exists
        std::fs::create_dir_all(path)?;

        // Database options
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);
        db_opts.set_level_zero_file_num_compaction_trigger(
            config.rocksdb.level0_file_num_compaction_trigger,
        );

        // Universal compaction for the append-heavy event log
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_EVENTS, Self::cf_options_events()),
            ColumnFamilyDescriptor::new(CF_COUNTERS, Self::cf_options_counters()),
            ColumnFamilyDescriptor::new(CF_META, Self::cf_options_meta()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened RocksDB");

        Ok(Self { db: Arc::new(db) })
    }

    fn cf_options_events() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_counters() -> Options {
        let mut opts = Options::default();
        // Counters are frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_meta() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    /// Write the genesis state for a fresh data directory
    pub fn init_genesis(&self, owner: &Principal) -> Result<()> {
        let cf_meta = self.cf_handle(CF_META)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(cf_meta, META_OWNER, owner.as_str().as_bytes());
        batch.put_cf(cf_meta, META_PAUSED, [0u8]);
        batch.put_cf(cf_meta, META_TOTAL_OPERATIONS, 0u64.to_be_bytes());
        batch.put_cf(cf_meta, META_LOG_HEAD, 0u64.to_be_bytes());
        self.db.write(batch)?;

        tracing::info!(owner = %owner, "Ledger genesis written");
        Ok(())
    }

    /// Reload persisted state, or `None` for a fresh data directory
    pub fn load_state(&self) -> Result<Option<PersistedState>> {
        let cf_meta = self.cf_handle(CF_META)?;

        let owner = match self.db.get_cf(cf_meta, META_OWNER)? {
            Some(bytes) => Principal::new(String::from_utf8(bytes).map_err(|e| {
                Error::Storage(format!("Corrupt owner entry: {}", e))
            })?),
            None => return Ok(None),
        };

        let paused = self
            .db
            .get_cf(cf_meta, META_PAUSED)?
            .map(|bytes| bytes.first() == Some(&1))
            .unwrap_or(false);
        let total_operations = self.read_meta_u64(META_TOTAL_OPERATIONS)?;
        let log_head = self.read_meta_u64(META_LOG_HEAD)?;

        let cf_counters = self.cf_handle(CF_COUNTERS)?;
        let mut user_operations = HashMap::new();
        for item in self.db.iterator_cf(cf_counters, IteratorMode::Start) {
            let (key, value) = item?;
            let caller = Principal::new(String::from_utf8(key.to_vec()).map_err(|e| {
                Error::Storage(format!("Corrupt counter key: {}", e))
            })?);
            user_operations.insert(caller, decode_u64(&value)?);
        }

        Ok(Some(PersistedState {
            owner,
            paused,
            total_operations,
            user_operations,
            log_head,
        }))
    }

    fn read_meta_u64(&self, key: &[u8]) -> Result<u64> {
        let cf_meta = self.cf_handle(CF_META)?;
        match self.db.get_cf(cf_meta, key)? {
            Some(bytes) => decode_u64(&bytes),
            None => Ok(0),
        }
    }

    /// Atomically persist events plus the state columns they moved
    ///
    /// Events are appended at consecutive log indices starting at `log_head`.
    /// Returns the new log head.
    pub fn commit(
        &self,
        log_head: u64,
        events: &[LedgerEvent],
        meta: CommitMeta<'_>,
    ) -> Result<u64> {
        let cf_events = self.cf_handle(CF_EVENTS)?;
        let cf_counters = self.cf_handle(CF_COUNTERS)?;
        let cf_meta = self.cf_handle(CF_META)?;

        let mut batch = WriteBatch::default();

        for (i, event) in events.iter().enumerate() {
            let key = (log_head + i as u64).to_be_bytes();
            let value = bincode::serialize(event)?;
            batch.put_cf(cf_events, key, &value);
        }
        let new_head = log_head + events.len() as u64;
        batch.put_cf(cf_meta, META_LOG_HEAD, new_head.to_be_bytes());

        if let Some(total) = meta.total_operations {
            batch.put_cf(cf_meta, META_TOTAL_OPERATIONS, total.to_be_bytes());
        }
        if let Some((caller, count)) = meta.counter {
            batch.put_cf(cf_counters, caller.as_str().as_bytes(), count.to_be_bytes());
        }
        if let Some(paused) = meta.paused {
            batch.put_cf(cf_meta, META_PAUSED, [paused as u8]);
        }
        if let Some(owner) = meta.owner {
            batch.put_cf(cf_meta, META_OWNER, owner.as_str().as_bytes());
        }

        self.db.write(batch)?;

        tracing::debug!(
            log_head = new_head,
            event_count = events.len(),
            "Commit persisted"
        );

        Ok(new_head)
    }

    /// Read committed events in log order, starting at `from`
    pub fn read_events(&self, from: u64) -> Result<Vec<LedgerEvent>> {
        let cf_events = self.cf_handle(CF_EVENTS)?;
        let start = from.to_be_bytes();
        let iter = self
            .db
            .iterator_cf(cf_events, IteratorMode::From(&start, Direction::Forward));

        let mut events = Vec::new();
        for item in iter {
            let (_, value) = item?;
            events.push(bincode::deserialize(&value)?);
        }
        Ok(events)
    }
}

fn decode_u64(bytes: &[u8]) -> Result<u64> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| Error::Storage("Corrupt u64 entry".to_string()))?;
    Ok(u64::from_be_bytes(arr))
}
