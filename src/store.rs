//! The record store: an append-only history of canonical records.
//!
//! Backed by an embedded sled database so the process owns its storage for
//! its whole lifetime; there is no connection to establish per caller, just
//! one handle opened at startup and shared behind an `Arc`. Records are
//! bincode-encoded [`StoredRecord`]s keyed by the big-endian timestamp in
//! milliseconds, which makes sled's natural key order the ascending
//! timestamp order the read API wants.
//!
//! The [`RecordStore`] trait is the gateway contract the pipeline depends
//! on; tests substitute an in-memory implementation.

use crate::error::StorageError;
use crate::models::{CovidRecord, SCHEMA_VERSION, StoredRecord};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{debug, info};

/// Filter for [`RecordStore::find_all`]. Bounds are inclusive and apply to
/// the record date.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordFilter {
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl RecordFilter {
    fn matches(&self, record: &CovidRecord) -> bool {
        if let Some(from) = self.from {
            if record.date < from {
                return false;
            }
        }
        if let Some(until) = self.until {
            if record.date > until {
                return false;
            }
        }
        true
    }
}

/// The persistence gateway contract.
///
/// Inserts append; nothing ever updates or deletes a stored record.
pub trait RecordStore: Send + Sync {
    /// Persist a record, returning its store-assigned id.
    fn insert(&self, record: &CovidRecord) -> Result<u64, StorageError>;

    /// The most recently inserted record, if any.
    fn find_latest(&self) -> Result<Option<StoredRecord>, StorageError>;

    /// All records matching `filter`, ascending by timestamp.
    fn find_all(&self, filter: &RecordFilter) -> Result<Vec<StoredRecord>, StorageError>;
}

/// Sled-backed implementation of [`RecordStore`].
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = sled::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), records = db.len(), "record store opened");
        Ok(Self { db })
    }

    fn key_for(record: &CovidRecord) -> u64 {
        record.date.timestamp_millis() as u64
    }

    fn decode(value: &[u8]) -> Result<StoredRecord, StorageError> {
        Ok(bincode::deserialize(value)?)
    }
}

impl RecordStore for SledStore {
    fn insert(&self, record: &CovidRecord) -> Result<u64, StorageError> {
        let id = Self::key_for(record);
        let stored = StoredRecord {
            id,
            schema: SCHEMA_VERSION,
            record: record.clone(),
        };

        let value = bincode::serialize(&stored)?;
        self.db.insert(id.to_be_bytes(), value)?;
        self.db.flush()?;
        debug!(id, "record inserted");
        Ok(id)
    }

    fn find_latest(&self) -> Result<Option<StoredRecord>, StorageError> {
        match self.db.last()? {
            Some((_key, value)) => Ok(Some(Self::decode(&value)?)),
            None => Ok(None),
        }
    }

    fn find_all(&self, filter: &RecordFilter) -> Result<Vec<StoredRecord>, StorageError> {
        let mut records = Vec::new();
        for entry in self.db.iter() {
            let (_key, value) = entry?;
            let stored = Self::decode(&value)?;
            if filter.matches(&stored.record) {
                records.push(stored);
            }
        }
        Ok(records)
    }
}
