//! Persistent backing stores for the album collection.
//!
//! Two stores are used, primary first:
//! - a small string key-value store with a hard capacity (`local`)
//! - a record store keyed by album id with no hard limit (`records`)

pub mod local;
pub mod records;
mod schema;

use thiserror::Error;

pub use local::LocalStore;
pub use records::SqliteRecordStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("quota exceeded: {needed} bytes needed, capacity is {capacity} bytes")]
    QuotaExceeded { needed: usize, capacity: usize },

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("stored data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// String key-value store with a capacity ceiling enforced at write time.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite `key`. Fails with `QuotaExceeded` when the store would
    /// grow past its capacity.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Capacity in bytes.
    fn capacity(&self) -> usize;
}

/// Record-oriented store, one serialized record per album id.
pub trait RecordStore {
    /// All records as `(id, record)` in write order.
    fn load_all(&self) -> Result<Vec<(String, String)>, StorageError>;

    fn clear(&mut self) -> Result<(), StorageError>;

    fn put(&mut self, id: &str, record: &str) -> Result<(), StorageError>;

    /// Replace the whole record set. Implementations with transactions
    /// leave the previous set intact when any write fails.
    fn replace_all(&mut self, records: &[(String, String)]) -> Result<(), StorageError> {
        self.clear()?;
        for (id, record) in records {
            self.put(id, record)?;
        }
        Ok(())
    }
}
