//! Client-local key/value storage.
//!
//! `LocalStorage` mirrors the string-keyed, string-valued store a browser
//! client persists small values in. `MemoryStorage` lives for the process;
//! `RocksDbStorage` survives restarts.

use crate::Result;
#[cfg(feature = "persistent")]
use crate::LucidraError;
use dashmap::DashMap;
#[cfg(feature = "persistent")]
use rocksdb::{Options, DB};
#[cfg(feature = "persistent")]
use std::path::Path;
#[cfg(feature = "persistent")]
use tracing::info;

pub trait LocalStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    fn remove_item(&self, key: &str) -> Result<()>;
}

/// In-process storage, lost on exit
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).map(|v| v.value().clone()))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// Persistent storage using RocksDB
#[cfg(feature = "persistent")]
pub struct RocksDbStorage {
    db: DB,
}

#[cfg(feature = "persistent")]
impl RocksDbStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, path.as_ref())
            .map_err(|e| LucidraError::StorageError(e.to_string()))?;

        info!(target: "local_storage", path = %path.as_ref().display(), "Local storage opened");
        Ok(Self { db })
    }
}

#[cfg(feature = "persistent")]
impl LocalStorage for RocksDbStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match self.db.get(key) {
            Ok(Some(data)) => String::from_utf8(data)
                .map(Some)
                .map_err(|e| LucidraError::StorageError(format!("Non UTF-8 value: {}", e))),
            Ok(None) => Ok(None),
            Err(e) => Err(LucidraError::StorageError(e.to_string())),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .put(key, value.as_bytes())
            .map_err(|e| LucidraError::StorageError(e.to_string()))
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.db
            .delete(key)
            .map_err(|e| LucidraError::StorageError(e.to_string()))
    }
}
