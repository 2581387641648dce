//! Storage backends (memory, SQLite, per-key JSON files) and the
//! persistence adapter that moves whole collections in and out of them.

pub mod files;
pub mod memory;
pub mod sqlite;

use std::cell::RefCell;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::{DeskError, Result};

pub use files::FileKv;
pub use memory::MemoryKv;
pub use sqlite::SqliteKv;

/// Durable key-value backend. Values are JSON text.
pub trait KvStore {
    /// Value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value under `key`.
    fn put(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// All keys, ascending.
    fn keys(&self) -> Result<Vec<String>>;
}

impl<K: KvStore + ?Sized> KvStore for Box<K> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).put(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        (**self).keys()
    }
}

/// One backend shared by every store of a desk. Single-threaded.
pub struct SharedKv<K> {
    inner: Rc<RefCell<K>>,
}

impl<K> SharedKv<K> {
    pub fn new(kv: K) -> Self {
        Self {
            inner: Rc::new(RefCell::new(kv)),
        }
    }

    /// Run `f` against the underlying backend.
    pub fn with<T>(&self, f: impl FnOnce(&K) -> T) -> T {
        f(&self.inner.borrow())
    }
}

impl<K> Clone for SharedKv<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K: KvStore> KvStore for SharedKv<K> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.borrow().get(key)
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.inner.borrow_mut().put(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.inner.borrow_mut().remove(key)
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.inner.borrow().keys()
    }
}

// ─── Persistence adapter ──────────────────────────────────────────────────

/// Where a loaded collection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Stored,
    Seed,
}

/// Decode the value under `key`. Absent, unreadable and malformed values
/// all come back as `None`; the latter two are logged.
pub fn load_value<T: DeserializeOwned>(kv: &impl KvStore, key: &str) -> Option<T> {
    let raw = match kv.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "storage read failed");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            let err = DeskError::StorageRead {
                key: key.to_string(),
                reason: e.to_string(),
            };
            warn!(key, error = %err, "ignoring malformed stored value");
            None
        }
    }
}

pub fn save_value<T: Serialize + ?Sized>(kv: &mut impl KvStore, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    kv.put(key, &json)
}

/// The collection stored under `key`, or `seed()` when there is none
/// or it cannot be parsed. Never fails.
pub fn load_collection<R: DeserializeOwned>(
    kv: &impl KvStore,
    key: &str,
    seed: impl FnOnce() -> Vec<R>,
) -> (Vec<R>, Origin) {
    match load_value(kv, key) {
        Some(records) => (records, Origin::Stored),
        None => (seed(), Origin::Seed),
    }
}

/// Overwrite the whole collection under `key`.
pub fn save_collection<R: Serialize>(kv: &mut impl KvStore, key: &str, records: &[R]) -> Result<()> {
    save_value(kv, key, records)?;
    debug!(key, count = records.len(), "collection saved");
    Ok(())
}
