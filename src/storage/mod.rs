//! Key/value persistence shared by every component.
//!
//! Values are arbitrary JSON. Reads never fail: a missing key or a value that
//! cannot be interpreted resolves to `None`. Writes report errors so callers
//! can log them, but nothing in the app treats a failed write as fatal.

use crate::config::{APP_DIR_NAME, STORAGE_FILE_NAME};
use crate::error::Result;
use async_trait::async_trait;
use log::{info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::rc::Rc;

pub mod file_store;
pub mod memory_store;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

/// Asynchronous key/value store.
///
/// Implementations may complete synchronously, but callers must always await.
#[async_trait(?Send)]
pub trait KeyValueStore {
    /// Returns the stored value, or `None` if missing or unreadable.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Reads `key` and deserializes it into `T`.
///
/// A value of the wrong shape counts as corruption: it is logged, removed, and
/// reported as missing.
pub async fn load_typed<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let value = store.get(key).await?;
    match serde_json::from_value(value) {
        Ok(typed) => Some(typed),
        Err(e) => {
            warn!("Discarding unreadable value for '{}': {}", key, e);
            if let Err(e) = store.remove(key).await {
                warn!("Failed to remove unreadable value for '{}': {}", key, e);
            }
            None
        }
    }
}

/// Serializes `value` and stores it under `key`.
pub async fn save_typed<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let value = serde_json::to_value(value)?;
    store.set(key, value).await
}

/// Opens the persisted store in the user's data directory.
///
/// Falls back to an in-process store when no data directory is available, so
/// the app still runs (without persistence across restarts).
pub fn open_default_store() -> Rc<dyn KeyValueStore> {
    let Some(mut path) = dirs::data_dir().or_else(dirs::home_dir) else {
        warn!("No data directory available, using in-memory storage");
        return Rc::new(MemoryStore::new());
    };

    path.push(APP_DIR_NAME);
    if let Err(e) = std::fs::create_dir_all(&path) {
        warn!(
            "Cannot create {}: {}, using in-memory storage",
            path.display(),
            e
        );
        return Rc::new(MemoryStore::new());
    }

    path.push(STORAGE_FILE_NAME);
    let store = FileStore::new(path);
    info!("Storage file: {}", store.path().display());
    Rc::new(store)
}
