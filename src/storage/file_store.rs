//! Store backed by a single JSON document on disk.
//!
//! The document is read once and then kept in memory. Every operation holds
//! the document lock until its write has landed, so overlapping writes are
//! applied one after the other and each rewrites the file through a
//! temporary file and a rename.

use super::KeyValueStore;
use crate::error::Result;
use async_std::sync::Mutex;
use async_trait::async_trait;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

type Document = Map<String, Value>;

pub struct FileStore {
    path: PathBuf,
    /// `None` until first read from disk.
    document: Mutex<Option<Document>>,
}

impl FileStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            document: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the document. Missing or corrupt documents read as empty.
    async fn read_document(&self) -> Document {
        let text = match async_std::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Map::new(),
            Err(e) => {
                warn!("Failed to read {}: {}", self.path.display(), e);
                return Map::new();
            }
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!(
                    "Storage document {} is corrupt, treating as empty",
                    self.path.display()
                );
                Map::new()
            }
        }
    }

    async fn write_document(&self, document: &Document) -> Result<()> {
        let text = serde_json::to_string_pretty(document)?;
        let tmp_path = self.path.with_extension("json.tmp");
        async_std::fs::write(&tmp_path, text).await?;
        async_std::fs::rename(&tmp_path, &self.path).await?;
        debug!("Wrote {}", self.path.display());
        Ok(())
    }

    /// Applies `edit` to the document and persists it when `edit` reports a
    /// change. On a failed write the in-memory document is reloaded from disk
    /// on next access.
    async fn update(&self, edit: impl FnOnce(&mut Document) -> bool) -> Result<()> {
        let mut slot = self.document.lock().await;
        if slot.is_none() {
            *slot = Some(self.read_document().await);
        }
        let Some(document) = slot.as_mut() else {
            return Ok(());
        };
        if !edit(document) {
            return Ok(());
        }

        let result = self.write_document(document).await;
        if result.is_err() {
            *slot = None;
        }
        result
    }
}

#[async_trait(?Send)]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Option<Value> {
        let mut slot = self.document.lock().await;
        if slot.is_none() {
            *slot = Some(self.read_document().await);
        }
        slot.as_ref()?.get(key).cloned()
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.update(|document| {
            document.insert(key.to_string(), value);
            true
        })
        .await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.update(|document| document.remove(key).is_some()).await
    }
}
