//! Durable key-value storage backed by a single JSON file
//!
//! Every mutation rewrites the whole file with a temp-file + rename so a
//! crash mid-write never leaves a half-written file behind. A tokio Mutex
//! serializes writers; multi-key updates happen under one lock acquisition
//! and one file replace, so readers never observe a partial update.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

type Items = HashMap<String, Value>;

/// Thread-safe JSON key-value file.
pub struct LocalStorage {
    path: PathBuf,
    state: Mutex<Items>,
}

impl LocalStorage {
    /// Open the storage file at `path`.
    ///
    /// A missing file is created as `{}`, including its parent directory.
    pub async fn open(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading storage file: {e}")))?;
            let items: Items = serde_json::from_str(&contents)
                .map_err(|e| Error::Parse(format!("parsing storage file: {e}")))?;
            info!(path = %path.display(), keys = items.len(), "opened local storage");
            items
        } else {
            info!(path = %path.display(), "storage file not found, starting empty");
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::Io(format!("creating storage directory: {e}")))?;
            }
            let items = Items::new();
            write_atomic(&path, &items).await?;
            items
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw value stored under `key`.
    pub async fn get_item(&self, key: &str) -> Option<Value> {
        let state = self.state.lock().await;
        state.get(key).cloned()
    }

    /// Values for several keys read under a single lock.
    pub async fn get_items(&self, keys: &[&str]) -> Vec<Option<Value>> {
        let state = self.state.lock().await;
        keys.iter().map(|k| state.get(*k).cloned()).collect()
    }

    /// Deserialize the value under `key`, `None` when the key is absent.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_item(key).await {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| Error::InvalidValue {
                    key: key.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    /// Serialize `value` and store it under `key`.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| Error::InvalidValue {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.set_items(vec![(key.to_string(), value)]).await
    }

    /// Insert or replace several keys in one atomic file write.
    ///
    /// Memory is only updated once the file write succeeds.
    pub async fn set_items(&self, items: Vec<(String, Value)>) -> Result<()> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        for (key, value) in items {
            debug!(key, "storing item");
            next.insert(key, value);
        }
        write_atomic(&self.path, &next).await?;
        *state = next;
        Ok(())
    }

    /// Remove several keys in one atomic file write.
    ///
    /// The in-memory removal happens even if persisting fails.
    pub async fn remove_items(&self, keys: &[&str]) -> Result<()> {
        let mut state = self.state.lock().await;
        let mut removed = false;
        for key in keys {
            removed |= state.remove(*key).is_some();
        }
        if removed {
            debug!(?keys, "removed items");
            write_atomic(&self.path, &state).await?;
        }
        Ok(())
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.state.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Write the storage map atomically with 0600 permissions (unix only).
async fn write_atomic(path: &Path, data: &Items) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::Parse(format!("serializing storage: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("storage path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".storage.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp storage file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting storage file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp storage file: {e}")))?;

    debug!(path = %path.display(), "persisted local storage");
    Ok(())
}
