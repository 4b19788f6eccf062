//! Access/refresh token persistence
//!
//! `TokenStore` is the seam the request client depends on. The file-backed
//! store is what the CLI uses; the in-memory store backs tests and
//! short-lived sessions that should not touch disk.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::error::Result;
use crate::storage::LocalStorage;

/// Snapshot of the stored tokens. Either may be absent (no session).
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StoredTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl StoredTokens {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }
}

// Token values never reach logs, only their presence.
impl fmt::Debug for StoredTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredTokens")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Durable async get/set/clear of the two bearer tokens.
///
/// Uses `Pin<Box<dyn Future>>` return types so the client can hold an
/// `Arc<dyn TokenStore>`.
pub trait TokenStore: Send + Sync {
    /// Read both tokens.
    fn get(&self) -> Pin<Box<dyn Future<Output = StoredTokens> + Send + '_>>;

    /// Overwrite both tokens. Readers never observe one old and one new value.
    fn set<'a>(
        &'a self,
        access_token: &'a str,
        refresh_token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Remove both tokens. Storage failures are logged, never returned.
    fn clear(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Token store persisted in the shared local storage file.
#[derive(Clone)]
pub struct FileTokenStore {
    storage: Arc<LocalStorage>,
}

impl FileTokenStore {
    pub fn new(storage: Arc<LocalStorage>) -> Self {
        Self { storage }
    }
}

fn as_token(key: &str, value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(token)) if !token.is_empty() => Some(token),
        Some(Value::String(_)) | None => None,
        Some(other) => {
            warn!(key, kind = json_kind(&other), "ignoring non-string token value");
            None
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Pin<Box<dyn Future<Output = StoredTokens> + Send + '_>> {
        Box::pin(async move {
            let mut values = self
                .storage
                .get_items(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY])
                .await
                .into_iter();
            let access = values.next().flatten();
            let refresh = values.next().flatten();
            StoredTokens {
                access_token: as_token(ACCESS_TOKEN_KEY, access),
                refresh_token: as_token(REFRESH_TOKEN_KEY, refresh),
            }
        })
    }

    fn set<'a>(
        &'a self,
        access_token: &'a str,
        refresh_token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.storage
                .set_items(vec![
                    (ACCESS_TOKEN_KEY.to_string(), Value::from(access_token)),
                    (REFRESH_TOKEN_KEY.to_string(), Value::from(refresh_token)),
                ])
                .await?;
            debug!("stored token pair");
            Ok(())
        })
    }

    fn clear(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            if let Err(e) = self
                .storage
                .remove_items(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY])
                .await
            {
                warn!(error = %e, "failed to persist token removal");
            } else {
                debug!("cleared tokens");
            }
        })
    }
}

/// Token store kept only in memory.
#[derive(Default)]
pub struct MemoryTokenStore {
    state: Mutex<StoredTokens>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a session.
    pub fn with_tokens(access_token: &str, refresh_token: &str) -> Self {
        Self {
            state: Mutex::new(StoredTokens::new(access_token, refresh_token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Pin<Box<dyn Future<Output = StoredTokens> + Send + '_>> {
        Box::pin(async move { self.state.lock().await.clone() })
    }

    fn set<'a>(
        &'a self,
        access_token: &'a str,
        refresh_token: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            *self.state.lock().await = StoredTokens::new(access_token, refresh_token);
            Ok(())
        })
    }

    fn clear(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            *self.state.lock().await = StoredTokens::default();
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn file_store(dir: &tempfile::TempDir) -> FileTokenStore {
        let storage = LocalStorage::open(dir.path().join("storage.json"))
            .await
            .unwrap();
        FileTokenStore::new(Arc::new(storage))
    }

    #[tokio::test]
    async fn set_then_get_returns_identical_pair() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir).await;

        store.set("at_1", "rt_1").await.unwrap();
        assert_eq!(store.get().await, StoredTokens::new("at_1", "rt_1"));
    }

    #[tokio::test]
    async fn clear_then_get_returns_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = file_store(&dir).await;

        store.set("at_1", "rt_1").await.unwrap();
        store.clear().await;
        let tokens = store.get().await;
        assert_eq!(tokens.access_token, None);
        assert_eq!(tokens.refresh_token, None);
    }

    #[tokio::test]
    async fn tokens_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        file_store(&dir).await.set("at_2", "rt_2").await.unwrap();

        let reopened = file_store(&dir).await;
        assert_eq!(reopened.get().await, StoredTokens::new("at_2", "rt_2"));
    }

    #[tokio::test]
    async fn clear_swallows_storage_failures() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("gone");
        let storage = LocalStorage::open(sub.join("storage.json")).await.unwrap();
        let store = FileTokenStore::new(Arc::new(storage));
        store.set("at", "rt").await.unwrap();

        // Removing the directory makes every further write fail
        std::fs::remove_dir_all(&sub).unwrap();

        store.clear().await;
        assert_eq!(store.get().await, StoredTokens::default());
    }

    #[tokio::test]
    async fn failed_set_keeps_the_previous_pair() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("gone");
        let storage = LocalStorage::open(sub.join("storage.json")).await.unwrap();
        let store = FileTokenStore::new(Arc::new(storage));
        store.set("at_old", "rt_old").await.unwrap();

        std::fs::remove_dir_all(&sub).unwrap();

        assert!(store.set("at_new", "rt_new").await.is_err());
        assert_eq!(store.get().await, StoredTokens::new("at_old", "rt_old"));
    }

    #[tokio::test]
    async fn non_string_values_read_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(
            LocalStorage::open(dir.path().join("storage.json"))
                .await
                .unwrap(),
        );
        storage
            .set_items(vec![
                (ACCESS_TOKEN_KEY.into(), serde_json::json!(42)),
                (REFRESH_TOKEN_KEY.into(), serde_json::json!("")),
            ])
            .await
            .unwrap();

        let store = FileTokenStore::new(storage);
        assert_eq!(store.get().await, StoredTokens::default());
    }

    #[tokio::test]
    async fn readers_never_observe_mixed_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(file_store(&dir).await);
        store.set("at_0", "rt_0").await.unwrap();

        let mut handles = vec![];
        for i in 1..=10 {
            let writer = store.clone();
            handles.push(tokio::spawn(async move {
                writer
                    .set(&format!("at_{i}"), &format!("rt_{i}"))
                    .await
                    .unwrap();
            }));
            let reader = store.clone();
            handles.push(tokio::spawn(async move {
                let tokens = reader.get().await;
                let access = tokens.access_token.unwrap();
                let refresh = tokens.refresh_token.unwrap();
                assert_eq!(access.trim_start_matches("at_"), refresh.trim_start_matches("rt_"));
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemoryTokenStore::with_tokens("at", "rt");
        assert_eq!(store.get().await, StoredTokens::new("at", "rt"));

        store.set("at_new", "rt_new").await.unwrap();
        assert_eq!(store.get().await.access_token.as_deref(), Some("at_new"));

        store.clear().await;
        store.clear().await;
        assert_eq!(store.get().await, StoredTokens::default());
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let tokens = StoredTokens::new("at_secret", "rt_secret");
        let debug = format!("{tokens:?}");
        assert!(!debug.contains("at_secret"));
        assert!(!debug.contains("rt_secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
