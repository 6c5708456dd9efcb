//! In-process storage backend.
//!
//! Used by tests and as the fallback when no database can be opened. It can
//! be switched offline to simulate an unreachable store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use super::{diff_changes, StorageBackend, StorageChange, StorageMap, CHANGE_CHANNEL_CAPACITY};
use crate::error::{CoreError, Result};

/// Cloneable handle to a shared in-memory map.
#[derive(Clone)]
pub struct MemoryStorage {
    inner: Arc<Inner>,
}

struct Inner {
    values: Mutex<HashMap<String, Value>>,
    offline: AtomicBool,
    writes: AtomicUsize,
    changes: broadcast::Sender<StorageChange>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                values: Mutex::new(HashMap::new()),
                offline: AtomicBool::new(false),
                writes: AtomicUsize::new(0),
                changes,
            }),
        }
    }

    /// Pre-populated store.
    pub fn with_values(values: StorageMap) -> Self {
        let storage = Self::new();
        if let Ok(mut map) = storage.inner.values.lock() {
            map.extend(values);
        }
        storage
    }

    /// While offline every read and write fails with `StorageUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of successful `write` calls so far.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// Copy of everything stored.
    pub fn dump(&self) -> StorageMap {
        match self.inner.values.lock() {
            Ok(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Err(_) => StorageMap::new(),
        }
    }

    fn check_online(&self) -> Result<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            Err(CoreError::StorageUnavailable("memory store is offline".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn read(&self, keys: &[&str]) -> Result<StorageMap> {
        self.check_online()?;
        let map = self
            .inner
            .values
            .lock()
            .map_err(|_| CoreError::StorageUnavailable("memory store poisoned".into()))?;
        Ok(keys
            .iter()
            .filter_map(|key| map.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn write(&self, values: StorageMap) -> Result<()> {
        self.check_online()?;
        let changes = {
            let mut map = self
                .inner
                .values
                .lock()
                .map_err(|_| CoreError::StorageUnavailable("memory store poisoned".into()))?;
            let previous: StorageMap = values
                .keys()
                .filter_map(|key| map.get(key).map(|v| (key.clone(), v.clone())))
                .collect();
            let changes = diff_changes(&previous, &values);
            map.extend(values);
            changes
        };
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        for change in changes {
            // No subscribers is fine.
            let _ = self.inner.changes.send(change);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.inner.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> StorageMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[tokio::test]
    async fn read_returns_only_present_keys() {
        let storage = MemoryStorage::with_values(map(&[("enabled", json!(false))]));
        let values = storage.read(&["enabled", "interval"]).await.unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values["enabled"], json!(false));
    }

    #[tokio::test]
    async fn write_preserves_other_keys_and_notifies() {
        let storage = MemoryStorage::with_values(map(&[
            ("enabled", json!(true)),
            ("interval", json!(60)),
        ]));
        let mut changes = storage.subscribe();

        storage.write(map(&[("interval", json!(15))])).await.unwrap();

        let all = storage.dump();
        assert_eq!(all["enabled"], json!(true));
        assert_eq!(all["interval"], json!(15));

        let change = changes.recv().await.unwrap();
        assert_eq!(change.key, "interval");
        assert_eq!(change.old_value, Some(json!(60)));
        assert_eq!(change.new_value, Some(json!(15)));
    }

    #[tokio::test]
    async fn offline_store_fails_without_side_effects() {
        let storage = MemoryStorage::new();
        storage.set_offline(true);
        assert!(matches!(
            storage.read(&["enabled"]).await,
            Err(CoreError::StorageUnavailable(_))
        ));
        assert!(storage.write(map(&[("enabled", json!(false))])).await.is_err());
        assert_eq!(storage.write_count(), 0);

        storage.set_offline(false);
        assert!(storage.dump().is_empty());
    }
}
