//! Key-value persistence and application configuration.
//!
//! Everything the reminder engine persists goes through [`StorageBackend`]:
//! a flat map of string keys to JSON values with change notifications, the
//! same shape the browser's synced storage area offers. [`SettingsStore`]
//! layers typed records and defaults on top.

mod config;
pub mod database;
pub mod memory;
mod settings_store;

pub use config::{AppConfig, DaemonConfig, LoggingConfig, ReminderConfig, StorageConfig};
pub use database::SqliteStorage;
pub use memory::MemoryStorage;
pub use settings_store::SettingsStore;
pub(crate) use settings_store::{merge_strict, to_map};

use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::{ConfigError, Result};

/// Flat key-value payload exchanged with a backend.
pub type StorageMap = serde_json::Map<String, Value>;

/// Capacity of each backend's change channel.
pub(crate) const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// One key changed by a write.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// Async key-value store.
///
/// Writes are last-write-wins per key; a backend shared by several writers
/// offers no atomic read-modify-write across them.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Values for the requested keys. Missing keys are absent from the map.
    async fn read(&self, keys: &[&str]) -> Result<StorageMap>;

    /// Persist every entry of `values`, leaving other keys untouched.
    async fn write(&self, values: StorageMap) -> Result<()>;

    /// Stream of changes made through this backend.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

/// Diff a write against the previous values, skipping keys that did not change.
pub(crate) fn diff_changes(
    previous: &StorageMap,
    written: &StorageMap,
) -> Vec<StorageChange> {
    written
        .iter()
        .filter(|(key, value)| previous.get(*key) != Some(*value))
        .map(|(key, value)| StorageChange {
            key: key.clone(),
            old_value: previous.get(key).cloned(),
            new_value: Some(value.clone()),
        })
        .collect()
}

/// Returns `~/.config/workout-reminder[-dev]/` based on WORKOUT_REMINDER_ENV.
///
/// Set WORKOUT_REMINDER_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("WORKOUT_REMINDER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("workout-reminder-dev")
    } else {
        base_dir.join("workout-reminder")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn diff_skips_unchanged_keys() {
        let mut previous = StorageMap::new();
        previous.insert("enabled".into(), json!(true));
        previous.insert("interval".into(), json!(60));

        let mut written = StorageMap::new();
        written.insert("enabled".into(), json!(true));
        written.insert("interval".into(), json!(30));
        written.insert("soundEnabled".into(), json!(false));

        let changes = diff_changes(&previous, &written);
        assert_eq!(changes.len(), 2);
        assert!(changes.contains(&StorageChange {
            key: "interval".into(),
            old_value: Some(json!(60)),
            new_value: Some(json!(30)),
        }));
        assert!(changes.contains(&StorageChange {
            key: "soundEnabled".into(),
            old_value: None,
            new_value: Some(json!(false)),
        }));
    }
}
