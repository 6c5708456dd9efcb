//! Typed access to the settings and stats records.
//!
//! Stored values are merged key by key onto the defaults: a key that was
//! never written, or that holds something that no longer decodes, falls back
//! to its default instead of failing the whole record.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;

use super::{StorageBackend, StorageChange, StorageMap};
use crate::error::{CoreError, Result};
use crate::settings::{Settings, SettingsPatch, SETTINGS_KEYS};
use crate::stats::{Stats, STATS_KEYS};

/// Settings and stats accessor over any [`StorageBackend`].
pub struct SettingsStore<B> {
    backend: B,
}

impl<B: StorageBackend> SettingsStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Current settings, defaults filled in.
    pub async fn get(&self) -> Result<Settings> {
        let stored = self.backend.read(&SETTINGS_KEYS).await?;
        Ok(merge_lenient(&Settings::default(), &stored))
    }

    /// Persist the provided fields only.
    pub async fn set(&self, patch: &SettingsPatch) -> Result<()> {
        if patch.is_empty() {
            return Ok(());
        }
        self.backend.write(to_map(patch)?).await
    }

    /// Current stats, defaults filled in.
    pub async fn stats(&self) -> Result<Stats> {
        let stored = self.backend.read(&STATS_KEYS).await?;
        Ok(merge_lenient(&Stats::default(), &stored))
    }

    /// Persist the whole stats record group.
    pub async fn save_stats(&self, stats: &Stats) -> Result<()> {
        self.backend.write(to_map(stats)?).await
    }

    /// Settings and stats flattened into one map, as exported.
    pub async fn dump(&self) -> Result<StorageMap> {
        let mut data = to_map(&self.get().await?)?;
        data.extend(to_map(&self.stats().await?)?);
        Ok(data)
    }

    /// Write an already validated set of record keys in one call.
    pub(crate) async fn write_raw(&self, values: StorageMap) -> Result<()> {
        self.backend.write(values).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.backend.subscribe()
    }
}

/// Serialize a record into a flat storage map.
pub(crate) fn to_map<T: Serialize>(value: &T) -> Result<StorageMap> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(CoreError::Json(<serde_json::Error as serde::ser::Error>::custom(
            format!("expected a record, got {other}"),
        ))),
    }
}

/// Overlay `overrides` onto `base`, all or nothing.
pub(crate) fn merge_strict<T>(base: &T, overrides: &StorageMap) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = to_map(base)?;
    for (key, value) in overrides {
        if merged.contains_key(key) {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(serde_json::from_value(Value::Object(merged))?)
}

/// Overlay `stored` onto `base`, skipping keys that do not decode.
pub(crate) fn merge_lenient<T>(base: &T, stored: &StorageMap) -> T
where
    T: Serialize + DeserializeOwned + Clone,
{
    let mut current = base.clone();
    for (key, value) in stored {
        let mut single = StorageMap::new();
        single.insert(key.clone(), value.clone());
        match merge_strict(&current, &single) {
            Ok(next) => current = next,
            Err(e) => tracing::warn!(key = %key, error = %e, "stored value ignored, using default"),
        }
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::IntervalMinutes;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn stored(pairs: &[(&str, Value)]) -> MemoryStorage {
        MemoryStorage::with_values(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    #[tokio::test]
    async fn first_access_yields_defaults() {
        let store = SettingsStore::new(MemoryStorage::new());
        assert_eq!(store.get().await.unwrap(), Settings::default());
        assert_eq!(store.stats().await.unwrap(), Stats::default());
    }

    #[tokio::test]
    async fn stored_overrides_merge_onto_defaults() {
        let store = SettingsStore::new(stored(&[
            ("enabled", json!(false)),
            ("customWorkouts", json!(["Plank"])),
        ]));
        let settings = store.get().await.unwrap();
        assert!(!settings.enabled);
        assert_eq!(settings.custom_workouts, vec!["Plank"]);
        assert_eq!(settings.interval_minutes, IntervalMinutes::default());
        assert!(settings.sound_enabled);
    }

    #[tokio::test]
    async fn undecodable_key_falls_back_to_default() {
        let store = SettingsStore::new(stored(&[
            ("soundEnabled", json!("loud")),
            ("interval", json!(2000)),
        ]));
        let settings = store.get().await.unwrap();
        assert!(settings.sound_enabled);
        assert_eq!(settings.interval_minutes.get(), IntervalMinutes::MAX);
    }

    #[tokio::test]
    async fn set_writes_only_provided_fields() {
        let backend = stored(&[("customWorkouts", json!(["Plank"]))]);
        let store = SettingsStore::new(backend.clone());
        store
            .set(&SettingsPatch {
                sound_enabled: Some(false),
                ..SettingsPatch::default()
            })
            .await
            .unwrap();

        let dump = backend.dump();
        assert_eq!(dump.len(), 2);
        assert_eq!(dump["soundEnabled"], json!(false));
        assert_eq!(dump["customWorkouts"], json!(["Plank"]));
    }

    #[tokio::test]
    async fn empty_patch_is_not_written() {
        let backend = MemoryStorage::new();
        let store = SettingsStore::new(backend.clone());
        store.set(&SettingsPatch::default()).await.unwrap();
        assert_eq!(backend.write_count(), 0);
    }

    #[tokio::test]
    async fn unavailable_backend_surfaces_error() {
        let backend = MemoryStorage::new();
        backend.set_offline(true);
        let store = SettingsStore::new(backend);
        assert!(matches!(
            store.get().await,
            Err(CoreError::StorageUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn dump_flattens_both_records() {
        let store = SettingsStore::new(MemoryStorage::new());
        let data = store.dump().await.unwrap();
        for key in SETTINGS_KEYS.iter().chain(STATS_KEYS.iter()) {
            assert!(data.contains_key(*key), "missing {key}");
        }
    }

    #[test]
    fn strict_merge_rejects_bad_types() {
        let mut overrides = StorageMap::new();
        overrides.insert("streak".into(), json!("many"));
        assert!(merge_strict(&Stats::default(), &overrides).is_err());
    }
}
