//! SQLite-backed key-value storage.
//!
//! Values are JSON documents in a single `kv` table, so the stored shape is
//! identical to what the extension keeps in its synced storage area and to
//! the `data` section of an export.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tokio::sync::broadcast;

use super::{data_dir, diff_changes, StorageBackend, StorageChange, StorageMap, CHANGE_CHANNEL_CAPACITY};
use crate::error::{CoreError, Result};

/// SQLite key-value store.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
    changes: broadcast::Sender<StorageChange>,
}

impl SqliteStorage {
    /// Open the database at `~/.config/workout-reminder/workout-reminder.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("workout-reminder.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            conn: Mutex::new(conn),
            changes,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CoreError::StorageUnavailable("database connection poisoned".into()))
    }

    fn get(conn: &Connection, key: &str) -> Result<Option<Value>> {
        let raw: Option<String> = conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        match raw {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    tracing::warn!(key, error = %e, "ignoring undecodable stored value");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }
}

#[async_trait]
impl StorageBackend for SqliteStorage {
    async fn read(&self, keys: &[&str]) -> Result<StorageMap> {
        let conn = self.lock()?;
        let mut values = StorageMap::new();
        for key in keys {
            if let Some(value) = Self::get(&conn, key)? {
                values.insert(key.to_string(), value);
            }
        }
        Ok(values)
    }

    async fn write(&self, values: StorageMap) -> Result<()> {
        let changes = {
            let mut conn = self.lock()?;
            let tx = conn.transaction()?;
            let mut previous = StorageMap::new();
            for (key, value) in &values {
                if let Some(old) = Self::get(&tx, key)? {
                    previous.insert(key.clone(), old);
                }
                tx.execute(
                    "INSERT INTO kv (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    params![key, serde_json::to_string(value)?],
                )?;
            }
            tx.commit()?;
            diff_changes(&previous, &values)
        };
        for change in changes {
            let _ = self.changes.send(change);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn kv_roundtrip() {
        let db = SqliteStorage::open_memory().unwrap();
        assert!(db.read(&["streak"]).await.unwrap().is_empty());

        let mut values = StorageMap::new();
        values.insert("streak".into(), json!(3));
        values.insert("customWorkouts".into(), json!(["Plank"]));
        db.write(values).await.unwrap();

        let read = db.read(&["streak", "customWorkouts", "missing"]).await.unwrap();
        assert_eq!(read.len(), 2);
        assert_eq!(read["streak"], json!(3));
        assert_eq!(read["customWorkouts"], json!(["Plank"]));
    }

    #[tokio::test]
    async fn overwrite_notifies_with_old_value() {
        let db = SqliteStorage::open_memory().unwrap();
        let mut changes = db.subscribe();

        let mut first = StorageMap::new();
        first.insert("enabled".into(), json!(true));
        db.write(first.clone()).await.unwrap();
        // Same value again: no notification.
        db.write(first).await.unwrap();
        let mut second = StorageMap::new();
        second.insert("enabled".into(), json!(false));
        db.write(second).await.unwrap();

        let created = changes.recv().await.unwrap();
        assert_eq!(created.old_value, None);
        let flipped = changes.recv().await.unwrap();
        assert_eq!(flipped.old_value, Some(json!(true)));
        assert_eq!(flipped.new_value, Some(json!(false)));
        assert!(changes.try_recv().is_err());
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reminder.db");
        {
            let db = SqliteStorage::open_at(&path).unwrap();
            let mut values = StorageMap::new();
            values.insert("interval".into(), json!(25));
            db.write(values).await.unwrap();
        }
        let db = SqliteStorage::open_at(&path).unwrap();
        assert_eq!(db.read(&["interval"]).await.unwrap()["interval"], json!(25));
    }
}
