//! TOML-based host configuration.
//!
//! Covers how the reminder host runs, not what the user picked in the
//! reminder settings (those live in the key-value store):
//! - Snooze delay
//! - Daemon polling cadence
//! - Log filter
//! - Database location
//!
//! Configuration is stored at `~/.config/workout-reminder/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;

/// Reminder behaviour knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Delay applied by "Remind me later".
    #[serde(default = "default_snooze_minutes")]
    pub snooze_minutes: u32,
}

/// Daemon loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// How often the daemon re-reads settings changed by other processes.
    #[serde(default = "default_poll_seconds")]
    pub poll_seconds: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file; defaults to `workout-reminder.db` in the data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
}

/// Host configuration.
///
/// Serialized to/from TOML at `~/.config/workout-reminder/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub reminder: ReminderConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_snooze_minutes() -> u32 {
    5
}
fn default_poll_seconds() -> u64 {
    30
}
fn default_log_filter() -> String {
    "info".into()
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            snooze_minutes: default_snooze_minutes(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            poll_seconds: default_poll_seconds(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent_path) = parent_path {
            for part in parent_path.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }
        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf);

        let new_value = match existing {
            Some(serde_json::Value::Bool(_)) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
            ),
            Some(serde_json::Value::Number(_)) => value
                .parse::<u64>()
                .map(|n| serde_json::Value::Number(n.into()))
                .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
            Some(_) => serde_json::Value::String(value.into()),
            // Optional fields are skipped when unset.
            None if key == "storage.database" => serde_json::Value::String(value.into()),
            None => return Err(unknown()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    /// Reject values the reminder host cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=480).contains(&self.reminder.snooze_minutes) {
            return Err(ConfigError::InvalidValue {
                key: "reminder.snooze_minutes".into(),
                message: format!(
                    "must be between 1 and 480 (got {})",
                    self.reminder.snooze_minutes
                ),
            });
        }
        if self.daemon.poll_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "daemon.poll_seconds".into(),
                message: "must be greater than 0".into(),
            });
        }
        Ok(())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: AppConfig =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation. `self` is untouched on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: AppConfig =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Database location, resolved against the data directory.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match self.storage.database {
            Some(ref path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("workout-reminder.db")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = AppConfig::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.reminder.snooze_minutes, 5);
        assert_eq!(parsed.daemon.poll_seconds, 30);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: AppConfig = toml::from_str("[reminder]\nsnooze_minutes = 10\n").unwrap();
        assert_eq!(parsed.reminder.snooze_minutes, 10);
        assert_eq!(parsed.logging.filter, "info");
        assert!(parsed.storage.database.is_none());
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.get("reminder.snooze_minutes").as_deref(), Some("5"));
        assert_eq!(cfg.get("logging.filter").as_deref(), Some("info"));
        assert!(cfg.get("reminder.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_nested_number_and_string() {
        let mut cfg = AppConfig::default();
        cfg.set("reminder.snooze_minutes", "10").unwrap();
        cfg.set("logging.filter", "workout_reminder_core=debug").unwrap();
        assert_eq!(cfg.reminder.snooze_minutes, 10);
        assert_eq!(cfg.logging.filter, "workout_reminder_core=debug");
    }

    #[test]
    fn set_accepts_optional_database_path() {
        let mut cfg = AppConfig::default();
        cfg.set("storage.database", "/tmp/reminders.db").unwrap();
        assert_eq!(
            cfg.database_path().unwrap(),
            PathBuf::from("/tmp/reminders.db")
        );
    }

    #[test]
    fn set_rejects_unknown_key_and_bad_type() {
        let mut cfg = AppConfig::default();
        assert!(matches!(
            cfg.set("reminder.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.set("reminder.snooze_minutes", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn set_rejects_out_of_range_snooze() {
        let mut cfg = AppConfig::default();
        assert!(cfg.set("reminder.snooze_minutes", "0").is_err());
        assert!(cfg.set("reminder.snooze_minutes", "481").is_err());
        assert_eq!(cfg.reminder.snooze_minutes, 5);
    }

    #[test]
    fn load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = AppConfig::load_from(&path).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert!(path.exists());

        std::fs::write(&path, "[daemon]\npoll_seconds = 5\n").unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap().daemon.poll_seconds, 5);
    }

    #[test]
    fn load_from_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[daemon]\npoll_seconds = 0\n").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
        std::fs::write(&path, "not = [valid").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
