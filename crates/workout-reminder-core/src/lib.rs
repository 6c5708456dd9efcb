//! # Workout Reminder Core Library
//!
//! This library provides the core logic for the workout reminder: a periodic
//! nudge to get up and move, a "Done" / "Remind me later" choice, and streak
//! bookkeeping for the completions. Hosts (the `workout-reminder` CLI, a
//! browser extension shell, a desktop tray) only wire up the three backends.
//!
//! ## Architecture
//!
//! - **Storage**: a flat key-value [`StorageBackend`] (SQLite or in-memory)
//!   with [`SettingsStore`] layering typed records and defaults on top
//! - **Stats**: pure streak/completion functions in [`stats`]
//! - **Scheduler**: one named alarm driven through an [`AlarmBackend`]
//! - **Reminder**: the [`ReminderController`] state machine and the
//!   [`Presenter`] contract for showing reminders
//!
//! ## Key Components
//!
//! - [`ReminderController`]: Disabled / Idle / Presented state machine
//! - [`Settings`], [`Stats`]: the two persisted records
//! - [`AppConfig`]: host configuration (`config.toml`)
//! - [`Event`]: what every state change reports

pub mod clock;
pub mod error;
pub mod events;
pub mod reminder;
pub mod scheduler;
pub mod settings;
pub mod snapshot;
pub mod stats;
pub mod storage;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use reminder::{ControllerState, Notification, Presenter, ReminderController, UserAction};
pub use scheduler::{AlarmBackend, AlarmFired, AlarmSpec, ReminderScheduler, TokioAlarms, REMINDER_ALARM};
pub use settings::{IntervalMinutes, Settings, SettingsPatch};
pub use snapshot::ExportSnapshot;
pub use stats::{HistoryEntry, Stats, StatsSummary};
pub use storage::{
    AppConfig, MemoryStorage, SettingsStore, SqliteStorage, StorageBackend, StorageChange,
};
