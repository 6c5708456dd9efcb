//! Reminder controller.
//!
//! ## State Transitions
//!
//! ```text
//! Disabled --enable--> Idle --reminder due--> Presented
//!    ^                  ^  \                    |  |
//!    |                  |   `----disable--------+  | Done / Snooze
//!    `------disable-----+-----------------------'  v
//!                       `--------------------------'
//! ```
//!
//! The controller is owned by one event loop; every handler takes `&mut self`,
//! so stats read-modify-write cycles never interleave within a process.
//! Backend failures are logged and returned; the state is left as it was
//! unless noted otherwise.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;

use super::presenter::{spoken_prompt, Notification, Presenter, UserAction, REMINDER_NOTIFICATION_ID};
use super::workouts::pick_workout;
use super::ControllerState;
use crate::clock::{Clock, SystemClock};
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::scheduler::{AlarmBackend, AlarmFired, ReminderScheduler};
use crate::settings::{IntervalMinutes, Settings, SettingsPatch, SETTINGS_KEYS};
use crate::snapshot::{self, ExportSnapshot};
use crate::stats::{self, Stats, STATS_KEYS};
use crate::storage::{merge_strict, to_map, SettingsStore, StorageBackend, StorageMap};

/// Delay of the "Remind me later" one-shot unless configured otherwise.
pub const DEFAULT_SNOOZE_MINUTES: u32 = 5;
const MAX_SNOOZE_MINUTES: u32 = 480;

pub struct ReminderController<B, A, P> {
    store: SettingsStore<B>,
    scheduler: ReminderScheduler<A>,
    presenter: P,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    state: ControllerState,
    /// Last settings read from storage.
    settings: Settings,
    snooze_minutes: u32,
    /// `(enabled, interval)` the alarm currently reflects.
    applied: Option<(bool, IntervalMinutes)>,
    reschedule_pending: bool,
}

impl<B, A, P> ReminderController<B, A, P>
where
    B: StorageBackend,
    A: AlarmBackend,
    P: Presenter,
{
    /// Controller in `Disabled` state. Call [`init`](Self::init) before use.
    pub fn new(backend: B, alarms: A, presenter: P) -> Self {
        Self {
            store: SettingsStore::new(backend),
            scheduler: ReminderScheduler::new(alarms),
            presenter,
            clock: Arc::new(SystemClock),
            rng: StdRng::from_entropy(),
            state: ControllerState::Disabled,
            settings: Settings::default(),
            snooze_minutes: DEFAULT_SNOOZE_MINUTES,
            applied: None,
            reschedule_pending: false,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Deterministic workout picks.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_snooze_minutes(mut self, minutes: u32) -> Result<Self, ValidationError> {
        if !(1..=MAX_SNOOZE_MINUTES).contains(&minutes) {
            return Err(ValidationError::InvalidValue {
                field: "snooze_minutes".into(),
                message: format!("must be between 1 and {MAX_SNOOZE_MINUTES} (got {minutes})"),
            });
        }
        self.snooze_minutes = minutes;
        Ok(self)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn snooze_minutes(&self) -> u32 {
        self.snooze_minutes
    }

    /// A schedule or cancel failed and has not been retried successfully yet.
    pub fn reschedule_pending(&self) -> bool {
        self.reschedule_pending
    }

    pub fn store(&self) -> &SettingsStore<B> {
        &self.store
    }

    pub fn scheduler(&self) -> &ReminderScheduler<A> {
        &self.scheduler
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            state: self.state,
            enabled: self.settings.enabled,
            interval_minutes: self.settings.interval_minutes.get(),
            reschedule_pending: self.reschedule_pending,
            at: self.clock.now_utc(),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Load settings and re-establish scheduling after a (re)start.
    ///
    /// Never fails: when storage cannot be read the defaults are used for
    /// now and scheduling is left pending for [`reconcile`](Self::reconcile).
    pub async fn init(&mut self) -> Event {
        match self.store.get().await {
            Ok(settings) => {
                self.state = if settings.enabled {
                    ControllerState::Idle
                } else {
                    ControllerState::Disabled
                };
                self.settings = settings;
                self.apply_schedule().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "settings unavailable at startup, using defaults");
                self.settings = Settings::default();
                self.state = ControllerState::Idle;
                self.applied = None;
                self.reschedule_pending = true;
            }
        }
        tracing::info!(
            state = ?self.state,
            interval = self.settings.interval_minutes.get(),
            "reminder controller initialized"
        );
        self.snapshot()
    }

    /// Re-read settings and make scheduling match them.
    ///
    /// Picks up changes made by another writer and retries a pending
    /// schedule. Returns a snapshot when anything was adjusted.
    pub async fn reconcile(&mut self) -> Result<Option<Event>> {
        let settings = self.store.get().await.inspect_err(|e| {
            tracing::warn!(error = %e, "reconcile skipped, settings unavailable");
        })?;
        if self.adopt(settings).await {
            Ok(Some(self.snapshot()))
        } else {
            Ok(None)
        }
    }

    // ── Inbound events ───────────────────────────────────────────────

    /// An alarm fired.
    pub async fn handle_alarm(&mut self, fired: &AlarmFired) -> Result<Option<Event>> {
        let Some(due) = self.scheduler.on_fired(fired) else {
            return Ok(None);
        };
        if due.after_snooze && self.settings.enabled {
            // Snooze was a one-shot; the regular cadence restarts from here.
            self.apply_schedule().await;
        }
        if self.state == ControllerState::Disabled {
            tracing::debug!("reminder due while disabled, ignored");
            return Ok(None);
        }
        self.present_reminder().await
    }

    /// A notification button was clicked.
    pub async fn handle_action(&mut self, id: &str, index: usize) -> Result<Option<Event>> {
        if id != REMINDER_NOTIFICATION_ID {
            return Ok(None);
        }
        match UserAction::from_index(index) {
            Some(UserAction::Done) => self.complete_workout().await.map(Some),
            Some(UserAction::Snooze) => self.snooze().await,
            None => {
                tracing::debug!(index, "unknown notification action");
                Ok(None)
            }
        }
    }

    async fn present_reminder(&mut self) -> Result<Option<Event>> {
        let settings = self.store.get().await.inspect_err(|e| {
            tracing::warn!(error = %e, "reminder skipped, settings unavailable");
        })?;
        self.adopt(settings).await;
        if self.state == ControllerState::Disabled {
            return Ok(None);
        }

        let current = self.store.stats().await.inspect_err(|e| {
            tracing::warn!(error = %e, "reminder skipped, stats unavailable");
        })?;
        let workout = pick_workout(&self.settings.custom_workouts, &mut self.rng);
        self.presenter
            .present(REMINDER_NOTIFICATION_ID, &Notification::reminder(&workout))
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "reminder could not be shown"))?;

        if self.settings.sound_enabled {
            if let Err(e) = self.presenter.speak(&spoken_prompt(&workout)).await {
                tracing::warn!(error = %e, "speaking reminder failed");
            }
        }

        let updated = stats::record_reminder_shown(&current);
        if let Err(e) = self.store.save_stats(&updated).await {
            tracing::warn!(error = %e, "reminder count not saved");
        }

        let superseded = self.state == ControllerState::Presented;
        self.state = ControllerState::Presented;
        tracing::info!(workout = %workout, superseded, "reminder presented");
        Ok(Some(Event::ReminderPresented {
            workout,
            total_reminders: updated.total_reminders,
            superseded,
            at: self.clock.now_utc(),
        }))
    }

    /// "Done". Counted even when no reminder is on screen, so a click that
    /// outlives a restart is not lost.
    async fn complete_workout(&mut self) -> Result<Event> {
        let current = self.store.stats().await?;
        let today = self.clock.today();
        let now = self.clock.now_utc();
        let updated = stats::record_completion(&current, today, now);
        self.store.save_stats(&updated).await.inspect_err(|e| {
            tracing::warn!(error = %e, "completion not saved");
        })?;

        self.dismiss().await;
        if self.state == ControllerState::Presented {
            self.state = ControllerState::Idle;
        }
        tracing::info!(
            streak = updated.streak,
            completed = updated.completed_workouts,
            "workout completed"
        );
        Ok(Event::WorkoutCompleted {
            date: today,
            streak: updated.streak,
            completed_workouts: updated.completed_workouts,
            at: now,
        })
    }

    /// "Remind me later".
    async fn snooze(&mut self) -> Result<Option<Event>> {
        self.dismiss().await;
        if self.state == ControllerState::Disabled {
            tracing::debug!("snooze while disabled, nothing to reschedule");
            return Ok(None);
        }
        self.state = ControllerState::Idle;

        let delay_minutes = self.snooze_minutes;
        if let Err(e) = self.scheduler.snooze(delay_minutes).await {
            self.applied = None;
            self.reschedule_pending = true;
            return Err(e);
        }
        tracing::info!(delay_minutes, "reminder snoozed");
        Ok(Some(Event::ReminderSnoozed {
            delay_minutes,
            at: self.clock.now_utc(),
        }))
    }

    // ── Control requests ─────────────────────────────────────────────

    pub async fn toggle_reminders(&mut self, enabled: bool) -> Result<Event> {
        let patch = SettingsPatch {
            enabled: Some(enabled),
            ..SettingsPatch::default()
        };
        self.write_settings(&patch).await?;

        if enabled {
            if self.state == ControllerState::Disabled {
                self.state = ControllerState::Idle;
            }
        } else {
            if self.state == ControllerState::Presented {
                self.dismiss().await;
            }
            self.state = ControllerState::Disabled;
        }
        self.apply_schedule().await;

        let at = self.clock.now_utc();
        tracing::info!(enabled, "reminders toggled");
        Ok(if enabled {
            Event::RemindersEnabled {
                interval_minutes: self.settings.interval_minutes.get(),
                at,
            }
        } else {
            Event::RemindersDisabled { at }
        })
    }

    /// Validate and persist a new interval; restart the cadence when enabled.
    pub async fn set_interval(&mut self, minutes: u32) -> Result<Event> {
        let interval = IntervalMinutes::new(minutes)?;
        self.write_settings(&SettingsPatch {
            interval_minutes: Some(interval),
            ..SettingsPatch::default()
        })
        .await?;

        let rescheduled = self.settings.enabled && self.apply_schedule().await;
        tracing::info!(interval = minutes, rescheduled, "interval changed");
        Ok(Event::IntervalChanged {
            interval_minutes: minutes,
            rescheduled,
            at: self.clock.now_utc(),
        })
    }

    pub async fn set_sound_enabled(&mut self, enabled: bool) -> Result<Event> {
        self.write_settings(&SettingsPatch {
            sound_enabled: Some(enabled),
            ..SettingsPatch::default()
        })
        .await?;
        Ok(Event::SoundToggled {
            enabled,
            at: self.clock.now_utc(),
        })
    }

    pub async fn add_custom_workout(&mut self, text: &str) -> Result<Event> {
        let settings = self.store.get().await?;
        let workouts = settings.with_custom_workout(text)?;
        let workout = workouts.last().cloned().unwrap_or_default();
        self.write_settings(&SettingsPatch {
            custom_workouts: Some(workouts),
            ..SettingsPatch::default()
        })
        .await?;
        tracing::info!(workout = %workout, "custom workout added");
        Ok(Event::CustomWorkoutAdded {
            workout,
            at: self.clock.now_utc(),
        })
    }

    pub async fn remove_custom_workout(&mut self, index: usize) -> Result<Event> {
        let settings = self.store.get().await?;
        let (workouts, workout) = settings.without_custom_workout(index)?;
        self.write_settings(&SettingsPatch {
            custom_workouts: Some(workouts),
            ..SettingsPatch::default()
        })
        .await?;
        tracing::info!(index, workout = %workout, "custom workout removed");
        Ok(Event::CustomWorkoutRemoved {
            index,
            workout,
            at: self.clock.now_utc(),
        })
    }

    pub async fn reset_stats(&mut self) -> Result<Event> {
        self.store.save_stats(&stats::reset()).await?;
        tracing::info!("stats reset");
        Ok(Event::StatsReset {
            at: self.clock.now_utc(),
        })
    }

    pub async fn export_data(&self) -> Result<ExportSnapshot> {
        let data = self.store.dump().await?;
        Ok(ExportSnapshot::new(data, self.clock.now_utc()))
    }

    /// Import a previously exported snapshot.
    ///
    /// Returns `Ok(false)`, without writing anything, when the envelope is
    /// not version 1.0 or a known key holds a value of the wrong shape.
    /// Custom workouts must pass the same checks as [`Self::add_custom_workout`]
    /// or the import is rejected. Unknown keys are ignored. Only keys present
    /// in the snapshot are written, normalized (interval clamped, ISO dates,
    /// workouts trimmed).
    pub async fn import_data(&mut self, raw: &Value) -> Result<bool> {
        let Some(data) = snapshot::accepted_data(raw) else {
            tracing::warn!("import rejected: unsupported version or missing data");
            return Ok(false);
        };
        let settings_part = pick_keys(data, &SETTINGS_KEYS);
        let stats_part = pick_keys(data, &STATS_KEYS);

        let decoded = merge_strict(&Settings::default(), &settings_part)
            .and_then(|s| merge_strict(&Stats::default(), &stats_part).map(|t| (s, t)));
        let (mut settings, stats) = match decoded {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "import rejected: data does not decode");
                return Ok(false);
            }
        };
        match Settings::checked_custom_workouts(&settings.custom_workouts) {
            Ok(workouts) => settings.custom_workouts = workouts,
            Err(e) => {
                tracing::warn!(error = %e, "import rejected: invalid custom workouts");
                return Ok(false);
            }
        }

        let mut normalized = to_map(&settings)?
            .into_iter()
            .filter(|(key, _)| settings_part.contains_key(key))
            .collect::<StorageMap>();
        normalized.extend(
            to_map(&stats)?
                .into_iter()
                .filter(|(key, _)| stats_part.contains_key(key)),
        );
        if normalized.is_empty() {
            tracing::info!("import contained no known keys");
            return Ok(true);
        }

        let keys: Vec<String> = normalized.keys().cloned().collect();
        self.store.write_raw(normalized).await?;
        tracing::info!(?keys, "data imported");

        if let Err(e) = self.reconcile().await {
            tracing::warn!(error = %e, "scheduling not reconciled after import");
        }
        Ok(true)
    }

    // ── Internals ────────────────────────────────────────────────────

    /// Persist `patch` over freshly read settings and cache the result.
    async fn write_settings(&mut self, patch: &SettingsPatch) -> Result<()> {
        let mut settings = self.store.get().await?;
        self.store.set(patch).await?;
        patch.apply_to(&mut settings);
        self.settings = settings;
        Ok(())
    }

    /// Take over `settings`; adjust state and scheduling where they differ.
    /// Returns whether anything changed.
    async fn adopt(&mut self, settings: Settings) -> bool {
        let in_sync = match self.applied {
            Some((enabled, interval)) => {
                enabled == settings.enabled && (!enabled || interval == settings.interval_minutes)
            }
            None => false,
        };
        self.settings = settings;

        let mut changed = false;
        if self.settings.enabled && self.state == ControllerState::Disabled {
            self.state = ControllerState::Idle;
            changed = true;
        }
        if !self.settings.enabled && self.state != ControllerState::Disabled {
            if self.state == ControllerState::Presented {
                self.dismiss().await;
            }
            self.state = ControllerState::Disabled;
            changed = true;
        }
        if !in_sync || self.reschedule_pending {
            self.apply_schedule().await;
            changed = true;
        }
        if changed {
            tracing::debug!(state = ?self.state, "reconciled with stored settings");
        }
        changed
    }

    /// Start or stop the alarm per the cached settings.
    async fn apply_schedule(&mut self) -> bool {
        let enabled = self.settings.enabled;
        let interval = self.settings.interval_minutes;
        let result = if enabled {
            self.scheduler.start(interval).await
        } else {
            self.scheduler.stop().await
        };
        match result {
            Ok(()) => {
                self.applied = Some((enabled, interval));
                self.reschedule_pending = false;
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "reminder schedule not applied, will retry");
                self.applied = None;
                self.reschedule_pending = true;
                false
            }
        }
    }

    async fn dismiss(&self) {
        if let Err(e) = self.presenter.clear(REMINDER_NOTIFICATION_ID).await {
            tracing::warn!(error = %e, "clearing reminder failed");
        }
    }
}

fn pick_keys(data: &StorageMap, keys: &[&str]) -> StorageMap {
    data.iter()
        .filter(|(key, _)| keys.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
