//! Reminder cadence on top of an [`AlarmBackend`].
//!
//! There is exactly one reminder alarm, named [`REMINDER_ALARM`]. It is
//! either stopped, repeating at the configured interval, or waiting on a
//! one-shot snooze. A snooze does not resume the repeating cadence by itself:
//! when the snoozed alarm fires, [`ReminderDue::after_snooze`] tells the
//! caller to call [`ReminderScheduler::start`] again.
//!
//! Only fires from the alarm generation scheduled last count. A repeating
//! fire still queued when a snooze replaced it is dropped.

mod alarms;

pub use alarms::{AlarmBackend, AlarmFired, AlarmSpec, TokioAlarms};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::settings::IntervalMinutes;

/// Name of the single reminder alarm.
pub const REMINDER_ALARM: &str = "workoutReminder";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScheduleMode {
    Stopped,
    Repeating { interval: IntervalMinutes },
    Snoozed { delay_minutes: u32 },
}

/// A reminder should be presented now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderDue {
    /// The fire was the snoozed one-shot; the repeating cadence is not running.
    pub after_snooze: bool,
}

pub struct ReminderScheduler<A> {
    alarms: A,
    mode: ScheduleMode,
    generation: Option<u64>,
}

impl<A: AlarmBackend> ReminderScheduler<A> {
    pub fn new(alarms: A) -> Self {
        Self {
            alarms,
            mode: ScheduleMode::Stopped,
            generation: None,
        }
    }

    pub fn mode(&self) -> ScheduleMode {
        self.mode
    }

    pub fn alarms(&self) -> &A {
        &self.alarms
    }

    /// (Re)start the repeating reminder: first fire after `interval`.
    pub async fn start(&mut self, interval: IntervalMinutes) -> Result<()> {
        self.replace(AlarmSpec::repeating(interval.get())).await?;
        self.mode = ScheduleMode::Repeating { interval };
        tracing::debug!(interval = interval.get(), "reminder cadence started");
        Ok(())
    }

    /// Cancel the reminder. Safe to call when nothing is scheduled.
    pub async fn stop(&mut self) -> Result<()> {
        let had_alarm = self.alarms.cancel(REMINDER_ALARM).await.inspect_err(|e| {
            tracing::warn!(error = %e, "cancelling reminder alarm failed");
        })?;
        self.mode = ScheduleMode::Stopped;
        self.generation = None;
        tracing::debug!(had_alarm, "reminder cadence stopped");
        Ok(())
    }

    /// Replace whatever is scheduled with a single fire after `delay_minutes`.
    pub async fn snooze(&mut self, delay_minutes: u32) -> Result<()> {
        self.replace(AlarmSpec::once(delay_minutes)).await?;
        self.mode = ScheduleMode::Snoozed { delay_minutes };
        tracing::debug!(delay_minutes, "reminder snoozed");
        Ok(())
    }

    /// Translate a fired alarm into a due reminder.
    ///
    /// Alarms with other names, fires from a replaced schedule and stray
    /// fires while stopped are ignored.
    pub fn on_fired(&mut self, fired: &AlarmFired) -> Option<ReminderDue> {
        if fired.name != REMINDER_ALARM {
            return None;
        }
        if self.generation != Some(fired.generation) {
            tracing::debug!(
                generation = fired.generation,
                current = ?self.generation,
                "ignoring stale reminder alarm"
            );
            return None;
        }
        match self.mode {
            ScheduleMode::Stopped => {
                tracing::debug!("ignoring reminder alarm while stopped");
                None
            }
            ScheduleMode::Repeating { .. } => Some(ReminderDue {
                after_snooze: false,
            }),
            ScheduleMode::Snoozed { .. } => {
                // One-shot is spent.
                self.mode = ScheduleMode::Stopped;
                self.generation = None;
                Some(ReminderDue { after_snooze: true })
            }
        }
    }

    async fn replace(&mut self, spec: AlarmSpec) -> Result<()> {
        let result = async {
            self.alarms.cancel(REMINDER_ALARM).await?;
            self.alarms.schedule(REMINDER_ALARM, spec).await
        }
        .await;
        match result {
            Ok(generation) => {
                self.generation = Some(generation);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, ?spec, "scheduling reminder alarm failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{AlarmCall, RecordingAlarms};

    fn interval(m: u32) -> IntervalMinutes {
        IntervalMinutes::new(m).unwrap()
    }

    #[tokio::test]
    async fn start_cancels_then_schedules_repeating() {
        let alarms = RecordingAlarms::new();
        let mut scheduler = ReminderScheduler::new(alarms.clone());
        scheduler.start(interval(45)).await.unwrap();

        assert_eq!(
            alarms.calls(),
            vec![
                AlarmCall::Cancel(REMINDER_ALARM.into()),
                AlarmCall::Schedule(REMINDER_ALARM.into(), AlarmSpec::repeating(45)),
            ]
        );
        assert_eq!(
            scheduler.mode(),
            ScheduleMode::Repeating {
                interval: interval(45)
            }
        );
    }

    #[tokio::test]
    async fn stop_cancels_once_and_silences_fires() {
        let alarms = RecordingAlarms::new();
        let mut scheduler = ReminderScheduler::new(alarms.clone());
        scheduler.start(interval(60)).await.unwrap();
        alarms.clear_calls();

        scheduler.stop().await.unwrap();
        assert_eq!(alarms.calls(), vec![AlarmCall::Cancel(REMINDER_ALARM.into())]);
        assert_eq!(scheduler.on_fired(&alarms.fire(REMINDER_ALARM)), None);

        // Stopping again is a no-op apart from the idempotent cancel.
        scheduler.stop().await.unwrap();
        assert_eq!(scheduler.mode(), ScheduleMode::Stopped);
    }

    #[tokio::test]
    async fn snooze_is_one_shot_and_does_not_resume_cadence() {
        let alarms = RecordingAlarms::new();
        let mut scheduler = ReminderScheduler::new(alarms.clone());
        scheduler.start(interval(60)).await.unwrap();
        alarms.clear_calls();

        scheduler.snooze(5).await.unwrap();
        assert_eq!(
            alarms.calls(),
            vec![
                AlarmCall::Cancel(REMINDER_ALARM.into()),
                AlarmCall::Schedule(REMINDER_ALARM.into(), AlarmSpec::once(5)),
            ]
        );

        assert_eq!(
            scheduler.on_fired(&alarms.fire(REMINDER_ALARM)),
            Some(ReminderDue { after_snooze: true })
        );
        // The one-shot is spent; nothing else fires until `start` runs again.
        assert_eq!(scheduler.mode(), ScheduleMode::Stopped);
        assert_eq!(scheduler.on_fired(&alarms.fire(REMINDER_ALARM)), None);
    }

    #[tokio::test]
    async fn repeating_fire_is_due() {
        let alarms = RecordingAlarms::new();
        let mut scheduler = ReminderScheduler::new(alarms.clone());
        scheduler.start(interval(30)).await.unwrap();
        assert_eq!(
            scheduler.on_fired(&alarms.fire(REMINDER_ALARM)),
            Some(ReminderDue {
                after_snooze: false
            })
        );
        assert_eq!(scheduler.on_fired(&alarms.fire("somethingElse")), None);
    }

    #[tokio::test]
    async fn fire_queued_before_snooze_is_stale() {
        let alarms = RecordingAlarms::new();
        let mut scheduler = ReminderScheduler::new(alarms.clone());
        scheduler.start(interval(60)).await.unwrap();
        let queued = alarms.fire(REMINDER_ALARM);

        scheduler.snooze(5).await.unwrap();
        assert_eq!(scheduler.on_fired(&queued), None);
        assert_eq!(scheduler.mode(), ScheduleMode::Snoozed { delay_minutes: 5 });

        assert_eq!(
            scheduler.on_fired(&alarms.fire(REMINDER_ALARM)),
            Some(ReminderDue { after_snooze: true })
        );
    }

    #[tokio::test]
    async fn failed_schedule_keeps_previous_mode() {
        let alarms = RecordingAlarms::new();
        let mut scheduler = ReminderScheduler::new(alarms.clone());
        alarms.set_failing(true);
        assert!(scheduler.start(interval(30)).await.is_err());
        assert_eq!(scheduler.mode(), ScheduleMode::Stopped);
    }
}
