use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::reminder::ControllerState;

/// Every state change the controller makes produces an Event.
/// Hosts print or forward them; tests assert on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    RemindersEnabled {
        interval_minutes: u32,
        at: DateTime<Utc>,
    },
    RemindersDisabled {
        at: DateTime<Utc>,
    },
    IntervalChanged {
        interval_minutes: u32,
        /// Whether the repeating alarm was rebased.
        rescheduled: bool,
        at: DateTime<Utc>,
    },
    SoundToggled {
        enabled: bool,
        at: DateTime<Utc>,
    },
    ReminderPresented {
        workout: String,
        total_reminders: u64,
        /// A previous reminder was still on screen and got replaced.
        superseded: bool,
        at: DateTime<Utc>,
    },
    WorkoutCompleted {
        date: NaiveDate,
        streak: u32,
        completed_workouts: u64,
        at: DateTime<Utc>,
    },
    ReminderSnoozed {
        delay_minutes: u32,
        at: DateTime<Utc>,
    },
    CustomWorkoutAdded {
        workout: String,
        at: DateTime<Utc>,
    },
    CustomWorkoutRemoved {
        index: usize,
        workout: String,
        at: DateTime<Utc>,
    },
    StatsReset {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: ControllerState,
        enabled: bool,
        interval_minutes: u32,
        /// A failed schedule/cancel is waiting to be retried.
        reschedule_pending: bool,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::ReminderSnoozed {
            delay_minutes: 5,
            at: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ReminderSnoozed");
        assert_eq!(json["delay_minutes"], 5);
    }
}
