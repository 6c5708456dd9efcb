//! Presentation contract.
//!
//! Whatever shows the reminder (a desktop notification, a terminal, a browser
//! toast) implements [`Presenter`]. Button clicks come back to the controller
//! as `(id, action index)` pairs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Fixed identifier of the reminder notification.
pub const REMINDER_NOTIFICATION_ID: &str = "workoutReminder";

pub const REMINDER_TITLE: &str = "Time for a Workout Break!";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    /// Reminder for `workout` with the Done / Remind me later buttons.
    pub fn reminder(workout: &str) -> Self {
        Self {
            title: REMINDER_TITLE.to_string(),
            message: workout.to_string(),
            actions: UserAction::ALL
                .iter()
                .map(|action| NotificationAction {
                    label: action.label().to_string(),
                })
                .collect(),
        }
    }
}

/// Buttons on the reminder, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserAction {
    Done,
    Snooze,
}

impl UserAction {
    pub const ALL: [UserAction; 2] = [UserAction::Done, UserAction::Snooze];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            UserAction::Done => 0,
            UserAction::Snooze => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            UserAction::Done => "✅ Done",
            UserAction::Snooze => "🔁 Remind me later",
        }
    }
}

/// Text spoken alongside the reminder when sound is enabled.
pub fn spoken_prompt(workout: &str) -> String {
    format!("Time to take a workout break!, {workout}")
}

/// Notification surface.
#[async_trait]
pub trait Presenter: Send + Sync {
    /// Show `notification` under `id`, replacing anything already shown there.
    async fn present(&self, id: &str, notification: &Notification) -> Result<()>;

    /// Remove the notification shown under `id`, if any.
    async fn clear(&self, id: &str) -> Result<()>;

    /// Read `text` aloud or play a chime.
    async fn speak(&self, _text: &str) -> Result<()> {
        Ok(()) // default no-op
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_has_done_then_snooze() {
        let n = Notification::reminder("Cat-Cow stretch");
        assert_eq!(n.title, REMINDER_TITLE);
        assert_eq!(n.message, "Cat-Cow stretch");
        let labels: Vec<_> = n.actions.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, vec!["✅ Done", "🔁 Remind me later"]);
    }

    #[test]
    fn action_indexes_roundtrip() {
        for action in UserAction::ALL {
            assert_eq!(UserAction::from_index(action.index()), Some(action));
        }
        assert_eq!(UserAction::from_index(2), None);
    }
}
