//! Reminder lifecycle: what to suggest, how it is shown, and the controller
//! that ties scheduling, presentation and stats together.

mod controller;
mod presenter;
mod workouts;

pub use controller::ReminderController;
pub use presenter::{
    spoken_prompt, Notification, NotificationAction, Presenter, UserAction,
    REMINDER_NOTIFICATION_ID, REMINDER_TITLE,
};
pub use workouts::{all_workouts, pick_workout, BUILTIN_WORKOUTS};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerState {
    /// Reminders are switched off.
    Disabled,
    /// Waiting for the next alarm.
    Idle,
    /// A reminder is on screen awaiting Done or Snooze.
    Presented,
}
