//! Terminal implementations of the reminder backends.

use std::io::Write;

use async_trait::async_trait;
use workout_reminder_core::error::{CoreError, Result};
use workout_reminder_core::reminder::{Notification, Presenter, UserAction};
use workout_reminder_core::scheduler::{AlarmBackend, AlarmSpec};
use workout_reminder_core::{AppConfig, ReminderController, SqliteStorage};

/// Prints reminders to stdout; answers come back as lines on stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsolePresenter;

#[async_trait]
impl Presenter for ConsolePresenter {
    async fn present(&self, _id: &str, notification: &Notification) -> Result<()> {
        let buttons: Vec<String> = notification
            .actions
            .iter()
            .enumerate()
            .map(|(i, action)| format!("[{}] {}", i + 1, action.label))
            .collect();
        let mut out = std::io::stdout().lock();
        writeln!(out, "\n{}", notification.title)
            .and_then(|_| writeln!(out, "  {}", notification.message))
            .and_then(|_| writeln!(out, "  {}", buttons.join("   ")))
            .and_then(|_| out.flush())
            .map_err(presentation_failed)
    }

    async fn clear(&self, id: &str) -> Result<()> {
        tracing::debug!(id, "reminder dismissed");
        Ok(())
    }

    async fn speak(&self, text: &str) -> Result<()> {
        // Terminal bell stands in for speech.
        let mut out = std::io::stdout().lock();
        write!(out, "\x07")
            .and_then(|_| out.flush())
            .map_err(presentation_failed)?;
        tracing::debug!(text, "spoken prompt");
        Ok(())
    }
}

/// A terminal that cannot be written to is a presentation problem, not a
/// storage one.
fn presentation_failed(e: std::io::Error) -> CoreError {
    CoreError::PresentationFailed(e.to_string())
}

/// Alarm backend for one-shot commands.
///
/// Only the running daemon owns the reminder alarm; it picks up settings
/// written by other commands on its next poll.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedAlarms;

#[async_trait]
impl AlarmBackend for DetachedAlarms {
    async fn schedule(&self, name: &str, spec: AlarmSpec) -> Result<u64> {
        tracing::debug!(alarm = name, ?spec, "schedule left to the daemon");
        Ok(0)
    }

    async fn cancel(&self, _name: &str) -> Result<bool> {
        Ok(false)
    }
}

pub type Controller<A> = ReminderController<SqliteStorage, A, ConsolePresenter>;

pub fn open_storage(config: &AppConfig) -> Result<SqliteStorage> {
    let path = config.database_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    SqliteStorage::open_at(&path)
}

/// Controller for commands that only read or change stored data.
pub async fn open_controller(config: &AppConfig) -> Result<Controller<DetachedAlarms>> {
    let mut controller = ReminderController::new(open_storage(config)?, DetachedAlarms, ConsolePresenter)
        .with_snooze_minutes(config.reminder.snooze_minutes)?;
    controller.init().await;
    Ok(controller)
}

/// Map a line typed in the daemon to a reminder button.
pub fn parse_answer(line: &str) -> Option<UserAction> {
    match line.trim().to_ascii_lowercase().as_str() {
        "done" | "d" | "1" => Some(UserAction::Done),
        "snooze" | "s" | "later" | "2" => Some(UserAction::Snooze),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers_accept_words_letters_and_numbers() {
        assert_eq!(parse_answer("done"), Some(UserAction::Done));
        assert_eq!(parse_answer(" D \n"), Some(UserAction::Done));
        assert_eq!(parse_answer("1"), Some(UserAction::Done));
        assert_eq!(parse_answer("Snooze"), Some(UserAction::Snooze));
        assert_eq!(parse_answer("2"), Some(UserAction::Snooze));
        assert_eq!(parse_answer("maybe"), None);
        assert_eq!(parse_answer(""), None);
    }

    #[test]
    fn write_failures_are_transient_presentation_errors() {
        let err = presentation_failed(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "stdout closed",
        ));
        assert!(matches!(err, CoreError::PresentationFailed(ref m) if m.contains("stdout closed")));
        assert!(err.is_transient());
    }
}
