//! `workout-reminder run`: the long-lived reminder loop.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use workout_reminder_core::error::Result as CoreResult;
use workout_reminder_core::reminder::REMINDER_NOTIFICATION_ID;
use workout_reminder_core::{AppConfig, Event, ReminderController, TokioAlarms};

use crate::host::{open_storage, parse_answer, ConsolePresenter};

pub async fn run(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let (alarms, mut fired) = TokioAlarms::new();
    let mut controller = ReminderController::new(open_storage(config)?, alarms, ConsolePresenter)
        .with_snooze_minutes(config.reminder.snooze_minutes)?;
    report(Ok(Some(controller.init().await)));

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let mut poll = tokio::time::interval(Duration::from_secs(config.daemon.poll_seconds.max(1)));
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
    poll.tick().await;

    println!(
        "Workout reminders running. Answer with 'done' or 'snooze'; Ctrl-C to quit."
    );

    loop {
        tokio::select! {
            Some(fire) = fired.recv() => {
                report(controller.handle_alarm(&fire).await);
            }
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => match parse_answer(&line) {
                    Some(action) => report(
                        controller
                            .handle_action(REMINDER_NOTIFICATION_ID, action.index())
                            .await,
                    ),
                    None if line.trim().is_empty() => {}
                    None => eprintln!("unrecognized answer '{}': use 'done' or 'snooze'", line.trim()),
                },
                Ok(None) => stdin_open = false,
                Err(e) => {
                    tracing::warn!(error = %e, "stdin closed");
                    stdin_open = false;
                }
            },
            _ = poll.tick() => {
                report(controller.reconcile().await);
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                break;
            }
        }
    }
    Ok(())
}

/// Handler failures are survivable; log and keep running.
fn report(outcome: CoreResult<Option<Event>>) {
    match outcome {
        Ok(Some(event)) => match serde_json::to_string(&event) {
            Ok(json) => tracing::debug!(event = %json, "reminder event"),
            Err(e) => tracing::warn!(error = %e, "event not serializable"),
        },
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, transient = e.is_transient(), "reminder step abandoned"),
    }
}
