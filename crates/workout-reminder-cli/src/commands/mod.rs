pub mod config;
pub mod daemon;
pub mod settings;
pub mod stats;
pub mod transfer;
pub mod workout;

use workout_reminder_core::Event;

/// Print an event as pretty JSON on stdout.
pub fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}
