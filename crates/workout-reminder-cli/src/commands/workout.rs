use clap::Subcommand;
use workout_reminder_core::reminder::BUILTIN_WORKOUTS;
use workout_reminder_core::AppConfig;

use super::print_event;
use crate::host::open_controller;

#[derive(Subcommand)]
pub enum WorkoutAction {
    /// Add a custom workout suggestion
    Add {
        /// Suggestion text (1-100 characters)
        text: String,
    },
    /// Remove a custom workout by its index (see `workout list`)
    Remove { index: usize },
    /// List built-in and custom suggestions
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn run(config: &AppConfig, action: WorkoutAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = open_controller(config).await?;

    match action {
        WorkoutAction::Add { text } => {
            print_event(&controller.add_custom_workout(&text).await?)?;
        }
        WorkoutAction::Remove { index } => {
            print_event(&controller.remove_custom_workout(index).await?)?;
        }
        WorkoutAction::List { json } => {
            let custom = controller.store().get().await?.custom_workouts;
            if json {
                let listing = serde_json::json!({
                    "builtin": BUILTIN_WORKOUTS,
                    "custom": custom,
                });
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                println!("Built-in:");
                for workout in BUILTIN_WORKOUTS {
                    println!("  - {workout}");
                }
                println!("Custom:");
                if custom.is_empty() {
                    println!("  (none)");
                }
                for (index, workout) in custom.iter().enumerate() {
                    println!("  [{index}] {workout}");
                }
            }
        }
    }
    Ok(())
}
