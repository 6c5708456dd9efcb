use chrono::{Local, Utc};
use clap::Subcommand;
use workout_reminder_core::stats::{history_within_days, summarize};
use workout_reminder_core::AppConfig;

use super::print_event;
use crate::host::open_controller;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Streak, totals and today's completions
    Show,
    /// Completions of the last N days
    History {
        #[arg(long, default_value = "7")]
        days: u32,
    },
    /// Zero every counter and clear the history
    Reset,
}

pub async fn run(config: &AppConfig, action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = open_controller(config).await?;

    match action {
        StatsAction::Show => {
            let stats = controller.store().stats().await?;
            let summary = summarize(&stats, Local::now().date_naive());
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        StatsAction::History { days } => {
            let stats = controller.store().stats().await?;
            let history = history_within_days(&stats, days, Utc::now());
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        StatsAction::Reset => {
            print_event(&controller.reset_stats().await?)?;
        }
    }
    Ok(())
}
