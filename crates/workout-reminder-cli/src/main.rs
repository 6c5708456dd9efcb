use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use workout_reminder_core::AppConfig;

mod commands;
mod host;

#[derive(Parser)]
#[command(name = "workout-reminder", version, about = "Workout break reminders")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn enabled(self) -> bool {
        matches!(self, Switch::On)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reminder daemon (answer reminders on stdin: done / snooze)
    Run,
    /// Turn reminders on or off
    Toggle {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Set the reminder interval in minutes (5-480)
    Interval { minutes: u32 },
    /// Turn the spoken prompt on or off
    Sound {
        #[arg(value_enum)]
        state: Switch,
    },
    /// Custom workout suggestions
    Workout {
        #[command(subcommand)]
        action: commands::workout::WorkoutAction,
    },
    /// Streaks and completion statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Export settings and stats as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Import a previously exported JSON file
    Import { file: PathBuf },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let loaded = AppConfig::load();
    init_logging(
        loaded
            .as_ref()
            .map(|c| c.logging.filter.as_str())
            .unwrap_or("info"),
    );

    let result = match cli.command {
        // Config commands must work even when the file is broken.
        Commands::Config { action } => commands::config::run(action),
        command => match loaded {
            Ok(config) => dispatch(command, &config).await,
            Err(e) => Err(e.into()),
        },
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn dispatch(command: Commands, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Run => commands::daemon::run(config).await,
        Commands::Toggle { state } => commands::settings::toggle(config, state.enabled()).await,
        Commands::Interval { minutes } => commands::settings::interval(config, minutes).await,
        Commands::Sound { state } => commands::settings::sound(config, state.enabled()).await,
        Commands::Workout { action } => commands::workout::run(config, action).await,
        Commands::Stats { action } => commands::stats::run(config, action).await,
        Commands::Export { out } => commands::transfer::export(config, out).await,
        Commands::Import { file } => commands::transfer::import(config, &file).await,
        Commands::Config { action } => commands::config::run(action),
    }
}
