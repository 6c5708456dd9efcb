use workout_reminder_core::AppConfig;

use super::print_event;
use crate::host::open_controller;

pub async fn toggle(config: &AppConfig, enabled: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = open_controller(config).await?;
    print_event(&controller.toggle_reminders(enabled).await?)
}

pub async fn interval(config: &AppConfig, minutes: u32) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = open_controller(config).await?;
    print_event(&controller.set_interval(minutes).await?)
}

pub async fn sound(config: &AppConfig, enabled: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut controller = open_controller(config).await?;
    print_event(&controller.set_sound_enabled(enabled).await?)
}
