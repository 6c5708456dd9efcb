use std::path::{Path, PathBuf};

use workout_reminder_core::AppConfig;

use crate::host::open_controller;

pub async fn export(config: &AppConfig, out: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let controller = open_controller(config).await?;
    let snapshot = controller.export_data().await?;
    let json = serde_json::to_string_pretty(&snapshot)?;
    match out {
        Some(path) => {
            std::fs::write(&path, json)?;
            println!("exported to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub async fn import(config: &AppConfig, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(file)?)?;
    let mut controller = open_controller(config).await?;
    if !controller.import_data(&raw).await? {
        return Err(format!(
            "{} is not a version 1.0 export or holds invalid data; nothing was imported",
            file.display()
        )
        .into());
    }
    println!("imported {}", file.display());
    Ok(())
}
