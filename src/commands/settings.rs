//! settings command

use super::{print_rule, CommandResult};
use crate::settings::{Settings, SettingsError};
use std::path::Path;

pub fn run_settings(
    path: Option<&Path>,
    show: bool,
    reset: bool,
    set: Option<&[String]>,
) -> CommandResult {
    let path = path.ok_or(SettingsError::NoConfigDir)?;

    if reset {
        Settings::default().save_to(path)?;
        println!("Settings reset to defaults");
        return Ok(());
    }

    if let Some([key, value]) = set {
        let mut settings = Settings::load_from(path)?;
        settings.set(key, value)?;
        settings.save_to(path)?;
        println!("Updated {} = {}", key, value);
        return Ok(());
    }

    if !show {
        log::debug!("No settings action given, showing current settings");
    }
    let settings = Settings::load(Some(path));
    print_rule("STM32 Deployment Settings");
    println!("File: {}", path.display());
    println!();
    for (key, value) in settings.entries() {
        println!("{:22} {}", format!("{}:", key), value);
    }
    println!("{}", "=".repeat(60));
    Ok(())
}
