//! CLI command implementations
//!
//! Each command turns parsed arguments plus the loaded settings into calls
//! on the builder, the programmer or the deployer, and prints the outcome.
//! Flags given on the command line win over the settings file.

pub mod deploy;
pub mod device;
pub mod project;
pub mod settings;

use crate::cli::TargetArgs;
use crate::settings::Settings;
use std::time::Duration;
use stmdeploy_core::ProgrammingConfig;

/// Result type shared by all commands
pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Programming configuration from settings with command-line overrides
pub fn programming_config(settings: &Settings, target: &TargetArgs) -> ProgrammingConfig {
    let mut config = settings.to_config(target.timeout.map(Duration::from_secs));
    if let Some(port) = &target.port {
        config.port = port.clone();
    }
    if let Some(chip) = &target.chip {
        config.chip = chip.clone();
    }
    config
}

fn print_rule(title: &str) {
    println!();
    println!("{}", "=".repeat(60));
    println!("  {}", title);
    println!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_settings() {
        let mut settings = Settings::default();
        settings.set("default_port", "JTAG").unwrap();
        settings.set("default_chip", "STM32F407VG").unwrap();

        let config = programming_config(&settings, &TargetArgs::default());
        assert_eq!(config.port, "JTAG");
        assert_eq!(config.chip, "STM32F407VG");
        assert_eq!(config.timeout, None);

        let target = TargetArgs {
            port: Some("SWD".to_string()),
            chip: None,
            timeout: Some(45),
        };
        let config = programming_config(&settings, &target);
        assert_eq!(config.port, "SWD");
        assert_eq!(config.chip, "STM32F407VG");
        assert_eq!(config.timeout, Some(Duration::from_secs(45)));
    }
}
