//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use stmdeploy_build::BuildConfig;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "stmdeploy")]
#[command(author, version, about = "Build and flash STM32 firmware", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Settings file to use instead of the per-user one
    #[arg(long, global = true)]
    pub settings_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Target options shared across device commands
///
/// Anything left unset comes from the settings file.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Connection port (SWD, JTAG, or a serial port)
    #[arg(long)]
    pub port: Option<String>,

    /// Target chip, e.g. STM32F103C8
    #[arg(long)]
    pub chip: Option<String>,

    /// Kill the programming tool after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build a project and flash the result
    Deploy {
        /// Project root directory
        project: PathBuf,

        #[command(flatten)]
        target: TargetArgs,

        /// Skip the build step
        #[arg(long)]
        no_build: bool,

        /// Clean before building
        #[arg(long)]
        clean: bool,

        /// Build configuration
        #[arg(long, default_value_t = BuildConfig::Debug)]
        config: BuildConfig,

        /// Skip verification after flashing
        #[arg(long)]
        no_verify: bool,
    },

    /// Flash a firmware image
    Flash {
        /// Image to flash (.bin, .hex, .elf)
        binary: PathBuf,

        #[command(flatten)]
        target: TargetArgs,

        /// Flash start address (hex, e.g., 0x08000000)
        #[arg(long, value_parser = parse_hex_u32)]
        address: Option<u32>,

        /// Skip verification
        #[arg(long)]
        no_verify: bool,
    },

    /// Erase device flash memory
    Erase {
        #[command(flatten)]
        target: TargetArgs,

        /// Erase the whole chip instead of the first sector
        #[arg(long)]
        full: bool,
    },

    /// Read device memory to a file
    Read {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Start address (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0x08000000")]
        address: u32,

        /// Number of bytes to read (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32)]
        size: u32,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Build a project without flashing
    Build {
        /// Project root directory
        project: PathBuf,

        /// Clean before building
        #[arg(long)]
        clean: bool,

        /// Build configuration
        #[arg(long, default_value_t = BuildConfig::Debug)]
        config: BuildConfig,
    },

    /// Remove build artifacts
    Clean {
        /// Project root directory
        project: PathBuf,
    },

    /// Show project, programmer and device status
    Status {
        /// Project root directory (device only when omitted)
        project: Option<PathBuf>,

        #[command(flatten)]
        target: TargetArgs,
    },

    /// Show or change persisted settings
    Settings {
        /// Show current settings
        #[arg(long, conflicts_with_all = ["reset", "set"])]
        show: bool,

        /// Reset to defaults
        #[arg(long, conflicts_with = "set")]
        reset: bool,

        /// Set a configuration value
        #[arg(long, num_args = 2, value_names = ["KEY", "VALUE"])]
        set: Option<Vec<String>>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x08000000"), Ok(0x0800_0000));
        assert_eq!(parse_hex_u32("0X100"), Ok(0x100));
        assert_eq!(parse_hex_u32("4096"), Ok(4096));
        assert!(parse_hex_u32("0xZZ").is_err());
        assert!(parse_hex_u32("ten").is_err());
    }

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_deploy_args() {
        let cli = Cli::try_parse_from([
            "stmdeploy", "deploy", "./blinky", "--config", "release", "--no-verify", "--chip",
            "STM32G474RE",
        ])
        .unwrap();
        match cli.command {
            Commands::Deploy {
                project,
                target,
                config,
                no_verify,
                no_build,
                ..
            } => {
                assert_eq!(project, PathBuf::from("./blinky"));
                assert_eq!(config, BuildConfig::Release);
                assert!(no_verify);
                assert!(!no_build);
                assert_eq!(target.chip.as_deref(), Some("STM32G474RE"));
                assert_eq!(target.port, None);
            }
            _ => panic!("expected deploy"),
        }
    }

    #[test]
    fn test_settings_set_takes_two_values() {
        let cli =
            Cli::try_parse_from(["stmdeploy", "settings", "--set", "default_port", "JTAG"]).unwrap();
        match cli.command {
            Commands::Settings { set, show, reset } => {
                assert_eq!(set, Some(vec!["default_port".to_string(), "JTAG".to_string()]));
                assert!(!show && !reset);
            }
            _ => panic!("expected settings"),
        }
        assert!(Cli::try_parse_from(["stmdeploy", "settings", "--show", "--reset"]).is_err());
    }

    #[test]
    fn test_flash_address() {
        let cli = Cli::try_parse_from(["stmdeploy", "flash", "fw.bin", "--address", "0x08004000"])
            .unwrap();
        match cli.command {
            Commands::Flash { address, .. } => assert_eq!(address, Some(0x0800_4000)),
            _ => panic!("expected flash"),
        }
    }
}
