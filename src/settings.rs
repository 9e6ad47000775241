//! Persisted user settings
//!
//! Stored as TOML in `<config dir>/stmdeploy/config.toml`. Command-line flags
//! override these values, and these values override built-in defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stmdeploy_core::config::{DEFAULT_BAUDRATE, DEFAULT_CHIP, DEFAULT_PORT};
use stmdeploy_core::ProgrammingConfig;
use thiserror::Error;

/// Settings keys, in display order
pub const KEYS: [&str; 10] = [
    "default_port",
    "default_baudrate",
    "default_chip",
    "cube_programmer_path",
    "openocd_path",
    "cube_ide_path",
    "verify_by_default",
    "auto_reset",
    "build_before_flash",
    "clean_before_build",
];

/// Errors from loading, saving or editing settings
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Settings file could not be read or written
    #[error("{}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Settings file is not valid TOML for these settings
    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Settings could not be encoded
    #[error("failed to encode settings: {0}")]
    Encode(#[from] toml::ser::Error),

    /// No settings key with this name
    #[error("unknown setting '{}' (known: {})", .0, KEYS.join(", "))]
    UnknownKey(String),

    /// Value does not fit the key's type
    #[error("invalid value '{value}' for {key}: expected {expected}")]
    InvalidValue {
        /// Key being set
        key: String,
        /// Rejected value
        value: String,
        /// What would have been accepted
        expected: &'static str,
    },

    /// No per-user configuration directory on this system
    #[error("no configuration directory available, use --settings-file")]
    NoConfigDir,
}

/// User settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub default_port: String,
    pub default_baudrate: u32,
    pub default_chip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cube_programmer_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openocd_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cube_ide_path: Option<PathBuf>,
    pub verify_by_default: bool,
    pub auto_reset: bool,
    pub build_before_flash: bool,
    pub clean_before_build: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_PORT.to_string(),
            default_baudrate: DEFAULT_BAUDRATE,
            default_chip: DEFAULT_CHIP.to_string(),
            cube_programmer_path: None,
            openocd_path: None,
            cube_ide_path: None,
            verify_by_default: true,
            auto_reset: true,
            build_before_flash: true,
            clean_before_build: false,
        }
    }
}

impl Settings {
    /// Per-user settings file, if the platform has a config directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("stmdeploy").join("config.toml"))
    }

    /// Load settings, falling back to defaults on any problem
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Failed to load settings: {}", e);
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Load settings from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        log::debug!("Loaded settings from {}", path.display());
        Ok(toml::from_str(&content)?)
    }

    /// Write settings to `path`, creating its directory
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let io_err = |source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(io_err)
    }

    /// Set `key` from its textual form
    ///
    /// Path keys are cleared by an empty value or `none`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        let invalid = |expected| SettingsError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            expected,
        };
        match key {
            "default_port" => self.default_port = value.to_string(),
            "default_chip" => self.default_chip = value.to_string(),
            "default_baudrate" => {
                self.default_baudrate = value
                    .parse()
                    .map_err(|_| invalid("an unsigned integer"))?
            }
            "cube_programmer_path" => self.cube_programmer_path = parse_path(value),
            "openocd_path" => self.openocd_path = parse_path(value),
            "cube_ide_path" => self.cube_ide_path = parse_path(value),
            "verify_by_default" => {
                self.verify_by_default = parse_bool(value).ok_or_else(|| invalid("a boolean"))?
            }
            "auto_reset" => {
                self.auto_reset = parse_bool(value).ok_or_else(|| invalid("a boolean"))?
            }
            "build_before_flash" => {
                self.build_before_flash = parse_bool(value).ok_or_else(|| invalid("a boolean"))?
            }
            "clean_before_build" => {
                self.clean_before_build = parse_bool(value).ok_or_else(|| invalid("a boolean"))?
            }
            _ => return Err(SettingsError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// All settings as displayable key/value pairs
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let path = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "None".to_string())
        };
        vec![
            (KEYS[0], self.default_port.clone()),
            (KEYS[1], self.default_baudrate.to_string()),
            (KEYS[2], self.default_chip.clone()),
            (KEYS[3], path(&self.cube_programmer_path)),
            (KEYS[4], path(&self.openocd_path)),
            (KEYS[5], path(&self.cube_ide_path)),
            (KEYS[6], self.verify_by_default.to_string()),
            (KEYS[7], self.auto_reset.to_string()),
            (KEYS[8], self.build_before_flash.to_string()),
            (KEYS[9], self.clean_before_build.to_string()),
        ]
    }

    /// Programming configuration seeded from these settings
    pub fn to_config(&self, timeout: Option<Duration>) -> ProgrammingConfig {
        ProgrammingConfig {
            port: self.default_port.clone(),
            baudrate: self.default_baudrate,
            chip: self.default_chip.clone(),
            verify: self.verify_by_default,
            auto_reset: self.auto_reset,
            cube_programmer_path: self.cube_programmer_path.clone(),
            openocd_path: self.openocd_path.clone(),
            timeout,
            ..ProgrammingConfig::default()
        }
    }
}

fn parse_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
