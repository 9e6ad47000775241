//! Device programming configuration

use std::path::PathBuf;
use std::time::Duration;

/// Default flash base address of STM32 parts
pub const DEFAULT_FLASH_START: u32 = 0x0800_0000;

/// Default connection port
pub const DEFAULT_PORT: &str = "SWD";

/// Default target chip
pub const DEFAULT_CHIP: &str = "STM32F103C8";

/// Default UART baud rate
pub const DEFAULT_BAUDRATE: u32 = 115_200;

/// How to reach and address a device
///
/// Built once per operation and handed to a programmer by value. Callers
/// that want different settings build a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgrammingConfig {
    /// Connection port or transport name (`SWD`, `UART`, `USB1`, ...)
    pub port: String,
    /// Baud rate for serial connections
    pub baudrate: u32,
    /// Target chip identifier, e.g. `STM32F103C8`
    pub chip: String,
    /// Address the firmware image is written to
    pub flash_start: u32,
    /// Verify the image after writing it
    pub verify: bool,
    /// Reset the target once programming is done
    pub auto_reset: bool,
    /// Explicit STM32CubeProgrammer CLI location
    pub cube_programmer_path: Option<PathBuf>,
    /// Explicit OpenOCD location
    pub openocd_path: Option<PathBuf>,
    /// Wall-clock limit for device-facing invocations (`None` waits forever)
    pub timeout: Option<Duration>,
}

impl Default for ProgrammingConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baudrate: DEFAULT_BAUDRATE,
            chip: DEFAULT_CHIP.to_string(),
            flash_start: DEFAULT_FLASH_START,
            verify: true,
            auto_reset: true,
            cube_programmer_path: None,
            openocd_path: None,
            timeout: None,
        }
    }
}
