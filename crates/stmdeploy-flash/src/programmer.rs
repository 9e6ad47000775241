//! Programmer: flash, erase, read and query a device through one backend

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use stmdeploy_core::{
    hex, CommandRunner, Error, Invocation, ProgrammingConfig, Result, ToolHandle, ToolLocator,
    ToolOutput,
};

use crate::registry::{self, Backend, ProgrammerTool};
use crate::{cubeprog, openocd};

/// Status marker of a device that answered a query
pub const DEVICE_CONNECTED: &str = "connected";

/// Outcome of a successful flash
#[derive(Debug, Clone)]
pub struct FlashReport {
    /// Image that was written
    pub binary: PathBuf,
    /// Image size in bytes
    pub size: u64,
    /// Address it was written to
    pub address: u32,
    /// Whether the tool was asked to verify
    pub verified: bool,
    /// Backend that did the work
    pub backend: Backend,
    /// Captured standard output of the tool
    pub stdout: String,
}

/// Answer of a device query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Always [`DEVICE_CONNECTED`]
    pub status: &'static str,
    /// Raw tool output, for display
    pub output: String,
}

/// Which programmer is configured for which device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgrammerSummary {
    /// Active backend
    pub tool: Option<Backend>,
    /// Configured port
    pub port: String,
    /// Configured chip
    pub chip: String,
}

impl ProgrammerSummary {
    /// Backend name, or `None` when nothing is installed
    pub fn tool_name(&self) -> &'static str {
        self.tool.map(Backend::name).unwrap_or("None")
    }
}

impl fmt::Display for ProgrammerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (port {}, chip {})", self.tool_name(), self.port, self.chip)
    }
}

/// Device programmer bound to one configuration and one backend
///
/// The backend is chosen when the programmer is created and never
/// re-detected.
pub struct Programmer {
    config: ProgrammingConfig,
    tool: Option<ProgrammerTool>,
    runner: Arc<dyn CommandRunner>,
}

impl Programmer {
    /// Programmer using the best backend installed on this host
    pub fn new(config: ProgrammingConfig, runner: Arc<dyn CommandRunner>) -> Self {
        let tool = registry::resolve(&config, &ToolLocator::new(runner.as_ref()));
        Self::with_tool(config, tool, runner)
    }

    /// Programmer with an explicitly resolved backend
    pub fn with_tool(
        config: ProgrammingConfig,
        tool: Option<ProgrammerTool>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            config,
            tool,
            runner,
        }
    }

    /// Configuration this programmer was created with
    pub fn config(&self) -> &ProgrammingConfig {
        &self.config
    }

    /// Active backend, if any
    pub fn backend(&self) -> Option<Backend> {
        self.tool.as_ref().map(|t| t.backend)
    }

    /// Active tool, if any
    pub fn tool(&self) -> Option<&ProgrammerTool> {
        self.tool.as_ref()
    }

    /// Write `binary` to the device
    ///
    /// `address` and `verify` default to the configuration's values.
    pub fn flash(
        &self,
        binary: &Path,
        address: Option<u32>,
        verify: Option<bool>,
    ) -> Result<FlashReport> {
        let size = match binary.metadata() {
            Ok(meta) if meta.is_file() => meta.len(),
            _ => return Err(Error::BinaryNotFound(binary.to_path_buf())),
        };
        let tool = self.tool.as_ref().ok_or(Error::NoProgrammerAvailable)?;

        let address = address.unwrap_or(self.config.flash_start);
        let verify = verify.unwrap_or(self.config.verify);

        log::info!(
            "Flashing {} ({} bytes) to {} at {}",
            binary.file_name().unwrap_or_default().to_string_lossy(),
            size,
            self.config.chip,
            hex(address)
        );

        let args = match tool.backend {
            Backend::CubeProgrammer => cubeprog::flash_args(
                &self.config.port,
                binary,
                address,
                verify,
                self.config.auto_reset,
            ),
            Backend::OpenOcd => openocd::flash_args(
                &self.config.port,
                &self.config.chip,
                binary,
                address,
                verify,
                self.config.auto_reset,
            ),
        };

        let output = self.run_device("flash", &tool.handle, args)?;
        log::info!("Flashing completed successfully");
        Ok(FlashReport {
            binary: binary.to_path_buf(),
            size,
            address,
            verified: verify,
            backend: tool.backend,
            stdout: output.stdout,
        })
    }

    /// Erase the whole chip (`full`) or its first sector
    pub fn erase(&self, full: bool) -> Result<()> {
        log::info!(
            "Erasing flash memory ({})...",
            if full { "full" } else { "sector 0" }
        );
        let cli = self.cube_programmer("erase")?;
        self.run_device("erase", cli, cubeprog::erase_args(&self.config.port, full))?;
        log::info!("Erase completed");
        Ok(())
    }

    /// Read `size` bytes at `address` into `output`
    pub fn read_memory(&self, address: u32, size: u32, output: &Path) -> Result<()> {
        log::info!("Reading memory from {}, size={} bytes...", hex(address), size);
        let cli = self.cube_programmer("read")?;
        self.run_device(
            "read",
            cli,
            cubeprog::read_args(&self.config.port, output, address, size),
        )?;
        log::info!("Memory read to {}", output.display());
        Ok(())
    }

    /// Query the connected device; `None` on any failure
    pub fn device_info(&self) -> Option<DeviceInfo> {
        let cli = match self.cube_programmer("query") {
            Ok(cli) => cli,
            Err(e) => {
                log::debug!("Device query skipped: {}", e);
                return None;
            }
        };
        match self.run_device("query", cli, cubeprog::query_args(&self.config.port)) {
            Ok(output) => Some(DeviceInfo {
                status: DEVICE_CONNECTED,
                output: output.stdout,
            }),
            Err(e) => {
                log::debug!("Device query failed: {}", e);
                None
            }
        }
    }

    /// Backend, port and chip at a glance
    pub fn summary(&self) -> ProgrammerSummary {
        ProgrammerSummary {
            tool: self.backend(),
            port: self.config.port.clone(),
            chip: self.config.chip.clone(),
        }
    }

    // Erase, read and query exist only on the primary backend.
    fn cube_programmer(&self, operation: &'static str) -> Result<&ToolHandle> {
        match &self.tool {
            Some(ProgrammerTool {
                backend: Backend::CubeProgrammer,
                handle,
            }) => Ok(handle),
            Some(ProgrammerTool { backend, .. }) => Err(Error::UnsupportedOperation {
                operation,
                backend: backend.name(),
            }),
            None => Err(Error::NoProgrammerAvailable),
        }
    }

    fn run_device(
        &self,
        operation: &'static str,
        tool: &ToolHandle,
        args: Vec<String>,
    ) -> Result<ToolOutput> {
        let invocation: Invocation = tool.invocation().args(args).timeout(self.config.timeout);
        let output = self.runner.run(&invocation)?;
        if output.is_success() {
            Ok(output)
        } else {
            log::error!("{} failed (exit code {:?})", operation, output.code);
            Err(Error::DeviceCommunicationFailed {
                operation,
                stderr: output.stderr,
            })
        }
    }
}
