//! Discovery of installed external tools
//!
//! Each [`ToolKind`] is found through the same ordered chain:
//!
//! 1. an explicitly configured path, if it exists
//! 2. the platform's well-known install locations, in table order
//! 3. the command search `PATH`, by running `<command> --version`
//!
//! The install locations are plain data ([`install_candidates`]) so they can
//! be inspected and extended without touching the control flow. Entries may
//! start with `~/` (home directory) and may contain glob wildcards; for a
//! wildcard entry the first match in the glob crate's sorted traversal
//! order wins, which keeps discovery deterministic.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::process::{CommandRunner, Invocation};

/// External tools the orchestrator knows how to find
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// STM32CubeProgrammer command-line interface (primary programmer)
    CubeProgrammer,
    /// OpenOCD on-chip debugger (alternate programmer)
    OpenOcd,
    /// STM32CubeIDE headless launcher
    CubeIde,
    /// GNU Make
    Make,
}

impl ToolKind {
    /// Human readable product name
    pub fn display_name(self) -> &'static str {
        match self {
            ToolKind::CubeProgrammer => "STM32CubeProgrammer",
            ToolKind::OpenOcd => "OpenOCD",
            ToolKind::CubeIde => "STM32CubeIDE",
            ToolKind::Make => "make",
        }
    }

    /// Command name used for the `PATH` lookup
    pub fn command_name(self) -> &'static str {
        match self {
            ToolKind::CubeProgrammer => "STM32_Programmer_CLI",
            ToolKind::OpenOcd => "openocd",
            ToolKind::CubeIde => "stm32cubeidec",
            ToolKind::Make => "make",
        }
    }

    /// Whether running `--version` from `PATH` is a cheap, harmless check
    ///
    /// The IDE launcher starts a full Eclipse instance, so it is only ever
    /// found through install locations.
    pub fn checks_search_path(self) -> bool {
        !matches!(self, ToolKind::CubeIde)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Host platform family, selects the install location table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Microsoft Windows
    Windows,
    /// Linux, macOS and other Unix-likes
    Posix,
}

impl Platform {
    /// Platform this binary was compiled for
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }
}

/// Well-known STM32CubeProgrammer locations on Windows
pub const CUBE_PROGRAMMER_WINDOWS: &[&str] = &[
    r"C:\Program Files\STMicroelectronics\STM32Cube\STM32CubeProgrammer\bin\STM32_Programmer_CLI.exe",
    r"C:\Program Files (x86)\STMicroelectronics\STM32Cube\STM32CubeProgrammer\bin\STM32_Programmer_CLI.exe",
    r"C:\ST\STM32CubeIDE_*\STM32CubeIDE\plugins\**\STM32_Programmer_CLI.exe",
];

/// Well-known STM32CubeProgrammer locations on Linux and macOS
pub const CUBE_PROGRAMMER_POSIX: &[&str] = &[
    "/usr/local/STMicroelectronics/STM32Cube/STM32CubeProgrammer/bin/STM32_Programmer_CLI",
    "~/STMicroelectronics/STM32Cube/STM32CubeProgrammer/bin/STM32_Programmer_CLI",
];

/// Well-known STM32CubeIDE headless launcher locations on Windows
pub const CUBE_IDE_WINDOWS: &[&str] = &[
    r"C:\ST\STM32CubeIDE_1.11.0\STM32CubeIDE\stm32cubeidec.exe",
    r"C:\ST\STM32CubeIDE_1.12.0\STM32CubeIDE\stm32cubeidec.exe",
    r"C:\ST\STM32CubeIDE_1.13.0\STM32CubeIDE\stm32cubeidec.exe",
    r"C:\ST\STM32CubeIDE_*\STM32CubeIDE\stm32cubeidec.exe",
];

/// Well-known STM32CubeIDE headless launcher locations on Linux and macOS
pub const CUBE_IDE_POSIX: &[&str] = &[
    "/opt/st/stm32cubeide_1.11.0/stm32cubeidec",
    "~/STM32CubeIDE/stm32cubeidec",
    "/opt/st/stm32cubeide_*/stm32cubeidec",
];

/// Ordered install locations for `kind` on `platform`
///
/// OpenOCD and make are expected on `PATH`, so their tables are empty.
pub fn install_candidates(kind: ToolKind, platform: Platform) -> &'static [&'static str] {
    match (kind, platform) {
        (ToolKind::CubeProgrammer, Platform::Windows) => CUBE_PROGRAMMER_WINDOWS,
        (ToolKind::CubeProgrammer, Platform::Posix) => CUBE_PROGRAMMER_POSIX,
        (ToolKind::CubeIde, Platform::Windows) => CUBE_IDE_WINDOWS,
        (ToolKind::CubeIde, Platform::Posix) => CUBE_IDE_POSIX,
        (ToolKind::OpenOcd, _) | (ToolKind::Make, _) => &[],
    }
}

/// Where a tool handle came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSource {
    /// Explicitly configured path
    Override,
    /// One of the well-known install locations
    InstallPath,
    /// Found on the command search `PATH`
    SearchPath,
}

/// A resolved external tool
///
/// For [`ToolSource::SearchPath`] handles the path is the bare command
/// name and the operating system resolves it at spawn time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolHandle {
    path: PathBuf,
    source: ToolSource,
}

impl ToolHandle {
    /// Create a handle
    pub fn new(path: impl Into<PathBuf>, source: ToolSource) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }

    /// Executable path or command name
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// How the tool was found
    pub fn source(&self) -> ToolSource {
        self.source
    }

    /// Start an invocation of this tool
    pub fn invocation(&self) -> Invocation {
        Invocation::new(&self.path)
    }
}

impl fmt::Display for ToolHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Resolves [`ToolKind`]s to [`ToolHandle`]s
///
/// The locator holds no cache. Callers resolve once and keep the handle.
pub struct ToolLocator<'a> {
    runner: &'a dyn CommandRunner,
    platform: Platform,
    home: Option<PathBuf>,
}

impl<'a> ToolLocator<'a> {
    /// Locator for the current platform and user
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            platform: Platform::current(),
            home: dirs::home_dir(),
        }
    }

    /// Use another platform's install table
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Use another directory for `~/` expansion
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    /// Find `kind`, preferring `override_path` when it exists
    pub fn locate(&self, kind: ToolKind, override_path: Option<&Path>) -> Result<ToolHandle> {
        self.locate_in(kind, override_path, install_candidates(kind, self.platform))
    }

    /// Find `kind` using an explicit install location table
    pub fn locate_in(
        &self,
        kind: ToolKind,
        override_path: Option<&Path>,
        candidates: &[&str],
    ) -> Result<ToolHandle> {
        if let Some(path) = override_path {
            if path.exists() {
                log::debug!("Using configured {}: {}", kind, path.display());
                return Ok(ToolHandle::new(path, ToolSource::Override));
            }
            log::warn!(
                "Configured {} path does not exist: {}",
                kind,
                path.display()
            );
        }

        for entry in candidates {
            if let Some(path) = self.existing_candidate(entry) {
                log::debug!("Found {} at {}", kind, path.display());
                return Ok(ToolHandle::new(path, ToolSource::InstallPath));
            }
        }

        if kind.checks_search_path() {
            let version = Invocation::new(kind.command_name()).arg("--version");
            match self.runner.run(&version) {
                Ok(output) if output.is_success() => {
                    log::debug!("Found {} on PATH", kind);
                    return Ok(ToolHandle::new(kind.command_name(), ToolSource::SearchPath));
                }
                Ok(output) => {
                    log::debug!("{} --version exited with {:?}", kind, output.code)
                }
                Err(e) => log::debug!("{} not on PATH: {}", kind, e),
            }
        }

        Err(Error::ToolNotFound(kind))
    }

    fn existing_candidate(&self, entry: &str) -> Option<PathBuf> {
        if is_pattern(entry) {
            let pattern = self.expand_pattern(entry)?;
            first_match(&pattern)
        } else {
            let path = self.expand_path(entry)?;
            path.exists().then_some(path)
        }
    }

    fn expand_path(&self, entry: &str) -> Option<PathBuf> {
        match entry.strip_prefix("~/") {
            Some(rest) => self.home.as_ref().map(|home| home.join(rest)),
            None => Some(PathBuf::from(entry)),
        }
    }

    fn expand_pattern(&self, entry: &str) -> Option<String> {
        match entry.strip_prefix("~/") {
            Some(rest) => self.home.as_ref().map(|home| {
                let home = glob::Pattern::escape(&home.display().to_string());
                format!("{}/{}", home, rest)
            }),
            None => Some(entry.to_string()),
        }
    }
}

fn is_pattern(entry: &str) -> bool {
    entry.contains(['*', '?', '['])
}

/// First regular file matching `pattern`, in sorted traversal order
pub fn first_match(pattern: &str) -> Option<PathBuf> {
    glob::glob(pattern)
        .ok()?
        .filter_map(|entry| entry.ok())
        .find(|path| path.is_file())
}
