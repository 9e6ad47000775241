//! Programmer backend resolution
//!
//! Backends are tried in [`RESOLUTION_ORDER`]. The first one whose tool can
//! be located becomes the programmer's only backend for its lifetime.

use std::fmt;
use std::path::Path;

use stmdeploy_core::{ProgrammingConfig, ToolHandle, ToolKind, ToolLocator};

/// Device programming backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// STM32CubeProgrammer CLI (primary)
    CubeProgrammer,
    /// OpenOCD (alternate)
    OpenOcd,
}

impl Backend {
    /// Display name
    pub fn name(self) -> &'static str {
        self.tool_kind().display_name()
    }

    /// Tool that implements this backend
    pub fn tool_kind(self) -> ToolKind {
        match self {
            Backend::CubeProgrammer => ToolKind::CubeProgrammer,
            Backend::OpenOcd => ToolKind::OpenOcd,
        }
    }

    fn override_path(self, config: &ProgrammingConfig) -> Option<&Path> {
        match self {
            Backend::CubeProgrammer => config.cube_programmer_path.as_deref(),
            Backend::OpenOcd => config.openocd_path.as_deref(),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Backends in order of preference
pub const RESOLUTION_ORDER: [Backend; 2] = [Backend::CubeProgrammer, Backend::OpenOcd];

/// A located programming tool and the backend it implements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgrammerTool {
    /// Which backend this is
    pub backend: Backend,
    /// Where the tool lives
    pub handle: ToolHandle,
}

/// Resolve the preferred available backend, if any
pub fn resolve(config: &ProgrammingConfig, locator: &ToolLocator<'_>) -> Option<ProgrammerTool> {
    for backend in RESOLUTION_ORDER {
        match locator.locate(backend.tool_kind(), backend.override_path(config)) {
            Ok(handle) => {
                log::info!("Using {}: {}", backend, handle);
                return Some(ProgrammerTool { backend, handle });
            }
            Err(e) => log::debug!("{}", e),
        }
    }
    log::warn!("No programmer found (install STM32CubeProgrammer or OpenOCD)");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use stmdeploy_core::dummy::RecordingRunner;
    use stmdeploy_core::ToolSource;

    #[test]
    fn test_primary_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let cli = dir.path().join("STM32_Programmer_CLI");
        let ocd = dir.path().join("openocd");
        fs::write(&cli, b"").unwrap();
        fs::write(&ocd, b"").unwrap();
        let config = ProgrammingConfig {
            cube_programmer_path: Some(cli.clone()),
            openocd_path: Some(ocd),
            ..Default::default()
        };
        let runner = RecordingRunner::new();

        let tool = resolve(&config, &ToolLocator::new(&runner)).unwrap();
        assert_eq!(tool.backend, Backend::CubeProgrammer);
        assert_eq!(tool.handle.path(), cli);
        assert_eq!(runner.call_count(), 0);
    }

    #[test]
    fn test_alternate_when_primary_missing() {
        let dir = tempfile::tempdir().unwrap();
        let ocd = dir.path().join("openocd");
        fs::write(&ocd, b"").unwrap();
        let config = ProgrammingConfig {
            openocd_path: Some(ocd.clone()),
            ..Default::default()
        };
        let runner = RecordingRunner::new().fail("STM32_Programmer_CLI", 127, "");

        let tool = resolve(
            &config,
            &ToolLocator::new(&runner).with_home(Some(dir.path().to_path_buf())),
        )
        .unwrap();
        assert_eq!(tool.backend, Backend::OpenOcd);
        assert_eq!(tool.handle.source(), ToolSource::Override);
    }

    #[test]
    fn test_nothing_available() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new()
            .fail("STM32_Programmer_CLI", 127, "")
            .fail("openocd", 127, "");

        let locator = ToolLocator::new(&runner).with_home(Some(dir.path().to_path_buf()));
        assert!(resolve(&ProgrammingConfig::default(), &locator).is_none());
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(Backend::CubeProgrammer.to_string(), "STM32CubeProgrammer");
        assert_eq!(Backend::OpenOcd.to_string(), "OpenOCD");
    }
}
