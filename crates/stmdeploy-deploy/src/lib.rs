//! Build, locate and flash in one pipeline
//!
//! [`Deployer`] owns one builder and one programmer and runs them strictly
//! in sequence. The first failing step ends the run; later steps never
//! start.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod state;
mod status;
mod step;

pub use state::{DeployError, DeployState};
pub use status::{DeploymentStatus, DeviceState};
pub use step::{BuildStep, FlashStep};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use stmdeploy_build::{BuildConfig, BuildReport, Builder};
use stmdeploy_core::{CommandRunner, Error, ProgrammingConfig};
use stmdeploy_flash::{FlashReport, Programmer};

/// What a deployment should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeployOptions {
    /// Run the build step first
    pub build: bool,
    /// Clean before building
    pub clean: bool,
    /// Configuration to build and look up
    pub config: BuildConfig,
    /// Ask the programmer to verify
    pub verify: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            build: true,
            clean: false,
            config: BuildConfig::Debug,
            verify: true,
        }
    }
}

/// Outcome of a successful deployment
#[derive(Debug, Clone)]
pub struct DeploymentReport {
    /// Final state, always [`DeployState::Done`]
    pub state: DeployState,
    /// Build outcome, if a build ran
    pub build: Option<BuildReport>,
    /// Image that was flashed
    pub binary: PathBuf,
    /// Flash outcome
    pub flash: FlashReport,
}

/// Result type for deployments
pub type DeployResult<T> = std::result::Result<T, DeployError>;

/// Build-and-flash pipeline
pub struct Deployer<B = Builder, P = Programmer> {
    builder: B,
    programmer: P,
    state: DeployState,
}

impl Deployer {
    /// Deployer for the project at `project_root` with tools found on this host
    pub fn for_project(
        project_root: &Path,
        config: ProgrammingConfig,
        ide_override: Option<&Path>,
        runner: Arc<dyn CommandRunner>,
    ) -> stmdeploy_core::Result<Self> {
        let builder = Builder::with_ide_override(project_root, ide_override, runner.clone())?;
        let programmer = Programmer::new(config, runner);
        Ok(Self::new(builder, programmer))
    }
}

impl<B: BuildStep, P: FlashStep> Deployer<B, P> {
    /// Compose a builder and a programmer
    pub fn new(builder: B, programmer: P) -> Self {
        Self {
            builder,
            programmer,
            state: DeployState::Idle,
        }
    }

    /// Builder used by this deployer
    pub fn builder(&self) -> &B {
        &self.builder
    }

    /// Programmer used by this deployer
    pub fn programmer(&self) -> &P {
        &self.programmer
    }

    /// State the last run ended in
    pub fn state(&self) -> DeployState {
        self.state
    }

    /// Optionally build, then locate the image and flash it
    pub fn deploy(&mut self, options: DeployOptions) -> DeployResult<DeploymentReport> {
        self.state = DeployState::Idle;

        let build = if options.build {
            self.enter(DeployState::Building);
            let report = self
                .builder
                .build(options.clean, options.config)
                .map_err(|e| self.fail(e))?;
            Some(report)
        } else {
            None
        };

        self.enter(DeployState::Locating);
        let binary = match self.builder.binary_path(options.config) {
            Some(path) => path,
            None => {
                let dir = self.builder.output_dir(options.config);
                return Err(self.fail(Error::BinaryNotFound(dir)));
            }
        };

        self.flash_binary(build, binary, options.verify)
    }

    /// Flash without building
    ///
    /// Without an explicit `binary` the image of the default configuration
    /// is used.
    pub fn flash_only(
        &mut self,
        binary: Option<&Path>,
        verify: bool,
    ) -> DeployResult<DeploymentReport> {
        self.state = DeployState::Idle;

        self.enter(DeployState::Locating);
        let binary = match binary {
            Some(path) if path.is_file() => path.to_path_buf(),
            Some(path) => return Err(self.fail(Error::BinaryNotFound(path.to_path_buf()))),
            None => {
                let config = BuildConfig::default();
                match self.builder.binary_path(config) {
                    Some(path) => path,
                    None => {
                        let dir = self.builder.output_dir(config);
                        return Err(self.fail(Error::BinaryNotFound(dir)));
                    }
                }
            }
        };

        self.flash_binary(None, binary, verify)
    }

    /// Clean, build and flash `config`
    pub fn rebuild_and_deploy(
        &mut self,
        config: BuildConfig,
        verify: bool,
    ) -> DeployResult<DeploymentReport> {
        self.deploy(DeployOptions {
            build: true,
            clean: true,
            config,
            verify,
        })
    }

    /// Project, device and programmer at a glance
    pub fn status(&self) -> DeploymentStatus {
        DeploymentStatus {
            build: self.builder.build_info(),
            device: self.programmer.device_info().into(),
            programmer: self.programmer.summary(),
        }
    }

    fn flash_binary(
        &mut self,
        build: Option<BuildReport>,
        binary: PathBuf,
        verify: bool,
    ) -> DeployResult<DeploymentReport> {
        self.enter(DeployState::Flashing);
        let flash = self
            .programmer
            .flash(&binary, verify)
            .map_err(|e| self.fail(e))?;

        self.enter(DeployState::Done);
        log::info!("Deployment completed successfully");
        Ok(DeploymentReport {
            state: self.state,
            build,
            binary,
            flash,
        })
    }

    fn enter(&mut self, next: DeployState) {
        log::debug!("Deploy: {} -> {}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, source: Error) -> DeployError {
        let state = self.state.failed();
        log::error!("Deployment failed while {}: {}", self.state, source);
        self.state = state;
        DeployError { state, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs;

    use stmdeploy_build::{BuildInfo, BuildSystem, BuildTools};
    use stmdeploy_core::dummy::RecordingRunner;
    use stmdeploy_core::{ToolHandle, ToolSource};
    use stmdeploy_flash::{Backend, DeviceInfo, ProgrammerSummary, ProgrammerTool, DEVICE_CONNECTED};

    struct FakeBuilder {
        fail: bool,
        binary: Option<PathBuf>,
        builds: Cell<usize>,
        cleans: Cell<usize>,
    }

    impl FakeBuilder {
        fn new(fail: bool, binary: Option<PathBuf>) -> Self {
            Self {
                fail,
                binary,
                builds: Cell::new(0),
                cleans: Cell::new(0),
            }
        }
    }

    impl BuildStep for FakeBuilder {
        fn build(&self, clean: bool, config: BuildConfig) -> stmdeploy_core::Result<BuildReport> {
            self.builds.set(self.builds.get() + 1);
            if clean {
                self.cleans.set(self.cleans.get() + 1);
            }
            if self.fail {
                return Err(Error::CompileFailed {
                    stdout: String::new(),
                    stderr: "main.c:3: error: expected ';'".to_string(),
                });
            }
            Ok(BuildReport {
                system: BuildSystem::Make,
                config,
                stdout: String::new(),
            })
        }

        fn binary_path(&self, _config: BuildConfig) -> Option<PathBuf> {
            self.binary.clone()
        }

        fn output_dir(&self, config: BuildConfig) -> PathBuf {
            PathBuf::from("/work/proj").join(config.as_str())
        }

        fn build_info(&self) -> BuildInfo {
            BuildInfo {
                project_name: "proj".to_string(),
                project_root: PathBuf::from("/work/proj"),
                build_dir: PathBuf::from("/work/proj/Debug"),
                binary: None,
            }
        }
    }

    #[derive(Default)]
    struct FakeProgrammer {
        fail: bool,
        connected: bool,
        flashes: Cell<usize>,
        verified: Cell<Option<bool>>,
    }

    impl FlashStep for FakeProgrammer {
        fn flash(&self, binary: &Path, verify: bool) -> stmdeploy_core::Result<FlashReport> {
            self.flashes.set(self.flashes.get() + 1);
            self.verified.set(Some(verify));
            if self.fail {
                return Err(Error::DeviceCommunicationFailed {
                    operation: "flash",
                    stderr: "Error: No STM32 target found!".to_string(),
                });
            }
            Ok(FlashReport {
                binary: binary.to_path_buf(),
                size: 1024,
                address: 0x0800_0000,
                verified: verify,
                backend: Backend::CubeProgrammer,
                stdout: String::new(),
            })
        }

        fn device_info(&self) -> Option<DeviceInfo> {
            self.connected.then(|| DeviceInfo {
                status: DEVICE_CONNECTED,
                output: "Device ID : 0x410".to_string(),
            })
        }

        fn summary(&self) -> ProgrammerSummary {
            ProgrammerSummary {
                tool: Some(Backend::CubeProgrammer),
                port: "SWD".to_string(),
                chip: "STM32F103C8".to_string(),
            }
        }
    }

    fn bin() -> Option<PathBuf> {
        Some(PathBuf::from("/work/proj/Debug/proj.bin"))
    }

    #[test]
    fn test_failed_build_never_flashes() {
        let mut deployer = Deployer::new(FakeBuilder::new(true, bin()), FakeProgrammer::default());

        let err = deployer.deploy(DeployOptions::default()).unwrap_err();
        assert_eq!(err.state, DeployState::BuildFailed);
        assert!(matches!(err.source, Error::CompileFailed { .. }));
        assert_eq!(deployer.state(), DeployState::BuildFailed);
        assert_eq!(deployer.programmer().flashes.get(), 0);
    }

    #[test]
    fn test_missing_binary_never_flashes() {
        let mut deployer = Deployer::new(FakeBuilder::new(false, None), FakeProgrammer::default());

        let err = deployer.deploy(DeployOptions::default()).unwrap_err();
        assert_eq!(err.state, DeployState::BinaryMissing);
        match err.source {
            Error::BinaryNotFound(dir) => assert_eq!(dir, PathBuf::from("/work/proj/Debug")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(deployer.programmer().flashes.get(), 0);
    }

    #[test]
    fn test_flash_failure() {
        let programmer = FakeProgrammer {
            fail: true,
            ..Default::default()
        };
        let mut deployer = Deployer::new(FakeBuilder::new(false, bin()), programmer);

        let err = deployer.deploy(DeployOptions::default()).unwrap_err();
        assert_eq!(err.state, DeployState::FlashFailed);
        assert!(err.source.to_string().contains("No STM32 target found"));
        assert_eq!(deployer.builder().builds.get(), 1);
    }

    #[test]
    fn test_successful_deploy() {
        let mut deployer = Deployer::new(FakeBuilder::new(false, bin()), FakeProgrammer::default());

        let report = deployer
            .deploy(DeployOptions {
                verify: false,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(report.state, DeployState::Done);
        assert_eq!(report.binary, PathBuf::from("/work/proj/Debug/proj.bin"));
        assert!(report.build.is_some());
        assert!(!report.flash.verified);
        assert_eq!(deployer.state(), DeployState::Done);
        assert_eq!(deployer.programmer().verified.get(), Some(false));
    }

    #[test]
    fn test_deploy_without_build() {
        let mut deployer = Deployer::new(FakeBuilder::new(true, bin()), FakeProgrammer::default());

        let report = deployer
            .deploy(DeployOptions {
                build: false,
                ..Default::default()
            })
            .unwrap();
        assert!(report.build.is_none());
        assert_eq!(deployer.builder().builds.get(), 0);
        assert_eq!(deployer.programmer().flashes.get(), 1);
    }

    #[test]
    fn test_flash_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut deployer = Deployer::new(FakeBuilder::new(true, None), FakeProgrammer::default());

        let explicit = dir.path().join("other.hex");
        fs::write(&explicit, b":00000001FF\n").unwrap();
        let report = deployer.flash_only(Some(&explicit), true).unwrap();
        assert_eq!(report.binary, explicit);
        assert_eq!(deployer.builder().builds.get(), 0);

        let err = deployer.flash_only(None, true).unwrap_err();
        assert_eq!(err.state, DeployState::BinaryMissing);
        assert_eq!(deployer.programmer().flashes.get(), 1);
    }

    #[test]
    fn test_flash_only_missing_explicit_binary() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.bin");
        let mut deployer = Deployer::new(FakeBuilder::new(false, bin()), FakeProgrammer::default());

        let err = deployer.flash_only(Some(&missing), true).unwrap_err();
        assert_eq!(err.state, DeployState::BinaryMissing);
        assert!(matches!(&err.source, Error::BinaryNotFound(path) if *path == missing));
        assert_eq!(deployer.state(), DeployState::BinaryMissing);
        assert_eq!(deployer.programmer().flashes.get(), 0);
    }

    #[test]
    fn test_each_run_starts_idle() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("fw.bin");
        fs::write(&image, [0u8; 16]).unwrap();
        let mut deployer = Deployer::new(FakeBuilder::new(false, None), FakeProgrammer::default());
        assert_eq!(deployer.state(), DeployState::Idle);

        deployer.deploy(DeployOptions::default()).unwrap_err();
        assert_eq!(deployer.state(), DeployState::BinaryMissing);

        deployer.flash_only(Some(&image), true).unwrap();
        assert_eq!(deployer.state(), DeployState::Done);
    }

    #[test]
    fn test_rebuild_cleans() {
        let mut deployer = Deployer::new(FakeBuilder::new(false, bin()), FakeProgrammer::default());

        deployer.rebuild_and_deploy(BuildConfig::Release, true).unwrap();
        assert_eq!(deployer.builder().cleans.get(), 1);
        assert_eq!(deployer.builder().builds.get(), 1);
    }

    #[test]
    fn test_status() {
        let deployer = Deployer::new(FakeBuilder::new(false, None), FakeProgrammer::default());
        let status = deployer.status();
        assert_eq!(status.device, DeviceState::NotConnected);
        assert_eq!(status.device.to_string(), "not connected");
        assert_eq!(status.build.project_name, "proj");
        assert_eq!(status.programmer.tool, Some(Backend::CubeProgrammer));

        let programmer = FakeProgrammer {
            connected: true,
            ..Default::default()
        };
        let deployer = Deployer::new(FakeBuilder::new(false, None), programmer);
        assert!(matches!(deployer.status().device, DeviceState::Connected(_)));
        assert_eq!(deployer.state(), DeployState::Idle);
    }

    #[test]
    fn test_make_project_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("blinky");
        fs::create_dir_all(root.join("Debug")).unwrap();
        fs::write(root.join("Makefile"), "all:\n").unwrap();

        let runner = Arc::new(RecordingRunner::new());
        let tools = BuildTools {
            ide: None,
            make: Some(ToolHandle::new("make", ToolSource::SearchPath)),
        };
        let builder = Builder::with_tools(&root, tools, runner.clone()).unwrap();
        let root = builder.project_root().to_path_buf();
        let tool = ProgrammerTool {
            backend: Backend::CubeProgrammer,
            handle: ToolHandle::new("STM32_Programmer_CLI", ToolSource::SearchPath),
        };
        let programmer =
            Programmer::with_tool(ProgrammingConfig::default(), Some(tool), runner.clone());
        let mut deployer = Deployer::new(builder, programmer);

        // The recording runner does not produce an image.
        let err = deployer.deploy(DeployOptions::default()).unwrap_err();
        assert_eq!(err.state, DeployState::BinaryMissing);
        assert_eq!(runner.call_count(), 1);
        assert_eq!(runner.invocations()[0].program, PathBuf::from("make"));

        let image = root.join("Debug/blinky.bin");
        fs::write(&image, [0u8; 64]).unwrap();
        runner.clear();

        let report = deployer.deploy(DeployOptions::default()).unwrap();
        assert_eq!(report.binary, image);
        assert_eq!(report.flash.size, 64);
        let calls = runner.invocations();
        assert_eq!(calls.len(), 2);
        let image_arg = image.display().to_string();
        assert!(calls[1].has_args(&["-w", image_arg.as_str(), "0x8000000"]));
    }
}
