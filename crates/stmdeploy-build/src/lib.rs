//! Firmware project builds
//!
//! [`Builder`] drives the external build tool for one project directory:
//!
//! - projects with an Eclipse `.project` marker are built with the
//!   STM32CubeIDE headless launcher
//! - projects with a Makefile (in the root or in `Debug/`) are built with make
//!
//! The IDE path falls back to make only when the IDE is not installed. Once
//! the IDE has run, its verdict is final.

mod artifact;
mod clean;
mod descriptor;

pub use artifact::{find_binary, BinaryInfo, BuildInfo, BINARY_EXTENSIONS};
pub use clean::{clean_dir, CleanReport, INTERMEDIATE_EXTENSIONS};
pub use descriptor::{
    BuildConfig, BuildDescriptor, BuildSystem, CANONICAL_BUILD_DIR, MAKEFILE, PROJECT_MARKER,
};

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use stmdeploy_core::{
    CommandRunner, Error, Invocation, Result, RunError, ToolHandle, ToolKind, ToolLocator,
    ToolOutput,
};

/// Wall-clock budget for a single build
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(300);

/// Parallel jobs when the CPU count cannot be determined
pub const FALLBACK_JOBS: usize = 4;

/// Eclipse application id of the CDT headless builder
pub const HEADLESS_BUILD_APPLICATION: &str = "org.eclipse.cdt.managedbuilder.core.headlessbuild";

/// Build tools resolved for a builder
#[derive(Debug, Clone, Default)]
pub struct BuildTools {
    /// STM32CubeIDE headless launcher
    pub ide: Option<ToolHandle>,
    /// make
    pub make: Option<ToolHandle>,
}

/// Outcome of a successful build
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Build system that produced the result
    pub system: BuildSystem,
    /// Configuration that was built
    pub config: BuildConfig,
    /// Captured standard output of the build tool
    pub stdout: String,
}

/// Builds one firmware project
pub struct Builder {
    descriptor: BuildDescriptor,
    tools: BuildTools,
    runner: Arc<dyn CommandRunner>,
}

impl Builder {
    /// Builder for `project_root`, discovering tools on this host
    pub fn new(project_root: impl AsRef<Path>, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        Self::with_ide_override(project_root, None, runner)
    }

    /// Like [`Builder::new`], preferring a configured IDE location
    pub fn with_ide_override(
        project_root: impl AsRef<Path>,
        ide_path: Option<&Path>,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self> {
        let descriptor = BuildDescriptor::new(project_root.as_ref())?;

        let locator = ToolLocator::new(runner.as_ref());
        let tools = BuildTools {
            ide: locator.locate(ToolKind::CubeIde, ide_path).ok(),
            make: locator.locate(ToolKind::Make, None).ok(),
        };

        Ok(Self {
            descriptor,
            tools,
            runner,
        })
    }

    /// Builder with explicitly resolved tools
    pub fn with_tools(
        project_root: impl AsRef<Path>,
        tools: BuildTools,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self> {
        Ok(Self {
            descriptor: BuildDescriptor::new(project_root.as_ref())?,
            tools,
            runner,
        })
    }

    /// Project name
    pub fn project_name(&self) -> &str {
        self.descriptor.project_name()
    }

    /// Project root
    pub fn project_root(&self) -> &Path {
        self.descriptor.project_root()
    }

    /// Canonical build directory
    pub fn build_dir(&self) -> &Path {
        self.descriptor.build_dir()
    }

    /// Tools this builder resolved
    pub fn tools(&self) -> &BuildTools {
        &self.tools
    }

    /// Build the project, optionally cleaning first
    ///
    /// A clean that fails to remove some files is logged and the build
    /// still runs.
    pub fn build(&self, clean: bool, config: BuildConfig) -> Result<BuildReport> {
        if clean {
            log::info!("Cleaning build artifacts...");
            match self.clean() {
                Ok(report) if !report.is_complete() => log::warn!(
                    "Clean left {} file(s) behind, building anyway",
                    report.failed.len()
                ),
                Ok(_) => {}
                Err(e) => log::error!("Clean failed: {}", e),
            }
        }

        log::info!("Building {} ({})", self.project_name(), config);

        match self.descriptor.detect() {
            Some(BuildSystem::IdeHeadless) => self.build_with_ide(config),
            Some(BuildSystem::Make) => self.build_with_make(config),
            None => Err(Error::NoBuildSystemDetected(
                self.project_root().to_path_buf(),
            )),
        }
    }

    fn build_with_ide(&self, config: BuildConfig) -> Result<BuildReport> {
        let Some(ide) = &self.tools.ide else {
            log::warn!("STM32CubeIDE not found, trying make...");
            return self.build_with_make(config);
        };

        let root = self.project_root();
        let workspace = root.parent().unwrap_or(root);
        let invocation = ide
            .invocation()
            .args(["-nosplash", "-application", HEADLESS_BUILD_APPLICATION])
            .arg("-data")
            .arg(workspace.display().to_string())
            .arg("-import")
            .arg(root.display().to_string())
            .arg("-build")
            .arg(format!("{}/{}", self.project_name(), config))
            .timeout(Some(BUILD_TIMEOUT));

        let output = self.run_build_tool(&invocation, ToolKind::CubeIde)?;
        log::info!("Build completed successfully");
        Ok(BuildReport {
            system: BuildSystem::IdeHeadless,
            config,
            stdout: output.stdout,
        })
    }

    fn build_with_make(&self, config: BuildConfig) -> Result<BuildReport> {
        let dir = self
            .descriptor
            .makefile_dir()
            .ok_or_else(|| Error::NoBuildSystemDetected(self.project_root().to_path_buf()))?;

        let Some(make) = &self.tools.make else {
            return Err(Error::BuildToolNotInstalled(
                ToolKind::Make.command_name().to_string(),
            ));
        };

        let invocation = make
            .invocation()
            .arg(format!("-j{}", parallel_jobs()))
            .arg("-C")
            .arg(dir.display().to_string())
            .timeout(Some(BUILD_TIMEOUT));

        let output = self.run_build_tool(&invocation, ToolKind::Make)?;
        log::info!("Build completed successfully");
        Ok(BuildReport {
            system: BuildSystem::Make,
            config,
            stdout: output.stdout,
        })
    }

    fn run_build_tool(&self, invocation: &Invocation, kind: ToolKind) -> Result<ToolOutput> {
        match self.runner.run(invocation) {
            Ok(output) if output.is_success() => Ok(output),
            Ok(output) => {
                log::error!("Build failed (exit code {:?})", output.code);
                Err(Error::CompileFailed {
                    stdout: output.stdout,
                    stderr: output.stderr,
                })
            }
            Err(RunError::NotFound(_)) => {
                Err(Error::BuildToolNotInstalled(kind.command_name().to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove intermediate and output files from the build directory
    pub fn clean(&self) -> Result<CleanReport> {
        log::info!("Cleaning build directory: {}", self.build_dir().display());
        clean_dir(self.build_dir())
    }

    /// Directory the firmware image for `config` is expected in
    pub fn output_dir(&self, config: BuildConfig) -> PathBuf {
        self.descriptor.output_dir(config)
    }

    /// Locate the firmware image produced for `config`
    pub fn binary_path(&self, config: BuildConfig) -> Option<PathBuf> {
        find_binary(&self.output_dir(config), self.project_name())
    }

    /// Snapshot of the project's build state for the default configuration
    pub fn build_info(&self) -> BuildInfo {
        BuildInfo {
            project_name: self.project_name().to_string(),
            project_root: self.project_root().to_path_buf(),
            build_dir: self.build_dir().to_path_buf(),
            binary: self
                .binary_path(BuildConfig::default())
                .and_then(BinaryInfo::from_path),
        }
    }
}

/// Number of parallel make jobs: logical CPUs, or [`FALLBACK_JOBS`]
pub fn parallel_jobs() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(FALLBACK_JOBS)
}
