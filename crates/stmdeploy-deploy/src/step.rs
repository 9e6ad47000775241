//! Pipeline steps
//!
//! The deployer only talks to its builder and programmer through these two
//! traits, which lets tests substitute steps that fail on purpose.

use std::path::{Path, PathBuf};

use stmdeploy_build::{BuildConfig, BuildInfo, BuildReport, Builder};
use stmdeploy_core::Result;
use stmdeploy_flash::{DeviceInfo, FlashReport, Programmer, ProgrammerSummary};

/// Something that can produce a firmware image
pub trait BuildStep {
    /// Build, optionally cleaning first
    fn build(&self, clean: bool, config: BuildConfig) -> Result<BuildReport>;

    /// Image produced for `config`, if one exists
    fn binary_path(&self, config: BuildConfig) -> Option<PathBuf>;

    /// Directory searched for the image of `config`
    fn output_dir(&self, config: BuildConfig) -> PathBuf;

    /// Read-only snapshot for status reports
    fn build_info(&self) -> BuildInfo;
}

/// Something that can write a firmware image to a device
pub trait FlashStep {
    /// Write `binary` at the configured start address
    fn flash(&self, binary: &Path, verify: bool) -> Result<FlashReport>;

    /// Query the device, `None` if it does not answer
    fn device_info(&self) -> Option<DeviceInfo>;

    /// Active backend, port and chip
    fn summary(&self) -> ProgrammerSummary;
}

impl BuildStep for Builder {
    fn build(&self, clean: bool, config: BuildConfig) -> Result<BuildReport> {
        Builder::build(self, clean, config)
    }

    fn binary_path(&self, config: BuildConfig) -> Option<PathBuf> {
        Builder::binary_path(self, config)
    }

    fn output_dir(&self, config: BuildConfig) -> PathBuf {
        Builder::output_dir(self, config)
    }

    fn build_info(&self) -> BuildInfo {
        Builder::build_info(self)
    }
}

impl FlashStep for Programmer {
    fn flash(&self, binary: &Path, verify: bool) -> Result<FlashReport> {
        Programmer::flash(self, binary, None, Some(verify))
    }

    fn device_info(&self) -> Option<DeviceInfo> {
        Programmer::device_info(self)
    }

    fn summary(&self) -> ProgrammerSummary {
        Programmer::summary(self)
    }
}
