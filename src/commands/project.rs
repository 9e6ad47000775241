//! build and clean commands

use super::CommandResult;
use crate::settings::Settings;
use std::path::Path;
use std::sync::Arc;
use stmdeploy_build::{BuildConfig, Builder};
use stmdeploy_core::CommandRunner;

pub fn run_build(
    settings: &Settings,
    project: &Path,
    clean: bool,
    config: BuildConfig,
    runner: Arc<dyn CommandRunner>,
) -> CommandResult {
    let builder =
        Builder::with_ide_override(project, settings.cube_ide_path.as_deref(), runner)?;
    let report = builder.build(clean || settings.clean_before_build, config)?;

    println!("Built {} with {} ({})", builder.project_name(), report.system, report.config);
    match builder.binary_path(config) {
        Some(binary) => println!("Binary: {}", binary.display()),
        None => log::warn!("Build succeeded but no firmware image was found"),
    }
    Ok(())
}

pub fn run_clean(project: &Path, runner: Arc<dyn CommandRunner>) -> CommandResult {
    let builder = Builder::with_tools(project, Default::default(), runner)?;
    let report = builder.clean()?;

    println!("Removed {} file(s)", report.removed.len());
    if !report.is_complete() {
        for (path, err) in &report.failed {
            eprintln!("  could not remove {}: {}", path.display(), err);
        }
        return Err(format!("{} file(s) could not be removed", report.failed.len()).into());
    }
    Ok(())
}
