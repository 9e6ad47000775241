//! deploy and flash commands

use super::{programming_config, CommandResult};
use crate::cli::TargetArgs;
use crate::settings::Settings;
use std::path::Path;
use std::sync::Arc;
use stmdeploy_build::BuildConfig;
use stmdeploy_core::{hex, CommandRunner};
use stmdeploy_deploy::{DeployOptions, Deployer, DeploymentReport};
use stmdeploy_flash::{FlashReport, Programmer};

/// Flags of the deploy command
pub struct DeployArgs<'a> {
    pub project: &'a Path,
    pub target: &'a TargetArgs,
    pub no_build: bool,
    pub clean: bool,
    pub config: BuildConfig,
    pub no_verify: bool,
}

/// Settings and flags combined into pipeline options
pub fn deploy_options(settings: &Settings, args: &DeployArgs<'_>) -> DeployOptions {
    let build = settings.build_before_flash && !args.no_build;
    DeployOptions {
        build,
        clean: build && (args.clean || settings.clean_before_build),
        config: args.config,
        verify: settings.verify_by_default && !args.no_verify,
    }
}

pub fn run_deploy(
    settings: &Settings,
    args: DeployArgs<'_>,
    runner: Arc<dyn CommandRunner>,
) -> CommandResult {
    let options = deploy_options(settings, &args);
    let config = programming_config(settings, args.target);
    let mut deployer = Deployer::for_project(
        args.project,
        config,
        settings.cube_ide_path.as_deref(),
        runner,
    )?;

    log::info!(
        "Deploying {} (build: {}, clean: {}, config: {}, verify: {})",
        deployer.builder().project_name(),
        options.build,
        options.clean,
        options.config,
        options.verify
    );

    let report = deployer.deploy(options)?;
    print_deployment(&report);
    Ok(())
}

pub fn run_flash(
    settings: &Settings,
    binary: &Path,
    target: &TargetArgs,
    address: Option<u32>,
    no_verify: bool,
    runner: Arc<dyn CommandRunner>,
) -> CommandResult {
    let config = programming_config(settings, target);
    let verify = config.verify && !no_verify;
    let programmer = Programmer::new(config, runner);

    let report = programmer.flash(binary, address, Some(verify))?;
    print_flash(&report);
    Ok(())
}

fn print_deployment(report: &DeploymentReport) {
    if let Some(build) = &report.build {
        println!("Built with {} ({})", build.system, build.config);
    }
    print_flash(&report.flash);
}

fn print_flash(report: &FlashReport) {
    println!(
        "Flashed {} ({} bytes) at {} using {}{}",
        report.binary.display(),
        report.size,
        hex(report.address),
        report.backend,
        if report.verified { ", verified" } else { "" }
    );
}
