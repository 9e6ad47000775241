//! stmdeploy - Build and flash STM32 firmware from the command line
//!
//! stmdeploy does not talk to hardware itself. It finds the vendor tools
//! installed on the host and sequences them:
//!
//! - **Build**: STM32CubeIDE headless builds for Eclipse projects, `make`
//!   for Makefile projects
//! - **Flash**: STM32CubeProgrammer, with OpenOCD as an alternate for
//!   flashing when the former is not installed
//! - **Deploy**: build, locate the image, flash, and stop at the first
//!   failure
//!
//! Every external command line is logged before it runs.

mod cli;
mod commands;
mod progress;
mod settings;

use clap::Parser;
use cli::{Cli, Commands};
use commands::deploy::DeployArgs;
use progress::{SpinnerRunner, SuspendingLogger};
use settings::Settings;
use std::sync::Arc;
use stmdeploy_core::{CommandRunner, SystemRunner};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logger, verbosity flags override RUST_LOG
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    match cli.verbose {
        0 => {} // default (info)
        1 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }
    let logger = builder.build();
    let max_level = logger.filter();
    log::set_boxed_logger(Box::new(SuspendingLogger::new(logger)))?;
    log::set_max_level(max_level);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: Cli) -> commands::CommandResult {
    let settings_path = cli.settings_file.or_else(Settings::default_path);
    let settings = Settings::load(settings_path.as_deref());
    let runner: Arc<dyn CommandRunner> = Arc::new(SpinnerRunner::new(SystemRunner::new()));

    match cli.command {
        Commands::Deploy {
            project,
            target,
            no_build,
            clean,
            config,
            no_verify,
        } => commands::deploy::run_deploy(
            &settings,
            DeployArgs {
                project: &project,
                target: &target,
                no_build,
                clean,
                config,
                no_verify,
            },
            runner,
        ),
        Commands::Flash {
            binary,
            target,
            address,
            no_verify,
        } => commands::deploy::run_flash(&settings, &binary, &target, address, no_verify, runner),
        Commands::Erase { target, full } => {
            commands::device::run_erase(&settings, &target, full, runner)
        }
        Commands::Read {
            output,
            address,
            size,
            target,
        } => commands::device::run_read(&settings, &target, &output, address, size, runner),
        Commands::Build {
            project,
            clean,
            config,
        } => commands::project::run_build(&settings, &project, clean, config, runner),
        Commands::Clean { project } => commands::project::run_clean(&project, runner),
        Commands::Status { project, target } => {
            commands::device::run_status(&settings, project.as_deref(), &target, runner)
        }
        Commands::Settings { show, reset, set } => commands::settings::run_settings(
            settings_path.as_deref(),
            show,
            reset,
            set.as_deref(),
        ),
    }
}
