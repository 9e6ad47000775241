//! erase, read and status commands

use super::{print_rule, programming_config, CommandResult};
use crate::cli::TargetArgs;
use crate::settings::Settings;
use std::path::Path;
use std::sync::Arc;
use stmdeploy_core::CommandRunner;
use stmdeploy_deploy::{Deployer, DeploymentStatus, DeviceState};
use stmdeploy_flash::Programmer;

pub fn run_erase(
    settings: &Settings,
    target: &TargetArgs,
    full: bool,
    runner: Arc<dyn CommandRunner>,
) -> CommandResult {
    let programmer = Programmer::new(programming_config(settings, target), runner);
    programmer.erase(full)?;
    println!("Erase complete");
    Ok(())
}

pub fn run_read(
    settings: &Settings,
    target: &TargetArgs,
    output: &Path,
    address: u32,
    size: u32,
    runner: Arc<dyn CommandRunner>,
) -> CommandResult {
    let programmer = Programmer::new(programming_config(settings, target), runner);
    programmer.read_memory(address, size, output)?;
    println!("Wrote {} bytes to {}", size, output.display());
    Ok(())
}

pub fn run_status(
    settings: &Settings,
    project: Option<&Path>,
    target: &TargetArgs,
    runner: Arc<dyn CommandRunner>,
) -> CommandResult {
    let config = programming_config(settings, target);

    let Some(project) = project else {
        let programmer = Programmer::new(config, runner);
        match programmer.device_info() {
            Some(info) => println!("\nDevice Info:\n{}", info.output),
            None => println!("\nNo device found or no programmer available"),
        }
        return Ok(());
    };

    let deployer =
        Deployer::for_project(project, config, settings.cube_ide_path.as_deref(), runner)?;
    print_status(&deployer.status());
    Ok(())
}

fn print_status(status: &DeploymentStatus) {
    print_rule("STM32 Deployment Status");
    println!();
    println!("Project:         {}", status.build.project_name);
    println!("Build dir:       {}", status.build.build_dir.display());
    println!("Binary found:    {}", status.build.binary_found());
    if let Some(binary) = &status.build.binary {
        println!("Binary path:     {}", binary.path.display());
        println!("Binary size:     {} bytes", binary.size);
    }
    println!();
    println!("Programmer:      {}", status.programmer.tool_name());
    println!("Port:            {}", status.programmer.port);
    println!("Chip:            {}", status.programmer.chip);
    println!();
    println!("Device:          {}", status.device);
    if let DeviceState::Connected(info) = &status.device {
        println!();
        println!("{}", info.output.trim_end());
    }
    println!("{}", "=".repeat(60));
}
