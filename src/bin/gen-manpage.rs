//! Man page generator for stmdeploy
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]
//!
//! Writes `stmdeploy.1` plus one page per subcommand (`stmdeploy-deploy.1`,
//! `stmdeploy-flash.1`, ...).

use clap::CommandFactory;
use std::fs;
use std::path::{Path, PathBuf};

#[path = "../cli.rs"]
#[allow(dead_code)]
mod cli;

fn render(cmd: clap::Command, output_dir: &Path, name: &str) -> std::io::Result<PathBuf> {
    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd).render(&mut buffer)?;
    let path = output_dir.join(format!("{}.1", name));
    fs::write(&path, buffer)?;
    Ok(path)
}

fn main() -> std::io::Result<()> {
    let output_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    fs::create_dir_all(&output_dir)?;

    let cmd = cli::Cli::command();
    for sub in cmd.get_subcommands() {
        let name = format!("stmdeploy-{}", sub.get_name());
        let page = render(sub.clone(), &output_dir, &name)?;
        println!("  {}", page.display());
    }
    let main_page = render(cmd, &output_dir, "stmdeploy")?;

    println!("Man page generated at: {}", main_page.display());
    println!("\nTo view the man page:");
    println!("  man -l {}", main_page.display());
    println!("\nTo install system-wide (requires sudo):");
    println!(
        "  sudo cp {}/*.1 /usr/local/share/man/man1/",
        output_dir.display()
    );
    println!("  sudo mandb");

    Ok(())
}
