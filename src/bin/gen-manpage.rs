//! Man page generator for sfflash
//!
//! Writes sfflash.1 and one page per subcommand (sfflash-program.1, ...).
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::CommandFactory;
use std::fs;
use std::path::{Path, PathBuf};

#[path = "../cli.rs"]
mod cli;

fn render(cmd: clap::Command, output_dir: &Path, file_name: &str) -> std::io::Result<PathBuf> {
    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd).render(&mut buffer)?;

    let path = output_dir.join(file_name);
    fs::write(&path, buffer)?;
    Ok(path)
}

/// A subcommand set up to be rendered as its own page (sfflash-<name>)
fn subcommand_page(sub: &clap::Command) -> clap::Command {
    sub.clone()
        .display_name(format!("sfflash-{}", sub.get_name()))
        .bin_name(format!("sfflash {}", sub.get_name()))
}

fn main() -> std::io::Result<()> {
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    fs::create_dir_all(&output_dir)?;

    let cmd = cli::Cli::command();
    let main_page = render(cmd.clone(), &output_dir, "sfflash.1")?;
    println!("Generated {}", main_page.display());

    for sub in cmd.get_subcommands() {
        let name = format!("sfflash-{}", sub.get_name());
        let page = render(subcommand_page(sub), &output_dir, &format!("{}.1", name))?;
        println!("Generated {}", page.display());
    }

    println!("\nTo view: man -l {}", main_page.display());
    Ok(())
}
