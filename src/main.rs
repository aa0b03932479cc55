//! sfflash - Flash programmer for Kickstart ROM expansion cards
//!
//! The card carries a 1 MiB parallel SST39 NOR flash, mapped into the host
//! address space and split into two 512 KiB banks that the card presents as
//! the $E0 and $F8 ROM areas.
//!
//! # Architecture
//!
//! - `sfflash-core` drives the chip's unlock/command protocol through a
//!   [`sfflash_core::bus::FlashBus`] and lays images out over the banks
//! - programmers provide the bus: `physmap` maps the real window through
//!   /dev/mem, `dummy` emulates the chip in memory
//! - the commands here add image loading and progress bars on top

mod cli;
mod commands;
mod config;
mod image;
mod programmers;

use std::process::ExitCode;

use clap::Parser;
use cli::{BankArgs, Cli, Commands, FlashCommands, SourceArgs};
use commands::ImageSource;
use config::BoardConfig;
use programmers::Programmer;
use sfflash_core::chip::Bank;

/// Exit status for any failed operation
const EXIT_FAILURE: u8 = 5;

fn main() -> ExitCode {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let command = match cli.command {
        Commands::ListProgrammers => {
            commands::list_programmers();
            return Ok(());
        }
        Commands::Flash(command) => command,
    };

    let mut config = BoardConfig::load(cli.config.as_deref())?;
    if let Some(limit) = cli.poll_limit {
        if limit == 0 {
            return Err("--poll-limit must be at least 1".into());
        }
        config.poll_limit = Some(limit);
    }

    let mut programmer = programmers::open_programmer(&cli.programmer, &config)?;
    log::debug!("Using programmer {}", programmer.name());

    let result = run_flash_command(command, &mut programmer);

    // Release the programmer on failure too; the first error wins
    let finished = programmer.finish();
    result.and(finished)
}

fn run_flash_command(
    command: FlashCommands,
    programmer: &mut Programmer,
) -> Result<(), Box<dyn std::error::Error>> {
    if command.needs_identity() {
        commands::check_identity(programmer)?;
    }

    match command {
        FlashCommands::Program {
            source,
            bank,
            skip_verify,
        } => commands::run_program(
            programmer,
            &image_source(source),
            select_bank(bank),
            skip_verify,
        ),
        FlashCommands::Verify { source, bank } => {
            commands::run_verify(programmer, &image_source(source), select_bank(bank))
        }
        FlashCommands::Erase { bank } => commands::run_erase_bank(programmer, select_bank(bank)),
        FlashCommands::EraseChip => commands::run_erase_chip(programmer),
        FlashCommands::Identify => commands::run_identify(programmer),
    }
}

/// Bank 1 unless bank 0 was asked for
fn select_bank(args: BankArgs) -> Bank {
    if args.bank0 {
        Bank::Bank0
    } else {
        Bank::Bank1
    }
}

fn image_source(args: SourceArgs) -> ImageSource {
    match args.file {
        Some(path) => ImageSource::File(path),
        None => ImageSource::Rom,
    }
}
