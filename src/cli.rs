//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sfflash")]
#[command(
    author,
    version,
    about = "Programmer for the parallel SST39 flash on a Kickstart ROM expansion card",
    long_about = None
)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Board configuration file (TOML format)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Programmer to use, with optional parameters (e.g. physmap:base=0xA00000)
    #[arg(short, long, global = true, default_value = "physmap")]
    pub programmer: String,

    /// Give up on a busy chip after this many status polls
    #[arg(long, global = true)]
    pub poll_limit: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Bank selection shared by the bank commands
#[derive(clap::Args, Debug, Clone, Copy, Default)]
pub struct BankArgs {
    /// Select bank 0 ($E0 ROM)
    #[arg(short = '0', long = "bank0", conflicts_with = "bank1")]
    pub bank0: bool,

    /// Select bank 1 ($F8 ROM, the boot bank) [default]
    #[arg(short = '1', long = "bank1")]
    pub bank1: bool,
}

/// Image source shared by program and verify
#[derive(clap::Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct SourceArgs {
    /// Image file (256K, 512K or 1M)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Use the Kickstart ROM the machine is running
    #[arg(short = 'c', long)]
    pub rom: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(flatten)]
    Flash(FlashCommands),

    /// List available programmers
    ListProgrammers,
}

/// Commands that operate on the flash chip
#[derive(Subcommand)]
pub enum FlashCommands {
    /// Erase, program and verify a bank
    Program {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        bank: BankArgs,

        /// Skip verification after programming
        #[arg(short = 'V', long)]
        skip_verify: bool,
    },

    /// Verify a bank against an image
    Verify {
        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        bank: BankArgs,
    },

    /// Erase a bank
    Erase {
        #[command(flatten)]
        bank: BankArgs,
    },

    /// Erase the whole chip
    EraseChip,

    /// Show the flash manufacturer and device ids
    Identify,
}

impl FlashCommands {
    /// Whether the chip identity must match before running
    pub fn needs_identity(&self) -> bool {
        !matches!(self, FlashCommands::Identify)
    }
}
