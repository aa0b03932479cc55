//! Program command implementation

use sfflash_core::chip::Bank;
use sfflash_core::flash::{self, ImageSize, ProgramOptions};

use super::progress::IndicatifProgress;
use super::{at_host_address, ImageSource};
use crate::programmers::Programmer;

/// Erase the target, write an image and verify it
///
/// A 1 MiB image always goes to the whole chip starting at bank 0.
pub fn run_program(
    programmer: &mut Programmer,
    source: &ImageSource,
    bank: Bank,
    skip_verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = source.load(programmer)?;
    let size = ImageSize::from_len(image.len())?;

    let target = if size.needs_chip_erase() {
        "the whole chip".to_string()
    } else {
        format!("bank {}", bank)
    };
    println!("Programming {} image to {}", size, target);

    let mut progress = IndicatifProgress::new();
    let flash_base = programmer.flash_base();
    flash::program(
        programmer.chip(),
        &image,
        bank.address(),
        ProgramOptions { skip_verify },
        &mut progress,
    )
    .map_err(|e| at_host_address(e, flash_base))?;
    drop(progress);

    if skip_verify {
        println!("Programming complete (not verified)");
    } else {
        println!("Programming complete, verification passed");
    }
    Ok(())
}
