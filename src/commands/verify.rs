//! Verify command implementation

use sfflash_core::chip::Bank;
use sfflash_core::flash::{self, ImageSize};

use super::progress::IndicatifProgress;
use super::{at_host_address, ImageSource};
use crate::programmers::Programmer;

/// Compare the flash against an image
pub fn run_verify(
    programmer: &mut Programmer,
    source: &ImageSource,
    bank: Bank,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = source.load(programmer)?;
    let size = ImageSize::from_len(image.len())?;

    if size.needs_chip_erase() {
        println!("Verifying {} image against the whole chip", size);
    } else {
        println!("Verifying {} image against bank {}", size, bank);
    }

    let mut progress = IndicatifProgress::new();
    let flash_base = programmer.flash_base();
    flash::verify(programmer.chip(), &image, bank.address(), &mut progress)
        .map_err(|e| at_host_address(e, flash_base))?;
    drop(progress);

    println!("Verification passed!");
    Ok(())
}
