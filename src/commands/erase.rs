//! Erase command implementation

use sfflash_core::chip::Bank;
use sfflash_core::flash;

use super::progress::IndicatifProgress;
use crate::programmers::Programmer;

/// Erase one bank
pub fn run_erase_bank(
    programmer: &mut Programmer,
    bank: Bank,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut progress = IndicatifProgress::new();
    flash::erase_bank(programmer.chip(), bank.address(), &mut progress)?;
    drop(progress);

    println!("Bank {} erased", bank);
    Ok(())
}

/// Erase the whole chip
pub fn run_erase_chip(programmer: &mut Programmer) -> Result<(), Box<dyn std::error::Error>> {
    let mut progress = IndicatifProgress::new();
    flash::erase_chip(programmer.chip(), &mut progress)?;
    drop(progress);

    println!("Chip erase complete");
    Ok(())
}
