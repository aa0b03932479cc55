//! Chip identification

use sfflash_core::chip::DeviceId;

use crate::programmers::Programmer;

/// Print the manufacturer and device ids
pub fn run_identify(programmer: &mut Programmer) -> Result<(), Box<dyn std::error::Error>> {
    let id = programmer.chip().identify();

    println!("{}", id);
    match id.name() {
        Some(name) => println!("Found: {}", name),
        None if id.matches_expected() => println!("Unknown device from the expected vendor"),
        None => println!("Not the expected flash chip"),
    }

    Ok(())
}

/// Read the chip identity and fail unless the manufacturer matches
///
/// A mismatch usually means the ROM overlay is still mapped over the flash
/// window.
pub fn check_identity(programmer: &mut Programmer) -> Result<DeviceId, Box<dyn std::error::Error>> {
    let id = programmer.chip().identify();
    log::debug!("{}", id);

    match id.check() {
        Ok(id) => Ok(id),
        Err(e) => {
            eprintln!("Unexpected flash identity: {}", id);
            eprintln!("Check that ROM overlay is switched off and try again.");
            Err(e.into())
        }
    }
}
