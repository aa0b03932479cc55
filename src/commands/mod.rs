//! CLI command implementations
//!
//! Every command runs against an opened [`Programmer`]. Commands that touch
//! the flash array expect the caller to have checked the chip identity first.

mod erase;
mod identify;
mod list;
mod program;
mod progress;
mod verify;

use std::path::PathBuf;

use sfflash_core::error::{Error, VerifyFailure};

pub use erase::{run_erase_bank, run_erase_chip};
pub use identify::{check_identity, run_identify};
pub use list::list_programmers;
pub use program::run_program;
pub use verify::run_verify;

use crate::programmers::Programmer;

/// Where an image to program or verify comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// An image file
    File(PathBuf),
    /// The Kickstart ROM the machine is running
    Rom,
}

impl ImageSource {
    /// Load the image into memory
    fn load(&self, programmer: &Programmer) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        match self {
            Self::File(path) => {
                let data = crate::image::load_image(path)?;
                println!("Read {} bytes from {}", data.len(), path.display());
                Ok(data)
            }
            Self::Rom => {
                let data = programmer.read_rom()?;
                println!("Copied {} bytes of Kickstart ROM", data.len());
                Ok(data)
            }
        }
    }
}

/// Report a verification failure at the host address of the failing word
///
/// Other errors are passed through unchanged.
fn at_host_address(error: Error, flash_base: u64) -> Box<dyn std::error::Error> {
    match error {
        Error::Verify(VerifyFailure {
            address,
            expected,
            found,
        }) => format!(
            "Verification failed at {:06x} - Expected {:04X} but read {:04X}",
            flash_base + u64::from(address),
            expected,
            found
        )
        .into(),
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_failure_uses_host_address() {
        let error = Error::Verify(VerifyFailure {
            address: 0x8_0100,
            expected: 0x1234,
            found: 0xFFFF,
        });
        assert_eq!(
            at_host_address(error, 0xA0_0000).to_string(),
            "Verification failed at a80100 - Expected 1234 but read FFFF"
        );
    }

    #[test]
    fn test_other_errors_unchanged() {
        let error = Error::BadImageSize(3);
        assert_eq!(
            at_host_address(error, 0xA0_0000).to_string(),
            error.to_string()
        );
    }
}
