//! Bank level flash operations

use log::{debug, info, warn};

use crate::bus::{window_offset, FlashBus};
use crate::chip::{bank_base, sector_of, Bank, BANK_SECTORS};
use crate::error::{Result, VerifyFailure};
use crate::protocol::SdpFlash;

use super::image::{source_word, ImageSize};
use super::progress::{Percent, Progress};

/// Options for [`program`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgramOptions {
    /// Skip the verify pass after programming
    pub skip_verify: bool,
}

/// Erase every sector of one bank
///
/// `bank_address` is aligned down to its bank first. Sectors are erased in
/// ascending order, with progress reported after each one.
pub fn erase_bank<B: FlashBus, P: Progress + ?Sized>(
    chip: &mut SdpFlash<B>,
    bank_address: u32,
    progress: &mut P,
) -> Result<()> {
    let base = bank_base(bank_address);
    let bank = Bank::from_address(base);
    let first_sector = sector_of(base);

    debug!(
        "Erasing bank {} (sectors {}..{})",
        bank,
        first_sector,
        first_sector + BANK_SECTORS
    );
    progress.erasing_bank(bank);

    for index in 0..BANK_SECTORS {
        chip.erase_sector(first_sector + index)?;
        progress.erase_progress(index * 100 / (BANK_SECTORS - 1));
    }

    info!("Erased bank {}", bank);
    Ok(())
}

/// Erase the whole chip
pub fn erase_chip<B: FlashBus, P: Progress + ?Sized>(
    chip: &mut SdpFlash<B>,
    progress: &mut P,
) -> Result<()> {
    progress.erasing_chip();
    chip.erase_chip()?;
    progress.chip_erased();

    info!("Erased chip");
    Ok(())
}

/// Erase, program and (unless skipped) verify an image
///
/// The image length decides the layout:
/// - 256 KiB: the requested bank is erased and filled with two copies
/// - 512 KiB: the requested bank is erased and written once
/// - 1 MiB: the chip is erased and the image written from Bank 0, whatever
///   bank was requested
///
/// Any other length is rejected before the chip is touched.
pub fn program<B: FlashBus, P: Progress + ?Sized>(
    chip: &mut SdpFlash<B>,
    image: &[u8],
    bank_address: u32,
    options: ProgramOptions,
    progress: &mut P,
) -> Result<()> {
    let size = ImageSize::from_len(image.len())?;
    let destination = size.destination(bank_address);

    if size.needs_chip_erase() {
        if destination != bank_base(bank_address) {
            warn!("{} image spans both banks, writing from bank 0", size);
        }
        erase_chip(chip, progress)?;
    } else {
        erase_bank(chip, destination, progress)?;
    }

    write_image(chip, image, size, destination, progress)?;

    if options.skip_verify {
        debug!("Skipping verification");
        return Ok(());
    }

    verify_image(chip, image, size, destination, progress)
}

/// Compare the flash against an image
///
/// Uses the same layout as [`program`]. Stops at the first differing word
/// and reports its flash offset along with both words.
pub fn verify<B: FlashBus, P: Progress + ?Sized>(
    chip: &mut SdpFlash<B>,
    image: &[u8],
    bank_address: u32,
    progress: &mut P,
) -> Result<()> {
    let size = ImageSize::from_len(image.len())?;
    let destination = size.destination(bank_address);
    if destination != bank_base(bank_address) {
        warn!("{} image spans both banks, verifying from bank 0", size);
    }
    verify_image(chip, image, size, destination, progress)
}

fn write_image<B: FlashBus, P: Progress + ?Sized>(
    chip: &mut SdpFlash<B>,
    image: &[u8],
    size: ImageSize,
    destination: u32,
    progress: &mut P,
) -> Result<()> {
    let span = size.span();
    debug!(
        "Writing {} image to {:06x} ({} bytes)",
        size, destination, span
    );
    progress.writing(span);

    let mut percent = Percent::default();
    for offset in (0..span).step_by(2) {
        if let Some(p) = percent.update(offset, span) {
            progress.write_progress(p);
        }
        chip.write_word(destination + offset, source_word(image, offset))?;
    }

    Ok(())
}

fn verify_image<B: FlashBus, P: Progress + ?Sized>(
    chip: &mut SdpFlash<B>,
    image: &[u8],
    size: ImageSize,
    destination: u32,
    progress: &mut P,
) -> Result<()> {
    let span = size.span();
    debug!(
        "Verifying {} image at {:06x} ({} bytes)",
        size, destination, span
    );
    progress.verifying(span);

    let mut percent = Percent::default();
    for offset in (0..span).step_by(2) {
        if let Some(p) = percent.update(offset, span) {
            progress.verify_progress(p);
        }

        let address = window_offset(destination + offset);
        let found = chip.read_word(address);
        let expected = source_word(image, offset);

        if found != expected {
            return Err(VerifyFailure {
                address,
                expected,
                found,
            }
            .into());
        }
    }

    progress.verified();
    Ok(())
}
