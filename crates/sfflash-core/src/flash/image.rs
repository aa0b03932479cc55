//! ROM image size policy

use core::fmt;

use crate::chip::{bank_base, BANK_SIZE, FLASH_SIZE};
use crate::error::{Error, Result};

/// 256 KiB ROM (mirrored to fill a bank)
pub const ROM_256K: usize = 0x04_0000;
/// 512 KiB ROM (exactly one bank)
pub const ROM_512K: usize = 0x08_0000;
/// 1 MiB ROM (both banks)
pub const ROM_1M: usize = 0x10_0000;

/// The accepted image sizes and how each is placed in the flash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSize {
    /// 256 KiB image, written twice to fill one bank
    Rom256K,
    /// 512 KiB image, written once to one bank
    Rom512K,
    /// 1 MiB image, spanning both banks from Bank 0
    Rom1M,
}

impl ImageSize {
    /// Classify an image length, rejecting anything but the three ROM sizes
    pub const fn from_len(len: usize) -> Result<Self> {
        match len {
            ROM_256K => Ok(Self::Rom256K),
            ROM_512K => Ok(Self::Rom512K),
            ROM_1M => Ok(Self::Rom1M),
            _ => Err(Error::BadImageSize(len)),
        }
    }

    /// Image length in bytes
    pub const fn len(self) -> usize {
        match self {
            Self::Rom256K => ROM_256K,
            Self::Rom512K => ROM_512K,
            Self::Rom1M => ROM_1M,
        }
    }

    /// Number of flash bytes written (and verified) for this image
    ///
    /// A 256 KiB image fills a whole bank by repeating the image.
    pub const fn span(self) -> u32 {
        match self {
            Self::Rom256K => BANK_SIZE,
            Self::Rom512K => BANK_SIZE,
            Self::Rom1M => FLASH_SIZE,
        }
    }

    /// Flash offset the image is written to
    ///
    /// A 1 MiB image always starts at Bank 0, whatever bank was requested.
    pub const fn destination(self, bank_address: u32) -> u32 {
        match self {
            Self::Rom1M => 0,
            _ => bank_base(bank_address),
        }
    }

    /// Whether the whole chip has to be erased before programming
    pub const fn needs_chip_erase(self) -> bool {
        matches!(self, Self::Rom1M)
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rom256K => write!(f, "256K"),
            Self::Rom512K => write!(f, "512K"),
            Self::Rom1M => write!(f, "1M"),
        }
    }
}

/// Source word for a flash offset relative to the image start
///
/// The source offset wraps around the image length, which is what mirrors a
/// 256 KiB image into both halves of a bank. The word is assembled in native
/// byte order, the same as a 16-bit load from the buffer.
#[inline]
pub fn source_word(image: &[u8], offset: u32) -> u16 {
    let i = offset as usize % image.len();
    u16::from_ne_bytes([image[i], image[i + 1]])
}
