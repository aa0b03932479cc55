//! sfflash-physmap - Flash window access through physical memory
//!
//! This crate maps the card's flash window with `/dev/mem` and exposes it as
//! a [`FlashBus`]. It can also copy the currently mapped Kickstart ROM, which
//! serves as an image source for programming and verifying.
//!
//! # Example
//!
//! ```ignore
//! use sfflash_core::chip::DEFAULT_FLASH_BASE;
//! use sfflash_core::protocol::SdpFlash;
//! use sfflash_physmap::FlashWindow;
//!
//! let window = FlashWindow::open(DEFAULT_FLASH_BASE)?;
//! let mut chip = SdpFlash::new(window);
//! println!("{}", chip.identify());
//! ```

mod error;
mod physmap;

pub use error::{PhysMapError, Result};
pub use physmap::PhysMap;

use sfflash_core::bus::FlashBus;
use sfflash_core::chip::FLASH_SIZE;

/// The flash array mapped at a physical base address
pub struct FlashWindow {
    map: PhysMap,
}

impl FlashWindow {
    /// Map `FLASH_SIZE` bytes of flash starting at `base`
    pub fn open(base: u64) -> Result<Self> {
        let map = PhysMap::new(base, FLASH_SIZE as usize, true)?;
        Self::from_map(map)
    }

    /// Use an existing mapping as the flash window
    pub fn from_map(map: PhysMap) -> Result<Self> {
        if map.len() < FLASH_SIZE as usize {
            return Err(PhysMapError::WindowTooSmall {
                size: map.len(),
                required: FLASH_SIZE as usize,
            });
        }
        Ok(Self { map })
    }

    /// Physical base address of the window
    pub fn base(&self) -> u64 {
        self.map.phys_addr()
    }
}

impl FlashBus for FlashWindow {
    fn read16(&mut self, offset: u32) -> u16 {
        self.map.read16(offset as usize)
    }

    fn write16(&mut self, offset: u32, value: u16) {
        self.map.write16(offset as usize, value)
    }
}

/// Copy `len` bytes of the ROM mapped at physical address `base`
///
/// The copy is taken before the flash is touched, so programming the bank
/// the ROM is currently running from still writes the original contents.
pub fn read_rom(base: u64, len: usize) -> Result<Vec<u8>> {
    let map = PhysMap::new(base, len, false)?;
    let data = map.copy_to_vec();
    log::info!("Copied {} bytes of ROM from {:#08x}", data.len(), base);
    Ok(data)
}
