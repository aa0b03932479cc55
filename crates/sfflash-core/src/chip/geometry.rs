//! Flash window layout

use core::fmt;

/// Size of the mapped flash window in bytes
pub const FLASH_SIZE: u32 = 0x10_0000;

/// Size of one ROM bank in bytes
pub const BANK_SIZE: u32 = 0x08_0000;

/// Number of banks tiling the flash window
pub const BANK_COUNT: u32 = FLASH_SIZE / BANK_SIZE;

/// Smallest erasable unit (2048 words)
pub const SECTOR_SIZE: u32 = 2048 << 1;

/// Number of sectors in one bank
pub const BANK_SECTORS: u32 = BANK_SIZE / SECTOR_SIZE;

/// Total number of sectors in the window
pub const SECTOR_COUNT: u32 = BANK_SECTORS * BANK_COUNT;

/// Default physical base address of the flash window
pub const DEFAULT_FLASH_BASE: u64 = 0xA0_0000;

/// Default physical base address of the running Kickstart ROM
pub const DEFAULT_ROM_BASE: u64 = 0xF8_0000;

/// Expansion board manufacturer ID
pub const BOARD_MANUFACTURER: u16 = 5194;

/// Expansion board product ID
pub const BOARD_PRODUCT: u8 = 10;

/// Align a bank address down to its bank and mask it into the window
#[inline]
pub const fn bank_base(address: u32) -> u32 {
    address & !(BANK_SIZE - 1) & (FLASH_SIZE - 1)
}

/// Base offset of a sector
#[inline]
pub const fn sector_base(sector: u32) -> u32 {
    sector.wrapping_mul(SECTOR_SIZE)
}

/// Sector index containing `address`
#[inline]
pub const fn sector_of(address: u32) -> u32 {
    address / SECTOR_SIZE
}

/// One of the two ROM banks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Bank {
    /// Bank 0 - the $E0 ROM
    Bank0,
    /// Bank 1 - the $F8 ROM, used for booting
    #[default]
    Bank1,
}

impl Bank {
    /// Flash offset where this bank starts
    pub const fn address(self) -> u32 {
        match self {
            Bank::Bank0 => 0,
            Bank::Bank1 => BANK_SIZE,
        }
    }

    /// Bank containing `address` (after masking into the window)
    pub const fn from_address(address: u32) -> Self {
        if bank_base(address) == 0 {
            Bank::Bank0
        } else {
            Bank::Bank1
        }
    }

    /// Bank number (0 or 1)
    pub const fn index(self) -> u8 {
        match self {
            Bank::Bank0 => 0,
            Bank::Bank1 => 1,
        }
    }

    /// First sector of this bank
    pub const fn first_sector(self) -> u32 {
        sector_of(self.address())
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}
