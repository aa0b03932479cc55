//! Flash bus trait definitions

use crate::chip::FLASH_SIZE;

/// Mask an offset into the flash window
///
/// The window is `FLASH_SIZE` bytes long and addresses past its end wrap
/// around to the start.
#[inline]
pub const fn window_offset(address: u32) -> u32 {
    address & (FLASH_SIZE - 1)
}

/// 16-bit access to the flash array
///
/// Implementations expose a linear window of `FLASH_SIZE` bytes. The chip
/// driver always masks offsets with [`window_offset`] before calling into the
/// bus, so implementations may assume `offset < FLASH_SIZE`. Offsets used by
/// the driver are even.
///
/// Reads take `&mut self`: on real hardware a read of the array while an
/// operation is in progress returns status bits that change on every access,
/// and emulations need to model that.
pub trait FlashBus {
    /// Read the 16-bit word at `offset`
    fn read16(&mut self, offset: u32) -> u16;

    /// Write the 16-bit word `value` at `offset`
    fn write16(&mut self, offset: u32, value: u16);
}

impl<T: FlashBus + ?Sized> FlashBus for &mut T {
    fn read16(&mut self, offset: u32) -> u16 {
        (**self).read16(offset)
    }

    fn write16(&mut self, offset: u32, value: u16) {
        (**self).write16(offset, value)
    }
}

#[cfg(feature = "alloc")]
impl<T: FlashBus + ?Sized> FlashBus for alloc::boxed::Box<T> {
    fn read16(&mut self, offset: u32) -> u16 {
        (**self).read16(offset)
    }

    fn write16(&mut self, offset: u32, value: u16) {
        (**self).write16(offset, value)
    }
}

/// A boxed flash bus, used where the programmer is picked at runtime
#[cfg(feature = "alloc")]
pub type BoxedFlashBus = alloc::boxed::Box<dyn FlashBus>;
