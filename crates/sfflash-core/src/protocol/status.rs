//! Status bits returned while an operation is in progress

use bitflags::bitflags;

bitflags! {
    /// Status bits read from the array during an internal operation
    ///
    /// Only the low byte is decoded; on the x16 bus the chip drives the
    /// status on DQ0-DQ7.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u16 {
        /// DQ6 toggles on every read until the operation completes
        const TOGGLE = 1 << 6;
    }
}

impl Status {
    /// Decode the status bits of a raw word
    pub const fn from_word(word: u16) -> Self {
        Self::from_bits_truncate(word)
    }

    /// Whether two consecutive reads show a settled toggle bit
    pub fn settled(first: u16, second: u16) -> bool {
        Self::from_word(first).contains(Self::TOGGLE)
            == Self::from_word(second).contains(Self::TOGGLE)
    }
}
