//! Progress reporting for long running operations

use crate::chip::Bank;

/// Progress callback for erase, program and verify
///
/// Percentages run from 0 to 100. Implementations receive a percentage only
/// when it differs from the previous one of the same phase.
pub trait Progress {
    /// Called before the first sector of a bank is erased
    fn erasing_bank(&mut self, bank: Bank);

    /// Called after each sector of the bank is erased
    fn erase_progress(&mut self, percent: u32);

    /// Called before a chip erase
    fn erasing_chip(&mut self);

    /// Called once the chip erase has completed
    fn chip_erased(&mut self);

    /// Called before programming `total_bytes` of flash
    fn writing(&mut self, total_bytes: u32);

    /// Called as programming advances
    fn write_progress(&mut self, percent: u32);

    /// Called before comparing `total_bytes` of flash
    fn verifying(&mut self, total_bytes: u32);

    /// Called as verification advances
    fn verify_progress(&mut self, percent: u32);

    /// Called when the whole range compared equal
    fn verified(&mut self);
}

/// A no-op progress reporter
pub struct NoProgress;

impl Progress for NoProgress {
    fn erasing_bank(&mut self, _bank: Bank) {}
    fn erase_progress(&mut self, _percent: u32) {}
    fn erasing_chip(&mut self) {}
    fn chip_erased(&mut self) {}
    fn writing(&mut self, _total_bytes: u32) {}
    fn write_progress(&mut self, _percent: u32) {}
    fn verifying(&mut self, _total_bytes: u32) {}
    fn verify_progress(&mut self, _percent: u32) {}
    fn verified(&mut self) {}
}

/// Tracks a percentage and reports only changes
#[derive(Debug, Default)]
pub(crate) struct Percent {
    last: Option<u32>,
}

impl Percent {
    /// Percentage of word `offset` within `span` bytes, if it changed
    ///
    /// The last word (`span - 2`) maps to 100%.
    pub(crate) fn update(&mut self, offset: u32, span: u32) -> Option<u32> {
        let percent = (u64::from(offset) * 100 / u64::from(span - 2)) as u32;
        if self.last == Some(percent) {
            return None;
        }
        self.last = Some(percent);
        Some(percent)
    }
}
