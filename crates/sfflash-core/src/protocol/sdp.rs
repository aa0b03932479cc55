//! SST39 command sequences over a mapped flash window
//!
//! Every state-changing command must be preceded by the Software Data
//! Protection unlock sequence. Program and erase are followed by a toggle-bit
//! poll of the address that was touched, so every call here returns only once
//! the chip is idle again.

use log::trace;

use crate::bus::{window_offset, FlashBus};
use crate::chip::{sector_base, DeviceId};
use crate::error::{Error, Result};

use super::commands::{self, *};
use super::status::Status;

/// How long to wait for the toggle bit to settle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollMode {
    /// Poll until the chip reports completion, however long it takes
    ///
    /// A chip that never settles (removed, unpowered) hangs the caller.
    #[default]
    Unbounded,
    /// Give up with [`Error::PollTimeout`] after this many read pairs
    Bounded(u32),
}

/// Driver for an SST39 chip behind a [`FlashBus`]
///
/// The driver knows nothing about banks or images; see [`crate::flash`] for
/// the operations built on top of it.
#[derive(Debug)]
pub struct SdpFlash<B> {
    bus: B,
    poll_mode: PollMode,
}

impl<B: FlashBus> SdpFlash<B> {
    /// Create a driver that polls without a limit
    pub fn new(bus: B) -> Self {
        Self::with_poll(bus, PollMode::Unbounded)
    }

    /// Create a driver with an explicit poll mode
    pub fn with_poll(bus: B, poll_mode: PollMode) -> Self {
        Self { bus, poll_mode }
    }

    /// The poll mode in use
    pub fn poll_mode(&self) -> PollMode {
        self.poll_mode
    }

    /// Borrow the underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Mutably borrow the underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Release the underlying bus
    pub fn into_inner(self) -> B {
        self.bus
    }

    /// Send the SDP unlock sequence
    pub fn unlock(&mut self) {
        self.bus.write16(ADDR_CMD_STEP_1, SDP_STEP_1);
        self.bus.write16(ADDR_CMD_STEP_2, SDP_STEP_2);
    }

    /// Write a command word to the first command address
    ///
    /// Commands that change the array must be preceded by [`Self::unlock`].
    pub fn command(&mut self, code: u16) {
        trace!("flash command {} ({:04X})", commands::command_name(code), code);
        self.bus.write16(ADDR_CMD_STEP_1, code);
    }

    /// Read the manufacturer and device IDs
    ///
    /// The chip is always returned to array read mode before this returns.
    pub fn identify(&mut self) -> DeviceId {
        self.unlock();
        self.command(ID_ENTRY);
        let manufacturer = self.bus.read16(ADDR_MANUFACTURER);
        let device = self.bus.read16(ADDR_DEVICE);
        self.command(ID_EXIT);

        let id = DeviceId::new(manufacturer, device);
        trace!("flash identify: {}", id);
        id
    }

    /// Read one word of the array
    pub fn read_word(&mut self, address: u32) -> u16 {
        self.bus.read16(window_offset(address))
    }

    /// Program one word and wait for completion
    pub fn write_word(&mut self, address: u32, value: u16) -> Result<()> {
        let address = window_offset(address);
        self.unlock();
        self.command(WORD_PROGRAM);
        self.bus.write16(address, value);
        self.poll(address).map(|_| ())
    }

    /// Erase one sector and wait for completion
    pub fn erase_sector(&mut self, sector: u32) -> Result<()> {
        let address = window_offset(sector_base(sector));
        trace!("erase sector {} at {:06x}", sector, address);
        self.unlock();
        self.command(ERASE);
        self.unlock();
        self.bus.write16(address, ERASE_SECTOR);
        self.poll(address).map(|_| ())
    }

    /// Erase the whole chip and wait for completion
    pub fn erase_chip(&mut self) -> Result<()> {
        self.unlock();
        self.command(ERASE);
        self.unlock();
        self.command(ERASE_CHIP);
        self.poll(0).map(|_| ())
    }

    /// Wait until the toggle bit at `address` stops toggling
    ///
    /// Reads the address twice per iteration and finishes when bit 6 is the
    /// same in both reads. Returns the number of read pairs taken.
    pub fn poll(&mut self, address: u32) -> Result<u32> {
        let address = window_offset(address);
        let mut iterations: u32 = 0;

        loop {
            let first = self.bus.read16(address);
            let second = self.bus.read16(address);
            iterations = iterations.saturating_add(1);

            if Status::settled(first, second) {
                trace!("poll {:06x} settled after {} iterations", address, iterations);
                return Ok(iterations);
            }

            if let PollMode::Bounded(limit) = self.poll_mode {
                if iterations >= limit {
                    return Err(Error::PollTimeout { address });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::chip::FLASH_SIZE;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Access {
        Read(u32),
        Write(u32, u16),
    }

    /// Bus that records every access and toggles bit 6 for a number of reads
    #[derive(Default)]
    struct ScriptedBus {
        log: Vec<Access>,
        /// Reads that still return a toggling status
        toggling_reads: u32,
        /// Never stop toggling
        stuck: bool,
        toggle: bool,
        /// Words returned for settled reads, keyed by offset
        words: Vec<(u32, u16)>,
    }

    impl ScriptedBus {
        fn toggling(reads: u32) -> Self {
            Self {
                toggling_reads: reads,
                ..Self::default()
            }
        }

        fn writes(&self) -> Vec<(u32, u16)> {
            self.log
                .iter()
                .filter_map(|a| match *a {
                    Access::Write(addr, value) => Some((addr, value)),
                    Access::Read(_) => None,
                })
                .collect()
        }

        fn reads(&self) -> usize {
            self.log
                .iter()
                .filter(|a| matches!(a, Access::Read(_)))
                .count()
        }
    }

    impl FlashBus for ScriptedBus {
        fn read16(&mut self, offset: u32) -> u16 {
            self.log.push(Access::Read(offset));
            if self.stuck || self.toggling_reads > 0 {
                self.toggling_reads = self.toggling_reads.saturating_sub(1);
                self.toggle = !self.toggle;
                return if self.toggle { 0x0040 } else { 0x0000 };
            }
            self.words
                .iter()
                .find(|(addr, _)| *addr == offset)
                .map(|(_, w)| *w)
                .unwrap_or(0xFFFF)
        }

        fn write16(&mut self, offset: u32, value: u16) {
            self.log.push(Access::Write(offset, value));
        }
    }

    const UNLOCK: [(u32, u16); 2] = [(0xAAA, 0xAAAA), (0x554, 0x5555)];

    #[test]
    fn test_command_addresses() {
        assert_eq!(ADDR_CMD_STEP_1, 0xAAA);
        assert_eq!(ADDR_CMD_STEP_2, 0x554);
    }

    #[test]
    fn test_unlock_sequence() {
        let mut flash = SdpFlash::new(ScriptedBus::default());
        flash.unlock();
        assert_eq!(flash.bus().writes(), UNLOCK.to_vec());
    }

    #[test]
    fn test_write_word_sequence() {
        let mut flash = SdpFlash::new(ScriptedBus::default());
        flash.write_word(0x8_1234, 0xBEEF).unwrap();

        let mut expected = UNLOCK.to_vec();
        expected.push((0xAAA, 0xA0A0));
        expected.push((0x8_1234, 0xBEEF));
        assert_eq!(flash.bus().writes(), expected);
        // Polled at the programmed address
        assert_eq!(flash.bus().log.last(), Some(&Access::Read(0x8_1234)));
    }

    #[test]
    fn test_write_word_masks_address() {
        let mut flash = SdpFlash::new(ScriptedBus::default());
        flash.write_word(FLASH_SIZE + 0x10, 0x1234).unwrap();
        assert_eq!(flash.bus().writes()[3], (0x10, 0x1234));
    }

    #[test]
    fn test_erase_sector_sequence() {
        let mut flash = SdpFlash::new(ScriptedBus::default());
        flash.erase_sector(129).unwrap();

        let mut expected = UNLOCK.to_vec();
        expected.push((0xAAA, 0x8080));
        expected.extend_from_slice(&UNLOCK);
        expected.push((0x8_1000, 0x5050));
        assert_eq!(flash.bus().writes(), expected);
        assert_eq!(flash.bus().log.last(), Some(&Access::Read(0x8_1000)));
    }

    #[test]
    fn test_erase_chip_sequence() {
        let mut flash = SdpFlash::new(ScriptedBus::default());
        flash.erase_chip().unwrap();

        let mut expected = UNLOCK.to_vec();
        expected.push((0xAAA, 0x8080));
        expected.extend_from_slice(&UNLOCK);
        expected.push((0xAAA, 0x1010));
        assert_eq!(flash.bus().writes(), expected);
        assert_eq!(flash.bus().log.last(), Some(&Access::Read(0)));
    }

    #[test]
    fn test_identify_expected_manufacturer() {
        let bus = ScriptedBus {
            words: [(0, 0x00BF), (2, 0x2781)].to_vec(),
            ..ScriptedBus::default()
        };
        let mut flash = SdpFlash::new(bus);
        let id = flash.identify();

        assert_eq!(id, DeviceId::new(0x00BF, 0x2781));
        assert!(id.matches_expected());

        let mut expected = UNLOCK.to_vec();
        expected.push((0xAAA, 0x9090));
        expected.push((0xAAA, 0xF0F0));
        assert_eq!(flash.bus().writes(), expected);
    }

    #[test]
    fn test_identify_other_manufacturer_still_reports_device() {
        let bus = ScriptedBus {
            words: [(0, 0x0001), (2, 0x22DA)].to_vec(),
            ..ScriptedBus::default()
        };
        let mut flash = SdpFlash::new(bus);
        let id = flash.identify();

        assert!(!id.matches_expected());
        assert_eq!(id.device, 0x22DA);
        // ID mode is left even on mismatch
        assert_eq!(flash.bus().writes().last(), Some(&(0xAAA, 0xF0F0)));
    }

    #[test]
    fn test_poll_settled_immediately() {
        let mut flash = SdpFlash::new(ScriptedBus::default());
        assert_eq!(flash.poll(0x100).unwrap(), 1);
        assert_eq!(flash.bus().reads(), 2);
    }

    #[test]
    fn test_poll_counts_iterations() {
        // Four toggling reads: two pairs with differing bit 6, then settled
        let mut flash = SdpFlash::new(ScriptedBus::toggling(4));
        assert_eq!(flash.poll(0x100).unwrap(), 3);
        assert_eq!(flash.bus().reads(), 6);

        let mut flash = SdpFlash::new(ScriptedBus::toggling(20));
        assert_eq!(flash.poll(0x100).unwrap(), 11);
    }

    #[test]
    fn test_poll_reads_same_address() {
        let mut flash = SdpFlash::new(ScriptedBus::toggling(6));
        flash.poll(FLASH_SIZE + 0x42).unwrap();
        assert!(flash.bus().log.iter().all(|a| *a == Access::Read(0x42)));
    }

    #[test]
    fn test_poll_never_settles() {
        let bus = ScriptedBus {
            stuck: true,
            ..ScriptedBus::default()
        };
        let mut flash = SdpFlash::with_poll(bus, PollMode::Bounded(1000));
        assert_eq!(
            flash.poll(0x8_0000),
            Err(Error::PollTimeout { address: 0x8_0000 })
        );
        assert_eq!(flash.bus().reads(), 2000);
    }

    #[test]
    fn test_write_word_propagates_timeout() {
        let bus = ScriptedBus {
            stuck: true,
            ..ScriptedBus::default()
        };
        let mut flash = SdpFlash::with_poll(bus, PollMode::Bounded(3));
        assert_eq!(
            flash.write_word(0x20, 0),
            Err(Error::PollTimeout { address: 0x20 })
        );
    }
}
