//! sfflash-dummy - In-memory SST39 flash emulator for testing
//!
//! This crate provides a flash bus that emulates the SST39 command set in
//! memory: the SDP unlock handshake, word program, sector and chip erase,
//! software ID mode and toggle-bit status while an operation is running.
//! It's useful for testing and development without real hardware.

use log::{trace, warn};

use sfflash_core::bus::FlashBus;
use sfflash_core::chip::{sector_of, EXPECTED_MANUFACTURER, FLASH_SIZE, SECTOR_SIZE};
use sfflash_core::protocol::commands::*;
use sfflash_core::protocol::Status;

/// Configuration for the dummy flash
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Manufacturer ID returned in ID mode
    pub manufacturer_id: u16,
    /// Device ID returned in ID mode
    pub device_id: u16,
    /// Word the array holds before anything is erased
    pub initial_fill: u16,
    /// Number of toggling status reads after each program or erase
    pub busy_reads: u32,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: EXPECTED_MANUFACTURER,
            device_id: 0x2781, // SST39VF800A
            initial_fill: 0xFFFF,
            busy_reads: 2,
        }
    }
}

/// Operations the emulated chip carried out, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashEvent {
    /// A word was programmed at a flash offset
    Program {
        /// Flash offset
        address: u32,
        /// Word written
        value: u16,
    },
    /// A sector was erased
    SectorErase {
        /// Sector index
        sector: u32,
    },
    /// The whole chip was erased
    ChipErase,
    /// Software ID mode was entered
    IdEntry,
    /// Software ID mode was left
    IdExit,
}

/// Command state of the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommandState {
    /// Array read mode
    Idle,
    /// First unlock cycle seen
    Unlock1,
    /// Both unlock cycles seen, waiting for a command
    Unlocked,
    /// Word program armed, next write is the data
    Program,
    /// Erase setup, waiting for the second unlock
    EraseSetup,
    /// Erase setup and first unlock cycle seen
    EraseUnlock1,
    /// Erase setup fully unlocked, waiting for the erase type
    EraseUnlocked,
}

/// Dummy flash bus
///
/// Emulates an SST39 chip in memory for testing purposes. Writes that do not
/// follow a valid command sequence are ignored, like on the real chip, and
/// counted in [`DummyFlash::rejected_writes`].
pub struct DummyFlash {
    config: DummyConfig,
    data: Vec<u16>,
    state: CommandState,
    id_mode: bool,
    busy: u32,
    stuck: bool,
    toggle: bool,
    rejected_writes: usize,
    writes_while_busy: usize,
    events: Vec<FlashEvent>,
}

impl DummyFlash {
    /// Create a new dummy flash with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![config.initial_fill; (FLASH_SIZE / 2) as usize];
        Self {
            config,
            data,
            state: CommandState::Idle,
            id_mode: false,
            busy: 0,
            stuck: false,
            toggle: false,
            rejected_writes: 0,
            writes_while_busy: 0,
            events: Vec::new(),
        }
    }

    /// Create a new dummy flash with default configuration (SST39VF800A)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy flash with pre-filled contents
    ///
    /// Bytes are taken pairwise in native order, the way a 16-bit load of
    /// the buffer sees them.
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut flash = Self::new(config);
        for (word, bytes) in flash.data.iter_mut().zip(initial_data.chunks_exact(2)) {
            *word = u16::from_ne_bytes([bytes[0], bytes[1]]);
        }
        flash
    }

    /// Get a reference to the flash words
    pub fn words(&self) -> &[u16] {
        &self.data
    }

    /// Get a mutable reference to the flash words
    pub fn words_mut(&mut self) -> &mut [u16] {
        &mut self.data
    }

    /// Word stored at a flash offset (bypassing the command state)
    pub fn word_at(&self, address: u32) -> u16 {
        self.data[word_index(address)]
    }

    /// Flash contents as bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|w| w.to_ne_bytes()).collect()
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Operations carried out so far
    pub fn events(&self) -> &[FlashEvent] {
        &self.events
    }

    /// Forget recorded operations
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Writes ignored because no valid command sequence preceded them
    pub fn rejected_writes(&self) -> usize {
        self.rejected_writes
    }

    /// Writes that arrived while an operation was still in progress
    pub fn writes_while_busy(&self) -> usize {
        self.writes_while_busy
    }

    /// Make the chip stop responding: the toggle bit never settles again
    pub fn set_stuck(&mut self, stuck: bool) {
        self.stuck = stuck;
    }

    /// Whether an internal operation is still running
    pub fn is_busy(&self) -> bool {
        self.stuck || self.busy > 0
    }

    fn start_operation(&mut self) {
        self.busy = self.config.busy_reads;
    }

    fn reject(&mut self, offset: u32, value: u16) {
        warn!(
            "dummy flash: ignoring write of {:04X} to {:06x} in state {:?}",
            value, offset, self.state
        );
        self.rejected_writes += 1;
        self.state = CommandState::Idle;
    }

    fn program(&mut self, offset: u32, value: u16) {
        trace!("dummy flash: program {:06x} = {:04X}", offset, value);
        // Programming can only clear bits
        self.data[word_index(offset)] &= value;
        self.events.push(FlashEvent::Program {
            address: offset,
            value,
        });
        self.start_operation();
    }

    fn erase_sector(&mut self, offset: u32) {
        let sector = sector_of(offset);
        let start = word_index(sector * SECTOR_SIZE);
        let end = start + (SECTOR_SIZE / 2) as usize;
        trace!("dummy flash: erase sector {}", sector);
        self.data[start..end].fill(0xFFFF);
        self.events.push(FlashEvent::SectorErase { sector });
        self.start_operation();
    }

    fn erase_chip(&mut self) {
        trace!("dummy flash: erase chip");
        self.data.fill(0xFFFF);
        self.events.push(FlashEvent::ChipErase);
        self.start_operation();
    }
}

impl Default for DummyFlash {
    fn default() -> Self {
        Self::new_default()
    }
}

impl FlashBus for DummyFlash {
    fn read16(&mut self, offset: u32) -> u16 {
        let offset = offset % FLASH_SIZE;

        if self.is_busy() {
            self.busy = self.busy.saturating_sub(1);
            self.toggle = !self.toggle;
            return if self.toggle {
                Status::TOGGLE.bits()
            } else {
                0
            };
        }

        if self.id_mode {
            return match offset {
                ADDR_MANUFACTURER => self.config.manufacturer_id,
                ADDR_DEVICE => self.config.device_id,
                _ => 0,
            };
        }

        self.data[word_index(offset)]
    }

    fn write16(&mut self, offset: u32, value: u16) {
        let offset = offset % FLASH_SIZE;

        if self.is_busy() {
            warn!("dummy flash: write to {:06x} while busy", offset);
            self.writes_while_busy += 1;
            return;
        }

        // Exit is accepted in any state except as program data
        if value == ID_EXIT && self.state != CommandState::Program {
            if self.id_mode {
                self.events.push(FlashEvent::IdExit);
            }
            self.id_mode = false;
            self.state = CommandState::Idle;
            return;
        }

        let step1 = offset == ADDR_CMD_STEP_1;
        let step2 = offset == ADDR_CMD_STEP_2;

        self.state = match (self.state, value) {
            (CommandState::Idle, SDP_STEP_1) if step1 => CommandState::Unlock1,
            (CommandState::Unlock1, SDP_STEP_2) if step2 => CommandState::Unlocked,
            (CommandState::Unlocked, WORD_PROGRAM) if step1 => CommandState::Program,
            (CommandState::Unlocked, ERASE) if step1 => CommandState::EraseSetup,
            (CommandState::Unlocked, ID_ENTRY) if step1 => {
                self.id_mode = true;
                self.events.push(FlashEvent::IdEntry);
                CommandState::Idle
            }
            (CommandState::Unlocked, CFI_ENTRY) if step1 => {
                self.id_mode = true;
                CommandState::Idle
            }
            (CommandState::Program, _) => {
                self.program(offset, value);
                CommandState::Idle
            }
            (CommandState::EraseSetup, SDP_STEP_1) if step1 => CommandState::EraseUnlock1,
            (CommandState::EraseUnlock1, SDP_STEP_2) if step2 => CommandState::EraseUnlocked,
            (CommandState::EraseUnlocked, ERASE_SECTOR) => {
                self.erase_sector(offset);
                CommandState::Idle
            }
            (CommandState::EraseUnlocked, ERASE_CHIP) if step1 => {
                self.erase_chip();
                CommandState::Idle
            }
            _ => {
                self.reject(offset, value);
                return;
            }
        };
    }
}

fn word_index(offset: u32) -> usize {
    ((offset % FLASH_SIZE) / 2) as usize
}
