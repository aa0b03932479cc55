//! SST39 command addresses and codes
//!
//! The chip sits on a 16-bit bus with flash A0 wired to CPU A1, so the
//! command addresses are the datasheet word addresses shifted left by one.
//! Command codes are repeated in both bytes of the word.

// ============================================================================
// Command addresses
// ============================================================================

/// First command cycle address (word address 0x555)
pub const ADDR_CMD_STEP_1: u32 = 0x555 << 1;
/// Second command cycle address (word address 0x2AA)
pub const ADDR_CMD_STEP_2: u32 = 0x2AA << 1;

/// Offset of the manufacturer ID in identification mode
pub const ADDR_MANUFACTURER: u32 = 0;
/// Offset of the device ID in identification mode
pub const ADDR_DEVICE: u32 = 2;

// ============================================================================
// Software Data Protection
// ============================================================================

/// First SDP unlock word
pub const SDP_STEP_1: u16 = 0xAAAA;
/// Second SDP unlock word
pub const SDP_STEP_2: u16 = 0x5555;

// ============================================================================
// Commands
// ============================================================================

/// Word program
pub const WORD_PROGRAM: u16 = 0xA0A0;
/// Erase setup (followed by a second unlock and the erase type)
pub const ERASE: u16 = 0x8080;
/// Sector erase, written to the sector base address
pub const ERASE_SECTOR: u16 = 0x5050;
/// Chip erase, written to the first command address
pub const ERASE_CHIP: u16 = 0x1010;
/// Enter software ID mode
pub const ID_ENTRY: u16 = 0x9090;
/// Enter CFI query mode
pub const CFI_ENTRY: u16 = 0x9898;
/// Leave software ID / CFI mode
pub const ID_EXIT: u16 = 0xF0F0;

/// Get a human-readable name for a command word
pub fn command_name(code: u16) -> &'static str {
    match code {
        WORD_PROGRAM => "WORD_PROGRAM",
        ERASE => "ERASE",
        ERASE_SECTOR => "ERASE_SECTOR",
        ERASE_CHIP => "ERASE_CHIP",
        ID_ENTRY => "ID_ENTRY",
        CFI_ENTRY => "CFI_ENTRY",
        ID_EXIT => "ID_EXIT",
        _ => "UNKNOWN",
    }
}
