//! Chip identification data

use core::fmt;

use crate::error::Error;

/// Manufacturer ID of the expected chip family (SST)
pub const EXPECTED_MANUFACTURER: u16 = 0x00BF;

/// Known SST39 parts, keyed by device ID as read on the x16 bus
const KNOWN_DEVICES: &[(u16, &str)] = &[
    (0x2781, "SST39VF800A / SST39LF800A"),
    (0x2782, "SST39VF160"),
    (0x233B, "SST39VF801C / SST39LF801C"),
    (0x233A, "SST39VF802C / SST39LF802C"),
];

/// Manufacturer and device IDs read from the chip in identification mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceId {
    /// Manufacturer ID (word at offset 0)
    pub manufacturer: u16,
    /// Device ID (word at offset 2)
    pub device: u16,
}

impl DeviceId {
    /// Create a new device identity
    pub const fn new(manufacturer: u16, device: u16) -> Self {
        Self {
            manufacturer,
            device,
        }
    }

    /// Whether the manufacturer is the expected chip family
    pub const fn matches_expected(&self) -> bool {
        self.manufacturer == EXPECTED_MANUFACTURER
    }

    /// The error describing a manufacturer mismatch for this identity
    pub const fn mismatch(&self) -> Error {
        Error::IdentityMismatch {
            expected: EXPECTED_MANUFACTURER,
            found: self.manufacturer,
        }
    }

    /// `Ok(self)` if the manufacturer matches, the mismatch error otherwise
    pub const fn check(self) -> Result<Self, Error> {
        if self.matches_expected() {
            Ok(self)
        } else {
            Err(self.mismatch())
        }
    }

    /// Part name, when the device ID is a known one
    pub fn name(&self) -> Option<&'static str> {
        if !self.matches_expected() {
            return None;
        }
        KNOWN_DEVICES
            .iter()
            .find(|(id, _)| *id == self.device)
            .map(|(_, name)| *name)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Manufacturer: {:04X}, Device: {:04X}",
            self.manufacturer, self.device
        )
    }
}
