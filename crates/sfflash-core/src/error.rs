//! Error types for sfflash-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Details about a verification failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyFailure {
    /// Flash offset of the first differing word
    pub address: u32,
    /// Word the source image holds at this position
    pub expected: u16,
    /// Word read back from the chip
    pub found: u16,
}

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The expansion board carrying the flash was not found
    DeviceNotFound,
    /// Manufacturer ID read in identification mode does not match
    IdentityMismatch {
        /// Manufacturer ID the board is expected to carry
        expected: u16,
        /// Manufacturer ID actually read
        found: u16,
    },
    /// Image length is not one of the accepted ROM sizes
    BadImageSize(usize),
    /// Flash contents differ from the source image
    Verify(VerifyFailure),
    /// Completion poll gave up (only with a bounded poll mode)
    PollTimeout {
        /// Flash offset that was being polled
        address: u32,
    },
}

impl fmt::Display for VerifyFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "verification failed at {:06x} - expected {:04X} but read {:04X}",
            self.address, self.expected, self.found
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceNotFound => write!(f, "flash board not found"),
            Self::IdentityMismatch { expected, found } => write!(
                f,
                "expected to see manufacturer id {:04X} but got {:04X} instead",
                expected, found
            ),
            Self::BadImageSize(len) => write!(
                f,
                "bad image size ({} bytes), 256K/512K/1M ROM required",
                len
            ),
            Self::Verify(failure) => write!(f, "{}", failure),
            Self::PollTimeout { address } => {
                write!(f, "flash did not complete operation at {:06x}", address)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl From<VerifyFailure> for Error {
    fn from(failure: VerifyFailure) -> Self {
        Self::Verify(failure)
    }
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
