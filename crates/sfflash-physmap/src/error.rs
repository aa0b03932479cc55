//! Error types for physical memory access

use std::io;
use thiserror::Error;

/// Physical mapping errors
#[derive(Debug, Error)]
pub enum PhysMapError {
    /// Failed to open the memory device
    #[error("Failed to open {path}: {source}")]
    Open {
        path: &'static str,
        #[source]
        source: io::Error,
    },

    /// Failed to map a physical range
    #[error("Failed to map memory at {address:#x} (size {size:#x}): {source}")]
    Map {
        address: u64,
        size: usize,
        #[source]
        source: io::Error,
    },

    /// Mapping is smaller than the flash window
    #[error("Mapping of {size:#x} bytes is smaller than the {required:#x} byte flash window")]
    WindowTooSmall { size: usize, required: usize },

    /// Operation not supported on this platform
    #[error("Not supported: {0}")]
    NotSupported(&'static str),
}

/// Result type for physical mapping operations
pub type Result<T> = std::result::Result<T, PhysMapError>;
