//! High-level flash operations
//!
//! This module provides the bank level operations (erase, program, verify)
//! built on the chip driver, together with the image size policy that
//! decides how an image is laid out across the banks.

mod image;
mod operations;
mod progress;

pub use image::*;
pub use operations::*;
pub use progress::*;
