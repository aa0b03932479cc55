//! Flash chip geometry and identity
//!
//! This module describes the fixed layout of the flash on the board (window,
//! banks, sectors) and the identification data used to recognise the chip.

mod geometry;
mod identity;

pub use geometry::*;
pub use identity::*;
