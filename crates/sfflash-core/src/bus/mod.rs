//! Flash window access
//!
//! This module defines the trait through which every read and write of the
//! memory-mapped flash array happens.

mod traits;

pub use traits::*;
