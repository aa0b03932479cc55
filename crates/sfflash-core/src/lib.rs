//! sfflash-core - Core library for parallel NOR flash programming
//!
//! This crate drives an SST39 style flash chip whose array is exposed through
//! a memory-mapped window, and implements the bank level operations (erase,
//! program, verify) used to replace the ROM images stored on it. It is
//! `no_std` compatible; all hardware access goes through the [`bus::FlashBus`]
//! trait.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap allocation
//!
//! # Example
//!
//! ```ignore
//! use sfflash_core::{chip::Bank, flash, protocol::SdpFlash};
//!
//! fn reflash<B: FlashBus>(bus: B, image: &[u8]) -> sfflash_core::Result<()> {
//!     let mut chip = SdpFlash::new(bus);
//!     let id = chip.identify();
//!     if !id.matches_expected() {
//!         return Err(id.mismatch());
//!     }
//!     flash::program(
//!         &mut chip,
//!         image,
//!         Bank::Bank1.address(),
//!         flash::ProgramOptions::default(),
//!         &mut flash::NoProgress,
//!     )
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod bus;
pub mod chip;
pub mod error;
pub mod flash;
pub mod protocol;

pub use error::{Error, Result};
