//! Protocol implementations
//!
//! This module contains the SST39 command set: the Software Data Protection
//! unlock sequence, command dispatch and toggle-bit completion polling.

pub mod commands;
mod sdp;
mod status;

pub use sdp::*;
pub use status::Status;
