/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

//! Raspberry Pi composite video encoder (VEC) configuration.
//!
//! The crate locates the VEC and the pixel valve feeding it through the live device tree,
//! maps their register windows from `/dev/mem` and converts between a human-level
//! [`video::Configuration`] and the packed register bitfields.

#![allow(clippy::upper_case_acronyms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod device_tree;
pub mod memory;
pub mod platform;
pub mod session;
pub mod video;

#[cfg(test)]
mod test_support;

pub use session::{Session, SessionConfig};
