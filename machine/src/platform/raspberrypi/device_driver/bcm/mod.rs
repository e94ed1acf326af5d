/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

//! BCM driver top level.

pub mod pixelvalve;
pub mod vec;

pub use {pixelvalve::PixelValve, vec::VideoEncoder};
