/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

pub mod raspberrypi;

pub use raspberrypi::{probe_pixelvalve, vec_address, VideoCoreModel};
