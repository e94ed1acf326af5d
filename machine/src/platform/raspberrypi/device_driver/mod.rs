/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

pub mod bcm;
pub mod common;

pub use common::{MemoryWindow, RegisterWindow, WINDOW_SIZE};
