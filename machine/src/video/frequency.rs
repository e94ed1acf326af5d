/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

//! Subcarrier frequencies and their 32-bit control words.
//!
//! The VEC synthesizes the subcarrier from its 27 MHz clock with a 32-bit phase accumulator,
//! so a control word is the fraction of a clock cycle the phase advances by per tick.

use {
    super::{ConfigError, FrequencyOutOfRangeSnafu},
    snafu::ensure,
};

/// VEC pixel clock.
pub const REFERENCE_CLOCK_HZ: f64 = 27_000_000.0;

const WORD_SCALE: f64 = 4_294_967_296.0;

/// 227.5 * fH
pub const NTSC_HZ: f64 = 3_579_545.0 + 5.0 / 11.0;
/// 283.7516 * fH
pub const PAL_HZ: f64 = 4_433_618.75;
/// 227.25 * fH
pub const PAL_M_HZ: f64 = 3_575_611.0 + 127.0 / 143.0;
/// 229.2516 * fH
pub const PAL_N_HZ: f64 = 3_582_056.25;
/// 282 * fH
pub const SECAM_DR_HZ: f64 = 4_406_250.0;
/// 272 * fH
pub const SECAM_DB_HZ: f64 = 4_250_000.0;

pub fn word_to_hz(word: u32) -> f64 {
    f64::from(word) * REFERENCE_CLOCK_HZ / WORD_SCALE
}

/// Nearest control word for `hz`. The word has to fit in 32 bits, `name` is the field
/// reported otherwise.
pub fn hz_to_word(name: &'static str, hz: f64) -> Result<u32, ConfigError> {
    let word = (hz * WORD_SCALE / REFERENCE_CLOCK_HZ + 0.5).floor();
    ensure!(
        (0.0..WORD_SCALE).contains(&word),
        FrequencyOutOfRangeSnafu {
            name,
            limit: REFERENCE_CLOCK_HZ as u32,
        }
    );
    Ok(word as u32)
}

/// Control word for a requested subcarrier, where zero or less asks for `default`.
pub fn subcarrier_word(name: &'static str, hz: f64, default: f64) -> Result<u32, ConfigError> {
    hz_to_word(name, if hz <= 0.0 { default } else { hz })
}
