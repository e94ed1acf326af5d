/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

//! Pixel valve horizontal timing and the picture shift derived from it.
//!
//! The VEC only accepts the 720 pixel active line of BT.601, so the horizontal position of the
//! picture is moved by trading pixels between the front and back porch. Half pixel steps come
//! from the VEC's own Y/C delay bit.

use {
    super::{ConfigError, ShiftOutOfRangeSnafu, UnknownTimingSnafu},
    crate::platform::raspberrypi::device_driver::bcm::pixelvalve::{HORZA, HORZB},
    core::ops::RangeInclusive,
    snafu::ensure,
    tock_registers::LocalRegisterCopy,
};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// One line of pixel valve timing, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HorizontalTiming {
    pub back_porch: u32,
    pub sync: u32,
    pub front_porch: u32,
    pub active: u32,
}

/// A horizontal picture shift split into whole pixels and the half pixel delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelShift {
    pub pixels: i64,
    pub half_pixel: bool,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl HorizontalTiming {
    pub const NOMINAL_BACK_PORCH: u32 = 60;
    pub const NOMINAL_SYNC: u32 = 64;
    pub const NOMINAL_ACTIVE: u32 = 720;

    /// Total line width of 525-line timing.
    pub const TOTAL_525: u32 = 858;
    /// Total line width of 625-line timing.
    pub const TOTAL_625: u32 = 864;

    pub fn from_registers(horza: u32, horzb: u32) -> Self {
        let horza = LocalRegisterCopy::<u32, HORZA::Register>::new(horza);
        let horzb = LocalRegisterCopy::<u32, HORZB::Register>::new(horzb);
        Self {
            back_porch: horza.read(HORZA::HBP),
            sync: horza.read(HORZA::HSYNC),
            front_porch: horzb.read(HORZB::HFP),
            active: horzb.read(HORZB::HACTIVE),
        }
    }

    /// HORZA and HORZB values.
    pub fn to_registers(&self) -> (u32, u32) {
        let horza = HORZA::HBP.val(self.back_porch) + HORZA::HSYNC.val(self.sync);
        let horzb = HORZB::HFP.val(self.front_porch) + HORZB::HACTIVE.val(self.active);
        (horza.value, horzb.value)
    }

    pub fn total(&self) -> u32 {
        self.back_porch + self.sync + self.front_porch + self.active
    }

    /// Unshifted timing for a line of `total` pixels.
    pub fn nominal(total: u32) -> Result<Self, ConfigError> {
        let front_porch = match total {
            Self::TOTAL_525 => 14,
            Self::TOTAL_625 => 20,
            _ => return UnknownTimingSnafu { total }.fail(),
        };
        Ok(Self {
            back_porch: Self::NOMINAL_BACK_PORCH,
            sync: Self::NOMINAL_SYNC,
            front_porch,
            active: Self::NOMINAL_ACTIVE,
        })
    }

    /// Whole pixel shifts this timing can absorb.
    pub fn shift_range(&self) -> RangeInclusive<i64> {
        -i64::from(self.back_porch)..=i64::from(self.front_porch)
    }

    /// Timing with the picture moved right by `pixels`.
    pub fn shifted(&self, pixels: i64) -> Result<Self, ConfigError> {
        let range = self.shift_range();
        ensure!(
            range.contains(&pixels),
            ShiftOutOfRangeSnafu {
                value: pixels,
                min: *range.start(),
                max: *range.end(),
            }
        );
        Ok(Self {
            back_porch: (i64::from(self.back_porch) + pixels) as u32,
            front_porch: (i64::from(self.front_porch) - pixels) as u32,
            ..*self
        })
    }

    /// Shift of this timing relative to the nominal back porch, in pixels.
    pub fn shift(&self, half_pixel: bool) -> f64 {
        PixelShift {
            pixels: i64::from(self.back_porch) - i64::from(Self::NOMINAL_BACK_PORCH),
            half_pixel,
        }
        .to_pixels()
    }
}

impl PixelShift {
    /// Rounds `pixels` to the nearest half pixel.
    pub fn from_pixels(pixels: f64) -> Self {
        let halves = (pixels * 2.0 + 0.5).floor() as i64;
        Self {
            pixels: halves.div_euclid(2),
            half_pixel: halves.rem_euclid(2) == 1,
        }
    }

    pub fn to_pixels(self) -> f64 {
        self.pixels as f64 + if self.half_pixel { 0.5 } else { 0.0 }
    }
}
