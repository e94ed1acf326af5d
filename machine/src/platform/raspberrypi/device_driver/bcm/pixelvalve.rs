/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

//! Pixel valve: the HVS-to-encoder timing generator in front of the VEC.
//!
//! Register layout after drivers/gpu/drm/vc4/vc4_regs.h in the Linux tree.

use {
    super::super::common::RegisterWindow,
    core::mem::offset_of,
    tock_registers::{register_bitfields, register_structs, registers::ReadWrite},
};

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

register_structs! {
    #[allow(non_snake_case)]
    RegisterBlock {
        (0x00 => pub CONTROL: ReadWrite<u32, CONTROL::Register>),
        (0x04 => __reserved_1),
        (0x0c => pub HORZA: ReadWrite<u32, HORZA::Register>),
        (0x10 => pub HORZB: ReadWrite<u32, HORZB::Register>),
        (0x14 => @END),
    }
}

/// Byte offsets into the window, taken from the layout above.
mod offset {
    use super::{offset_of, RegisterBlock};

    pub const CONTROL: usize = offset_of!(RegisterBlock, CONTROL);
    pub const HORZA: usize = offset_of!(RegisterBlock, HORZA);
    pub const HORZB: usize = offset_of!(RegisterBlock, HORZB);
}

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

register_bitfields! {
    u32,

    /// Pixel valve control
    pub CONTROL [
        /// Which encoder the pixel valve clocks pixels out to.
        CLK_SELECT OFFSET(2) NUMBITS(2) [
            DpiSmiHdmi = 0,
            Dsi = 1,
            Vec = 2
        ],
        FIFO_CLR OFFSET(1) NUMBITS(1) [],
        EN OFFSET(0) NUMBITS(1) []
    ],

    /// Horizontal timing, first half
    pub HORZA [
        /// Back porch, in pixels
        HBP OFFSET(16) NUMBITS(16) [],
        /// Sync pulse width, in pixels
        HSYNC OFFSET(0) NUMBITS(16) []
    ],

    /// Horizontal timing, second half
    pub HORZB [
        /// Front porch, in pixels
        HFP OFFSET(16) NUMBITS(16) [],
        /// Active line width, in pixels
        HACTIVE OFFSET(0) NUMBITS(16) []
    ]
}

/// Pixel valve registers in a mapped window.
pub struct PixelValve<W> {
    window: W,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl<W: RegisterWindow> PixelValve<W> {
    pub fn new(window: W) -> Self {
        Self { window }
    }

    pub fn control(&self) -> u32 {
        self.window.read(offset::CONTROL)
    }

    pub fn horza(&self) -> u32 {
        self.window.read(offset::HORZA)
    }

    pub fn set_horza(&self, value: u32) {
        self.window.write(offset::HORZA, value)
    }

    pub fn horzb(&self) -> u32 {
        self.window.read(offset::HORZB)
    }

    pub fn set_horzb(&self, value: u32) {
        self.window.write(offset::HORZB, value)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::platform::raspberrypi::device_driver::MemoryWindow,
        tock_registers::LocalRegisterCopy,
    };

    #[test]
    fn accessors_hit_documented_offsets() {
        let window = MemoryWindow::with_registers(&[(0x00, 0x8), (0x0c, 0x003c_0040)]);
        let pv = PixelValve::new(&window);
        assert_eq!(pv.control(), 0x8);
        assert_eq!(pv.horza(), 0x003c_0040);

        pv.set_horzb(0x000e_02d0);
        assert_eq!(window.read(0x10), 0x000e_02d0);
    }

    #[test]
    fn vec_clock_select_pattern() {
        for raw in [0x0000_0008, 0x0000_0009, 0x0000_000b] {
            let control = LocalRegisterCopy::<u32, CONTROL::Register>::new(raw);
            assert!(control.matches_all(CONTROL::CLK_SELECT::Vec), "{raw:#x}");
        }
        for raw in [0x0000_0000, 0x0000_0001, 0x0000_0004, 0x0000_000c, 0x0000_000d] {
            let control = LocalRegisterCopy::<u32, CONTROL::Register>::new(raw);
            assert!(!control.matches_all(CONTROL::CLK_SELECT::Vec), "{raw:#x}");
        }
    }

    #[test]
    fn layout_offsets() {
        assert_eq!(offset::CONTROL, 0x00);
        assert_eq!(offset::HORZA, 0x0c);
        assert_eq!(offset::HORZB, 0x10);
    }
}
