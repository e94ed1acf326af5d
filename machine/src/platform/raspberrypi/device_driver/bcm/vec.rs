/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

//! VEC, the composite (and S-Video/component) video encoder.
//!
//! Offsets follow drivers/gpu/drm/vc4/vc4_vec.c, bit meanings were worked out by poking at
//! the hardware and may not match Broadcom's naming.

use {
    super::super::common::{RegisterWindow, WINDOW_SIZE},
    core::mem::{offset_of, size_of},
    static_assertions::const_assert,
    tock_registers::{register_bitfields, register_structs, registers::ReadWrite},
};

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

register_structs! {
    #[allow(non_snake_case)]
    RegisterBlock {
        (0x000 => __reserved_1),
        (0x104 => pub CONFIG0: ReadWrite<u32, CONFIG0::Register>),
        (0x108 => __reserved_2),
        (0x180 => pub FREQ3_2: ReadWrite<u32>),
        (0x184 => pub FREQ1_0: ReadWrite<u32>),
        (0x188 => pub CONFIG1: ReadWrite<u32, CONFIG1::Register>),
        (0x18c => pub CONFIG2: ReadWrite<u32, CONFIG2::Register>),
        (0x190 => __reserved_3),
        (0x198 => pub FCW_SECAM_B: ReadWrite<u32>),
        (0x19c => __reserved_4),
        (0x1a0 => pub CONFIG3: ReadWrite<u32, CONFIG3::Register>),
        (0x1a4 => __reserved_5),
        (0x208 => pub CFG: ReadWrite<u32, CFG::Register>),
        (0x20c => @END),
    }
}

const_assert!(size_of::<RegisterBlock>() <= WINDOW_SIZE);

/// Byte offsets into the window, taken from the layout above.
mod offset {
    use super::{offset_of, RegisterBlock};

    pub const CONFIG0: usize = offset_of!(RegisterBlock, CONFIG0);
    pub const FREQ3_2: usize = offset_of!(RegisterBlock, FREQ3_2);
    pub const FREQ1_0: usize = offset_of!(RegisterBlock, FREQ1_0);
    pub const CONFIG1: usize = offset_of!(RegisterBlock, CONFIG1);
    pub const CONFIG2: usize = offset_of!(RegisterBlock, CONFIG2);
    pub const FCW_SECAM_B: usize = offset_of!(RegisterBlock, FCW_SECAM_B);
    pub const CONFIG3: usize = offset_of!(RegisterBlock, CONFIG3);
    pub const CFG: usize = offset_of!(RegisterBlock, CFG);
}

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Video standard bits of CONFIG0. Not contiguous, so it can't be a bitfield.
pub const CONFIG0_STD_MASK: u32 = 0x0020_0003;

register_bitfields! {
    u32,

    pub CONFIG0 [
        /// Luma delay, in pixels (?)
        YDEL OFFSET(26) NUMBITS(3) [],
        /// Chroma delay, in pixels (?)
        CDEL OFFSET(24) NUMBITS(2) [],
        CHROMA_GAIN OFFSET(16) NUMBITS(2) [],
        CBURST_GAIN OFFSET(13) NUMBITS(2) [],
        /// Sync disable
        SYNCDIS OFFSET(9) NUMBITS(1) [],
        /// Colour burst disable, chroma is still encoded in the active picture
        BURDIS OFFSET(8) NUMBITS(1) [],
        /// Chroma disable, only Y is encoded but the burst stays
        CHRDIS OFFSET(7) NUMBITS(1) [],
        /// 525-line pedestal
        PDEN OFFSET(6) NUMBITS(1) [],
        /// Shifts the picture about half a pixel to the right
        YCDELAY OFFSET(4) NUMBITS(1) [],
        /// Horizontal gradient test picture
        RAMPEN OFFSET(3) NUMBITS(1) []
    ],

    pub CONFIG1 [
        /// Limited range (RGB219) input
        RGB219 OFFSET(17) NUMBITS(1) [],
        /// Colour bars test picture
        CBAR_EN OFFSET(16) NUMBITS(1) [],
        /// DAC output routing
        OUTPUT_MODE OFFSET(10) NUMBITS(3) [],
        /// Treat pixel valve data as YCbCr instead of RGB
        YCBCR_IN OFFSET(6) NUMBITS(1) [],
        /// Luma disable
        LUMADIS OFFSET(2) NUMBITS(1) [],
        /// Use FREQ3_2/FREQ1_0 instead of the standard's subcarrier frequency
        CUSTOM_FREQ OFFSET(0) NUMBITS(1) []
    ],

    pub CONFIG2 [
        PROG_SCAN OFFSET(15) NUMBITS(1) [],
        SYNC_ADJ OFFSET(12) NUMBITS(3) []
    ],

    pub CONFIG3 [
        /// Use a soft edge on the active picture instead of a hard cut
        NON_LINEAR OFFSET(1) NUMBITS(1) [],
        /// Limit active picture width to MPEG-1 SIF
        HORIZ_LEN_MPEG1_SIF OFFSET(0) NUMBITS(1) []
    ],

    pub CFG [
        /// Signal generator test pattern
        SG_MODE OFFSET(5) NUMBITS(2) [],
        /// Signal generator enable
        SG_EN OFFSET(4) NUMBITS(1) [],
        VEC_EN OFFSET(3) NUMBITS(1) [],
        ENABLE OFFSET(1) NUMBITS(1) []
    ]
}

/// VEC registers in a mapped window.
pub struct VideoEncoder<W> {
    window: W,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl<W: RegisterWindow> VideoEncoder<W> {
    pub fn new(window: W) -> Self {
        Self { window }
    }

    pub fn config0(&self) -> u32 {
        self.window.read(offset::CONFIG0)
    }

    pub fn set_config0(&self, value: u32) {
        self.window.write(offset::CONFIG0, value)
    }

    /// Subcarrier frequency control word, assembled from its two 16-bit halves.
    pub fn frequency_word(&self) -> u32 {
        (self.window.read(offset::FREQ3_2) << 16) | (self.window.read(offset::FREQ1_0) & 0xffff)
    }

    pub fn set_frequency_word(&self, word: u32) {
        self.window.write(offset::FREQ3_2, word >> 16);
        self.window.write(offset::FREQ1_0, word & 0xffff);
    }

    pub fn config1(&self) -> u32 {
        self.window.read(offset::CONFIG1)
    }

    pub fn set_config1(&self, value: u32) {
        self.window.write(offset::CONFIG1, value)
    }

    pub fn config2(&self) -> u32 {
        self.window.read(offset::CONFIG2)
    }

    pub fn set_config2(&self, value: u32) {
        self.window.write(offset::CONFIG2, value)
    }

    /// SECAM Db subcarrier frequency control word.
    pub fn secam_b_frequency_word(&self) -> u32 {
        self.window.read(offset::FCW_SECAM_B)
    }

    pub fn set_secam_b_frequency_word(&self, word: u32) {
        self.window.write(offset::FCW_SECAM_B, word)
    }

    pub fn config3(&self) -> u32 {
        self.window.read(offset::CONFIG3)
    }

    pub fn set_config3(&self, value: u32) {
        self.window.write(offset::CONFIG3, value)
    }

    pub fn cfg(&self) -> u32 {
        self.window.read(offset::CFG)
    }

    pub fn set_cfg(&self, value: u32) {
        self.window.write(offset::CFG, value)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::platform::raspberrypi::device_driver::MemoryWindow};

    #[test]
    fn frequency_word_is_split_in_halves() {
        let window = MemoryWindow::default();
        let vec = VideoEncoder::new(&window);
        vec.set_frequency_word(0x21f0_7c1f);
        assert_eq!(window.read(0x180), 0x21f0);
        assert_eq!(window.read(0x184), 0x7c1f);
        assert_eq!(vec.frequency_word(), 0x21f0_7c1f);
    }

    #[test]
    fn frequency_low_half_ignores_upper_bits() {
        let window = MemoryWindow::with_registers(&[(0x180, 0x1234), (0x184, 0xffff_5678)]);
        assert_eq!(VideoEncoder::new(&window).frequency_word(), 0x1234_5678);
    }

    #[test]
    fn config_registers_at_documented_offsets() {
        let window = MemoryWindow::default();
        let vec = VideoEncoder::new(&window);
        vec.set_config0(1);
        vec.set_config1(2);
        vec.set_config2(3);
        vec.set_secam_b_frequency_word(4);
        vec.set_config3(5);
        vec.set_cfg(6);
        for (offset, value) in [
            (0x104, 1),
            (0x188, 2),
            (0x18c, 3),
            (0x198, 4),
            (0x1a0, 5),
            (0x208, 6),
        ] {
            assert_eq!(window.read(offset), value, "offset {offset:#x}");
        }
    }
}
