/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

use super::{frequency, Configuration, OutputMode, PictureMode, VideoStandard};

named_enum! {
    /// Named complete configurations for the common broadcast standards.
    pub enum Preset: "preset" {
        Ntsc => "NTSC",
        NtscJ => "NTSC-J",
        Ntsc361 => "NTSC361",
        Ntsc443 => "NTSC443",
        Pal => "PAL",
        PalM => "PAL-M",
        PalN => "PAL-N",
        Pal60 => "PAL60",
        Secam => "SECAM",
        Mono525 => "MONO525",
        Mono625 => "MONO625",
    }
}

/// Everything a preset sets apart from the standard.
const BASE: Configuration = Configuration {
    standard: None,
    output: Some(OutputMode::CCvbsCvbs),
    picture: Some(PictureMode::Normal),
    hshift: None,
    fsc: Some(0.0),
    secam_fb: Some(0.0),
    pedestal: Some(false),
    enable_luma: Some(true),
    enable_chroma: Some(true),
    enable_burst: Some(true),
    enable_sync: Some(true),
    burst_gain: Some(0),
    chroma_gain: Some(0),
    chroma_shift: Some(0),
    ycbcr_input: Some(false),
    limited_range: Some(false),
    sync_adj: Some(0),
    horiz_mask_sif: Some(false),
    horiz_mask_linear: Some(false),
};

/// Subcarrier of the fake "PAL-M" firmware generates with `sdtv_mode=3`.
const NTSC_361_HZ: f64 = 3_610_402.169_405;

impl Preset {
    pub const fn configuration(self) -> Configuration {
        match self {
            Self::Ntsc => Configuration {
                standard: Some(VideoStandard::Ntsc),
                pedestal: Some(true),
                ..BASE
            },
            Self::NtscJ => Configuration {
                standard: Some(VideoStandard::Ntsc),
                ..BASE
            },
            Self::Ntsc361 => Configuration {
                standard: Some(VideoStandard::Ntsc),
                fsc: Some(NTSC_361_HZ),
                ..BASE
            },
            Self::Ntsc443 => Configuration {
                standard: Some(VideoStandard::Ntsc),
                pedestal: Some(true),
                fsc: Some(frequency::PAL_HZ),
                ..BASE
            },
            Self::Pal => Configuration {
                standard: Some(VideoStandard::Pal),
                ..BASE
            },
            Self::PalM => Configuration {
                standard: Some(VideoStandard::PalM),
                ..BASE
            },
            Self::PalN => Configuration {
                standard: Some(VideoStandard::PalN),
                ..BASE
            },
            Self::Pal60 => Configuration {
                standard: Some(VideoStandard::PalM),
                fsc: Some(frequency::PAL_HZ),
                ..BASE
            },
            Self::Secam => Configuration {
                standard: Some(VideoStandard::Secam),
                ..BASE
            },
            Self::Mono525 => Configuration {
                standard: Some(VideoStandard::Ntsc),
                pedestal: Some(true),
                enable_chroma: Some(false),
                enable_burst: Some(false),
                ..BASE
            },
            Self::Mono625 => Configuration {
                standard: Some(VideoStandard::Pal),
                enable_chroma: Some(false),
                enable_burst: Some(false),
                ..BASE
            },
        }
    }

    pub const fn help(self) -> &'static str {
        match self {
            Self::Ntsc => "NTSC-M (525 lines; North America, South Korea, Taiwan, Philippines etc.)",
            Self::NtscJ => "NTSC-J (525 lines; Japan - no pedestal)",
            Self::Ntsc361 => {
                "NTSC 3.61 (525 lines; broken fake \"PAL-M\" generated by sdtv_mode=3)"
            }
            Self::Ntsc443 => "NTSC 4.43 (525 lines; NTSC playback on PAL VCRs etc.)",
            Self::Pal => {
                "PAL-B/D/G/H/I/K (625 lines; Western Europe, South Asia, Australia, etc.)"
            }
            Self::PalM => "PAL-M (525 lines; Brazil)",
            Self::PalN => "PAL-N (625 lines; Argentina, Paraguay, Uruguay)",
            Self::Pal60 => "PAL60 (525 lines format used by PAL video game consoles etc.)",
            Self::Secam => "SECAM IIIb (625 lines; France, Russia, etc.)",
            Self::Mono525 => "525 lines (\"NTSC\") black & white",
            Self::Mono625 => "625 lines (\"PAL/SECAM\") black & white",
        }
    }

    /// The plain preset of a standard, what a reset goes back to.
    pub const fn for_standard(standard: VideoStandard) -> Self {
        match standard {
            VideoStandard::Ntsc => Self::Ntsc,
            VideoStandard::Pal => Self::Pal,
            VideoStandard::PalM => Self::PalM,
            VideoStandard::PalN => Self::PalN,
            VideoStandard::Secam => Self::Secam,
        }
    }
}
