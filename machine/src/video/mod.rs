/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

//! Human-level composite video configuration and its VEC register encoding.
//!
//! [`decode`] turns a [`RegisterSnapshot`] into a fully populated [`Configuration`],
//! [`encode`] turns a sparse [`Configuration`] into the register values that have to change.
//! Both are pure, reading and writing the hardware is up to [`crate::session`].

use {
    crate::platform::raspberrypi::device_driver::bcm::vec::CONFIG0_STD_MASK,
    core::fmt,
    snafu::{OptionExt, Snafu},
    static_assertions::const_assert_eq,
};

/// Generates a fieldless enum with a user-facing name per variant, `ALL`, `Display` and a
/// case-insensitive `FromStr` that accepts `_` for `-`.
macro_rules! named_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $kind:literal {
            $( $(#[$variant_meta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$variant_meta])* $variant ),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter) -> ::core::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::video::ParseNameError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $crate::video::parse_name(s, $kind, Self::ALL, Self::name)
            }
        }
    };
}

pub mod bitfield;
mod decode;
mod encode;
pub mod frequency;
mod preset;
pub mod timing;

pub use {
    decode::decode,
    encode::{encode, RegisterWrites},
    preset::Preset,
};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Requested change refused before anything was written.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("Invalid value for {name}: {value}; valid values are 0..{max}"))]
    InvalidValue {
        name: &'static str,
        value: i64,
        max: i64,
    },
    #[snafu(display(
        "Cowardly refusing to reconfigure VEC while it is not in use, use --force to override"
    ))]
    Inactive,
    #[snafu(display(
        "Cowardly refusing to reconfigure the line standard from {from} to {to}. \
         Please switch modes using config.txt, tvservice or KMS first, \
         or use --force to override (it WILL result in garbled image)"
    ))]
    LineStandardChange { from: LineStandard, to: LineStandard },
    #[snafu(display(
        "Pedestal is supported in 525-line modes only. \
         You may use --force to override (it will be ignored)"
    ))]
    PedestalUnsupported,
    #[snafu(display("{name} must be less than {limit} Hz"))]
    FrequencyOutOfRange { name: &'static str, limit: u32 },
    #[snafu(display("PixelValve configured for unknown total horizontal resolution: {total}"))]
    UnknownTiming { total: u32 },
    #[snafu(display("Invalid value for {name}: {value}; a finite number is required"))]
    NotFinite { name: &'static str, value: f64 },
    #[snafu(display("Invalid value for hshift: {value}; valid values are {min}..{max}"))]
    ShiftOutOfRange { value: i64, min: i64, max: i64 },
}

/// Register contents the configuration model can't express.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DecodeError {
    #[snafu(display("Unrecognized video standard bits {bits:#010x} in CONFIG0"))]
    UnknownStandard { bits: u32 },
    #[snafu(display("Unrecognized output mode {bits} in CONFIG1"))]
    UnknownOutputMode { bits: u32 },
}

#[derive(Debug, Snafu)]
#[snafu(display("Unknown {kind} {name:?}, expected one of: {expected}"))]
pub struct ParseNameError {
    kind: &'static str,
    name: String,
    expected: String,
}

/// Timing family, independent of how colour is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStandard {
    Lines525,
    Lines625,
}

named_enum! {
    /// Colour encoding and line standard.
    pub enum VideoStandard: "video standard" {
        Ntsc => "NTSC",
        Pal => "PAL",
        PalM => "PAL-M",
        PalN => "PAL-N",
        Secam => "SECAM",
    }
}

named_enum! {
    /// Which signal goes out on each of the three DACs.
    pub enum OutputMode: "output mode" {
        CYCvbs => "C-Y-CVBS",
        CvbsYC => "CVBS-Y-C",
        PrYPb => "PR-Y-PB",
        Rgb => "RGB",
        YCCvbs => "Y-C-CVBS",
        CCvbsY => "C-CVBS-Y",
        CCvbsCvbs => "C-CVBS-CVBS",
    }
}

named_enum! {
    /// Picture source: the pixel valve or one of the built-in test patterns.
    pub enum PictureMode: "picture mode" {
        Normal => "NORMAL",
        Ramp => "RAMP",
        Colorbars => "COLORBARS",
        Signal1 => "SIGNAL1",
        Signal2 => "SIGNAL2",
        Signal3 => "SIGNAL3",
        Signal4 => "SIGNAL4",
    }
}

/// VEC settings, every field optional.
///
/// `None` leaves the hardware value alone when applied. Decoding the hardware state fills in
/// every field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Configuration {
    /// Base video standard
    pub standard: Option<VideoStandard>,
    /// Output mapping mode
    pub output: Option<OutputMode>,
    /// Picture display mode
    pub picture: Option<PictureMode>,
    /// Image horizontal shift, in pixels, in steps of half a pixel
    pub hshift: Option<f64>,
    /// Subcarrier frequency in Hz (Dr for SECAM), non-positive resets to the default
    pub fsc: Option<f64>,
    /// SECAM Db subcarrier frequency in Hz, non-positive resets to the default
    pub secam_fb: Option<f64>,
    /// Pedestal, 525-line standards only
    pub pedestal: Option<bool>,
    pub enable_luma: Option<bool>,
    /// For SECAM, unmodulated subcarrier for grey is output when disabled
    pub enable_chroma: Option<bool>,
    /// Ignored for SECAM
    pub enable_burst: Option<bool>,
    pub enable_sync: Option<bool>,
    pub burst_gain: Option<i64>,
    pub chroma_gain: Option<i64>,
    /// Chroma delay relative to luma, in pixels
    pub chroma_shift: Option<i64>,
    /// Treat pixel valve data as YCbCr instead of RGB
    pub ycbcr_input: Option<bool>,
    /// Treat pixel valve data as limited range RGB219
    pub limited_range: Option<bool>,
    pub sync_adj: Option<i64>,
    /// Limit active picture width to MPEG-1 SIF
    pub horiz_mask_sif: Option<bool>,
    /// Linear ramp on the edges of the active picture
    pub horiz_mask_linear: Option<bool>,
}

/// Raw values of every register the codec looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterSnapshot {
    /// Pixel valve CONTROL
    pub control: u32,
    /// Pixel valve HORZA
    pub horza: u32,
    /// Pixel valve HORZB
    pub horzb: u32,
    pub config0: u32,
    /// Combined FREQ3_2:FREQ1_0 control word
    pub frequency: u32,
    pub config1: u32,
    pub config2: u32,
    pub secam_b_frequency: u32,
    pub config3: u32,
    pub cfg: u32,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl LineStandard {
    /// Line standard of raw CONFIG0 standard bits. Only NTSC and PAL-M are 525-line, anything
    /// else, including patterns we don't know, counts as 625-line.
    pub fn of_bits(bits: u32) -> Self {
        match VideoStandard::from_bits(bits) {
            Some(standard) => standard.line_standard(),
            None => Self::Lines625,
        }
    }
}

impl fmt::Display for LineStandard {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Lines525 => write!(f, "525 lines"),
            Self::Lines625 => write!(f, "625 lines"),
        }
    }
}

impl VideoStandard {
    /// Union of all standard bit patterns.
    pub const MASK: u32 = Self::Ntsc.bits()
        | Self::Pal.bits()
        | Self::PalM.bits()
        | Self::PalN.bits()
        | Self::Secam.bits();

    /// CONFIG0 bit pattern.
    pub const fn bits(self) -> u32 {
        match self {
            Self::Ntsc => 0,
            Self::Pal => 1,
            Self::PalM => 2,
            Self::PalN => 3,
            Self::Secam => 0x0020_0000,
        }
    }

    pub fn from_bits(bits: u32) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|standard| standard.bits() == bits)
    }

    pub const fn line_standard(self) -> LineStandard {
        match self {
            Self::Ntsc | Self::PalM => LineStandard::Lines525,
            Self::Pal | Self::PalN | Self::Secam => LineStandard::Lines625,
        }
    }

    /// Subcarrier frequency the hardware uses unless CUSTOM_FREQ is set.
    pub const fn nominal_subcarrier(self) -> f64 {
        match self {
            Self::Ntsc => frequency::NTSC_HZ,
            Self::Pal => frequency::PAL_HZ,
            Self::PalM => frequency::PAL_M_HZ,
            Self::PalN => frequency::PAL_N_HZ,
            Self::Secam => frequency::SECAM_DR_HZ,
        }
    }

    pub const fn help(self) -> &'static str {
        match self {
            Self::Ntsc => {
                "525 lines, QAM; default subcarrier frequency: 3579545.4545 Hz (227.5 * fH)"
            }
            Self::Pal => {
                "625 lines, QAM with phase alternation; \
                 default subcarrier frequency: 4433618.75 Hz (283.7516 * fH)"
            }
            Self::PalM => {
                "525 lines, QAM with phase alternation; \
                 default subcarrier frequency: 3575611.8881 Hz (227.25 * fH)"
            }
            Self::PalN => {
                "625 lines, QAM with phase alternation; \
                 default subcarrier frequency: 3582056.25 Hz (229.2516 * fH), \
                 otherwise identical to regular PAL"
            }
            Self::Secam => {
                "625 lines, FM sequentially alternating between Dr (default fSC = 4406250 Hz \
                 = 282 * fH) and Db (default fSC = 4250000 Hz = 272 * fH)"
            }
        }
    }
}

const_assert_eq!(VideoStandard::MASK, CONFIG0_STD_MASK);

impl OutputMode {
    /// Value of the CONFIG1 OUTPUT_MODE field.
    pub const fn field_value(self) -> u32 {
        match self {
            Self::CYCvbs => 0,
            Self::CvbsYC => 1,
            Self::PrYPb => 2,
            Self::Rgb => 4,
            Self::YCCvbs => 5,
            Self::CCvbsY => 6,
            Self::CCvbsCvbs => 7,
        }
    }

    pub fn from_field_value(value: u32) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|mode| mode.field_value() == value)
    }
}

impl PictureMode {
    /// Signal generator pattern number, `None` for modes that don't use the generator.
    pub const fn signal_generator_mode(self) -> Option<u32> {
        match self {
            Self::Signal1 => Some(0),
            Self::Signal2 => Some(1),
            Self::Signal3 => Some(2),
            Self::Signal4 => Some(3),
            Self::Normal | Self::Ramp | Self::Colorbars => None,
        }
    }

    pub const fn from_signal_generator_mode(mode: u32) -> Self {
        match mode & 0b11 {
            0 => Self::Signal1,
            1 => Self::Signal2,
            2 => Self::Signal3,
            _ => Self::Signal4,
        }
    }
}

impl Configuration {
    /// Changes nothing.
    pub const EMPTY: Self = Self {
        standard: None,
        output: None,
        picture: None,
        hshift: None,
        fsc: None,
        secam_fb: None,
        pedestal: None,
        enable_luma: None,
        enable_chroma: None,
        enable_burst: None,
        enable_sync: None,
        burst_gain: None,
        chroma_gain: None,
        chroma_shift: None,
        ycbcr_input: None,
        limited_range: None,
        sync_adj: None,
        horiz_mask_sif: None,
        horiz_mask_linear: None,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    /// This configuration with every field set in `overrides` replaced.
    pub fn merge(&self, overrides: &Configuration) -> Configuration {
        Configuration {
            standard: overrides.standard.or(self.standard),
            output: overrides.output.or(self.output),
            picture: overrides.picture.or(self.picture),
            hshift: overrides.hshift.or(self.hshift),
            fsc: overrides.fsc.or(self.fsc),
            secam_fb: overrides.secam_fb.or(self.secam_fb),
            pedestal: overrides.pedestal.or(self.pedestal),
            enable_luma: overrides.enable_luma.or(self.enable_luma),
            enable_chroma: overrides.enable_chroma.or(self.enable_chroma),
            enable_burst: overrides.enable_burst.or(self.enable_burst),
            enable_sync: overrides.enable_sync.or(self.enable_sync),
            burst_gain: overrides.burst_gain.or(self.burst_gain),
            chroma_gain: overrides.chroma_gain.or(self.chroma_gain),
            chroma_shift: overrides.chroma_shift.or(self.chroma_shift),
            ycbcr_input: overrides.ycbcr_input.or(self.ycbcr_input),
            limited_range: overrides.limited_range.or(self.limited_range),
            sync_adj: overrides.sync_adj.or(self.sync_adj),
            horiz_mask_sif: overrides.horiz_mask_sif.or(self.horiz_mask_sif),
            horiz_mask_linear: overrides.horiz_mask_linear.or(self.horiz_mask_linear),
        }
    }

    /// Field names with their values formatted for display, `None` for unset fields.
    pub fn entries(&self) -> [(&'static str, Option<String>); 19] {
        fn show(value: Option<impl ToString>) -> Option<String> {
            value.map(|value| value.to_string())
        }
        fn show_float(value: Option<f64>) -> Option<String> {
            value.map(|value| format!("{value:?}"))
        }

        [
            ("standard", show(self.standard)),
            ("output", show(self.output)),
            ("picture", show(self.picture)),
            ("hshift", show_float(self.hshift)),
            ("fsc", show_float(self.fsc)),
            ("secam_fb", show_float(self.secam_fb)),
            ("pedestal", show(self.pedestal)),
            ("enable_luma", show(self.enable_luma)),
            ("enable_chroma", show(self.enable_chroma)),
            ("enable_burst", show(self.enable_burst)),
            ("enable_sync", show(self.enable_sync)),
            ("burst_gain", show(self.burst_gain)),
            ("chroma_gain", show(self.chroma_gain)),
            ("chroma_shift", show(self.chroma_shift)),
            ("ycbcr_input", show(self.ycbcr_input)),
            ("limited_range", show(self.limited_range)),
            ("sync_adj", show(self.sync_adj)),
            ("horiz_mask_sif", show(self.horiz_mask_sif)),
            ("horiz_mask_linear", show(self.horiz_mask_linear)),
        ]
    }
}

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

fn parse_name<T: Copy>(
    text: &str,
    kind: &'static str,
    all: &[T],
    name: fn(T) -> &'static str,
) -> Result<T, ParseNameError> {
    let wanted = text.trim().replace('_', "-");
    all.iter()
        .copied()
        .find(|value| name(*value).eq_ignore_ascii_case(&wanted))
        .with_context(|| ParseNameSnafu {
            kind,
            name: text,
            expected: all.iter().map(|value| name(*value)).collect::<Vec<_>>().join(", "),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_loosely() {
        assert_eq!("pal-m".parse::<VideoStandard>().unwrap(), VideoStandard::PalM);
        assert_eq!("PAL_N".parse::<VideoStandard>().unwrap(), VideoStandard::PalN);
        assert_eq!(
            "c_cvbs_cvbs".parse::<OutputMode>().unwrap(),
            OutputMode::CCvbsCvbs
        );
        assert_eq!("Signal3".parse::<PictureMode>().unwrap(), PictureMode::Signal3);
    }

    #[test]
    fn unknown_name_lists_choices() {
        let err = "ntsc-j".parse::<VideoStandard>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown video standard \"ntsc-j\", expected one of: NTSC, PAL, PAL-M, PAL-N, SECAM"
        );
    }

    #[test]
    fn names_round_trip_through_display() {
        for mode in OutputMode::ALL {
            assert_eq!(mode.to_string().parse::<OutputMode>().unwrap(), *mode);
        }
    }

    #[test]
    fn standard_bits_and_line_families() {
        for standard in VideoStandard::ALL {
            assert_eq!(VideoStandard::from_bits(standard.bits()), Some(*standard));
            assert_eq!(
                LineStandard::of_bits(standard.bits()),
                standard.line_standard()
            );
        }
        assert_eq!(VideoStandard::from_bits(0x0020_0001), None);
        assert_eq!(LineStandard::of_bits(0x0020_0001), LineStandard::Lines625);
        assert_eq!(VideoStandard::Ntsc.line_standard(), LineStandard::Lines525);
        assert_eq!(VideoStandard::PalM.line_standard(), LineStandard::Lines525);
    }

    #[test]
    fn output_mode_three_is_unassigned() {
        assert_eq!(OutputMode::from_field_value(3), None);
        assert_eq!(OutputMode::from_field_value(4), Some(OutputMode::Rgb));
    }

    #[test]
    fn merge_prefers_overrides() {
        let base = Configuration {
            standard: Some(VideoStandard::Pal),
            pedestal: Some(false),
            ..Configuration::EMPTY
        };
        let overrides = Configuration {
            pedestal: Some(true),
            sync_adj: Some(2),
            ..Configuration::EMPTY
        };
        let merged = base.merge(&overrides);
        assert_eq!(merged.standard, Some(VideoStandard::Pal));
        assert_eq!(merged.pedestal, Some(true));
        assert_eq!(merged.sync_adj, Some(2));
        assert_eq!(merged.fsc, None);
    }

    #[test]
    fn empty_configuration() {
        assert!(Configuration::default().is_empty());
        assert!(!Configuration {
            hshift: Some(0.0),
            ..Configuration::EMPTY
        }
        .is_empty());
    }

    #[test]
    fn entries_format_values() {
        let config = Configuration {
            standard: Some(VideoStandard::Secam),
            hshift: Some(0.0),
            chroma_shift: Some(-2),
            ..Configuration::EMPTY
        };
        let entries = config.entries();
        assert_eq!(entries[0], ("standard", Some("SECAM".to_string())));
        assert_eq!(entries[3], ("hshift", Some("0.0".to_string())));
        assert_eq!(entries[13], ("chroma_shift", Some("-2".to_string())));
        assert_eq!(entries[18], ("horiz_mask_linear", None));
    }
}
