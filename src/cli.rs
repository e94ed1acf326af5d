/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

//! Command line surface: one option per configuration field plus presets.

use {
    clap::{value_parser, Arg, ArgAction, ArgMatches, Command},
    machine::{
        device_tree::DEVICETREE_BASE,
        memory::DEV_MEM,
        video::{Configuration, OutputMode, PictureMode, Preset, VideoStandard},
        SessionConfig,
    },
    std::path::PathBuf,
};

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub preset: Option<Preset>,
    pub reset: bool,
    pub force: bool,
    /// Individually given fields, these win over the preset.
    pub overrides: Configuration,
}

pub fn command() -> Command {
    Command::new("tweakvec")
        .about("Tweak settings of the Raspberry Pi composite video encoder")
        .long_about(
            "Tweak settings of the Raspberry Pi composite video encoder.\n\n\
             Without any settings, prints the current configuration.",
        )
        .disable_version_flag(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Log every register access (same as RUST_LOG=debug)"),
        )
        .arg(
            Arg::new("devicetree")
                .long("devicetree")
                .env("TWEAKVEC_DEVICETREE")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .default_value(DEVICETREE_BASE)
                .help("Live device tree to locate the hardware in"),
        )
        .arg(
            Arg::new("memory_device")
                .long("memory-device")
                .env("TWEAKVEC_MEMORY_DEVICE")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .default_value(DEV_MEM)
                .help("Physical memory device to map the registers from"),
        )
        .arg(
            Arg::new("preset")
                .long("preset")
                .value_name("PRESET")
                .value_parser(value_parser!(Preset))
                .help("Preset of one of common color formats to use before applying individual tweaks")
                .long_help(choices(
                    "Preset of one of common color formats to use before applying individual tweaks",
                    Preset::ALL.iter().map(|preset| (preset.name(), Some(preset.help()))),
                )),
        )
        .arg(
            Arg::new("reset")
                .long("reset")
                .action(ArgAction::SetTrue)
                .help("Reset all settings to defaults before applying anything else"),
        )
        .arg(
            Arg::new("force")
                .long("force")
                .action(ArgAction::SetTrue)
                .help("Force applying configuration even if may be dangerous"),
        )
        .arg(
            field("standard", "Base video standard")
                .value_name("VIDEO_STANDARD")
                .value_parser(value_parser!(VideoStandard))
                .long_help(choices(
                    "Base video standard",
                    VideoStandard::ALL
                        .iter()
                        .map(|standard| (standard.name(), Some(standard.help()))),
                )),
        )
        .arg(
            field("output", "Output mapping mode")
                .value_name("OUTPUT_MODE")
                .value_parser(value_parser!(OutputMode))
                .long_help(choices(
                    "Output mapping mode",
                    OutputMode::ALL.iter().map(|mode| (mode.name(), None)),
                )),
        )
        .arg(
            field("picture", "Picture display mode")
                .value_name("PICTURE_MODE")
                .value_parser(value_parser!(PictureMode))
                .long_help(choices(
                    "Picture display mode",
                    PictureMode::ALL.iter().map(|mode| (mode.name(), None)),
                )),
        )
        .arg(float(
            "hshift",
            "Image horizontal shift, in pixels; will be rounded to the nearest multiple of 0.5",
        ))
        .arg(float(
            "fsc",
            "Subcarrier frequency in Hz (Dr for SECAM); 0 resets to the standard's default",
        ))
        .arg(float(
            "secam_fb",
            "SECAM Db subcarrier frequency in Hz; 0 resets to the default",
        ))
        .arg(boolean("pedestal", "Enable pedestal (525-line standards only)"))
        .arg(boolean("enable_luma", "Enable the luma signal"))
        .arg(boolean(
            "enable_chroma",
            "Enable the chroma signal; for SECAM, unmodulated subcarrier for grey is output when disabled",
        ))
        .arg(boolean("enable_burst", "Enable the color burst; ignored for SECAM"))
        .arg(boolean("enable_sync", "Enable sync pulses"))
        .arg(integer("burst_gain", "Color burst gain, 0-3"))
        .arg(integer("chroma_gain", "Chroma gain, 0-3"))
        .arg(integer(
            "chroma_shift",
            "Chroma delay relative to luma, in pixels, -7 to 3",
        ))
        .arg(boolean(
            "ycbcr_input",
            "Treat pixel valve data as YCbCr instead of RGB",
        ))
        .arg(boolean(
            "limited_range",
            "Treat pixel valve data as limited range RGB219",
        ))
        .arg(integer("sync_adj", "Sync pulse adjustment, 0-7"))
        .arg(boolean(
            "horiz_mask_sif",
            "Limit active picture width to MPEG-1 SIF",
        ))
        .arg(boolean(
            "horiz_mask_linear",
            "Apply a linear ramp to the edges of the active picture",
        ))
}

/// Accepts the usual spellings of yes and no.
pub fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(format!("{value} is not a valid bool value")),
    }
}

impl Request {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let bool_field = |name| matches.get_one::<bool>(name).copied();
        let float_field = |name| matches.get_one::<f64>(name).copied();
        let integer_field = |name| matches.get_one::<i64>(name).copied();

        Self {
            preset: matches.get_one::<Preset>("preset").copied(),
            reset: matches.get_flag("reset"),
            force: matches.get_flag("force"),
            overrides: Configuration {
                standard: matches.get_one::<VideoStandard>("standard").copied(),
                output: matches.get_one::<OutputMode>("output").copied(),
                picture: matches.get_one::<PictureMode>("picture").copied(),
                hshift: float_field("hshift"),
                fsc: float_field("fsc"),
                secam_fb: float_field("secam_fb"),
                pedestal: bool_field("pedestal"),
                enable_luma: bool_field("enable_luma"),
                enable_chroma: bool_field("enable_chroma"),
                enable_burst: bool_field("enable_burst"),
                enable_sync: bool_field("enable_sync"),
                burst_gain: integer_field("burst_gain"),
                chroma_gain: integer_field("chroma_gain"),
                chroma_shift: integer_field("chroma_shift"),
                ycbcr_input: bool_field("ycbcr_input"),
                limited_range: bool_field("limited_range"),
                sync_adj: integer_field("sync_adj"),
                horiz_mask_sif: bool_field("horiz_mask_sif"),
                horiz_mask_linear: bool_field("horiz_mask_linear"),
            },
        }
    }

    /// Nothing to change, just print the current configuration.
    pub fn is_query(&self) -> bool {
        self.preset.is_none() && !self.reset && !self.force && self.overrides.is_empty()
    }

    /// Whether the current standard is needed to work out the configuration.
    pub fn needs_current_standard(&self) -> bool {
        self.reset && self.preset.is_none()
    }

    /// The configuration to apply: the preset (or with `--reset` the preset of the running
    /// standard), then the individual fields on top.
    pub fn resolve(&self, current_standard: Option<VideoStandard>) -> Configuration {
        let preset = match (self.preset, self.reset) {
            (Some(preset), _) => Some(preset),
            (None, true) => current_standard.map(Preset::for_standard),
            (None, false) => None,
        };
        let mut config = preset.map_or(Configuration::EMPTY, Preset::configuration);
        if self.reset {
            config.hshift = Some(0.0);
        }
        config.merge(&self.overrides)
    }
}

pub fn session_config(matches: &ArgMatches) -> SessionConfig {
    let defaults = SessionConfig::default();
    SessionConfig {
        devicetree: matches
            .get_one::<PathBuf>("devicetree")
            .cloned()
            .unwrap_or(defaults.devicetree),
        memory_device: matches
            .get_one::<PathBuf>("memory_device")
            .cloned()
            .unwrap_or(defaults.memory_device),
    }
}

fn field(id: &'static str, help: &'static str) -> Arg {
    Arg::new(id).long(id.replace('_', "-")).help(help)
}

fn boolean(id: &'static str, help: &'static str) -> Arg {
    field(id, help)
        .value_name("BOOL")
        .value_parser(parse_bool)
}

fn float(id: &'static str, help: &'static str) -> Arg {
    field(id, help)
        .value_name("FLOAT")
        .allow_negative_numbers(true)
        .value_parser(value_parser!(f64))
}

fn integer(id: &'static str, help: &'static str) -> Arg {
    field(id, help)
        .value_name("INT")
        .allow_negative_numbers(true)
        .value_parser(value_parser!(i64))
}

fn choices<'a>(
    help: &str,
    values: impl Iterator<Item = (&'a str, Option<&'a str>)>,
) -> String {
    let mut text = format!("{help}; available settings:");
    for (name, description) in values {
        text.push_str("\n\n");
        text.push_str(name);
        if let Some(description) = description {
            text.push_str(" - ");
            text.push_str(description);
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use {super::*, machine::video::frequency};

    fn request(args: &[&str]) -> Request {
        let matches = command()
            .try_get_matches_from(std::iter::once("tweakvec").chain(args.iter().copied()))
            .unwrap();
        Request::from_matches(&matches)
    }

    #[test]
    fn command_is_well_formed() {
        command().debug_assert();
    }

    #[test]
    fn no_options_is_a_query() {
        assert!(request(&[]).is_query());
        assert!(request(&["-v"]).is_query());
        assert!(!request(&["--force"]).is_query());
        assert!(!request(&["--reset"]).is_query());
    }

    #[test]
    fn fields_are_parsed() {
        let request = request(&[
            "--standard",
            "pal-m",
            "--output=C-CVBS-CVBS",
            "--hshift",
            "-2.5",
            "--chroma-shift",
            "-3",
            "--pedestal",
            "yes",
            "--enable-burst=off",
        ]);
        assert!(!request.is_query());
        let overrides = request.overrides;
        assert_eq!(overrides.standard, Some(VideoStandard::PalM));
        assert_eq!(overrides.output, Some(OutputMode::CCvbsCvbs));
        assert_eq!(overrides.hshift, Some(-2.5));
        assert_eq!(overrides.chroma_shift, Some(-3));
        assert_eq!(overrides.pedestal, Some(true));
        assert_eq!(overrides.enable_burst, Some(false));
        assert_eq!(overrides.fsc, None);
    }

    #[test]
    fn bad_values_are_usage_errors() {
        for args in [
            &["tweakvec", "--pedestal", "maybe"][..],
            &["tweakvec", "--standard", "ntsc-j"][..],
            &["tweakvec", "--sync-adj", "two"][..],
        ] {
            assert!(command().try_get_matches_from(args).is_err(), "{args:?}");
        }
    }

    #[test]
    fn bool_spellings() {
        for yes in ["y", "YES", "t", "true", "On", "1"] {
            assert_eq!(parse_bool(yes), Ok(true));
        }
        for no in ["n", "no", "F", "false", "off", "0"] {
            assert_eq!(parse_bool(no), Ok(false));
        }
        assert!(parse_bool("").is_err());
    }

    #[test]
    fn overrides_win_over_preset() {
        let config = request(&["--preset", "ntsc", "--pedestal", "0", "--fsc", "3580000"])
            .resolve(None);
        assert_eq!(config.standard, Some(VideoStandard::Ntsc));
        assert_eq!(config.pedestal, Some(false));
        assert_eq!(config.fsc, Some(3_580_000.0));
        assert_eq!(config.hshift, None);
    }

    #[test]
    fn reset_uses_the_running_standard() {
        let request = request(&["--reset"]);
        assert!(request.needs_current_standard());
        let config = request.resolve(Some(VideoStandard::Secam));
        assert_eq!(config, Configuration {
            hshift: Some(0.0),
            ..Preset::Secam.configuration()
        });
    }

    #[test]
    fn reset_with_preset_ignores_the_running_standard() {
        let request = request(&["--reset", "--preset", "pal60"]);
        assert!(!request.needs_current_standard());
        let config = request.resolve(None);
        assert_eq!(config.standard, Some(VideoStandard::PalM));
        assert_eq!(config.fsc, Some(frequency::PAL_HZ));
        assert_eq!(config.hshift, Some(0.0));
    }

    #[test]
    fn paths_default_to_the_live_system() {
        let matches = command().try_get_matches_from(["tweakvec"]).unwrap();
        let config = session_config(&matches);
        if std::env::var_os("TWEAKVEC_DEVICETREE").is_none() {
            assert_eq!(config.devicetree, PathBuf::from(DEVICETREE_BASE));
        }

        let matches = command()
            .try_get_matches_from(["tweakvec", "--memory-device", "/tmp/mem"])
            .unwrap();
        assert_eq!(session_config(&matches).memory_device, PathBuf::from("/tmp/mem"));
    }
}
