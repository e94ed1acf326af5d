/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

use {
    super::{
        bitfield::insert_field,
        frequency,
        timing::{HorizontalTiming, PixelShift},
        ConfigError, Configuration, InactiveSnafu, LineStandard, LineStandardChangeSnafu,
        NotFiniteSnafu, PedestalUnsupportedSnafu, PictureMode, RegisterSnapshot, VideoStandard,
    },
    crate::platform::raspberrypi::device_driver::bcm::{
        pixelvalve::CONTROL,
        vec::{CFG, CONFIG0, CONFIG1, CONFIG2, CONFIG3},
    },
    snafu::ensure,
    tock_registers::LocalRegisterCopy,
    tracing::warn,
};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// New values for the registers a configuration touches, `None` for the ones to leave alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterWrites {
    pub config0: Option<u32>,
    /// Combined subcarrier control word, split into FREQ3_2 and FREQ1_0 on commit
    pub frequency: Option<u32>,
    pub config1: Option<u32>,
    pub config2: Option<u32>,
    pub secam_b_frequency: Option<u32>,
    pub config3: Option<u32>,
    pub cfg: Option<u32>,
    pub horza: Option<u32>,
    pub horzb: Option<u32>,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl RegisterWrites {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Register values implementing the set fields of `config` on top of `current`.
///
/// Every check happens here, so a returned error means nothing needs undoing. `force` turns
/// the guards against unsafe transitions into warnings, a pedestal requested on a 625-line
/// standard is then dropped.
pub fn encode(
    config: &Configuration,
    current: &RegisterSnapshot,
    force: bool,
) -> Result<RegisterWrites, ConfigError> {
    let control = LocalRegisterCopy::<u32, CONTROL::Register>::new(current.control);
    if !control.matches_all(CONTROL::CLK_SELECT::Vec) {
        if !force {
            return InactiveSnafu.fail();
        }
        warn!(
            "Pixel valve control {:#010x} is not feeding the VEC, reconfiguring anyway",
            current.control
        );
    }

    let shift = config
        .hshift
        .map(|hshift| -> Result<PixelShift, ConfigError> {
            ensure!(
                hshift.is_finite(),
                NotFiniteSnafu {
                    name: "hshift",
                    value: hshift
                }
            );
            Ok(PixelShift::from_pixels(hshift))
        })
        .transpose()?;

    Ok(RegisterWrites {
        config0: encode_config0(config, shift, current.config0, force)?,
        frequency: config
            .fsc
            .map(|hz| frequency::subcarrier_word("fsc", hz, frequency::SECAM_DR_HZ))
            .transpose()?,
        config1: encode_config1(config, current.config1),
        config2: config
            .sync_adj
            .map(|sync_adj| {
                let mut config2 = LocalRegisterCopy::<u32, CONFIG2::Register>::new(current.config2);
                insert_field("sync_adj", &mut config2, CONFIG2::SYNC_ADJ, sync_adj)
                    .map(|()| config2.get())
            })
            .transpose()?,
        secam_b_frequency: config
            .secam_fb
            .map(|hz| frequency::subcarrier_word("secam_fb", hz, frequency::SECAM_DB_HZ))
            .transpose()?,
        config3: encode_config3(config, current.config3),
        cfg: config.picture.map(encode_cfg),
        ..encode_timing(shift, current)?
    })
}

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

fn encode_config0(
    config: &Configuration,
    shift: Option<PixelShift>,
    current: u32,
    force: bool,
) -> Result<Option<u32>, ConfigError> {
    let touched = config.standard.is_some()
        || config.picture.is_some()
        || shift.is_some()
        || config.pedestal.is_some()
        || config.enable_chroma.is_some()
        || config.enable_burst.is_some()
        || config.enable_sync.is_some()
        || config.burst_gain.is_some()
        || config.chroma_gain.is_some()
        || config.chroma_shift.is_some();
    if !touched {
        return Ok(None);
    }

    let mut config0 = LocalRegisterCopy::<u32, CONFIG0::Register>::new(current);

    if let Some(standard) = config.standard {
        let from = LineStandard::of_bits(config0.get() & VideoStandard::MASK);
        let to = standard.line_standard();
        if from != to {
            if !force {
                return LineStandardChangeSnafu { from, to }.fail();
            }
            warn!("Changing line standard from {} to {}, expect a garbled picture", from, to);
        }
        config0.set((config0.get() & !VideoStandard::MASK) | standard.bits());
    }

    if let Some(picture) = config.picture {
        config0.modify(CONFIG0::RAMPEN.val(u32::from(picture == PictureMode::Ramp)));
    }

    if let Some(shift) = shift {
        config0.modify(CONFIG0::YCDELAY.val(u32::from(shift.half_pixel)));
    }

    if let Some(pedestal) = config.pedestal {
        config0.modify(CONFIG0::PDEN::CLEAR);
        if pedestal {
            // Checked against the standard being set, not the one currently running.
            if LineStandard::of_bits(config0.get() & VideoStandard::MASK)
                == LineStandard::Lines525
            {
                config0.modify(CONFIG0::PDEN::SET);
            } else if force {
                warn!("Pedestal is not supported in 625-line modes, ignoring");
            } else {
                return PedestalUnsupportedSnafu.fail();
            }
        }
    }

    if let Some(enable) = config.enable_chroma {
        config0.modify(CONFIG0::CHRDIS.val(u32::from(!enable)));
    }
    if let Some(enable) = config.enable_burst {
        config0.modify(CONFIG0::BURDIS.val(u32::from(!enable)));
    }
    if let Some(enable) = config.enable_sync {
        config0.modify(CONFIG0::SYNCDIS.val(u32::from(!enable)));
    }

    if let Some(gain) = config.burst_gain {
        insert_field("burst_gain", &mut config0, CONFIG0::CBURST_GAIN, gain)?;
    }
    if let Some(gain) = config.chroma_gain {
        insert_field("chroma_gain", &mut config0, CONFIG0::CHROMA_GAIN, gain)?;
    }

    // Positive shifts delay chroma, negative ones delay luma instead.
    if let Some(chroma_shift) = config.chroma_shift {
        let (chroma_delay, luma_delay) = match chroma_shift {
            shift if shift > 0 => (shift, 0),
            shift => (0, shift.saturating_neg()),
        };
        insert_field("positive chroma_shift", &mut config0, CONFIG0::CDEL, chroma_delay)?;
        insert_field("negative chroma_shift", &mut config0, CONFIG0::YDEL, luma_delay)?;
    }

    Ok(Some(config0.get()))
}

fn encode_config1(config: &Configuration, current: u32) -> Option<u32> {
    let touched = config.output.is_some()
        || config.picture.is_some()
        || config.fsc.is_some()
        || config.enable_luma.is_some()
        || config.ycbcr_input.is_some()
        || config.limited_range.is_some();
    if !touched {
        return None;
    }

    let mut config1 = LocalRegisterCopy::<u32, CONFIG1::Register>::new(current);
    if let Some(output) = config.output {
        config1.modify(CONFIG1::OUTPUT_MODE.val(output.field_value()));
    }
    if let Some(picture) = config.picture {
        config1.modify(CONFIG1::CBAR_EN.val(u32::from(picture == PictureMode::Colorbars)));
    }
    if let Some(fsc) = config.fsc {
        config1.modify(CONFIG1::CUSTOM_FREQ.val(u32::from(fsc > 0.0)));
    }
    if let Some(enable) = config.enable_luma {
        config1.modify(CONFIG1::LUMADIS.val(u32::from(!enable)));
    }
    if let Some(ycbcr) = config.ycbcr_input {
        config1.modify(CONFIG1::YCBCR_IN.val(u32::from(ycbcr)));
    }
    if let Some(limited) = config.limited_range {
        config1.modify(CONFIG1::RGB219.val(u32::from(limited)));
    }
    Some(config1.get())
}

fn encode_config3(config: &Configuration, current: u32) -> Option<u32> {
    if config.horiz_mask_sif.is_none() && config.horiz_mask_linear.is_none() {
        return None;
    }

    let mut config3 = LocalRegisterCopy::<u32, CONFIG3::Register>::new(current);
    if let Some(sif) = config.horiz_mask_sif {
        config3.modify(CONFIG3::HORIZ_LEN_MPEG1_SIF.val(u32::from(sif)));
    }
    if let Some(linear) = config.horiz_mask_linear {
        config3.modify(CONFIG3::NON_LINEAR.val(u32::from(!linear)));
    }
    Some(config3.get())
}

/// CFG is rewritten whole, which also switches off whatever pattern was running before.
fn encode_cfg(picture: PictureMode) -> u32 {
    match picture.signal_generator_mode() {
        Some(mode) => (CFG::SG_EN::SET + CFG::SG_MODE.val(mode)).value,
        None => (CFG::ENABLE::SET + CFG::VEC_EN::SET).value,
    }
}

/// Pixel valve timing for a shift, recomputed from the nominal timing of the current line
/// width rather than from the current porches.
fn encode_timing(
    shift: Option<PixelShift>,
    current: &RegisterSnapshot,
) -> Result<RegisterWrites, ConfigError> {
    let Some(shift) = shift else {
        return Ok(RegisterWrites::default());
    };
    let total = HorizontalTiming::from_registers(current.horza, current.horzb).total();
    let (horza, horzb) = HorizontalTiming::nominal(total)?
        .shifted(shift.pixels)?
        .to_registers();
    Ok(RegisterWrites {
        horza: Some(horza),
        horzb: Some(horzb),
        ..RegisterWrites::default()
    })
}
