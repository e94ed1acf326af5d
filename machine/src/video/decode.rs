/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

use {
    super::{
        bitfield::extract_field, frequency, timing::HorizontalTiming, Configuration,
        DecodeError, OutputMode, PictureMode, RegisterSnapshot, UnknownOutputModeSnafu,
        UnknownStandardSnafu, VideoStandard,
    },
    crate::platform::raspberrypi::device_driver::bcm::vec::{
        CFG, CONFIG0, CONFIG1, CONFIG2, CONFIG3,
    },
    snafu::OptionExt,
    tock_registers::LocalRegisterCopy,
};

/// Current configuration as the registers describe it, with every field set.
pub fn decode(registers: &RegisterSnapshot) -> Result<Configuration, DecodeError> {
    let config0 = LocalRegisterCopy::<u32, CONFIG0::Register>::new(registers.config0);
    let config1 = LocalRegisterCopy::<u32, CONFIG1::Register>::new(registers.config1);
    let config2 = LocalRegisterCopy::<u32, CONFIG2::Register>::new(registers.config2);
    let config3 = LocalRegisterCopy::<u32, CONFIG3::Register>::new(registers.config3);
    let cfg = LocalRegisterCopy::<u32, CFG::Register>::new(registers.cfg);

    // Signal generator beats ramp beats colour bars, whatever else is set.
    let picture = if cfg.is_set(CFG::SG_EN) {
        PictureMode::from_signal_generator_mode(cfg.read(CFG::SG_MODE))
    } else if config0.is_set(CONFIG0::RAMPEN) {
        PictureMode::Ramp
    } else if config1.is_set(CONFIG1::CBAR_EN) {
        PictureMode::Colorbars
    } else {
        PictureMode::Normal
    };

    let bits = registers.config0 & VideoStandard::MASK;
    let standard = VideoStandard::from_bits(bits).context(UnknownStandardSnafu { bits })?;

    let bits = config1.read(CONFIG1::OUTPUT_MODE);
    let output = OutputMode::from_field_value(bits).context(UnknownOutputModeSnafu { bits })?;

    // SECAM always runs off the programmed word.
    let fsc = if config1.is_set(CONFIG1::CUSTOM_FREQ) || standard == VideoStandard::Secam {
        frequency::word_to_hz(registers.frequency)
    } else {
        standard.nominal_subcarrier()
    };

    let hshift = HorizontalTiming::from_registers(registers.horza, registers.horzb)
        .shift(config0.is_set(CONFIG0::YCDELAY));

    let chroma_shift = i64::from(extract_field(&config0, CONFIG0::CDEL))
        - i64::from(extract_field(&config0, CONFIG0::YDEL));

    Ok(Configuration {
        standard: Some(standard),
        output: Some(output),
        picture: Some(picture),
        hshift: Some(hshift),
        fsc: Some(fsc),
        secam_fb: Some(frequency::word_to_hz(registers.secam_b_frequency)),
        pedestal: Some(config0.is_set(CONFIG0::PDEN)),
        enable_luma: Some(!config1.is_set(CONFIG1::LUMADIS)),
        enable_chroma: Some(!config0.is_set(CONFIG0::CHRDIS)),
        enable_burst: Some(!config0.is_set(CONFIG0::BURDIS)),
        enable_sync: Some(!config0.is_set(CONFIG0::SYNCDIS)),
        burst_gain: Some(extract_field(&config0, CONFIG0::CBURST_GAIN).into()),
        chroma_gain: Some(extract_field(&config0, CONFIG0::CHROMA_GAIN).into()),
        chroma_shift: Some(chroma_shift),
        ycbcr_input: Some(config1.is_set(CONFIG1::YCBCR_IN)),
        limited_range: Some(config1.is_set(CONFIG1::RGB219)),
        sync_adj: Some(extract_field(&config2, CONFIG2::SYNC_ADJ).into()),
        horiz_mask_sif: Some(config3.is_set(CONFIG3::HORIZ_LEN_MPEG1_SIF)),
        horiz_mask_linear: Some(!config3.is_set(CONFIG3::NON_LINEAR)),
    })
}
