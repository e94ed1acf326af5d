/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

//! One configuration session: both register windows mapped, read or changed, then released.

use {
    crate::{
        device_tree::{AddressMapper, DeviceTree, DeviceTreeError, DEVICETREE_BASE},
        memory::{DevMem, MapError, MappedWindow, DEV_MEM},
        platform::{
            probe_pixelvalve,
            raspberrypi::device_driver::{
                bcm::{PixelValve, VideoEncoder},
                RegisterWindow, WINDOW_SIZE,
            },
            vec_address, VideoCoreModel,
        },
        video::{self, ConfigError, Configuration, DecodeError, RegisterSnapshot, RegisterWrites},
    },
    snafu::Snafu,
    std::path::PathBuf,
    tracing::debug,
};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Where the hardware description and the physical memory come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub devicetree: PathBuf,
    pub memory_device: PathBuf,
}

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(transparent)]
    DeviceTree { source: DeviceTreeError },
    #[snafu(transparent)]
    Map { source: MapError },
    #[snafu(transparent)]
    Config { source: ConfigError },
    #[snafu(transparent)]
    Decode { source: DecodeError },
}

/// The pixel valve feeding the VEC and the VEC itself.
pub struct Session<W> {
    model: VideoCoreModel,
    pixelvalve: PixelValve<W>,
    encoder: VideoEncoder<W>,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            devicetree: DEVICETREE_BASE.into(),
            memory_device: DEV_MEM.into(),
        }
    }
}

impl Error {
    /// Not running on a Raspberry Pi, or on one whose device tree lacks the video nodes.
    pub fn is_platform_mismatch(&self) -> bool {
        matches!(self, Self::DeviceTree { source } if source.is_not_found())
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Map { source } if source.is_permission_denied())
    }
}

impl Session<MappedWindow> {
    /// Locate both register blocks through the device tree and map them.
    pub fn open(config: &SessionConfig) -> Result<Self, Error> {
        let tree = DeviceTree::new(&config.devicetree);
        let mapper = AddressMapper::from_device_tree(&tree)?;

        let (model, pixelvalve_node) = probe_pixelvalve(&tree)?;
        let pixelvalve_address = mapper.map_path_address(&tree, &pixelvalve_node)?;
        let vec_address = vec_address(&tree, &mapper, model)?;
        debug!(
            "Pixel valve at {:#x}, VEC at {:#x}",
            pixelvalve_address, vec_address
        );

        let memory = DevMem::open(&config.memory_device)?;
        let pixelvalve = memory.map(pixelvalve_address, WINDOW_SIZE)?;
        let encoder = memory.map(vec_address, WINDOW_SIZE)?;
        Ok(Self::new(model, pixelvalve, encoder))
    }
}

impl<W: RegisterWindow> Session<W> {
    pub fn new(model: VideoCoreModel, pixelvalve: W, encoder: W) -> Self {
        Self {
            model,
            pixelvalve: PixelValve::new(pixelvalve),
            encoder: VideoEncoder::new(encoder),
        }
    }

    pub fn model(&self) -> VideoCoreModel {
        self.model
    }

    /// Read every register the codec looks at.
    pub fn snapshot(&self) -> RegisterSnapshot {
        RegisterSnapshot {
            control: self.pixelvalve.control(),
            horza: self.pixelvalve.horza(),
            horzb: self.pixelvalve.horzb(),
            config0: self.encoder.config0(),
            frequency: self.encoder.frequency_word(),
            config1: self.encoder.config1(),
            config2: self.encoder.config2(),
            secam_b_frequency: self.encoder.secam_b_frequency_word(),
            config3: self.encoder.config3(),
            cfg: self.encoder.cfg(),
        }
    }

    pub fn current_config(&self) -> Result<Configuration, Error> {
        Ok(video::decode(&self.snapshot())?)
    }

    /// Validate `config` against the current state and write the registers it changes.
    ///
    /// Nothing is written unless every field validates.
    pub fn apply(&self, config: &Configuration, force: bool) -> Result<RegisterWrites, Error> {
        let writes = video::encode(config, &self.snapshot(), force)?;
        self.commit(&writes);
        Ok(writes)
    }

    fn commit(&self, writes: &RegisterWrites) {
        if let Some(value) = writes.config0 {
            debug!("CONFIG0 <- {:#010x}", value);
            self.encoder.set_config0(value);
        }
        if let Some(word) = writes.frequency {
            debug!("FREQ <- {:#010x}", word);
            self.encoder.set_frequency_word(word);
        }
        if let Some(value) = writes.config1 {
            debug!("CONFIG1 <- {:#010x}", value);
            self.encoder.set_config1(value);
        }
        if let Some(value) = writes.config2 {
            debug!("CONFIG2 <- {:#010x}", value);
            self.encoder.set_config2(value);
        }
        if let Some(word) = writes.secam_b_frequency {
            debug!("FCW_SECAM_B <- {:#010x}", word);
            self.encoder.set_secam_b_frequency_word(word);
        }
        if let Some(value) = writes.config3 {
            debug!("CONFIG3 <- {:#010x}", value);
            self.encoder.set_config3(value);
        }
        if let Some(value) = writes.cfg {
            debug!("CFG <- {:#010x}", value);
            self.encoder.set_cfg(value);
        }
        if let Some(value) = writes.horza {
            debug!("HORZA <- {:#010x}", value);
            self.pixelvalve.set_horza(value);
        }
        if let Some(value) = writes.horzb {
            debug!("HORZB <- {:#010x}", value);
            self.pixelvalve.set_horzb(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            platform::raspberrypi::device_driver::MemoryWindow,
            test_support::{ntsc_registers, DeviceTreeFixture},
            video::{frequency, PictureMode, Preset, VideoStandard},
        },
        tempfile::NamedTempFile,
    };

    fn load(pixelvalve: &MemoryWindow, vec: &MemoryWindow, registers: &RegisterSnapshot) {
        pixelvalve.write(0x00, registers.control);
        pixelvalve.write(0x0c, registers.horza);
        pixelvalve.write(0x10, registers.horzb);
        let encoder = VideoEncoder::new(vec);
        encoder.set_config0(registers.config0);
        encoder.set_frequency_word(registers.frequency);
        encoder.set_config1(registers.config1);
        encoder.set_config2(registers.config2);
        encoder.set_secam_b_frequency_word(registers.secam_b_frequency);
        encoder.set_config3(registers.config3);
        encoder.set_cfg(registers.cfg);
    }

    fn ntsc_hardware() -> (MemoryWindow, MemoryWindow) {
        let windows = (MemoryWindow::default(), MemoryWindow::default());
        load(&windows.0, &windows.1, &ntsc_registers());
        windows
    }

    #[test]
    fn snapshot_reads_every_register() {
        let (pixelvalve, vec) = ntsc_hardware();
        let session = Session::new(VideoCoreModel::VideoCore4, &pixelvalve, &vec);
        assert_eq!(session.snapshot(), ntsc_registers());
        assert_eq!(session.model(), VideoCoreModel::VideoCore4);
        assert_eq!(
            session.current_config().unwrap().standard,
            Some(VideoStandard::Ntsc)
        );
    }

    #[test]
    fn apply_writes_only_touched_registers() {
        let (pixelvalve, vec) = ntsc_hardware();
        vec.write(0x18c, 0x8000);
        let session = Session::new(VideoCoreModel::VideoCore6, &pixelvalve, &vec);

        let config = Configuration {
            sync_adj: Some(3),
            ..Configuration::EMPTY
        };
        let writes = session.apply(&config, false).unwrap();
        assert_eq!(
            writes,
            RegisterWrites {
                config2: Some(0xb000),
                ..RegisterWrites::default()
            }
        );
        assert_eq!(vec.read(0x18c), 0xb000);
        assert_eq!(session.current_config().unwrap().sync_adj, Some(3));
    }

    #[test]
    fn rejected_apply_writes_nothing() {
        let (pixelvalve, vec) = ntsc_hardware();
        let session = Session::new(VideoCoreModel::VideoCore4, &pixelvalve, &vec);
        let before = session.snapshot();

        // Valid frequency, invalid shift: the frequency must not land either.
        let config = Configuration {
            fsc: Some(frequency::PAL_HZ),
            hshift: Some(30.0),
            ..Configuration::EMPTY
        };
        let err = session.apply(&config, false).unwrap_err();
        assert!(matches!(
            err,
            Error::Config {
                source: ConfigError::ShiftOutOfRange { .. }
            }
        ));
        assert_eq!(session.snapshot(), before);
    }

    #[test]
    fn idle_pixel_valve_needs_force() {
        let (pixelvalve, vec) = ntsc_hardware();
        pixelvalve.write(0x00, 0);
        let session = Session::new(VideoCoreModel::VideoCore4, &pixelvalve, &vec);
        let config = Configuration {
            picture: Some(PictureMode::Colorbars),
            ..Configuration::EMPTY
        };
        assert!(matches!(
            session.apply(&config, false),
            Err(Error::Config {
                source: ConfigError::Inactive
            })
        ));
        session.apply(&config, true).unwrap();
        assert_eq!(
            session.current_config().unwrap().picture,
            Some(PictureMode::Colorbars)
        );
    }

    #[test]
    fn preset_with_shift_lands_in_hardware() {
        let (pixelvalve, vec) = ntsc_hardware();
        let session = Session::new(VideoCoreModel::VideoCore4, &pixelvalve, &vec);
        let config = Configuration {
            hshift: Some(-3.0),
            ..Preset::PalM.configuration()
        };
        session.apply(&config, false).unwrap();

        assert_eq!(pixelvalve.read(0x0c), (57 << 16) | 64);
        assert_eq!(pixelvalve.read(0x10), (17 << 16) | 720);
        let current = session.current_config().unwrap();
        assert_eq!(current.standard, Some(VideoStandard::PalM));
        assert_eq!(current.hshift, Some(-3.0));
        assert_eq!(current.fsc, Some(frequency::PAL_M_HZ));
        assert_eq!(vec.read(0x208), 0xa);
    }

    #[test]
    fn error_kinds() {
        let fixture = DeviceTreeFixture::empty();
        let config = SessionConfig {
            devicetree: fixture.path().to_path_buf(),
            ..SessionConfig::default()
        };
        let err = Session::open(&config).err().unwrap();
        assert!(err.is_platform_mismatch());
        assert!(!err.is_permission_denied());

        let fixture = DeviceTreeFixture::raspberry_pi_3();
        let config = SessionConfig {
            devicetree: fixture.path().to_path_buf(),
            memory_device: fixture.path().join("no-such-device"),
        };
        let err = Session::open(&config).err().unwrap();
        assert!(matches!(err, Error::Map { .. }));
        assert!(!err.is_platform_mismatch());
    }

    #[test]
    fn open_maps_both_windows() {
        let fixture = DeviceTreeFixture::raspberry_pi_3();
        let memory = NamedTempFile::new().unwrap();
        // Sparse, reads back as zeroes.
        memory.as_file().set_len(0x4000_0000).unwrap();
        let config = SessionConfig {
            devicetree: fixture.path().to_path_buf(),
            memory_device: memory.path().to_path_buf(),
        };

        {
            let session = Session::open(&config).unwrap();
            assert_eq!(session.model(), VideoCoreModel::VideoCore4);
            assert_eq!(session.snapshot(), RegisterSnapshot::default());

            let config = Configuration {
                enable_burst: Some(false),
                ..Configuration::EMPTY
            };
            assert!(session.apply(&config, false).is_err());
            session.apply(&config, true).unwrap();
        }

        let session = Session::open(&config).unwrap();
        assert_eq!(session.current_config().unwrap().enable_burst, Some(false));
    }
}
