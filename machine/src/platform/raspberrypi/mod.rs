/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

pub mod device_driver;

use {
    crate::device_tree::{
        AddressMapper, DeviceTree, DeviceTreeError, MissingPixelValveSnafu, Result,
        UnmappedAddressSnafu,
    },
    core::fmt,
    snafu::OptionExt,
    std::path::PathBuf,
    tracing::{debug, info},
};

/// GPU generation, told apart by which pixel valve drives the VEC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCoreModel {
    /// BCM2835/6/7: Raspberry Pi 1-3, Zero.
    VideoCore4,
    /// BCM2711: Raspberry Pi 4, 400, CM4.
    VideoCore6,
    /// BCM2712: Raspberry Pi 5.
    VideoCore7,
}

/// VEC bus address on BCM2711.
///
/// Some Raspberry Pi 4 kernels describe the `vec` node at the wrong address, so on VideoCore 6
/// this is used instead of the device tree symbol.
pub const BCM2711_VEC_BUS_ADDRESS: u64 = 0x7ec1_3000;

impl VideoCoreModel {
    /// Probe order: the first model whose pixel valve symbol resolves wins.
    pub const PROBE_ORDER: [Self; 3] = [Self::VideoCore6, Self::VideoCore4, Self::VideoCore7];

    /// Device tree label of the pixel valve feeding the VEC on this model.
    pub const fn pixelvalve_symbol(self) -> &'static str {
        match self {
            Self::VideoCore4 => "pixelvalve2",
            Self::VideoCore6 => "pixelvalve3",
            Self::VideoCore7 => "pixelvalve1",
        }
    }
}

impl fmt::Display for VideoCoreModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::VideoCore4 => write!(f, "VideoCore IV"),
            Self::VideoCore6 => write!(f, "VideoCore VI"),
            Self::VideoCore7 => write!(f, "VideoCore VII"),
        }
    }
}

/// Find the pixel valve node in front of the VEC and with it the GPU model.
///
/// A missing symbol just moves on to the next candidate, any other device tree error stops
/// the probe.
pub fn probe_pixelvalve(tree: &DeviceTree) -> Result<(VideoCoreModel, PathBuf)> {
    for model in VideoCoreModel::PROBE_ORDER {
        match tree.symbol_path(model.pixelvalve_symbol()) {
            Ok(path) => {
                info!("Detected {} ({})", model, path.display());
                return Ok((model, path));
            }
            Err(DeviceTreeError::SymbolNotFound { symbol }) => {
                debug!("No {} in device tree", symbol);
            }
            Err(err) => return Err(err),
        }
    }
    MissingPixelValveSnafu {
        symbols: VideoCoreModel::PROBE_ORDER
            .iter()
            .map(|model| model.pixelvalve_symbol())
            .collect::<Vec<_>>(),
    }
    .fail()
}

/// ARM physical address of the VEC registers.
pub fn vec_address(
    tree: &DeviceTree,
    mapper: &AddressMapper,
    model: VideoCoreModel,
) -> Result<u64> {
    match model {
        VideoCoreModel::VideoCore6 => mapper.map_address(BCM2711_VEC_BUS_ADDRESS).context(
            UnmappedAddressSnafu {
                address: BCM2711_VEC_BUS_ADDRESS,
            },
        ),
        _ => mapper.map_symbol_address(tree, "vec"),
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::test_support::DeviceTreeFixture};

    #[test]
    fn pixelvalve3_means_videocore6() {
        let fixture = DeviceTreeFixture::raspberry_pi_4();
        let (model, path) = probe_pixelvalve(&fixture.tree()).unwrap();
        assert_eq!(model, VideoCoreModel::VideoCore6);
        assert_eq!(path, fixture.path().join("soc/pixelvalve@7ec12000"));
    }

    #[test]
    fn pixelvalve2_wins_over_pixelvalve1() {
        let fixture = DeviceTreeFixture::raspberry_pi_3();
        let (model, path) = probe_pixelvalve(&fixture.tree()).unwrap();
        assert_eq!(model, VideoCoreModel::VideoCore4);
        assert_eq!(path, fixture.path().join("soc/pixelvalve@7e807000"));
    }

    #[test]
    fn pixelvalve1_is_the_last_resort() {
        let fixture = DeviceTreeFixture::raspberry_pi_3();
        fixture.remove("__symbols__/pixelvalve2");
        let (model, _) = probe_pixelvalve(&fixture.tree()).unwrap();
        assert_eq!(model, VideoCoreModel::VideoCore7);
    }

    #[test]
    fn no_pixelvalve_is_a_platform_mismatch() {
        let fixture = DeviceTreeFixture::raspberry_pi_3();
        fixture.remove("__symbols__/pixelvalve1");
        fixture.remove("__symbols__/pixelvalve2");
        let err = probe_pixelvalve(&fixture.tree()).unwrap_err();
        assert!(matches!(err, DeviceTreeError::MissingPixelValve { .. }));
        assert!(err.is_not_found());
    }

    #[test]
    fn videocore6_vec_address_bypasses_symbol() {
        let fixture = DeviceTreeFixture::raspberry_pi_4();
        let tree = fixture.tree();
        let mapper = AddressMapper::from_device_tree(&tree).unwrap();
        assert_eq!(
            vec_address(&tree, &mapper, VideoCoreModel::VideoCore6).unwrap(),
            0xfec1_3000
        );
        // The symbol still points at the stale node.
        assert_eq!(
            vec_address(&tree, &mapper, VideoCoreModel::VideoCore4).unwrap(),
            0xfe80_6000
        );
    }

    #[test]
    fn videocore4_vec_address_from_symbol() {
        let fixture = DeviceTreeFixture::raspberry_pi_3();
        let tree = fixture.tree();
        let mapper = AddressMapper::from_device_tree(&tree).unwrap();
        assert_eq!(
            vec_address(&tree, &mapper, VideoCoreModel::VideoCore4).unwrap(),
            0x3f80_6000
        );
    }
}
