/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

//! Device tree directories shaped like the ones Raspberry Pi kernels export, and register
//! states the firmware leaves behind.

use {
    crate::{device_tree::DeviceTree, video::RegisterSnapshot},
    std::{fs, path::Path},
    tempfile::TempDir,
};

pub fn be_cells(cells: &[u32]) -> Vec<u8> {
    cells.iter().flat_map(|cell| cell.to_be_bytes()).collect()
}

/// Firmware's composite NTSC output, pixel valve clocking the VEC.
pub fn ntsc_registers() -> RegisterSnapshot {
    RegisterSnapshot {
        control: 0x0000_0009,
        horza: 0x003c_0040,
        horzb: 0x000e_02d0,
        config0: 0x0000_0000,
        frequency: 0x21f0_7c1f,
        config1: 0x0000_1c00,
        config2: 0,
        secam_b_frequency: 0x284b_da13,
        config3: 0,
        cfg: 0x0000_000a,
    }
}

/// Firmware's composite PAL output.
pub fn pal_registers() -> RegisterSnapshot {
    RegisterSnapshot {
        horzb: 0x0014_02d0,
        config0: 0x0000_0001,
        frequency: 0x2a09_8acb,
        ..ntsc_registers()
    }
}

pub struct DeviceTreeFixture {
    dir: TempDir,
}

impl DeviceTreeFixture {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("temporary device tree directory"),
        }
    }

    /// BCM2711: 64-bit parent bus, pixel valves 0-4, VEC node with a stale address.
    pub fn raspberry_pi_4() -> Self {
        let fixture = Self::empty();
        fixture.write("#address-cells", &be_cells(&[2]));
        fixture.write("#size-cells", &be_cells(&[1]));
        fixture.write("soc/#address-cells", &be_cells(&[1]));
        fixture.write("soc/#size-cells", &be_cells(&[1]));
        fixture.write(
            "soc/ranges",
            &be_cells(&[
                0x7e00_0000, 0x0, 0xfe00_0000, 0x0180_0000, //
                0x7c00_0000, 0x0, 0xfc00_0000, 0x0200_0000, //
                0x4000_0000, 0x0, 0xff80_0000, 0x0080_0000,
            ]),
        );
        fixture.add_node("pixelvalve2", "/soc/pixelvalve@7e807000", 0x7e80_7000);
        fixture.add_node("pixelvalve3", "/soc/pixelvalve@7ec12000", 0x7ec1_2000);
        fixture.add_node("vec", "/soc/vec@7e806000", 0x7e80_6000);
        fixture
    }

    /// BCM2837: everything on a 32-bit bus.
    pub fn raspberry_pi_3() -> Self {
        let fixture = Self::empty();
        fixture.write("#address-cells", &be_cells(&[1]));
        fixture.write("#size-cells", &be_cells(&[1]));
        fixture.write("soc/#address-cells", &be_cells(&[1]));
        fixture.write("soc/#size-cells", &be_cells(&[1]));
        fixture.write(
            "soc/ranges",
            &be_cells(&[
                0x7e00_0000, 0x3f00_0000, 0x0100_0000, //
                0x4000_0000, 0x4000_0000, 0x0000_1000,
            ]),
        );
        fixture.add_node("pixelvalve1", "/soc/pixelvalve@7e207000", 0x7e20_7000);
        fixture.add_node("pixelvalve2", "/soc/pixelvalve@7e807000", 0x7e80_7000);
        fixture.add_node("vec", "/soc/vec@7e806000", 0x7e80_6000);
        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn tree(&self) -> DeviceTree {
        DeviceTree::new(self.dir.path())
    }

    pub fn write(&self, relative: &str, contents: &[u8]) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create device tree node");
        }
        fs::write(path, contents).expect("write device tree property");
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.dir.path().join(relative)).expect("remove device tree property");
    }

    /// A labelled node with a one-entry `reg`.
    pub fn add_node(&self, symbol: &str, node: &str, bus_address: u32) {
        let node = node.trim_start_matches('/');
        self.write(&format!("{node}/reg"), &be_cells(&[bus_address, 0x100]));
        self.write(
            &format!("__symbols__/{symbol}"),
            format!("/{node}\0").as_bytes(),
        );
    }
}
