/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

//! Bus address translation through the device tree the kernel exports under
//! `/sys/firmware/devicetree/base`.
//!
//! Only the part of DTSpec needed to find a peripheral's ARM physical address is here:
//! cell sizes, the `ranges` property of the `soc` bus, a node's `reg` and the
//! `__symbols__` table.

use {
    snafu::{ensure, OptionExt, ResultExt, Snafu},
    std::{
        collections::HashSet,
        fs, io,
        path::{Path, PathBuf},
    },
    tracing::debug,
};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Where Linux exposes the unflattened device tree.
pub const DEVICETREE_BASE: &str = "/sys/firmware/devicetree/base";

/// One cell is a big-endian u32.
const CELL_SIZE: usize = 4;

/// Widest address or size value we decode, in bytes.
const MAX_VALUE_WIDTH: usize = 8;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DeviceTreeError {
    #[snafu(display("Cannot read device tree property {}: {}", path.display(), source))]
    ReadProperty { path: PathBuf, source: io::Error },
    #[snafu(display(
        "Device tree property {} is {} bytes long, expected {}",
        path.display(),
        length,
        expected
    ))]
    PropertyLength {
        path: PathBuf,
        length: usize,
        expected: usize,
    },
    #[snafu(display("{}: {}-byte values are not supported", path.display(), width))]
    CellsTooWide { path: PathBuf, width: usize },
    #[snafu(display("{}: {} cells is not a usable value width", path.display(), cells))]
    CellCountOverflow { path: PathBuf, cells: u32 },
    #[snafu(display(
        "{}: {} bytes of ranges is not a multiple of the {}-byte entry size",
        path.display(),
        length,
        entry_size
    ))]
    MalformedRanges {
        path: PathBuf,
        length: usize,
        entry_size: usize,
    },
    #[snafu(display("Device tree symbol {} not found", symbol))]
    SymbolNotFound { symbol: String },
    #[snafu(display("Bus address {:#x} is not covered by any bus range", address))]
    UnmappedAddress { address: u64 },
    #[snafu(display("None of {} is present in the device tree", symbols.join(", ")))]
    MissingPixelValve { symbols: Vec<&'static str> },
}

pub type Result<T> = ::core::result::Result<T, DeviceTreeError>;

/// One `ranges` entry: `size` bytes at `child_address` on the child bus appear at
/// `parent_address` on the parent bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressRange {
    pub child_address: u64,
    pub parent_address: u64,
    pub size: u64,
}

/// Reads properties from an unflattened device tree directory.
#[derive(Debug, Clone)]
pub struct DeviceTree {
    base: PathBuf,
}

/// Translates `soc` bus addresses to ARM physical addresses.
#[derive(Debug, Clone, Default)]
pub struct AddressMapper {
    ranges: HashSet<AddressRange>,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl DeviceTreeError {
    /// The firmware does not describe the hardware we expect to run on.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ReadProperty { source, .. } => source.kind() == io::ErrorKind::NotFound,
            Self::SymbolNotFound { .. }
            | Self::UnmappedAddress { .. }
            | Self::MissingPixelValve { .. } => true,
            _ => false,
        }
    }
}

impl AddressRange {
    pub fn contains(&self, address: u64) -> bool {
        // Written as a difference so that ranges ending at the top of the space don't overflow.
        self.child_address <= address && address - self.child_address < self.size
    }

    pub fn translate(&self, address: u64) -> Option<u64> {
        if !self.contains(address) {
            return None;
        }
        (address - self.child_address).checked_add(self.parent_address)
    }
}

impl Default for DeviceTree {
    fn default() -> Self {
        Self::new(DEVICETREE_BASE)
    }
}

impl DeviceTree {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Filesystem location of an absolute device tree node path like `/soc/vec@7e806000`.
    pub fn node(&self, path: &str) -> PathBuf {
        self.base.join(path.trim_start_matches('/'))
    }

    /// Read a `#address-cells` or `#size-cells` property and return the width it describes
    /// in bytes.
    pub fn read_cell_size(&self, path: &Path) -> Result<usize> {
        let raw = read_property(path)?;
        let cells: [u8; CELL_SIZE] =
            raw.as_slice()
                .try_into()
                .ok()
                .context(PropertyLengthSnafu {
                    path,
                    length: raw.len(),
                    expected: CELL_SIZE,
                })?;
        let cells = u32::from_be_bytes(cells);
        usize::try_from(cells)
            .ok()
            .and_then(|cells| cells.checked_mul(CELL_SIZE))
            .context(CellCountOverflowSnafu { path, cells })
    }

    /// Decode the `ranges` property of a bus node.
    ///
    /// Child addresses use the node's own `#address-cells`, parent addresses the parent node's
    /// `#address-cells`, sizes the node's `#size-cells`. Identical entries collapse into one.
    pub fn read_ranges(&self, node: &Path) -> Result<HashSet<AddressRange>> {
        let parent = node.parent().unwrap_or(self.base.as_path());

        let child_width = self.read_value_width(&node.join("#address-cells"))?;
        let parent_width = self.read_value_width(&parent.join("#address-cells"))?;
        let size_width = self.read_value_width(&node.join("#size-cells"))?;
        let entry_size = child_width + parent_width + size_width;

        let path = node.join("ranges");
        let raw = read_property(&path)?;

        ensure!(
            entry_size > 0 && raw.len() % entry_size == 0,
            MalformedRangesSnafu {
                path,
                length: raw.len(),
                entry_size,
            }
        );

        let ranges: HashSet<AddressRange> = raw
            .chunks_exact(entry_size)
            .map(|entry| {
                let (child, rest) = entry.split_at(child_width);
                let (parent, size) = rest.split_at(parent_width);
                AddressRange {
                    child_address: from_be(child),
                    parent_address: from_be(parent),
                    size: from_be(size),
                }
            })
            .collect();

        debug!(node = %node.display(), count = ranges.len(), "Read bus ranges");
        Ok(ranges)
    }

    /// Resolve a label from `__symbols__` to the node it points at.
    pub fn symbol_path(&self, symbol: &str) -> Result<PathBuf> {
        let path = self.base.join("__symbols__").join(symbol);
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return SymbolNotFoundSnafu { symbol }.fail();
            }
            Err(source) => return Err(DeviceTreeError::ReadProperty { path, source }),
        };
        let target = String::from_utf8_lossy(&raw).replace('\0', "");
        Ok(self.node(&target))
    }

    /// The bus address from the first entry of a node's `reg` property.
    ///
    /// `reg` is laid out according to the `#address-cells` of the enclosing bus.
    pub fn node_address(&self, node: &Path) -> Result<u64> {
        let parent = node.parent().unwrap_or(self.base.as_path());
        let width = self.read_value_width(&parent.join("#address-cells"))?;

        let path = node.join("reg");
        let raw = read_property(&path)?;
        ensure!(
            raw.len() >= width,
            PropertyLengthSnafu {
                path,
                length: raw.len(),
                expected: width,
            }
        );
        Ok(from_be(&raw[..width]))
    }

    fn read_value_width(&self, path: &Path) -> Result<usize> {
        let width = self.read_cell_size(path)?;
        ensure!(width <= MAX_VALUE_WIDTH, CellsTooWideSnafu { path, width });
        Ok(width)
    }
}

impl AddressMapper {
    pub fn new(ranges: HashSet<AddressRange>) -> Self {
        Self { ranges }
    }

    /// Load the ranges of the `soc` bus.
    pub fn from_device_tree(tree: &DeviceTree) -> Result<Self> {
        Ok(Self::new(tree.read_ranges(&tree.node("/soc"))?))
    }

    pub fn ranges(&self) -> impl Iterator<Item = &AddressRange> {
        self.ranges.iter()
    }

    /// Translate a bus address, `None` if no range covers it.
    pub fn map_address(&self, address: u64) -> Option<u64> {
        self.ranges.iter().find_map(|range| range.translate(address))
    }

    /// ARM physical address of a device tree node.
    pub fn map_path_address(&self, tree: &DeviceTree, node: &Path) -> Result<u64> {
        let address = tree.node_address(node)?;
        let physical = self
            .map_address(address)
            .context(UnmappedAddressSnafu { address })?;
        debug!(
            node = %node.display(),
            "Bus address {:#x} maps to {:#x}", address, physical
        );
        Ok(physical)
    }

    /// ARM physical address of the node a `__symbols__` label points at.
    pub fn map_symbol_address(&self, tree: &DeviceTree, symbol: &str) -> Result<u64> {
        self.map_path_address(tree, &tree.symbol_path(symbol)?)
    }
}

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

fn read_property(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).context(ReadPropertySnafu { path })
}

fn from_be(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0u64, |value, byte| value << 8 | u64::from(*byte))
}
