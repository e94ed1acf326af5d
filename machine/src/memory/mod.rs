/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

//! Peripheral register windows mapped from `/dev/mem`.

use {
    crate::platform::raspberrypi::device_driver::common::RegisterWindow,
    memmap::{MmapMut, MmapOptions},
    snafu::{ResultExt, Snafu},
    std::{
        fs::{File, OpenOptions},
        io,
        os::unix::fs::OpenOptionsExt,
        path::{Path, PathBuf},
        ptr,
    },
    tracing::debug,
};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

pub const DEV_MEM: &str = "/dev/mem";

#[derive(Debug, Snafu)]
pub enum MapError {
    #[snafu(display("Cannot open {}: {}", path.display(), source))]
    Open { path: PathBuf, source: io::Error },
    #[snafu(display("Cannot map {:#x} bytes at physical address {:#x}: {}", length, address, source))]
    Map {
        address: u64,
        length: usize,
        source: io::Error,
    },
}

/// Open handle on the physical memory device. Windows mapped from it stay valid after the
/// handle is dropped.
#[derive(Debug)]
pub struct DevMem {
    file: File,
}

/// A page-aligned mapping of physical memory with word access at byte offsets from the
/// requested address.
pub struct MappedWindow {
    // Keeps the mapping alive, unmapped on drop.
    _map: MmapMut,
    base: *mut u8,
    address: u64,
    length: usize,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl MapError {
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Open { source, .. } | Self::Map { source, .. } => {
                source.kind() == io::ErrorKind::PermissionDenied
            }
        }
    }
}

impl DevMem {
    /// Open the memory device read-write and uncached.
    pub fn open(path: &Path) -> Result<Self, MapError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(path)
            .context(OpenSnafu { path })?;
        Ok(Self { file })
    }

    /// Map `length` bytes of physical memory starting at `address`.
    pub fn map(&self, address: u64, length: usize) -> Result<MappedWindow, MapError> {
        let page_offset = address % page_size();
        let aligned = address - page_offset;
        let page_offset = page_offset as usize;

        // Safety: nothing else in this process aliases the mapping; concurrent modification
        // by the hardware is why every access through it is volatile.
        let mut map = unsafe {
            MmapOptions::new()
                .offset(aligned)
                .len(length + page_offset)
                .map_mut(&self.file)
        }
        .context(MapSnafu { address, length })?;

        // Safety: page_offset is within the mapping we just created.
        let base = unsafe { map.as_mut_ptr().add(page_offset) };

        debug!("Mapped {:#x} bytes of physical memory at {:#x}", length, address);
        Ok(MappedWindow {
            _map: map,
            base,
            address,
            length,
        })
    }
}

impl MappedWindow {
    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    fn register(&self, offset: usize) -> *mut u32 {
        assert!(
            offset % 4 == 0 && offset + 4 <= self.length,
            "register offset {offset:#x} outside of {:#x}-byte window",
            self.length
        );
        // Safety: checked to be an aligned word inside the mapping.
        unsafe { self.base.add(offset).cast::<u32>() }
    }
}

impl RegisterWindow for MappedWindow {
    fn read(&self, offset: usize) -> u32 {
        // Safety: see register().
        unsafe { ptr::read_volatile(self.register(offset)) }
    }

    fn write(&self, offset: usize, value: u32) {
        // Safety: see register().
        unsafe { ptr::write_volatile(self.register(offset), value) }
    }
}

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

fn page_size() -> u64 {
    // Safety: sysconf has no preconditions.
    match unsafe { libc::sysconf(libc::_SC_PAGESIZE) } {
        size if size > 0 => size as u64,
        _ => 0x1000,
    }
}
