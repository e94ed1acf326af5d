/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

//! Common device driver code.

use std::cell::Cell;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Bytes of register space mapped for each peripheral.
pub const WINDOW_SIZE: usize = 0x1000;

/// Word access to a block of peripheral registers.
///
/// Every call is one aligned 32-bit load or store at a byte offset into the block. Nothing is
/// cached, a read right after a write observes the written value.
pub trait RegisterWindow {
    fn read(&self, offset: usize) -> u32;
    fn write(&self, offset: usize, value: u32);
}

/// Ordinary memory standing in for a register block.
#[derive(Debug, Clone)]
pub struct MemoryWindow {
    words: Box<[Cell<u32>]>,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl<W: RegisterWindow + ?Sized> RegisterWindow for &W {
    fn read(&self, offset: usize) -> u32 {
        (**self).read(offset)
    }

    fn write(&self, offset: usize, value: u32) {
        (**self).write(offset, value)
    }
}

impl Default for MemoryWindow {
    fn default() -> Self {
        Self::new(WINDOW_SIZE)
    }
}

impl MemoryWindow {
    /// Zero-filled block of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            words: (0..size / 4).map(|_| Cell::new(0)).collect(),
        }
    }

    /// Default-sized block with some registers preset.
    pub fn with_registers(registers: &[(usize, u32)]) -> Self {
        let window = Self::default();
        for &(offset, value) in registers {
            window.write(offset, value);
        }
        window
    }

    fn index(offset: usize) -> usize {
        assert_eq!(offset % 4, 0, "unaligned register offset {offset:#x}");
        offset / 4
    }
}

impl RegisterWindow for MemoryWindow {
    fn read(&self, offset: usize) -> u32 {
        self.words[Self::index(offset)].get()
    }

    fn write(&self, offset: usize, value: u32) {
        self.words[Self::index(offset)].set(value)
    }
}
