/*
 * SPDX-License-Identifier: BlueOak-1.0.0
 * Copyright (c) Berkus Decker <berkus+vesper@metta.systems>
 */

//! Masked integer sub-fields of 32-bit registers.

use {
    super::{ConfigError, InvalidValueSnafu},
    snafu::ensure,
    tock_registers::{fields::Field, LocalRegisterCopy, RegisterLongName},
};

/// Value of the sub-field selected by `mask`, shifted down to bit 0.
///
/// `mask` must be non-zero and contiguous.
pub fn extract(register: u32, mask: u32) -> u32 {
    debug_assert!(is_contiguous(mask), "mask {mask:#x} is not contiguous");
    (register & mask) >> mask.trailing_zeros()
}

/// `register` with the sub-field selected by `mask` replaced by `value`.
///
/// `value` must fit into the field, otherwise the error names the field `name` and the valid
/// range. Bits outside `mask` are preserved.
pub fn insert(name: &'static str, register: u32, mask: u32, value: i64) -> Result<u32, ConfigError> {
    debug_assert!(is_contiguous(mask), "mask {mask:#x} is not contiguous");
    let max = (1i64 << mask.count_ones()) - 1;
    ensure!(
        (0..=max).contains(&value),
        InvalidValueSnafu { name, value, max }
    );
    Ok((register & !mask) | ((value as u32) << mask.trailing_zeros()))
}

/// In-place mask of a declared register field.
pub fn field_mask<R: RegisterLongName>(field: Field<u32, R>) -> u32 {
    field.mask << field.shift
}

pub fn extract_field<R: RegisterLongName>(
    register: &LocalRegisterCopy<u32, R>,
    field: Field<u32, R>,
) -> u32 {
    extract(register.get(), field_mask(field))
}

/// [`insert`] for a declared register field.
pub fn insert_field<R: RegisterLongName>(
    name: &'static str,
    register: &mut LocalRegisterCopy<u32, R>,
    field: Field<u32, R>,
    value: i64,
) -> Result<(), ConfigError> {
    register.set(insert(name, register.get(), field_mask(field), value)?);
    Ok(())
}

fn is_contiguous(mask: u32) -> bool {
    let shifted = mask.checked_shr(mask.trailing_zeros()).unwrap_or(0);
    shifted != 0 && shifted & shifted.wrapping_add(1) == 0
}
