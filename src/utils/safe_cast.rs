//! Checked numeric conversions for pixel sizes and servo pulse widths

use crate::{Error, Result};

/// Safely convert a frame dimension reported as i32 to u32
///
/// # Errors
///
/// Returns an error if the value is negative
pub fn i32_to_u32(value: i32) -> Result<u32> {
    value
        .try_into()
        .map_err(|_| Error::InvalidInput(format!("Value {value} cannot be a size")))
}

/// Safely convert f64 to u16 with bounds checking, rounding to nearest
///
/// # Errors
///
/// Returns an error if the value is not finite or outside u16 range after rounding
#[allow(clippy::cast_possible_truncation)] // Truncation after bounds check is safe
#[allow(clippy::cast_sign_loss)] // Sign checked before the cast
pub fn f64_to_u16(value: f64) -> Result<u16> {
    let rounded = value.round();
    if rounded.is_finite() && rounded >= 0.0 && rounded <= f64::from(u16::MAX) {
        Ok(rounded as u16)
    } else {
        Err(Error::InvalidInput(format!(
            "Value {value} cannot be safely converted to u16"
        )))
    }
}
