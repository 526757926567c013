//! Decimal string <-> fixed-point integer conversion for token amounts
//!
//! Strings are parsed with `rust_decimal`, so an amount carries at most 28
//! significant digits and at most 28 decimal places.

use crate::error::{AmmError, AmmResult};
use rust_decimal::Decimal;
use std::str::FromStr;
use web3::types::U256;

/// Largest supported `decimals`, the maximum `Decimal` scale
pub const MAX_DECIMALS: u32 = 28;

/// Parse a human amount such as `"1.5"` into base units with `decimals` places
pub fn parse_units(value: &str, decimals: u32) -> AmmResult<U256> {
    if decimals > MAX_DECIMALS {
        return Err(AmmError::InvalidUnits("too many decimals"));
    }
    let amount = Decimal::from_str(value.trim())
        .map_err(|_| AmmError::InvalidUnits("amount must be an unsigned decimal"))?;
    if amount.is_sign_negative() {
        return Err(AmmError::InvalidUnits("amount must be an unsigned decimal"));
    }

    // trailing zeros do not count against `decimals`
    let amount = amount.normalize();
    if amount.scale() > decimals {
        return Err(AmmError::InvalidUnits("fraction exceeds decimals"));
    }

    let mantissa = u128::try_from(amount.mantissa())
        .map_err(|_| AmmError::InvalidUnits("amount must be an unsigned decimal"))?;
    U256::from(mantissa)
        .checked_mul(U256::exp10((decimals - amount.scale()) as usize))
        .ok_or(AmmError::InvalidUnits("amount out of range"))
}

/// Render base units as a decimal string, always with a fractional part (`"1.0"`)
pub fn format_units(value: U256, decimals: u32) -> AmmResult<String> {
    if decimals > MAX_DECIMALS {
        return Err(AmmError::InvalidUnits("too many decimals"));
    }
    let scale = U256::exp10(decimals as usize);
    let whole = value / scale;
    // below 10^28, inside the 96-bit Decimal mantissa
    let remainder = (value % scale).low_u128();

    let fraction = Decimal::from_i128_with_scale(remainder as i128, decimals).normalize();
    if fraction.is_zero() {
        return Ok(format!("{}.0", whole));
    }
    let fraction = fraction.to_string();
    Ok(format!("{}{}", whole, fraction.trim_start_matches('0')))
}
