//! Conversion between human readable decimal amounts and integer base units.
//!
//! Parsing is strict by default: an input with more fractional digits than the token supports is
//! rejected. Callers that want to drop the excess digits must use [`parse_units_truncating`],
//! which reports whether anything non-zero was discarded.

use num_bigint::BigUint;
use num_traits::Zero;

use crate::{errors::SwapError, models::Amount};

/// Returns `10^exp` as a big integer.
pub fn pow10(exp: u32) -> BigUint {
    BigUint::from(10u32).pow(exp)
}

/// Splits a plain, non-negative decimal literal into its integer and fractional digits.
///
/// Accepts `"12"`, `"12.5"`, `".5"` and `"12."`. Rejects signs, exponents, separators and
/// anything else that is not an ASCII digit.
pub(crate) fn split_decimal(input: &str) -> Result<(&str, &str), SwapError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(SwapError::InvalidAmount("amount is empty".to_string()));
    }
    if trimmed.starts_with('-') {
        return Err(SwapError::InvalidAmount(format!("amount must not be negative: {trimmed}")));
    }

    let (int_part, frac_part) = trimmed
        .split_once('.')
        .unwrap_or((trimmed, ""));

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (int_part.is_empty() && frac_part.is_empty()) || !all_digits(int_part) || !all_digits(frac_part)
    {
        return Err(SwapError::InvalidAmount(format!("not a decimal number: {trimmed}")));
    }
    Ok((int_part, frac_part))
}

/// Parses a string of ASCII digits, treating the empty string as zero.
pub(crate) fn parse_digits(digits: &str) -> Result<BigUint, SwapError> {
    if digits.is_empty() {
        return Ok(BigUint::zero());
    }
    BigUint::parse_bytes(digits.as_bytes(), 10)
        .ok_or_else(|| SwapError::InvalidAmount(format!("not a decimal number: {digits}")))
}

fn to_base_units(int_part: &str, frac_part: &str, decimals: u8) -> Result<BigUint, SwapError> {
    let scaled = format!("{int_part}{frac_part:0<width$}", width = decimals as usize);
    parse_digits(&scaled)
}

/// Converts a human readable amount (e.g. `"1.5"`) to base units using `decimals` precision.
///
/// Fails with [`SwapError::InvalidAmount`] if the input is negative, not a plain decimal number,
/// or carries more fractional digits than `decimals`.
pub fn parse_units(human: &str, decimals: u8) -> Result<Amount, SwapError> {
    let (int_part, frac_part) = split_decimal(human)?;
    if frac_part.len() > decimals as usize {
        return Err(SwapError::InvalidAmount(format!(
            "{} has {} fractional digits but the token supports {decimals}",
            human.trim(),
            frac_part.len()
        )));
    }
    Ok(Amount::new(to_base_units(int_part, frac_part, decimals)?, decimals))
}

/// Like [`parse_units`] but drops fractional digits beyond `decimals` instead of failing.
///
/// The returned flag is `true` if any non-zero digit was dropped.
pub fn parse_units_truncating(human: &str, decimals: u8) -> Result<(Amount, bool), SwapError> {
    let (int_part, frac_part) = split_decimal(human)?;
    let keep = frac_part.len().min(decimals as usize);
    let (kept, dropped) = frac_part.split_at(keep);
    let lossy = dropped.bytes().any(|b| b != b'0');
    Ok((Amount::new(to_base_units(int_part, kept, decimals)?, decimals), lossy))
}

/// Converts a numeric amount to base units.
///
/// The value is rendered with its shortest round-trip representation and then parsed strictly,
/// so binary floating point artifacts (e.g. `0.30000000000000004`) are rejected rather than
/// silently rounded.
pub fn parse_units_f64(value: f64, decimals: u8) -> Result<Amount, SwapError> {
    if !value.is_finite() {
        return Err(SwapError::InvalidAmount(format!("amount must be finite: {value}")));
    }
    if value.is_sign_negative() && value != 0.0 {
        return Err(SwapError::InvalidAmount(format!("amount must not be negative: {value}")));
    }
    parse_units(&value.abs().to_string(), decimals)
}

/// Renders a base unit integer as an exact human readable decimal, trimming trailing zeros.
pub fn format_units(value: &BigUint, decimals: u8) -> String {
    let digits = value.to_str_radix(10);
    if decimals == 0 {
        return digits;
    }

    let dec = decimals as usize;
    let padded = format!("{digits:0>width$}", width = dec + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - dec);
    let frac = frac_part.trim_end_matches('0');
    if frac.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac}")
    }
}
