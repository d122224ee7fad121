//! Decimal amount parsing and formatting.

use alloy_primitives::{
    U256,
    utils::{ParseUnits, format_units, parse_units},
};

/// Decimals of the native asset and of the test token.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Reasons a user supplied amount is rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount must be greater than zero")]
    Zero,
    #[error("amount must not be negative")]
    Negative,
    #[error("invalid amount `{input}`: {reason}")]
    Invalid { input: String, reason: String },
}

/// Parses a positive decimal amount, e.g. `"1.5"`, into base units.
pub fn parse_amount(input: &str, decimals: u8) -> Result<U256, AmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AmountError::Empty);
    }
    let parsed = parse_units(input, decimals).map_err(|err| AmountError::Invalid {
        input: input.to_string(),
        reason: err.to_string(),
    })?;
    match parsed {
        ParseUnits::U256(value) if value.is_zero() => Err(AmountError::Zero),
        ParseUnits::U256(value) => Ok(value),
        ParseUnits::I256(value) if value.is_zero() => Err(AmountError::Zero),
        ParseUnits::I256(_) => Err(AmountError::Negative),
    }
}

/// Formats base units as a decimal string without trailing zeros.
pub fn format_amount(value: U256, decimals: u8) -> String {
    let Ok(formatted) = format_units(value, decimals) else {
        return value.to_string();
    };
    match formatted.split_once('.') {
        Some((int, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() { int.to_string() } else { format!("{int}.{frac}") }
        }
        None => formatted,
    }
}

/// Formats base units rounded down to at most `places` fractional digits.
pub fn format_amount_truncated(value: U256, decimals: u8, places: usize) -> String {
    let full = format_amount(value, decimals);
    match full.split_once('.') {
        Some((int, frac)) if frac.len() > places => {
            let frac = frac[..places].trim_end_matches('0');
            if frac.is_empty() { int.to_string() } else { format!("{int}.{frac}") }
        }
        _ => full,
    }
}
