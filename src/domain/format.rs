//! Amount & Price Formatting
//!
//! Conversions between on-chain base units and human amounts, and the
//! display rules used for swap amounts, bubble prices and percent changes.

use std::str::FromStr;

use rust_decimal::prelude::*;
use rust_decimal::RoundingStrategy;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AmountError {
    #[error("Invalid amount: {0}")]
    Invalid(String),
    #[error("Amount must be positive")]
    NotPositive,
    #[error("Amount out of range for {decimals} decimals")]
    OutOfRange { decimals: u32 },
}

/// Parse a human amount ("1.5") into base units for a token with `decimals`
pub fn parse_units(amount: &str, decimals: u32) -> Result<u128, AmountError> {
    if decimals > 28 {
        return Err(AmountError::OutOfRange { decimals });
    }
    let value = Decimal::from_str(amount.trim()).map_err(|_| AmountError::Invalid(amount.to_string()))?;
    if value <= Decimal::ZERO {
        return Err(AmountError::NotPositive);
    }

    let factor = Decimal::from_i128_with_scale(10i128.pow(decimals), 0);
    value
        .checked_mul(factor)
        .map(|v| v.trunc())
        .and_then(|v| v.to_u128())
        .ok_or(AmountError::OutOfRange { decimals })
}

/// Convert base units back into a decimal amount
pub fn format_units(raw: u128, decimals: u32) -> Result<Decimal, AmountError> {
    if decimals > 28 {
        return Err(AmountError::OutOfRange { decimals });
    }
    let raw = i128::try_from(raw).map_err(|_| AmountError::OutOfRange { decimals })?;
    Decimal::try_from_i128_with_scale(raw, decimals)
        .map(|d| d.normalize())
        .map_err(|_| AmountError::OutOfRange { decimals })
}

/// Same as [`format_units`] for the decimal strings returned by the swap API
pub fn format_raw_units(raw: &str, decimals: u32) -> Result<Decimal, AmountError> {
    let raw = u128::from_str(raw.trim()).map_err(|_| AmountError::Invalid(raw.to_string()))?;
    format_units(raw, decimals)
}

/// Format an amount with fewer decimals the more integer digits it has.
///
/// 7+ digits: 0, 6: 1, 5: 2, 3-4: 4, otherwise 6. Trailing zeros are trimmed.
pub fn format_amount(value: Decimal) -> String {
    let integer_digits = value.abs().trunc().normalize().to_string().len();
    let max_decimals = match integer_digits {
        d if d >= 7 => 0,
        6 => 1,
        5 => 2,
        d if d >= 3 => 4,
        _ => 6,
    };

    value
        .round_dp_with_strategy(max_decimals, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
        .to_string()
}

/// USD price with 2 decimals from $1 up, up to 6 below
pub fn format_usd(price: f64) -> String {
    let Some(value) = Decimal::from_f64(price) else {
        return "N/A".to_string();
    };

    let max_decimals = if value.abs() >= Decimal::ONE { 2 } else { 6 };
    let mut rounded = value
        .round_dp_with_strategy(max_decimals, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    if rounded.scale() < 2 {
        rounded.rescale(2);
    }

    let text = rounded.abs().to_string();
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };

    format!("{}${}.{}", sign, group_thousands(int_part), frac_part)
}

/// Signed percent change, e.g. `+3.21%`
pub fn format_change(change: Option<f64>) -> String {
    match change {
        Some(c) if c >= 0.0 => format!("+{:.2}%", c),
        Some(c) => format!("{:.2}%", c),
        None => "N/A".to_string(),
    }
}

/// Compact USD figure for tables: $1.23B, $45.6M, $7.8K
pub fn format_compact_usd(value: Option<f64>) -> String {
    match value {
        None => "N/A".to_string(),
        Some(v) if v.abs() >= 1e9 => format!("${:.2}B", v / 1e9),
        Some(v) if v.abs() >= 1e6 => format!("${:.2}M", v / 1e6),
        Some(v) if v.abs() >= 1e3 => format!("${:.2}K", v / 1e3),
        Some(v) => format!("${:.2}", v),
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
