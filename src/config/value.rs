//! Conversions between stored text and typed values.
//!
//! Values are always stored as text; these helpers run at lookup and write
//! time.

use super::{ConfigError, Result};

/// Parses a boolean config value.
///
/// Accepts `true`/`yes`/`on`/`1` and `false`/`no`/`off`/`0` in any case.
/// The empty string is false. Any other integer is true when non-zero.
pub fn parse_bool(name: &str, value: &str) -> Result<bool> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(false);
    }

    for truthy in ["true", "yes", "on"] {
        if trimmed.eq_ignore_ascii_case(truthy) {
            return Ok(true);
        }
    }
    for falsy in ["false", "no", "off"] {
        if trimmed.eq_ignore_ascii_case(falsy) {
            return Ok(false);
        }
    }

    parse_integer(trimmed)
        .map(|n| n != 0)
        .ok_or_else(|| ConfigError::parse(name, value, "bool"))
}

/// Parses a 32-bit integer config value. See [`parse_i64`] for the syntax.
pub fn parse_i32(name: &str, value: &str) -> Result<i32> {
    parse_integer(value.trim())
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(|| ConfigError::parse(name, value, "int32"))
}

/// Parses a 64-bit integer config value.
///
/// Accepts an optional sign, decimal digits or a `0x`/`0o`/`0b` prefixed
/// literal, and an optional `k`, `m` or `g` unit suffix (powers of 1024).
pub fn parse_i64(name: &str, value: &str) -> Result<i64> {
    parse_integer(value.trim())
        .and_then(|n| i64::try_from(n).ok())
        .ok_or_else(|| ConfigError::parse(name, value, "int64"))
}

pub fn render_bool(value: bool) -> String {
    value.to_string()
}

pub fn render_int(value: impl Into<i64>) -> String {
    value.into().to_string()
}

/// Shared integer grammar. Works in i128 so that overflow of the target
/// width is detected by the caller rather than wrapping here.
fn parse_integer(text: &str) -> Option<i128> {
    let (negative, rest) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };

    let (digits, multiplier) = match rest.as_bytes().last()? {
        b'k' | b'K' => (&rest[..rest.len() - 1], 1i128 << 10),
        b'm' | b'M' => (&rest[..rest.len() - 1], 1i128 << 20),
        b'g' | b'G' => (&rest[..rest.len() - 1], 1i128 << 30),
        _ => (rest, 1),
    };

    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(hex) = lower.strip_prefix("0x") {
        (16, hex)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        (8, oct)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (2, bin)
    } else {
        (10, lower.as_str())
    };

    if body.is_empty() || !body.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let magnitude = u64::from_str_radix(body, radix).ok()? as i128;
    let value = magnitude.checked_mul(multiplier)?;
    Some(if negative { -value } else { value })
}
