//! # Rate Parsing
//!
//! Converts the pricing API's decimal payload (`"0.0012"`, `"1.2e-3"`,
//! `"3.4E+2"`) into the base currency's smallest unit. Precision beyond
//! `decimals` fractional digits is truncated.

use super::entities::U256;
use super::errors::ProofError;

/// Fractional digits of the base currency.
pub const DEFAULT_DECIMALS: u32 = 18;

/// Exponents beyond this magnitude can never produce a representable rate.
const MAX_EXPONENT: i64 = 10_000;

/// Parse a decimal (optionally scientific) payload into base units.
pub fn parse_rate(result: &str, decimals: u32) -> Result<U256, ProofError> {
    let text = result.trim();
    let text = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text);
    let text = text.strip_prefix('+').unwrap_or(text);

    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(index) => (&text[..index], parse_exponent(&text[index + 1..])?),
        None => (text, 0),
    };

    let (integer, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if integer.is_empty() && fraction.is_empty() {
        return Err(invalid(format!("no digits in {result:?}")));
    }
    if !all_digits(integer) || !all_digits(fraction) {
        return Err(invalid(format!("not a decimal number: {result:?}")));
    }

    // value = digits · 10^(decimals + exponent - fraction.len())
    let digits = format!("{integer}{fraction}");
    let scale = i64::from(decimals) + exponent - fraction.len() as i64;

    let kept = if scale < 0 {
        let drop = usize::try_from(-scale).unwrap_or(usize::MAX);
        &digits[..digits.len().saturating_sub(drop)]
    } else {
        &digits[..]
    };
    let kept = kept.trim_start_matches('0');

    let mut value = U256::zero();
    for digit in kept.bytes() {
        value = value
            .checked_mul(U256::from(10u8))
            .and_then(|v| v.checked_add(U256::from(digit - b'0')))
            .ok_or_else(|| invalid(format!("rate overflows: {result:?}")))?;
    }

    if value.is_zero() {
        return Err(invalid(format!("rate is zero: {result:?}")));
    }

    if scale > 0 {
        let factor = U256::from(10u8)
            .checked_pow(U256::from(scale))
            .ok_or_else(|| invalid(format!("rate overflows: {result:?}")))?;
        value = value
            .checked_mul(factor)
            .ok_or_else(|| invalid(format!("rate overflows: {result:?}")))?;
    }

    Ok(value)
}

fn parse_exponent(text: &str) -> Result<i64, ProofError> {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid(format!("bad exponent: {text:?}")));
    }

    let magnitude: i64 = digits
        .parse()
        .ok()
        .filter(|m| *m <= MAX_EXPONENT)
        .ok_or_else(|| invalid(format!("exponent out of range: {text:?}")))?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn invalid(reason: String) -> ProofError {
    ProofError::InvalidRate(reason)
}
