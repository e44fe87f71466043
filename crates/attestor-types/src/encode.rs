//! String-encoded integer parsing for wire payloads.
//!
//! Coordinate and balance values arrive as decimal strings, `0x` hex
//! strings, or — from sloppy upstream serializers — scientific notation
//! (`1.5e+21`). Everything is normalized to a `BigUint` here so the rest of
//! the system only ever sees canonical integers.

use crate::error::{AttestorError, Result};
use num_bigint::BigUint;
use num_traits::Zero;

/// Parse a string-encoded unsigned integer.
///
/// Accepts plain decimal, `0x`-prefixed hex, and scientific notation with a
/// non-negative integral result. Anything else is a malformed submission.
pub fn parse_uint_str(s: &str) -> Result<BigUint> {
    let s = s.trim();
    if s.is_empty() {
        return Err(AttestorError::MalformedSubmission(
            "empty integer string".to_string(),
        ));
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return BigUint::parse_bytes(hex.as_bytes(), 16).ok_or_else(|| {
            AttestorError::MalformedSubmission(format!("invalid hex integer: {}", s))
        });
    }

    if s.contains(['e', 'E']) {
        return parse_scientific(s);
    }

    BigUint::parse_bytes(s.as_bytes(), 10)
        .ok_or_else(|| AttestorError::MalformedSubmission(format!("invalid integer: {}", s)))
}

/// Re-encode any accepted integer form as a canonical decimal string.
pub fn canonical_uint_string(s: &str) -> Result<String> {
    Ok(parse_uint_str(s)?.to_str_radix(10))
}

/// `<mantissa>[.<fraction>]e<exponent>`, exponent large enough to absorb the
/// fraction. `1.5e+21` is fine; `1.5e0` is not an integer and is rejected.
fn parse_scientific(s: &str) -> Result<BigUint> {
    let malformed = || AttestorError::MalformedSubmission(format!("invalid scientific form: {}", s));

    let (mantissa, exponent) = s
        .split_once(['e', 'E'])
        .ok_or_else(malformed)?;
    let exponent: u32 = exponent
        .strip_prefix('+')
        .unwrap_or(exponent)
        .parse()
        .map_err(|_| malformed())?;

    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };
    let frac_part = frac_part.trim_end_matches('0');
    if frac_part.len() as u32 > exponent {
        return Err(malformed());
    }

    let digits: String = format!("{}{}", int_part, frac_part);
    let value = BigUint::parse_bytes(digits.as_bytes(), 10).ok_or_else(malformed)?;
    let shift = exponent - frac_part.len() as u32;
    if value.is_zero() {
        return Ok(BigUint::zero());
    }
    Ok(value * BigUint::from(10u8).pow(shift))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_and_hex() {
        assert_eq!(parse_uint_str("12345").unwrap(), BigUint::from(12345u32));
        assert_eq!(parse_uint_str("0xff").unwrap(), BigUint::from(255u32));
        assert_eq!(parse_uint_str("  42 ").unwrap(), BigUint::from(42u32));
    }

    #[test]
    fn test_scientific_notation() {
        assert_eq!(
            canonical_uint_string("1.5e+21").unwrap(),
            "1500000000000000000000"
        );
        assert_eq!(canonical_uint_string("2e3").unwrap(), "2000");
        assert_eq!(canonical_uint_string("1.20e2").unwrap(), "120");
        assert_eq!(canonical_uint_string("0e5").unwrap(), "0");
    }

    #[test]
    fn test_rejects_non_integers() {
        assert!(parse_uint_str("").is_err());
        assert!(parse_uint_str("-5").is_err());
        assert!(parse_uint_str("1.5e0").is_err());
        assert!(parse_uint_str("12.34").is_err());
        assert!(parse_uint_str("abc").is_err());
    }
}
