//! Token amount parsing and formatting

use alloy_primitives::U256;
use anyhow::{Context, Result};

/// Scale a raw integer amount by `decimals` without going through floats.
///
/// Matches the usual `formatUnits` output: whole amounts keep a single
/// fractional zero (`"1.0"`) and trailing zeros are trimmed otherwise.
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;

    let (whole, frac) = if digits.len() > decimals {
        let split = digits.len() - decimals;
        (digits[..split].to_string(), digits[split..].to_string())
    } else {
        ("0".to_string(), format!("{:0>width$}", digits, width = decimals))
    };

    let trimmed = frac.trim_end_matches('0');
    if trimmed.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, trimmed)
    }
}

/// Parse a raw balance as returned by the indexing API.
///
/// Accepts `0x`-prefixed hex (the usual wire form) or plain decimal.
pub fn parse_raw_balance(value: &str) -> Result<U256> {
    let trimmed = value.trim();
    if let Some(hex_str) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        if hex_str.is_empty() {
            return Ok(U256::ZERO);
        }
        return U256::from_str_radix(hex_str, 16)
            .with_context(|| format!("Invalid hex balance: {}", trimmed));
    }
    U256::from_str_radix(trimmed, 10).with_context(|| format!("Invalid balance: {}", trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_large_value_keeps_precision() {
        let raw = U256::from(123_456_789_012_345_678u64);
        assert_eq!(format_units(raw, 18), "0.123456789012345678");
    }

    #[test]
    fn test_whole_and_fractional() {
        let one_eth = U256::from(10u64).pow(U256::from(18));
        assert_eq!(format_units(one_eth, 18), "1.0");
        assert_eq!(format_units(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_units(U256::from(1u64), 18), "0.000000000000000001");
        assert_eq!(format_units(U256::ZERO, 18), "0.0");
        assert_eq!(format_units(U256::from(42u64), 0), "42.0");
    }

    #[test]
    fn test_beyond_u128() {
        let raw = U256::MAX;
        let formatted = format_units(raw, 18);
        assert!(formatted.starts_with("115792089237316195423570985008687907853269984665640564039457"));
        assert!(formatted.ends_with(".584007913129639935"));
    }

    #[test]
    fn test_parse_raw_balance() {
        assert_eq!(
            parse_raw_balance("0x00000000000000000000000000000000000000000000000000000000000f4240")
                .unwrap(),
            U256::from(1_000_000u64)
        );
        assert_eq!(parse_raw_balance("0x").unwrap(), U256::ZERO);
        assert_eq!(parse_raw_balance("1000").unwrap(), U256::from(1000u64));
        assert!(parse_raw_balance("0xzz").is_err());
    }
}
