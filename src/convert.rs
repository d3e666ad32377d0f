//! Field conversions between Qtum and Ethereum conventions
//!
//! Qtum reports amounts in QTUM (8 decimals) and gas prices in satoshi;
//! Ethereum clients expect wei (18 decimals) as `0x`-prefixed hex.

use alloy_primitives::U256;
use anyhow::{Context, Result};

/// 10^10 wei per satoshi, so that 1 QTUM maps to 1 ether.
const WEI_PER_SATOSHI: u64 = 10_000_000_000;

/// Satoshi per QTUM.
const SATOSHI_PER_QTUM: f64 = 100_000_000.0;

/// Prefix `s` with `0x` unless it already has one.
pub fn add_hex_prefix(s: &str) -> String {
    if s.starts_with("0x") {
        s.to_string()
    } else {
        format!("0x{}", s)
    }
}

/// Strip a leading `0x`, if present.
pub fn remove_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

/// Encode as minimal `0x` hex (`0x0` for zero).
pub fn encode_u64(n: u64) -> String {
    format!("0x{:x}", n)
}

pub fn encode_u256(n: U256) -> String {
    format!("0x{:x}", n)
}

/// Pad an odd-length hex string with a leading zero.
fn pad_hex_string(s: &str) -> String {
    if s.len() % 2 == 1 {
        format!("0{}", s)
    } else {
        s.to_string()
    }
}

/// Parse a big-endian hex number (with or without 0x prefix).
pub fn hex_to_u256(s: &str) -> Result<U256> {
    let s = remove_hex_prefix(s);
    if s.is_empty() {
        return Ok(U256::ZERO);
    }
    let s = pad_hex_string(s);
    let bytes = hex::decode(&s).with_context(|| format!("Invalid hex number: {}", s))?;
    if bytes.len() > 32 {
        anyhow::bail!("Number too large (max 32 bytes), got {} bytes", bytes.len());
    }
    Ok(U256::from_be_slice(&bytes))
}

pub fn satoshi_to_wei(satoshi: U256) -> U256 {
    satoshi.saturating_mul(U256::from(WEI_PER_SATOSHI))
}

/// Convert a QTUM amount as reported by the node into wei.
///
/// The node prints amounts with 8 decimals, so rounding to whole satoshi
/// recovers the exact value.
pub fn qtum_amount_to_wei(amount: f64) -> U256 {
    let satoshi = (amount * SATOSHI_PER_QTUM).round();
    if !satoshi.is_finite() || satoshi <= 0.0 {
        return U256::ZERO;
    }
    satoshi_to_wei(U256::from(satoshi as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_prefix() {
        assert_eq!(add_hex_prefix("ab"), "0xab");
        assert_eq!(add_hex_prefix("0xab"), "0xab");
        assert_eq!(add_hex_prefix(""), "0x");
        assert_eq!(remove_hex_prefix("0xab"), "ab");
        assert_eq!(remove_hex_prefix("ab"), "ab");
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode_u64(0), "0x0");
        assert_eq!(encode_u64(11284900), "0xac31a4");
        assert_eq!(encode_u256(U256::from(255u64)), "0xff");
    }

    #[test]
    fn test_hex_to_u256() {
        assert_eq!(hex_to_u256("28").unwrap(), U256::from(40u64));
        assert_eq!(hex_to_u256("0x3d090").unwrap(), U256::from(250_000u64));
        assert_eq!(hex_to_u256("").unwrap(), U256::ZERO);
        assert!(hex_to_u256("xyz").is_err());
    }

    #[test]
    fn test_satoshi_to_wei() {
        // 40 satoshi is the network minimum gas price
        assert_eq!(satoshi_to_wei(U256::from(40u64)), U256::from(400_000_000_000u64));
    }

    #[test]
    fn test_qtum_amount_to_wei() {
        assert_eq!(qtum_amount_to_wei(1.0), U256::from(1_000_000_000_000_000_000u64));
        assert_eq!(qtum_amount_to_wei(0.1), U256::from(100_000_000_000_000_000u64));
        assert_eq!(qtum_amount_to_wei(0.00000001), U256::from(WEI_PER_SATOSHI));
        assert_eq!(qtum_amount_to_wei(0.0), U256::ZERO);
    }
}
