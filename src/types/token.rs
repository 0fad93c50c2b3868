//! Token-related types and unit conversion.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// Information about a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Token contract address (None for native ETH).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Token symbol (e.g., "ETH", "cDAI").
    pub symbol: String,
    /// Number of decimals.
    pub decimals: u8,
}

impl TokenInfo {
    /// Create a new TokenInfo for native ETH.
    pub fn eth() -> Self {
        Self { address: None, symbol: "ETH".to_string(), decimals: 18 }
    }

    /// Create a new TokenInfo for an ERC20 token.
    pub fn erc20(address: Address, symbol: String, decimals: u8) -> Self {
        Self { address: Some(format!("{address:?}")), symbol, decimals }
    }
}

/// Balance information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceInfo {
    /// Token information.
    pub token: TokenInfo,
    /// Human-readable balance with proper decimals.
    pub balance: String,
    /// Raw balance in smallest unit.
    pub balance_raw: String,
}

/// Allowance granted by the account to a dApp contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllowanceInfo {
    /// Token information.
    pub token: TokenInfo,
    /// Contract allowed to spend (e.g., "GoodReserve").
    pub spender_name: String,
    /// Spender address.
    pub spender: String,
    /// Human-readable allowance.
    pub allowance: String,
    /// Raw allowance in smallest unit.
    pub allowance_raw: String,
}

/// Wallet overview for the connected account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountOverview {
    /// Account address.
    pub address: String,
    /// Network label.
    pub network: String,
    /// Native ETH balance.
    pub eth: BalanceInfo,
    /// Token balances (cDAI, DAI).
    pub tokens: Vec<BalanceInfo>,
    /// Allowances toward the reserve and staking contracts.
    pub allowances: Vec<AllowanceInfo>,
}

/// Format a U256 value with decimals to a human-readable string.
pub fn format_units(value: U256, decimals: u8) -> String {
    if value == U256::ZERO {
        return "0".to_string();
    }

    let value_str = value.to_string();
    let decimals = decimals as usize;

    if decimals == 0 {
        return value_str;
    }

    let len = value_str.len();
    if len <= decimals {
        // Value is less than 1, pad with zeros
        let zeros = decimals - len;
        let decimal_part = value_str.trim_end_matches('0');
        format!("0.{}{}", "0".repeat(zeros), decimal_part)
    } else {
        let (integer, decimal) = value_str.split_at(len - decimals);
        let decimal = decimal.trim_end_matches('0');
        if decimal.is_empty() {
            integer.to_string()
        } else {
            format!("{}.{}", integer, decimal)
        }
    }
}

/// Parse a human-readable amount string to U256 with decimals.
///
/// Fraction digits beyond `decimals` are truncated; callers that must
/// reject them validate first.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256, String> {
    let amount = amount.trim();

    if amount.is_empty() {
        return Err("Amount cannot be empty".to_string());
    }

    if amount.starts_with('-') {
        return Err("Amount cannot be negative".to_string());
    }

    let decimals = decimals as usize;
    let multiplier = U256::from(10).pow(U256::from(decimals));
    let overflow = || format!("Amount too large: {amount}");

    let (integer, fraction) = match amount.split_once('.') {
        None => (amount, ""),
        Some((_, fraction)) if fraction.contains('.') => {
            return Err("Invalid amount format".to_string())
        }
        Some(parts) => parts,
    };

    if integer.is_empty() && fraction.is_empty() {
        return Err("Invalid amount format".to_string());
    }

    let integer_value = if integer.is_empty() {
        U256::ZERO
    } else {
        integer.parse::<U256>().map_err(|e| format!("Invalid integer part: {}", e))?
    };

    let mut fraction = fraction.to_string();
    if fraction.len() > decimals {
        fraction.truncate(decimals);
    } else {
        fraction.push_str(&"0".repeat(decimals - fraction.len()));
    }

    let fraction_value = if fraction.is_empty() {
        U256::ZERO
    } else {
        fraction.parse::<U256>().map_err(|e| format!("Invalid fraction part: {}", e))?
    };

    integer_value
        .checked_mul(multiplier)
        .and_then(|scaled| scaled.checked_add(fraction_value))
        .ok_or_else(overflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_token_info_eth() {
        let info = TokenInfo::eth();
        assert_eq!(info.symbol, "ETH");
        assert_eq!(info.decimals, 18);
        assert!(info.address.is_none());

        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("address"));
    }

    #[test]
    fn test_token_info_erc20() {
        let addr = address!("5d3a536E4D6DbD6114cc1Ead35777bAB948E3643");
        let info = TokenInfo::erc20(addr, "cDAI".to_string(), 8);

        assert_eq!(info.symbol, "cDAI");
        assert_eq!(info.decimals, 8);
        let addr_lower = info.address.as_ref().unwrap().to_lowercase();
        assert!(addr_lower.contains("5d3a536e4d6dbd6114cc1ead35777bab948e3643"));
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::from(150_000_000u64), 8), "1.5");
        assert_eq!(format_units(U256::from(12_345u64), 2), "123.45");
        assert_eq!(format_units(U256::from(1_000_000_000_000_000_000u64), 18), "1");
        assert_eq!(format_units(U256::ZERO, 18), "0");
        assert_eq!(format_units(U256::from(42u64), 0), "42");
    }

    #[test]
    fn test_format_units_small_values() {
        assert_eq!(format_units(U256::from(1u64), 8), "0.00000001");
        assert_eq!(format_units(U256::from(10u64), 2), "0.1");
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_units("1.5", 8).unwrap(), U256::from(150_000_000u64));
        assert_eq!(parse_units("123.45", 2).unwrap(), U256::from(12_345u64));
        assert_eq!(parse_units("100", 2).unwrap(), U256::from(10_000u64));
        assert_eq!(parse_units(".5", 2).unwrap(), U256::from(50u64));
        assert_eq!(parse_units("5.", 2).unwrap(), U256::from(500u64));
        assert_eq!(parse_units("  2  ", 0).unwrap(), U256::from(2u64));
    }

    #[test]
    fn test_parse_units_truncates_excess_decimals() {
        assert_eq!(parse_units("1.239", 2).unwrap(), U256::from(123u64));
    }

    #[test]
    fn test_parse_units_rejects_bad_input() {
        assert_eq!(parse_units("-1", 18).unwrap_err(), "Amount cannot be negative");
        assert_eq!(parse_units("", 18).unwrap_err(), "Amount cannot be empty");
        assert!(parse_units(".", 2).is_err());
        assert!(parse_units("1.2.3", 2).is_err());
        assert!(parse_units("abc", 2).is_err());
    }

    #[test]
    fn test_parse_units_overflow() {
        let huge = "9".repeat(77);
        assert!(parse_units(&huge, 18).unwrap_err().contains("too large"));
    }

    #[test]
    fn test_parse_units_large_values() {
        let result = parse_units("1000000000", 18).unwrap();
        let expected = U256::from(10).pow(U256::from(27));
        assert_eq!(result, expected);
        assert_eq!(format_units(result, 18), "1000000000");
    }
}
