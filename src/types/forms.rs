//! Form state for the reserve and staking actions.
//!
//! Amounts are typed in human-readable units ("1.5") and kept alongside
//! their base-unit value. A field only ever holds a value that passed
//! validation, so nothing negative or malformed reaches a contract call.

use alloy::primitives::U256;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    error::{AppError, Result},
    ethereum::constants::{CDAI_DECIMALS, DAI_DECIMALS, GD_DECIMALS},
    types::token::parse_units,
};

/// Validate a user-typed amount and convert it to base units.
///
/// Accepts plain non-negative decimals with at most `decimals` fraction
/// digits. An empty input means zero.
pub fn validate_amount(input: &str, decimals: u8) -> Result<U256> {
    let amount = input.trim();

    if amount.is_empty() {
        return Ok(U256::ZERO);
    }

    if amount.starts_with('-') {
        return Err(AppError::InvalidAmount(format!("'{input}' is negative")));
    }

    if !amount.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(AppError::InvalidAmount(format!("'{input}' is not a decimal number")));
    }

    let parsed = Decimal::from_str_exact(amount)
        .map_err(|e| AppError::InvalidAmount(format!("'{input}': {e}")))?;
    if parsed.scale() > u32::from(decimals) {
        return Err(AppError::InvalidAmount(format!(
            "'{input}' has more than {decimals} decimal places"
        )));
    }

    parse_units(amount, decimals).map_err(|e| AppError::InvalidAmount(format!("'{input}': {e}")))
}

/// A numeric input bound to a token's decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmountField {
    /// Decimals of the token the field denominates.
    decimals: u8,
    /// Text as last accepted.
    raw: String,
    /// Base-unit value of `raw`.
    #[serde(serialize_with = "serialize_u256")]
    value: U256,
}

fn serialize_u256<S: serde::Serializer>(
    value: &U256,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

impl AmountField {
    /// A zero-valued field.
    pub fn new(decimals: u8) -> Self {
        Self { decimals, raw: "0".to_string(), value: U256::ZERO }
    }

    /// Replace the field's contents. On error the field is left unchanged.
    pub fn set(&mut self, input: &str) -> Result<U256> {
        let value = validate_amount(input, self.decimals)?;
        let trimmed = input.trim();
        self.raw = if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() };
        self.value = value;
        Ok(value)
    }

    /// Text as last accepted.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Base-unit value.
    pub fn value(&self) -> U256 {
        self.value
    }

    /// Token decimals.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }
}

/// Inputs of the "Buy G$ with cDAI" card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuyForm {
    /// Minimum cDAI the reserve may take.
    pub min_cdai: AmountField,
    /// Minimum G$ to receive, otherwise the transaction reverts.
    pub min_gd: AmountField,
}

impl Default for BuyForm {
    fn default() -> Self {
        Self { min_cdai: AmountField::new(CDAI_DECIMALS), min_gd: AmountField::new(GD_DECIMALS) }
    }
}

impl BuyForm {
    /// Update any provided fields. Either all updates apply or none do.
    pub fn update(&mut self, min_cdai: Option<&str>, min_gd: Option<&str>) -> Result<()> {
        let mut next = self.clone();
        if let Some(input) = min_cdai {
            next.min_cdai.set(input)?;
        }
        if let Some(input) = min_gd {
            next.min_gd.set(input)?;
        }
        *self = next;
        Ok(())
    }
}

/// Inputs of the "Stake DAI" card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StakeForm {
    /// Maximum DAI the staking contract may take.
    pub max_dai: AmountField,
}

impl Default for StakeForm {
    fn default() -> Self {
        Self { max_dai: AmountField::new(DAI_DECIMALS) }
    }
}

impl StakeForm {
    /// Update the amount if provided.
    pub fn update(&mut self, max_dai: Option<&str>) -> Result<()> {
        if let Some(input) = max_dai {
            self.max_dai.set(input)?;
        }
        Ok(())
    }
}
