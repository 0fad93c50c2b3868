//! Ethereum network constants.
//!
//! Contains chain IDs and the default GoodDollar deployment addresses.

use alloy::primitives::{address, Address};

// ============================================================================
// Chain IDs
// ============================================================================

/// Ethereum Mainnet chain ID.
pub const ETHEREUM_MAINNET_CHAIN_ID: u64 = 1;

/// Ropsten testnet chain ID.
pub const ROPSTEN_CHAIN_ID: u64 = 3;

// ============================================================================
// GoodDollar Deployments (Ethereum Mainnet)
// ============================================================================

/// GoodReserve contract on Ethereum Mainnet.
pub const MAINNET_RESERVE: Address = address!("5C16960F2Eeba27b7de4F1F6e84E616C1977e070");

/// Compound cDAI token on Ethereum Mainnet.
pub const MAINNET_CDAI: Address = address!("5d3a536E4D6DbD6114cc1Ead35777bAB948E3643");

/// GoodStaking contract on Ethereum Mainnet.
pub const MAINNET_STAKING: Address = address!("Ea12bB3917cf6aE2FDE97cE4756177703426d41F");

/// DAI token on Ethereum Mainnet.
pub const MAINNET_DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");

// ============================================================================
// GoodDollar Deployments (Ropsten)
// ============================================================================

/// GoodReserve contract on Ropsten.
pub const ROPSTEN_RESERVE: Address = address!("5810950BF9184F286f1C33b2cf80533D2CB274AF");

/// cDAI token on Ropsten.
pub const ROPSTEN_CDAI: Address = address!("6ce27497a64fffb5517aa4aee908b1e7eb63b9ff");

/// GoodStaking contract on Ropsten.
pub const ROPSTEN_STAKING: Address = address!("E6876231d1a5905Abed03E4C613E427b0357ec0b");

/// DAI token on Ropsten.
pub const ROPSTEN_DAI: Address = address!("B5E5D0F8C0cbA267CD3D7035d6AdC8eBA7Df7Cdd");

// ============================================================================
// Token decimals
// ============================================================================

/// cDAI decimals.
pub const CDAI_DECIMALS: u8 = 8;

/// G$ decimals.
pub const GD_DECIMALS: u8 = 2;

/// DAI decimals.
pub const DAI_DECIMALS: u8 = 18;

// ============================================================================
// Provider defaults
// ============================================================================

/// Gas limit used for staking calls.
pub const STAKING_GAS_LIMIT: u64 = 500_000;

/// Provider polling interval in milliseconds.
pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 12_000;

/// Default endpoint of a locally running Frame signer.
pub const DEFAULT_FRAME_RPC_URL: &str = "http://127.0.0.1:1248";

/// Message signed by the "sign message" action when none is given.
pub const DEFAULT_SIGN_MESSAGE: &str = "\u{1F44B}";
