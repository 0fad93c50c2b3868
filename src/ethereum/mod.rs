//! Ethereum interaction module.
//!
//! Contains the chain client, local wallet management, and contract bindings.

pub mod client;
pub mod constants;
pub mod contracts;
pub mod wallet;

pub use client::{ChainClient, EthereumClient, HttpProvider, ReceiptSummary};
pub use wallet::WalletManager;
