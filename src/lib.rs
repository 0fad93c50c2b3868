//! GoodDollar dApp MCP Server Library
//!
//! A Model Context Protocol server that connects a wallet and drives the
//! GoodDollar reserve and staking contracts.
//!
//! # Features
//!
//! - **Wallet Connectors**: Local private key or mnemonic, a Frame-compatible
//!   remote signer, or a read-only RPC endpoint
//! - **Reserve**: Unlock cDAI and buy G$ from the GoodReserve
//! - **Staking**: Unlock DAI, stake it in GoodStaking and withdraw the stake
//! - **Provider Events**: Chain and account changes are picked up by polling
//!
//! # Example
//!
//! ```rust,ignore
//! use gooddollar_dapp_mcp::{Config, GoodDollarServer, NetworkRegistry};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let server = GoodDollarServer::new(&config, NetworkRegistry::builtin())?;
//!     // Run server...
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod connectors;
pub mod error;
pub mod ethereum;
pub mod mcp;
pub mod networks;
pub mod services;
pub mod session;
pub mod types;

pub use config::Config;
pub use connectors::{ConnectorKind, ConnectorRegistry};
pub use error::{AppError, ConnectionError, Result};
pub use ethereum::constants::*;
pub use mcp::GoodDollarServer;
pub use networks::{NetworkDeployment, NetworkRegistry};
pub use session::{ConnectionManager, ProviderEvent};
