//! MCP server module.
//!
//! Contains the MCP server implementation with tool handlers.

pub mod server;

pub use server::GoodDollarServer;
pub use server::{
    ActivateConnectorInput, BuyInput, SignMessageInput, StakeInput, SwitchNetworkInput,
};
