//! GoodDollar dApp MCP Server
//!
//! A Model Context Protocol server for the GoodDollar reserve and staking contracts.

use std::time::Duration;

use rmcp::ServiceExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use gooddollar_dapp_mcp::{
    session::spawn_provider_listener, Config, GoodDollarServer, NetworkRegistry,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    tracing::info!(config = ?config, "Starting GoodDollar dApp MCP Server");

    let networks = match &config.networks_config {
        Some(source) => NetworkRegistry::load(source).await?,
        None => NetworkRegistry::builtin(),
    };
    tracing::info!(chains = ?networks.supported_chain_ids(), "Networks loaded");

    // Create the server
    let server = GoodDollarServer::new(&config, networks)?;

    let connections = server.connections();
    if connections.eager_connect(config.eager_connector).await {
        tracing::info!(status = ?connections.status(), "Reconnected at startup");
    }
    let listener =
        spawn_provider_listener(connections, Duration::from_millis(config.polling_interval_ms));

    // Run with stdio transport
    let transport = rmcp::transport::stdio();
    let running = server.serve(transport).await?;

    // Wait for the server to finish
    running.waiting().await?;
    listener.abort();

    Ok(())
}
