//! Configuration management module.
//!
//! Handles loading configuration from environment variables.

use std::{collections::HashMap, env};

use crate::{
    connectors::ConnectorKind,
    error::AppError,
    ethereum::constants::{DEFAULT_FRAME_RPC_URL, DEFAULT_POLLING_INTERVAL_MS},
};

/// Application configuration.
#[derive(Clone, Default)]
pub struct Config {
    /// Ethereum JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Private key for the local signer connector (hex string with 0x prefix).
    pub private_key: Option<String>,
    /// BIP-39 phrase for the mnemonic connector.
    pub mnemonic: Option<String>,
    /// HD derivation index used with the mnemonic.
    pub mnemonic_index: u32,
    /// Endpoint of a Frame-compatible remote signer.
    pub frame_rpc_url: String,
    /// Per-chain endpoints for the read-only network connector.
    pub network_rpc_urls: HashMap<u64, String>,
    /// Path or URL of a JSON network table.
    pub networks_config: Option<String>,
    /// Connector tried silently at startup.
    pub eager_connector: Option<ConnectorKind>,
    /// Provider event polling interval in milliseconds.
    pub polling_interval_ms: u64,
    /// Logging level (default: info).
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `ETHEREUM_RPC_URL`: Ethereum JSON-RPC endpoint
    ///
    /// Optional environment variables:
    /// - `ETHEREUM_PRIVATE_KEY`: enables the `PrivateKey` connector
    /// - `ETHEREUM_MNEMONIC` / `MNEMONIC_INDEX`: enables the `Mnemonic` connector
    /// - `FRAME_RPC_URL`: remote signer endpoint (default: http://127.0.0.1:1248)
    /// - `NETWORK_RPC_URLS`: `1=https://...,3=https://...`
    /// - `NETWORKS_CONFIG`: JSON network table (file path or http(s) URL)
    /// - `EAGER_CONNECTOR`: connector name to activate at startup
    /// - `POLLING_INTERVAL_MS`: provider polling interval (default: 12000)
    /// - `LOG_LEVEL`: Logging level (default: info)
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let rpc_url = env::var("ETHEREUM_RPC_URL").map_err(|_| {
            AppError::Config("ETHEREUM_RPC_URL environment variable not set".into())
        })?;

        let mnemonic_index = match non_empty_var("MNEMONIC_INDEX") {
            Some(raw) => raw
                .parse::<u32>()
                .map_err(|e| AppError::Config(format!("Invalid MNEMONIC_INDEX '{raw}': {e}")))?,
            None => 0,
        };

        let network_rpc_urls = match non_empty_var("NETWORK_RPC_URLS") {
            Some(raw) => parse_rpc_urls(&raw)?,
            None => HashMap::new(),
        };

        let eager_connector = non_empty_var("EAGER_CONNECTOR")
            .map(|raw| raw.parse::<ConnectorKind>().map_err(AppError::Config))
            .transpose()?;

        let polling_interval_ms = match non_empty_var("POLLING_INTERVAL_MS") {
            Some(raw) => parse_polling_interval(&raw)?,
            None => DEFAULT_POLLING_INTERVAL_MS,
        };

        Ok(Self {
            rpc_url,
            private_key: non_empty_var("ETHEREUM_PRIVATE_KEY"),
            mnemonic: non_empty_var("ETHEREUM_MNEMONIC"),
            mnemonic_index,
            frame_rpc_url: non_empty_var("FRAME_RPC_URL")
                .unwrap_or_else(|| DEFAULT_FRAME_RPC_URL.to_string()),
            network_rpc_urls,
            networks_config: non_empty_var("NETWORKS_CONFIG"),
            eager_connector,
            polling_interval_ms,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Build a configuration pointing at a single RPC endpoint with defaults elsewhere.
    pub fn with_rpc_url(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            frame_rpc_url: DEFAULT_FRAME_RPC_URL.to_string(),
            polling_interval_ms: DEFAULT_POLLING_INTERVAL_MS,
            log_level: "info".to_string(),
            ..Default::default()
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "<redacted>"))
            .field("mnemonic_index", &self.mnemonic_index)
            .field("frame_rpc_url", &self.frame_rpc_url)
            .field("network_rpc_urls", &self.network_rpc_urls)
            .field("networks_config", &self.networks_config)
            .field("eager_connector", &self.eager_connector)
            .field("polling_interval_ms", &self.polling_interval_ms)
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse `POLLING_INTERVAL_MS`. The interval must be non-zero.
pub fn parse_polling_interval(raw: &str) -> Result<u64, AppError> {
    let interval = raw
        .trim()
        .parse::<u64>()
        .map_err(|e| AppError::Config(format!("Invalid POLLING_INTERVAL_MS '{raw}': {e}")))?;

    if interval == 0 {
        return Err(AppError::Config("POLLING_INTERVAL_MS must be greater than 0".into()));
    }
    Ok(interval)
}

/// Parse `chain_id=url` pairs separated by commas.
pub fn parse_rpc_urls(raw: &str) -> Result<HashMap<u64, String>, AppError> {
    let mut urls = HashMap::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (chain, url) = entry.split_once('=').ok_or_else(|| {
            AppError::Config(format!("Invalid NETWORK_RPC_URLS entry '{entry}': expected id=url"))
        })?;

        let chain_id = chain.trim().parse::<u64>().map_err(|e| {
            AppError::Config(format!("Invalid chain id '{}' in NETWORK_RPC_URLS: {e}", chain.trim()))
        })?;

        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::Config(format!("Empty RPC URL for chain {chain_id}")));
        }

        urls.insert(chain_id, url.to_string());
    }

    Ok(urls)
}
