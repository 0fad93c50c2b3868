//! Wallet connectors.
//!
//! A connector turns some wallet backend into an account, a chain ID and a
//! [`ChainClient`]. The session layer only sees the [`Connector`] trait.

pub mod frame;
pub mod local;
pub mod network;

use std::{fmt, str::FromStr, sync::Arc};

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::{AppError, Result},
    ethereum::{ChainClient, WalletManager},
};

pub use frame::FrameConnector;
pub use local::LocalSignerConnector;
pub use network::NetworkConnector;

/// Connector backends, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConnectorKind {
    /// Local key from `ETHEREUM_PRIVATE_KEY`.
    PrivateKey,
    /// Local key derived from `ETHEREUM_MNEMONIC`.
    Mnemonic,
    /// Remote signer speaking JSON-RPC (Frame).
    Frame,
    /// Read-only RPC endpoint.
    Network,
}

impl ConnectorKind {
    /// All kinds in display order.
    pub const ALL: [ConnectorKind; 4] = [
        ConnectorKind::PrivateKey,
        ConnectorKind::Mnemonic,
        ConnectorKind::Frame,
        ConnectorKind::Network,
    ];

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            ConnectorKind::PrivateKey => "PrivateKey",
            ConnectorKind::Mnemonic => "Mnemonic",
            ConnectorKind::Frame => "Frame",
            ConnectorKind::Network => "Network",
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConnectorKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized =
            s.trim().chars().filter(|c| *c != '_' && *c != '-').collect::<String>().to_lowercase();

        match normalized.as_str() {
            "privatekey" => Ok(ConnectorKind::PrivateKey),
            "mnemonic" => Ok(ConnectorKind::Mnemonic),
            "frame" => Ok(ConnectorKind::Frame),
            "network" => Ok(ConnectorKind::Network),
            _ => Err(format!("Unknown connector: {}", s)),
        }
    }
}

/// Result of activating a connector.
#[derive(Clone)]
pub struct Activation {
    /// Account exposed by the wallet; `None` for read-only connectors.
    pub account: Option<Address>,
    /// Chain the provider is on.
    pub chain_id: u64,
    /// Chain access for the session.
    pub client: Arc<dyn ChainClient>,
}

impl fmt::Debug for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Activation")
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

/// A wallet backend.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> ConnectorKind;

    /// Connect and report the account and chain.
    async fn activate(&self) -> Result<Activation>;

    /// Tear down a backend-side session, if the backend has one.
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Whether [`close`](Self::close) ends a real session.
    fn has_session(&self) -> bool {
        false
    }

    /// Whether the connector can move to another chain on request.
    fn supports_chain_switch(&self) -> bool {
        false
    }

    /// Reconnect on another chain.
    async fn change_chain_id(&self, chain_id: u64) -> Result<Activation> {
        Err(AppError::Unsupported(format!(
            "{} connector cannot switch to chain {chain_id}",
            self.kind()
        )))
    }
}

/// The connectors available to the session, one per kind.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    connectors: Vec<Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    /// Build a registry; a later connector of the same kind replaces an earlier one.
    pub fn new(connectors: Vec<Arc<dyn Connector>>) -> Self {
        let mut registry = Self::default();
        for connector in connectors {
            registry.insert(connector);
        }
        registry
    }

    /// Add or replace a connector.
    pub fn insert(&mut self, connector: Arc<dyn Connector>) {
        self.connectors.retain(|existing| existing.kind() != connector.kind());
        self.connectors.push(connector);
        self.connectors.sort_by_key(|c| c.kind());
    }

    /// Build the connectors enabled by the configuration.
    ///
    /// `Frame` and `Network` are always listed; the local signer connectors
    /// only when their key material is configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut connectors: Vec<Arc<dyn Connector>> = Vec::new();

        if let Some(key) = &config.private_key {
            let wallet = WalletManager::from_private_key(key)?;
            connectors.push(Arc::new(LocalSignerConnector::new(
                ConnectorKind::PrivateKey,
                wallet,
                &config.rpc_url,
            )));
        }

        if let Some(phrase) = &config.mnemonic {
            let wallet = WalletManager::from_mnemonic(phrase, config.mnemonic_index)?;
            connectors.push(Arc::new(LocalSignerConnector::new(
                ConnectorKind::Mnemonic,
                wallet,
                &config.rpc_url,
            )));
        }

        connectors.push(Arc::new(FrameConnector::new(&config.frame_rpc_url)));
        connectors.push(Arc::new(NetworkConnector::new(
            &config.rpc_url,
            config.network_rpc_urls.clone(),
        )));

        let registry = Self::new(connectors);
        tracing::info!(connectors = ?registry.kinds(), "Connectors configured");
        Ok(registry)
    }

    /// Look up a connector; an unconfigured one means no provider is available.
    pub fn get(&self, kind: ConnectorKind) -> Result<Arc<dyn Connector>> {
        self.connectors
            .iter()
            .find(|c| c.kind() == kind)
            .cloned()
            .ok_or_else(|| AppError::NoProvider(format!("{kind} connector is not configured")))
    }

    /// Configured kinds in display order.
    pub fn kinds(&self) -> Vec<ConnectorKind> {
        self.connectors.iter().map(|c| c.kind()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_connector_kind_from_str() {
        assert_eq!("PrivateKey".parse::<ConnectorKind>().unwrap(), ConnectorKind::PrivateKey);
        assert_eq!("private_key".parse::<ConnectorKind>().unwrap(), ConnectorKind::PrivateKey);
        assert_eq!("MNEMONIC".parse::<ConnectorKind>().unwrap(), ConnectorKind::Mnemonic);
        assert_eq!(" frame ".parse::<ConnectorKind>().unwrap(), ConnectorKind::Frame);
        assert_eq!("network".parse::<ConnectorKind>().unwrap(), ConnectorKind::Network);
        assert!("WalletConnect".parse::<ConnectorKind>().is_err());
    }

    #[test]
    fn test_connector_kind_display_roundtrip() {
        for kind in ConnectorKind::ALL {
            assert_eq!(kind.to_string().parse::<ConnectorKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_registry_from_minimal_config() {
        let config = Config::with_rpc_url("http://127.0.0.1:8545");
        let registry = ConnectorRegistry::from_config(&config).unwrap();

        assert_eq!(registry.kinds(), vec![ConnectorKind::Frame, ConnectorKind::Network]);
        assert!(matches!(registry.get(ConnectorKind::PrivateKey), Err(AppError::NoProvider(_))));
    }

    #[test]
    fn test_registry_with_private_key() {
        let mut config = Config::with_rpc_url("http://127.0.0.1:8545");
        config.private_key = Some(TEST_PRIVATE_KEY.to_string());

        let registry = ConnectorRegistry::from_config(&config).unwrap();
        assert_eq!(
            registry.kinds(),
            vec![ConnectorKind::PrivateKey, ConnectorKind::Frame, ConnectorKind::Network]
        );
        let connector = registry.get(ConnectorKind::PrivateKey).unwrap();
        assert_eq!(connector.kind(), ConnectorKind::PrivateKey);
    }

    #[test]
    fn test_registry_rejects_bad_key() {
        let mut config = Config::with_rpc_url("http://127.0.0.1:8545");
        config.private_key = Some("0x1234".to_string());
        assert!(matches!(ConnectorRegistry::from_config(&config), Err(AppError::Wallet(_))));
    }

    #[test]
    fn test_registry_replaces_same_kind() {
        let first: Arc<dyn Connector> = Arc::new(FrameConnector::new("http://127.0.0.1:1248"));
        let second: Arc<dyn Connector> = Arc::new(FrameConnector::new("http://127.0.0.1:1249"));
        let registry = ConnectorRegistry::new(vec![first, second]);
        assert_eq!(registry.kinds(), vec![ConnectorKind::Frame]);
    }
}
