//! Read-only connector over plain JSON-RPC endpoints.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Activation, Connector, ConnectorKind};
use crate::{
    error::{AppError, Result},
    ethereum::{ChainClient, EthereumClient},
};

/// Exposes chain data without an account. Can hop between chains that have
/// an endpoint configured.
#[derive(Debug)]
pub struct NetworkConnector {
    default_url: String,
    urls: HashMap<u64, String>,
    current: Mutex<Option<u64>>,
}

impl NetworkConnector {
    /// Create a connector that starts on `default_url`.
    pub fn new(default_url: &str, urls: HashMap<u64, String>) -> Self {
        Self { default_url: default_url.to_string(), urls, current: Mutex::new(None) }
    }

    async fn connect(&self, url: &str, expected: Option<u64>) -> Result<Activation> {
        let client = EthereumClient::new(url)?;
        let chain_id = client.chain_id().await?;

        if let Some(expected) = expected {
            if chain_id != expected {
                return Err(AppError::Config(format!(
                    "RPC URL configured for chain {expected} serves chain {chain_id}"
                )));
            }
        }

        tracing::info!(rpc_url = %url, chain_id = chain_id, "Network connector activated");

        Ok(Activation { account: None, chain_id, client: Arc::new(client) })
    }
}

#[async_trait]
impl Connector for NetworkConnector {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Network
    }

    async fn activate(&self) -> Result<Activation> {
        let current = *self.current.lock().await;
        match current.and_then(|id| self.urls.get(&id).map(|url| (id, url))) {
            Some((id, url)) => self.connect(url, Some(id)).await,
            None => self.connect(&self.default_url, None).await,
        }
    }

    fn supports_chain_switch(&self) -> bool {
        true
    }

    async fn change_chain_id(&self, chain_id: u64) -> Result<Activation> {
        let url = self.urls.get(&chain_id).ok_or_else(|| {
            AppError::Unsupported(format!("no RPC URL configured for chain {chain_id}"))
        })?;

        let activation = self.connect(url, Some(chain_id)).await?;
        *self.current.lock().await = Some(chain_id);
        Ok(activation)
    }
}
