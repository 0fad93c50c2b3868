//! Connector backed by a key held in this process.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Activation, Connector, ConnectorKind};
use crate::{
    error::Result,
    ethereum::{ChainClient, EthereumClient, WalletManager},
};

/// Signs locally with a private key or a mnemonic-derived key.
#[derive(Debug, Clone)]
pub struct LocalSignerConnector {
    kind: ConnectorKind,
    wallet: WalletManager,
    rpc_url: String,
}

impl LocalSignerConnector {
    /// Create a connector for `kind` (`PrivateKey` or `Mnemonic`).
    pub fn new(kind: ConnectorKind, wallet: WalletManager, rpc_url: &str) -> Self {
        Self { kind, wallet, rpc_url: rpc_url.to_string() }
    }
}

#[async_trait]
impl Connector for LocalSignerConnector {
    fn kind(&self) -> ConnectorKind {
        self.kind
    }

    async fn activate(&self) -> Result<Activation> {
        let signer = self.wallet.clone().into_signer();
        let client = EthereumClient::with_signer(&self.rpc_url, signer)?;
        let chain_id = client.chain_id().await?;

        tracing::info!(
            connector = %self.kind,
            address = %self.wallet.address(),
            chain_id = chain_id,
            "Local signer activated"
        );

        Ok(Activation {
            account: Some(self.wallet.address()),
            chain_id,
            client: Arc::new(client),
        })
    }
}
