//! Connector for a remote signer that speaks JSON-RPC, such as Frame.
//!
//! The signer owns the keys: accounts come from `eth_requestAccounts`,
//! transactions go out unsigned through `eth_sendTransaction`, and messages
//! are signed with `personal_sign`. Closing the session revokes the
//! account permission with `wallet_revokePermissions`.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{Activation, Connector, ConnectorKind};
use crate::{
    error::{AppError, Result},
    ethereum::{ChainClient, EthereumClient},
};

/// Remote signer connector.
#[derive(Debug)]
pub struct FrameConnector {
    rpc_url: String,
    /// Client of the authorized session, until it is closed.
    session: Mutex<Option<EthereumClient>>,
}

impl FrameConnector {
    /// Create a connector for the signer at `rpc_url`.
    pub fn new(rpc_url: &str) -> Self {
        Self { rpc_url: rpc_url.to_string(), session: Mutex::new(None) }
    }

    fn session(&self) -> MutexGuard<'_, Option<EthereumClient>> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Connector for FrameConnector {
    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Frame
    }

    async fn activate(&self) -> Result<Activation> {
        let client = EthereumClient::new(&self.rpc_url)?;

        let accounts = match client.request_accounts().await {
            Ok(accounts) => accounts,
            Err(AppError::Transport(msg)) => {
                return Err(AppError::NoProvider(format!(
                    "signer unreachable at {}: {msg}",
                    self.rpc_url
                )))
            }
            Err(e) => return Err(e),
        };

        let account = accounts
            .first()
            .copied()
            .ok_or_else(|| AppError::NoProvider("signer exposed no accounts".into()))?;

        let chain_id = client.chain_id().await?;

        tracing::info!(
            rpc_url = %self.rpc_url,
            account = %account,
            chain_id = chain_id,
            "Remote signer activated"
        );

        *self.session() = Some(client.clone());
        Ok(Activation { account: Some(account), chain_id, client: Arc::new(client) })
    }

    async fn close(&self) -> Result<()> {
        let session = self.session().take();
        let Some(client) = session else {
            return Ok(());
        };

        // The local session ends even when the signer cannot revoke.
        match client.revoke_permissions().await {
            Ok(()) => tracing::info!(rpc_url = %self.rpc_url, "Remote signer session closed"),
            Err(e) => tracing::warn!(
                rpc_url = %self.rpc_url,
                error = %e,
                "Remote signer did not revoke permissions"
            ),
        }
        Ok(())
    }

    fn has_session(&self) -> bool {
        self.session().is_some()
    }
}
