//! Ethereum RPC client.

use alloy::{
    network::{Ethereum, ReceiptResponse},
    primitives::{Address, Bytes, Log, TxHash, U256},
    providers::{DynProvider, PendingTransactionBuilder, Provider, ProviderBuilder},
    rpc::types::{TransactionReceipt, TransactionRequest},
    signers::{local::PrivateKeySigner, Signer},
};
use async_trait::async_trait;
use serde::Serialize;

use crate::error::{AppError, Result};

/// Type alias for the type-erased provider.
pub type HttpProvider = DynProvider<Ethereum>;

/// The parts of a mined transaction the dApp cares about.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiptSummary {
    /// Transaction hash.
    pub transaction_hash: TxHash,
    /// Block the transaction was mined in.
    pub block_number: Option<u64>,
    /// Gas consumed.
    pub gas_used: u64,
    /// Whether execution succeeded.
    pub success: bool,
    /// Emitted logs.
    #[serde(skip)]
    pub logs: Vec<Log>,
}

impl From<&TransactionReceipt> for ReceiptSummary {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            success: receipt.status(),
            logs: receipt.inner.logs().iter().map(|log| log.inner.clone()).collect(),
        }
    }
}

/// Chain access exposed by an activated connector.
///
/// Services only talk to the chain through this trait, so a connector may
/// back it with a local signer, a remote signer, or nothing at all.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Chain ID currently served by the provider.
    async fn chain_id(&self) -> Result<u64>;

    /// Accounts the provider can sign for.
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Native ETH balance.
    async fn balance(&self, address: Address) -> Result<U256>;

    /// Execute a call without broadcasting.
    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes>;

    /// Estimate gas for a transaction.
    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64>;

    /// Broadcast a transaction and return its hash.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash>;

    /// Wait until the transaction is mined.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<ReceiptSummary>;

    /// EIP-191 personal sign, returned as 0x-prefixed hex.
    async fn sign_message(&self, account: Address, message: &[u8]) -> Result<String>;
}

/// Ethereum RPC client backed by an alloy provider.
#[derive(Clone)]
pub struct EthereumClient {
    /// The underlying provider.
    provider: HttpProvider,
    /// RPC URL for logging.
    rpc_url: String,
    /// Local signer; `None` when signing is delegated to the node.
    signer: Option<PrivateKeySigner>,
}

impl EthereumClient {
    /// Create a client without a local signer.
    ///
    /// Note: This does NOT make any network calls. The connection is
    /// established lazily when the first operation is performed.
    pub fn new(rpc_url: &str) -> Result<Self> {
        let url = rpc_url
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid RPC URL: {}", rpc_url)))?;

        let provider = ProviderBuilder::new().connect_http(url).erased();

        tracing::info!(rpc_url = %rpc_url, "Ethereum client created (lazy initialization)");

        Ok(Self { provider, rpc_url: rpc_url.to_string(), signer: None })
    }

    /// Create a client that signs transactions with a local key.
    pub fn with_signer(rpc_url: &str, signer: PrivateKeySigner) -> Result<Self> {
        let url = rpc_url
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid RPC URL: {}", rpc_url)))?;

        let provider = ProviderBuilder::new().wallet(signer.clone()).connect_http(url).erased();

        tracing::info!(
            rpc_url = %rpc_url,
            address = %signer.address(),
            "Signing Ethereum client created"
        );

        Ok(Self { provider, rpc_url: rpc_url.to_string(), signer: Some(signer) })
    }

    /// Get the underlying provider.
    pub fn provider(&self) -> &HttpProvider {
        &self.provider
    }

    /// RPC URL this client talks to.
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Ask the node to expose its accounts (`eth_requestAccounts`).
    pub async fn request_accounts(&self) -> Result<Vec<Address>> {
        let accounts: Vec<Address> =
            self.provider.raw_request("eth_requestAccounts".into(), [(); 0]).await?;
        Ok(accounts)
    }

    /// Drop the account permission granted by `eth_requestAccounts`
    /// (`wallet_revokePermissions`, EIP-2255).
    pub async fn revoke_permissions(&self) -> Result<()> {
        let _: serde_json::Value = self
            .provider
            .raw_request(
                "wallet_revokePermissions".into(),
                [serde_json::json!({ "eth_accounts": {} })],
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChainClient for EthereumClient {
    async fn chain_id(&self) -> Result<u64> {
        let chain_id = self.provider.get_chain_id().await?;
        Ok(chain_id)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        match &self.signer {
            Some(signer) => Ok(vec![signer.address()]),
            None => Ok(self.provider.get_accounts().await?),
        }
    }

    async fn balance(&self, address: Address) -> Result<U256> {
        let balance = self.provider.get_balance(address).await?;
        Ok(balance)
    }

    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes> {
        let result = self.provider.call(tx.clone()).await?;
        Ok(result)
    }

    async fn estimate_gas(&self, tx: &TransactionRequest) -> Result<u64> {
        let gas = self.provider.estimate_gas(tx.clone()).await?;
        Ok(gas)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();
        tracing::info!(tx_hash = %tx_hash, rpc_url = %self.rpc_url, "Transaction broadcast");
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<ReceiptSummary> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .get_receipt()
            .await?;
        Ok(ReceiptSummary::from(&receipt))
    }

    async fn sign_message(&self, account: Address, message: &[u8]) -> Result<String> {
        let signature = match &self.signer {
            Some(signer) => {
                if signer.address() != account {
                    return Err(AppError::Wallet(format!(
                        "Signer {} cannot sign for {account}",
                        signer.address()
                    )));
                }
                let sig = signer.sign_message(message).await?;
                Bytes::from(sig.as_bytes().to_vec())
            }
            None => {
                let payload = format!("0x{}", alloy::hex::encode(message));
                self.provider
                    .raw_request::<_, Bytes>("personal_sign".into(), (payload, account))
                    .await?
            }
        };

        Ok(format!("0x{}", alloy::hex::encode(signature)))
    }
}

impl std::fmt::Debug for EthereumClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthereumClient")
            .field("rpc_url", &self.rpc_url)
            .field("signer", &self.signer.as_ref().map(|s| s.address()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn test_client_rejects_invalid_url() {
        let result = EthereumClient::new("not a url");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_client_is_lazy() {
        // No node listens here; construction must still succeed.
        let client = EthereumClient::new("http://127.0.0.1:1").unwrap();
        assert_eq!(client.rpc_url(), "http://127.0.0.1:1");
    }

    #[tokio::test]
    async fn test_signing_client_reports_its_account() {
        let signer: PrivateKeySigner = TEST_PRIVATE_KEY.parse().unwrap();
        let address = signer.address();
        let client = EthereumClient::with_signer("http://127.0.0.1:1", signer).unwrap();

        let accounts = client.accounts().await.unwrap();
        assert_eq!(accounts, vec![address]);
    }

    #[tokio::test]
    async fn test_local_sign_message() {
        let signer: PrivateKeySigner = TEST_PRIVATE_KEY.parse().unwrap();
        let address = signer.address();
        let client = EthereumClient::with_signer("http://127.0.0.1:1", signer).unwrap();

        let signature = client.sign_message(address, "\u{1F44B}".as_bytes()).await.unwrap();
        assert!(signature.starts_with("0x"));
        // r (32) + s (32) + v (1) bytes, hex encoded
        assert_eq!(signature.len(), 2 + 65 * 2);
    }

    #[tokio::test]
    async fn test_local_sign_message_wrong_account() {
        let signer: PrivateKeySigner = TEST_PRIVATE_KEY.parse().unwrap();
        let client = EthereumClient::with_signer("http://127.0.0.1:1", signer).unwrap();

        let result = client.sign_message(Address::ZERO, b"hello").await;
        assert!(matches!(result, Err(AppError::Wallet(_))));
    }

    #[test]
    fn test_debug_hides_key() {
        let signer: PrivateKeySigner = TEST_PRIVATE_KEY.parse().unwrap();
        let client = EthereumClient::with_signer("http://127.0.0.1:1", signer).unwrap();
        let debug_str = format!("{client:?}");
        assert!(debug_str.contains("EthereumClient"));
        assert!(!debug_str.contains(TEST_PRIVATE_KEY));
    }
}
