//! Common utilities for integration tests.
#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};

use alloy::{
    primitives::{Address, Bytes, Log, TxHash, B256, U256},
    rpc::types::TransactionRequest,
    sol_types::SolCall,
};
use async_trait::async_trait;

use gooddollar_dapp_mcp::{
    connectors::{Activation, Connector},
    ethereum::{contracts::IERC20, ChainClient, ReceiptSummary},
    AppError, Config, ConnectionManager, ConnectorKind, ConnectorRegistry, GoodDollarServer,
    NetworkRegistry, Result,
};

/// A test account.
pub const ALICE: Address = Address::new([0xa1; 20]);

/// Scripted chain behaviour.
#[derive(Debug, Clone)]
pub struct ChainScript {
    pub chain_id: u64,
    pub accounts: Vec<Address>,
    pub eth_balance: U256,
    pub token_balance: U256,
    pub allowance: U256,
    pub gas_estimate: u64,
    pub fail_estimate: bool,
    pub revert: bool,
    pub unreachable: bool,
    pub logs: Vec<Log>,
}

impl Default for ChainScript {
    fn default() -> Self {
        Self {
            chain_id: 1,
            accounts: vec![ALICE],
            eth_balance: U256::from(2_000_000_000_000_000_000u64),
            token_balance: U256::ZERO,
            allowance: U256::ZERO,
            gas_estimate: 60_000,
            fail_estimate: false,
            revert: false,
            unreachable: false,
            logs: Vec::new(),
        }
    }
}

/// In-memory chain client.
#[derive(Debug, Default)]
pub struct MockClient {
    script: Mutex<ChainScript>,
    sent: Mutex<Vec<TransactionRequest>>,
    nonce: AtomicU64,
}

impl MockClient {
    pub fn new(script: ChainScript) -> Arc<Self> {
        Arc::new(Self { script: Mutex::new(script), ..Default::default() })
    }

    /// Change the scripted behaviour.
    pub fn update(&self, f: impl FnOnce(&mut ChainScript)) {
        f(&mut self.script.lock().unwrap());
    }

    pub fn script(&self) -> ChainScript {
        self.script.lock().unwrap().clone()
    }

    /// Transactions broadcast so far.
    pub fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }
}

fn encode_u256(value: U256) -> Bytes {
    Bytes::from(value.to_be_bytes::<32>().to_vec())
}

#[async_trait]
impl ChainClient for MockClient {
    async fn chain_id(&self) -> Result<u64> {
        let script = self.script();
        if script.unreachable {
            return Err(AppError::Transport("connection refused".into()));
        }
        Ok(script.chain_id)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.script().accounts)
    }

    async fn balance(&self, _address: Address) -> Result<U256> {
        Ok(self.script().eth_balance)
    }

    async fn call(&self, tx: &TransactionRequest) -> Result<Bytes> {
        let script = self.script();
        let selector = tx.input.input().and_then(|data| data.get(..4)).unwrap_or_default();

        if selector == IERC20::balanceOfCall::SELECTOR {
            Ok(encode_u256(script.token_balance))
        } else if selector == IERC20::allowanceCall::SELECTOR {
            Ok(encode_u256(script.allowance))
        } else {
            Err(AppError::Rpc("execution reverted".into()))
        }
    }

    async fn estimate_gas(&self, _tx: &TransactionRequest) -> Result<u64> {
        let script = self.script();
        if script.fail_estimate {
            return Err(AppError::Rpc("execution reverted".into()));
        }
        Ok(script.gas_estimate)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        self.sent.lock().unwrap().push(tx);
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(B256::with_last_byte(nonce as u8))
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<ReceiptSummary> {
        let script = self.script();
        Ok(ReceiptSummary {
            transaction_hash: tx_hash,
            block_number: Some(100),
            gas_used: 50_000,
            success: !script.revert,
            logs: script.logs,
        })
    }

    async fn sign_message(&self, account: Address, message: &[u8]) -> Result<String> {
        Ok(format!("0x{}{}", alloy::hex::encode(account), alloy::hex::encode(message)))
    }
}

/// How a mock connector's activation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    NoProvider,
    UserRejected,
    Unknown,
}

/// Connector over a [`MockClient`].
#[derive(Debug)]
pub struct MockConnector {
    pub kind: ConnectorKind,
    pub client: Arc<MockClient>,
    pub failure: Mutex<Option<Failure>>,
    pub read_only: bool,
    pub closable: bool,
    pub switchable: bool,
    pub closed: AtomicBool,
    pub activations: AtomicU64,
}

impl MockConnector {
    pub fn new(kind: ConnectorKind, client: Arc<MockClient>) -> Self {
        Self {
            kind,
            client,
            failure: Mutex::new(None),
            read_only: false,
            closable: false,
            switchable: false,
            closed: AtomicBool::new(false),
            activations: AtomicU64::new(0),
        }
    }

    pub fn failing(self, failure: Failure) -> Self {
        *self.failure.lock().unwrap() = Some(failure);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn closable(mut self) -> Self {
        self.closable = true;
        self
    }

    pub fn switchable(mut self) -> Self {
        self.switchable = true;
        self
    }

    pub fn set_failure(&self, failure: Option<Failure>) {
        *self.failure.lock().unwrap() = failure;
    }

    async fn connect(&self) -> Result<Activation> {
        let chain_id = self.client.chain_id().await?;
        let account =
            if self.read_only { None } else { self.client.script().accounts.first().copied() };
        let client: Arc<dyn ChainClient> = self.client.clone();
        Ok(Activation { account, chain_id, client })
    }
}

#[async_trait]
impl Connector for MockConnector {
    fn kind(&self) -> ConnectorKind {
        self.kind
    }

    async fn activate(&self) -> Result<Activation> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        let failure = *self.failure.lock().unwrap();
        match failure {
            Some(Failure::NoProvider) => Err(AppError::NoProvider("mock".into())),
            Some(Failure::UserRejected) => Err(AppError::UserRejected("mock".into())),
            Some(Failure::Unknown) => Err(AppError::Rpc("boom".into())),
            None => self.connect().await,
        }
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn has_session(&self) -> bool {
        self.closable
    }

    fn supports_chain_switch(&self) -> bool {
        self.switchable
    }

    async fn change_chain_id(&self, chain_id: u64) -> Result<Activation> {
        if !self.switchable {
            return Err(AppError::Unsupported("mock".into()));
        }
        self.client.update(|script| script.chain_id = chain_id);
        self.connect().await
    }
}

/// Registry holding the given mock connectors.
pub fn registry(connectors: Vec<Arc<MockConnector>>) -> ConnectorRegistry {
    ConnectorRegistry::new(connectors.into_iter().map(|c| c as Arc<dyn Connector>).collect())
}

/// Connection manager over the built-in networks.
pub fn manager(connectors: Vec<Arc<MockConnector>>) -> ConnectionManager {
    ConnectionManager::new(registry(connectors), Arc::new(NetworkRegistry::builtin()))
}

/// Server over the built-in networks.
pub fn server(connectors: Vec<Arc<MockConnector>>) -> GoodDollarServer {
    GoodDollarServer::with_parts(registry(connectors), NetworkRegistry::builtin())
}

/// Helper to create a test server from environment variables.
pub fn create_test_server() -> Option<GoodDollarServer> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Check if required environment variables are set
    let rpc_url = std::env::var("ETHEREUM_RPC_URL").ok()?;
    if rpc_url.is_empty() {
        return None;
    }

    let mut config = Config::with_rpc_url(rpc_url);
    config.private_key = std::env::var("ETHEREUM_PRIVATE_KEY").ok().filter(|k| !k.is_empty());

    GoodDollarServer::new(&config, NetworkRegistry::builtin()).ok()
}

/// Skip test if server cannot be created (missing env vars).
#[macro_export]
macro_rules! skip_if_no_server {
    () => {
        match common::create_test_server() {
            Some(server) => server,
            None => {
                eprintln!("Skipping test: ETHEREUM_RPC_URL not set");
                return;
            }
        }
    };
}
