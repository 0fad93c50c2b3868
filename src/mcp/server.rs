//! MCP server implementation.

use std::sync::Arc;

use rmcp::{
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::Serialize;

use crate::{
    config::Config,
    connectors::{ConnectorKind, ConnectorRegistry},
    error::AppError,
    ethereum::constants::DEFAULT_SIGN_MESSAGE,
    networks::NetworkRegistry,
    services::{
        BalanceService, ReserveService, ReserveState, StakingService, StakingState,
        TransactionService,
    },
    session::{ConnectionManager, ConnectorButton},
};

/// GoodDollar dApp MCP Server.
///
/// Connects a wallet and drives the reserve and staking contracts.
#[derive(Clone)]
pub struct GoodDollarServer {
    connections: Arc<ConnectionManager>,
    balance_service: BalanceService,
    reserve_service: ReserveService,
    staking_service: StakingService,
    tool_router: ToolRouter<Self>,
}

impl GoodDollarServer {
    /// Create the server from configuration.
    ///
    /// Note: No network calls are made here; connectors reach their backends
    /// when activated.
    pub fn new(config: &Config, networks: NetworkRegistry) -> Result<Self, AppError> {
        tracing::info!("Initializing GoodDollar dApp MCP Server");

        let connectors = ConnectorRegistry::from_config(config)?;
        let server = Self::with_parts(connectors, networks);

        tracing::info!("GoodDollar dApp MCP Server initialized successfully");
        Ok(server)
    }

    /// Create the server from prebuilt connectors and networks.
    pub fn with_parts(connectors: ConnectorRegistry, networks: NetworkRegistry) -> Self {
        let connections = Arc::new(ConnectionManager::new(connectors, Arc::new(networks)));
        let transactions = TransactionService::new();

        Self {
            connections,
            balance_service: BalanceService::new(),
            reserve_service: ReserveService::new(transactions.clone()),
            staking_service: StakingService::new(transactions),
            tool_router: Self::tool_router(),
        }
    }

    /// The connection manager shared with the provider listener.
    pub fn connections(&self) -> Arc<ConnectionManager> {
        Arc::clone(&self.connections)
    }
}

/// Input parameters for the activate_connector tool.
#[derive(Debug, Clone, serde::Deserialize, schemars::JsonSchema)]
pub struct ActivateConnectorInput {
    /// Connector name: "PrivateKey", "Mnemonic", "Frame" or "Network".
    pub connector: String,
}

/// Input parameters for the sign_message tool.
#[derive(Debug, Clone, Default, serde::Deserialize, schemars::JsonSchema)]
pub struct SignMessageInput {
    /// Message to sign. Defaults to "👋".
    #[serde(default)]
    pub message: Option<String>,
}

/// Input parameters for the switch_network tool.
#[derive(Debug, Clone, Default, serde::Deserialize, schemars::JsonSchema)]
pub struct SwitchNetworkInput {
    /// Target chain ID. Defaults to the next supported network.
    #[serde(default)]
    pub chain_id: Option<u64>,
}

/// Input parameters for the reserve tools.
#[derive(Debug, Clone, Default, serde::Deserialize, schemars::JsonSchema)]
pub struct BuyInput {
    /// Minimum cDAI amount (human-readable, e.g. "1.5"). Keeps the last value if omitted.
    #[serde(default)]
    pub min_cdai: Option<String>,
    /// Minimum G$ to receive (human-readable). Keeps the last value if omitted.
    #[serde(default)]
    pub min_gd: Option<String>,
}

/// Input parameters for the staking tools.
#[derive(Debug, Clone, Default, serde::Deserialize, schemars::JsonSchema)]
pub struct StakeInput {
    /// DAI amount (human-readable, e.g. "100"). Keeps the last value if omitted.
    #[serde(default)]
    pub max_dai: Option<String>,
}

#[derive(Serialize)]
struct ConnectorList {
    connectors: Vec<ConnectorButton>,
    tried_eager: bool,
}

#[derive(Serialize)]
struct TransactionOverview {
    reserve: ReserveState,
    staking: StakingState,
}

#[derive(Serialize)]
struct SignedMessage {
    message: String,
    signature: String,
}

fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))
}

#[tool_router]
impl GoodDollarServer {
    /// List connectors with their button state.
    #[tool(description = "List wallet connectors and whether each can be activated")]
    pub async fn list_connectors(&self) -> Result<String, McpError> {
        tracing::info!("list_connectors called");

        to_json(&ConnectorList {
            connectors: self.connections.connector_buttons(),
            tried_eager: self.connections.tried_eager(),
        })
    }

    /// Activate a wallet connector.
    ///
    /// Connection failures are reported in the returned status.
    #[tool(description = "Connect a wallet through a connector (PrivateKey, Mnemonic, Frame, Network)")]
    pub async fn activate_connector(
        &self,
        Parameters(input): Parameters<ActivateConnectorInput>,
    ) -> Result<String, McpError> {
        tracing::info!(connector = %input.connector, "activate_connector called");

        let kind = input
            .connector
            .parse::<ConnectorKind>()
            .map_err(|e| McpError::invalid_params(e, None))?;

        let status = self.connections.activate(kind).await?;
        to_json(&status)
    }

    /// Drop the wallet session and clear any connection error.
    #[tool(description = "Disconnect the wallet and clear the connection error")]
    pub async fn deactivate(&self) -> Result<String, McpError> {
        tracing::info!("deactivate called");
        to_json(&self.connections.deactivate())
    }

    #[tool(description = "Close the connector's backend session, then disconnect")]
    pub async fn kill_session(&self) -> Result<String, McpError> {
        tracing::info!("kill_session called");
        let status = self.connections.kill_session().await?;
        to_json(&status)
    }

    /// Current connection state, including the user-facing error.
    #[tool(description = "Show the connected account, network, connector and any connection error")]
    pub async fn connection_status(&self) -> Result<String, McpError> {
        tracing::info!("connection_status called");
        to_json(&self.connections.status())
    }

    /// Sign a message with the connected account.
    #[tool(description = "Sign a message with the connected account (defaults to \"👋\")")]
    pub async fn sign_message(
        &self,
        Parameters(input): Parameters<SignMessageInput>,
    ) -> Result<String, McpError> {
        let message = input.message.unwrap_or_else(|| DEFAULT_SIGN_MESSAGE.to_string());
        tracing::info!(message = %message, "sign_message called");

        let signature = self.connections.sign_message(&message).await?;
        to_json(&SignedMessage { message, signature })
    }

    /// Move the connector to another supported chain.
    #[tool(description = "Switch the connected wallet to another supported network")]
    pub async fn switch_network(
        &self,
        Parameters(input): Parameters<SwitchNetworkInput>,
    ) -> Result<String, McpError> {
        tracing::info!(chain_id = ?input.chain_id, "switch_network called");
        let status = self.connections.switch_network(input.chain_id).await?;
        to_json(&status)
    }

    /// Balances and allowances of the connected account.
    #[tool(description = "Show ETH, cDAI and DAI balances and the reserve/staking allowances")]
    pub async fn get_account(&self) -> Result<String, McpError> {
        tracing::info!("get_account called");

        let session = self.connections.session()?;
        let overview = self.balance_service.account_overview(&session).await?;
        to_json(&overview)
    }

    /// Form inputs and pending status of both cards.
    #[tool(description = "Show the current inputs and pending transaction status")]
    pub async fn transaction_status(&self) -> Result<String, McpError> {
        tracing::info!("transaction_status called");

        to_json(&TransactionOverview {
            reserve: self.reserve_service.state(),
            staking: self.staking_service.state(),
        })
    }

    /// Approve the reserve to spend cDAI.
    #[tool(description = "Unlock cDAI: approve the GoodReserve to spend min_cdai")]
    pub async fn unlock_cdai(
        &self,
        Parameters(input): Parameters<BuyInput>,
    ) -> Result<String, McpError> {
        tracing::info!(min_cdai = ?input.min_cdai, "unlock_cdai called");

        let form =
            self.reserve_service.set_inputs(input.min_cdai.as_deref(), input.min_gd.as_deref())?;
        let session = self.connections.session()?;
        let report = self.reserve_service.unlock_cdai_with(&session, &form).await?;
        to_json(&report)
    }

    /// Buy G$ from the reserve.
    #[tool(description = "Buy G$ with cDAI from the GoodReserve (unlock cDAI first)")]
    pub async fn buy_reserve(
        &self,
        Parameters(input): Parameters<BuyInput>,
    ) -> Result<String, McpError> {
        tracing::info!(min_cdai = ?input.min_cdai, min_gd = ?input.min_gd, "buy_reserve called");

        let form =
            self.reserve_service.set_inputs(input.min_cdai.as_deref(), input.min_gd.as_deref())?;
        let session = self.connections.session()?;
        let report = self.reserve_service.buy_with(&session, &form).await?;
        to_json(&report)
    }

    /// Approve the staking contract to spend DAI.
    #[tool(description = "Unlock DAI: approve GoodStaking to spend max_dai")]
    pub async fn unlock_dai(
        &self,
        Parameters(input): Parameters<StakeInput>,
    ) -> Result<String, McpError> {
        tracing::info!(max_dai = ?input.max_dai, "unlock_dai called");

        let form = self.staking_service.set_input(input.max_dai.as_deref())?;
        let session = self.connections.session()?;
        let report = self.staking_service.unlock_dai_with(&session, &form).await?;
        to_json(&report)
    }

    /// Stake DAI.
    #[tool(description = "Stake DAI in GoodStaking (unlock DAI first)")]
    pub async fn stake_dai(
        &self,
        Parameters(input): Parameters<StakeInput>,
    ) -> Result<String, McpError> {
        tracing::info!(max_dai = ?input.max_dai, "stake_dai called");

        let form = self.staking_service.set_input(input.max_dai.as_deref())?;
        let session = self.connections.session()?;
        let report = self.staking_service.stake_with(&session, &form).await?;
        to_json(&report)
    }

    #[tool(description = "Withdraw the whole DAI stake from GoodStaking")]
    pub async fn withdraw_stake(&self) -> Result<String, McpError> {
        tracing::info!("withdraw_stake called");

        let session = self.connections.session()?;
        let report = self.staking_service.withdraw(&session).await?;
        to_json(&report)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for GoodDollarServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "gooddollar-dapp-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "GoodDollar dApp MCP Server. Connect a wallet, then buy G$ from the \
                 reserve with cDAI or stake DAI. Unlock the token before buying or staking."
                    .to_string(),
            ),
        }
    }
}
