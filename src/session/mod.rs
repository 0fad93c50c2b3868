//! Wallet session management.
//!
//! Tracks which connector is activating, the active session, and the last
//! connection error, and derives the connector buttons and session actions
//! from that state.

pub mod events;

use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::Address;
use serde::Serialize;

use crate::{
    connectors::{Activation, Connector, ConnectorKind, ConnectorRegistry},
    error::{AppError, ConnectionError, Result},
    ethereum::ChainClient,
    networks::{NetworkDeployment, NetworkRegistry},
};

pub use events::{poll_session, spawn_provider_listener, ProviderEvent, SessionEvents};

/// An active wallet connection.
#[derive(Clone)]
pub struct Session {
    /// Connector that produced the session.
    pub connector: ConnectorKind,
    /// Connected account; `None` for read-only connectors.
    pub account: Option<Address>,
    /// Current chain.
    pub chain_id: u64,
    /// Contract addresses for `chain_id`.
    pub network: NetworkDeployment,
    /// Chain access.
    pub client: Arc<dyn ChainClient>,
    /// Identifies this session; provider events polled from an older
    /// generation are dropped.
    pub generation: u64,
}

impl Session {
    /// Account, or `NoAccount` for read-only sessions.
    pub fn require_account(&self) -> Result<Address> {
        self.account.ok_or(AppError::NoAccount)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("connector", &self.connector)
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .field("network", &self.network.name)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Mutable connection state.
#[derive(Debug, Default)]
struct ConnectionState {
    /// Connector whose activation is in flight.
    activating: Option<ConnectorKind>,
    /// Connector last selected; kept while an error is shown.
    connector: Option<ConnectorKind>,
    /// Active session.
    session: Option<Session>,
    /// Last connection error.
    error: Option<ConnectionError>,
    /// Whether the startup reconnection attempt has run.
    tried_eager: bool,
    /// Bumped whenever the session is replaced or dropped.
    generation: u64,
}

impl ConnectionState {
    fn install(&mut self, mut session: Session) {
        self.generation += 1;
        session.generation = self.generation;
        self.session = Some(session);
        self.error = None;
    }

    fn drop_session(&mut self, error: Option<ConnectionError>) {
        self.generation += 1;
        self.session = None;
        self.error = error;
    }

    fn clear(&mut self) {
        self.connector = None;
        self.drop_session(None);
    }

    fn is_current(&self, generation: u64) -> bool {
        self.session.as_ref().is_some_and(|session| session.generation == generation)
    }
}

/// A connector button as the user sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectorButton {
    /// Connector name.
    pub name: String,
    /// Activation in flight.
    pub activating: bool,
    /// Currently selected connector.
    pub connected: bool,
    /// Whether the button can be pressed.
    pub disabled: bool,
}

/// Session-level actions currently available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    /// Drop the session or clear the error.
    Deactivate,
    /// Sign a message with the connected account.
    SignMessage,
    /// Move the connector to another chain.
    SwitchNetworks,
    /// End the backend-side session.
    KillSession,
}

/// Snapshot of the connection for display.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    /// Whether a session is active.
    pub active: bool,
    /// Selected connector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connector: Option<String>,
    /// Connector being activated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activating: Option<String>,
    /// Connected account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Connected chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    /// Network label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// User-facing error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the startup reconnection attempt has run.
    pub tried_eager: bool,
    /// Available session actions.
    pub actions: Vec<SessionAction>,
}

/// Clears the activating flag if an activation is abandoned midway.
struct ActivatingGuard<'a> {
    manager: &'a ConnectionManager,
    kind: ConnectorKind,
}

impl Drop for ActivatingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.manager.state();
        if state.activating == Some(self.kind) {
            state.activating = None;
        }
    }
}

/// Owns the connection state and drives connector activation.
pub struct ConnectionManager {
    connectors: ConnectorRegistry,
    networks: Arc<NetworkRegistry>,
    state: Mutex<ConnectionState>,
}

impl ConnectionManager {
    /// Create a manager with no active session.
    pub fn new(connectors: ConnectorRegistry, networks: Arc<NetworkRegistry>) -> Self {
        Self { connectors, networks, state: Mutex::new(ConnectionState::default()) }
    }

    fn state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// The network table sessions resolve against.
    pub fn networks(&self) -> &NetworkRegistry {
        &self.networks
    }

    /// The configured connectors.
    pub fn connectors(&self) -> &ConnectorRegistry {
        &self.connectors
    }

    /// Activate a connector.
    ///
    /// Returns the resulting status; connection failures are recorded in
    /// the status rather than returned, so the caller sees the same
    /// message a user would.
    pub async fn activate(&self, kind: ConnectorKind) -> Result<ConnectionStatus> {
        let connector = self.connectors.get(kind);

        let previous = {
            let mut state = self.state();
            if let Some(activating) = state.activating {
                return Err(AppError::ConnectorBusy(format!("{activating} is activating")));
            }
            if state.connector == Some(kind) && state.session.is_some() {
                return Err(AppError::ConnectorBusy(format!("{kind} is already connected")));
            }
            state.activating = Some(kind);
            state.connector.filter(|previous| *previous != kind)
        };
        let _guard = ActivatingGuard { manager: self, kind };

        tracing::info!(connector = %kind, "Activating connector");

        if let Some(previous) = previous {
            self.close_connector(previous).await;
        }

        let result = match connector {
            Ok(connector) => connector.activate().await,
            Err(e) => Err(e),
        };

        {
            let mut state = self.state();
            state.activating = None;
            state.connector = Some(kind);
            self.apply_activation(&mut state, kind, result);
        }

        Ok(self.status())
    }

    /// Record an activation outcome.
    fn apply_activation(
        &self,
        state: &mut ConnectionState,
        kind: ConnectorKind,
        result: Result<Activation>,
    ) {
        let outcome = result.and_then(|activation| {
            let network = self.networks.resolve(activation.chain_id)?.clone();
            Ok(Session {
                connector: kind,
                account: activation.account,
                chain_id: activation.chain_id,
                network,
                client: activation.client,
                generation: 0,
            })
        });

        match outcome {
            Ok(session) => {
                tracing::info!(
                    connector = %kind,
                    account = ?session.account,
                    chain_id = session.chain_id,
                    network = %session.network.name,
                    "Wallet connected"
                );
                state.install(session);
            }
            Err(e) => {
                let error = ConnectionError::from(&e);
                if matches!(error, ConnectionError::Unknown(_)) {
                    tracing::error!(connector = %kind, error = %e, "Unexpected connection error");
                } else {
                    tracing::warn!(connector = %kind, error = %e, "Wallet connection failed");
                }
                state.drop_session(Some(error));
            }
        }
    }

    /// Drop the session and any error. Returns the cleared status.
    pub fn deactivate(&self) -> ConnectionStatus {
        {
            let mut state = self.state();
            if let Some(kind) = state.connector {
                tracing::info!(connector = %kind, "Deactivating connector");
            }
            state.clear();
        }
        self.status()
    }

    /// End the backend-side session, then deactivate.
    pub async fn kill_session(&self) -> Result<ConnectionStatus> {
        let kind = self.state().connector.ok_or(AppError::NotConnected)?;
        let connector: Arc<dyn Connector> = self.connectors.get(kind)?;

        if !connector.has_session() {
            return Err(AppError::Unsupported(format!("{kind} has no session to close")));
        }

        connector.close().await?;
        Ok(self.deactivate())
    }

    async fn close_connector(&self, kind: ConnectorKind) {
        if let Ok(connector) = self.connectors.get(kind) {
            if let Err(e) = connector.close().await {
                tracing::warn!(connector = %kind, error = %e, "Failed to close connector");
            }
        }
    }

    /// Try to reconnect silently at startup.
    ///
    /// Failures are logged and not surfaced as a connection error.
    pub async fn eager_connect(&self, kind: Option<ConnectorKind>) -> bool {
        let connected = match kind {
            Some(kind) => self.try_eager(kind).await,
            None => false,
        };
        self.state().tried_eager = true;
        connected
    }

    async fn try_eager(&self, kind: ConnectorKind) -> bool {
        let activation = match self.connectors.get(kind) {
            Ok(connector) => connector.activate().await,
            Err(e) => Err(e),
        };

        let session = activation.and_then(|activation| {
            let network = self.networks.resolve(activation.chain_id)?.clone();
            Ok(Session {
                connector: kind,
                account: activation.account,
                chain_id: activation.chain_id,
                network,
                client: activation.client,
                generation: 0,
            })
        });

        match session {
            Ok(session) => {
                let mut state = self.state();
                if state.session.is_some() || state.activating.is_some() {
                    return false;
                }
                tracing::info!(connector = %kind, chain_id = session.chain_id, "Eagerly connected");
                state.connector = Some(kind);
                state.install(session);
                true
            }
            Err(e) => {
                tracing::debug!(connector = %kind, error = %e, "Eager connection skipped");
                false
            }
        }
    }

    /// Apply everything one poll observed.
    pub fn handle_events(&self, polled: SessionEvents) {
        for event in polled.events {
            tracing::debug!(event = ?event, generation = polled.generation, "Provider event");
            self.handle_event(polled.generation, event);
        }
    }

    /// React to a provider event observed on session `generation`.
    ///
    /// Returns `false` when the event is stale: the session it was observed
    /// on has since been replaced, switched or dropped.
    pub fn handle_event(&self, generation: u64, event: ProviderEvent) -> bool {
        let mut state = self.state();

        if !state.is_current(generation) {
            tracing::debug!(
                generation = generation,
                current = state.generation,
                event = ?event,
                "Dropping stale provider event"
            );
            return false;
        }

        match event {
            ProviderEvent::ChainChanged(chain_id) => {
                let Some(session) = state.session.as_mut() else {
                    return false;
                };
                if session.chain_id == chain_id {
                    return true;
                }

                match self.networks.resolve(chain_id) {
                    Ok(network) => {
                        tracing::info!(chain_id = chain_id, network = %network.name, "Chain changed");
                        session.chain_id = chain_id;
                        session.network = network.clone();
                    }
                    Err(_) => {
                        tracing::warn!(chain_id = chain_id, "Chain changed to unsupported network");
                        state.drop_session(Some(ConnectionError::UnsupportedChainId(chain_id)));
                    }
                }
            }
            ProviderEvent::AccountsChanged(accounts) => {
                let Some(session) = state.session.as_mut() else {
                    return false;
                };
                if session.account.is_none() {
                    return true;
                }

                match accounts.first() {
                    Some(account) => {
                        tracing::info!(account = %account, "Account changed");
                        session.account = Some(*account);
                    }
                    None => {
                        tracing::info!("Wallet exposed no accounts, disconnecting");
                        state.clear();
                    }
                }
            }
            ProviderEvent::Disconnected => {
                tracing::info!("Provider disconnected");
                state.clear();
            }
        }
        true
    }

    /// Move the session's connector to another chain.
    ///
    /// Without a target, toggles to the next supported chain.
    pub async fn switch_network(&self, target: Option<u64>) -> Result<ConnectionStatus> {
        let (kind, current) = {
            let state = self.state();
            let session = state.session.as_ref().ok_or(AppError::NotConnected)?;
            (session.connector, session.chain_id)
        };

        let connector = self.connectors.get(kind)?;
        if !connector.supports_chain_switch() {
            return Err(AppError::Unsupported(format!("{kind} cannot switch networks")));
        }

        let target = match target {
            Some(target) => target,
            None => self.networks.next_chain(current).ok_or_else(|| {
                AppError::Unsupported("no other supported network to switch to".into())
            })?,
        };

        tracing::info!(connector = %kind, from = current, to = target, "Switching network");

        let activation = connector.change_chain_id(target).await?;

        {
            let mut state = self.state();
            if state.connector == Some(kind) {
                self.apply_activation(&mut state, kind, Ok(activation));
            }
        }

        Ok(self.status())
    }

    /// Sign a message with the connected account.
    pub async fn sign_message(&self, message: &str) -> Result<String> {
        let session = self.session()?;
        let account = session.require_account()?;
        let signature = session.client.sign_message(account, message.as_bytes()).await?;
        tracing::info!(account = %account, "Message signed");
        Ok(signature)
    }

    /// The active session.
    pub fn session(&self) -> Result<Session> {
        self.state().session.clone().ok_or(AppError::NotConnected)
    }

    /// Whether a connector is mid-activation.
    pub fn is_activating(&self) -> bool {
        self.state().activating.is_some()
    }

    /// Whether the startup reconnection attempt has run.
    pub fn tried_eager(&self) -> bool {
        self.state().tried_eager
    }

    /// Button state for every configured connector.
    pub fn connector_buttons(&self) -> Vec<ConnectorButton> {
        let state = self.state();
        let busy = !state.tried_eager || state.activating.is_some() || state.error.is_some();

        self.connectors
            .kinds()
            .into_iter()
            .map(|kind| {
                let connected = state.connector == Some(kind) && state.session.is_some();
                ConnectorButton {
                    name: kind.to_string(),
                    activating: state.activating == Some(kind),
                    connected,
                    disabled: busy || connected,
                }
            })
            .collect()
    }

    fn actions(&self, state: &ConnectionState) -> Vec<SessionAction> {
        let mut actions = Vec::new();

        if state.session.is_some() || state.error.is_some() {
            actions.push(SessionAction::Deactivate);
        }

        if let Some(session) = &state.session {
            if session.account.is_some() {
                actions.push(SessionAction::SignMessage);
            }
            if let Ok(connector) = self.connectors.get(session.connector) {
                if connector.supports_chain_switch() {
                    actions.push(SessionAction::SwitchNetworks);
                }
                if connector.has_session() {
                    actions.push(SessionAction::KillSession);
                }
            }
        }

        actions
    }

    /// Session-level actions currently available.
    pub fn session_actions(&self) -> Vec<SessionAction> {
        let state = self.state();
        self.actions(&state)
    }

    /// Snapshot of the connection.
    pub fn status(&self) -> ConnectionStatus {
        let state = self.state();
        let session = state.session.as_ref();

        ConnectionStatus {
            active: session.is_some(),
            connector: state.connector.map(|k| k.to_string()),
            activating: state.activating.map(|k| k.to_string()),
            account: session.and_then(|s| s.account).map(|a| format!("{a:?}")),
            chain_id: session.map(|s| s.chain_id),
            network: session.map(|s| s.network.name.clone()),
            error: state.error.as_ref().map(|e| e.user_message().to_string()),
            tried_eager: state.tried_eager,
            actions: self.actions(&state),
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connectors", &self.connectors.kinds())
            .field("state", &*self.state())
            .finish()
    }
}
