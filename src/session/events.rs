//! Provider change detection.
//!
//! Wallet backends reached over HTTP cannot push events, so the listener
//! polls the active session's client and turns differences into
//! [`ProviderEvent`]s.

use std::{sync::Arc, time::Duration};

use alloy::primitives::Address;
use tokio::task::JoinHandle;

use super::{ConnectionManager, Session};

/// A change reported by the wallet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// The provider moved to another chain.
    ChainChanged(u64),
    /// The exposed accounts changed; empty means the wallet locked.
    AccountsChanged(Vec<Address>),
    /// The provider went away.
    Disconnected,
}

/// Events observed on one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvents {
    /// Generation of the session that was polled.
    pub generation: u64,
    /// Changes, in the order they were observed.
    pub events: Vec<ProviderEvent>,
}

impl SessionEvents {
    /// Whether the poll observed nothing.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Compare the session with what its provider reports now.
pub async fn poll_session(session: &Session) -> SessionEvents {
    SessionEvents { generation: session.generation, events: observe(session).await }
}

async fn observe(session: &Session) -> Vec<ProviderEvent> {
    let mut events = Vec::new();

    let chain_id = match session.client.chain_id().await {
        Ok(chain_id) => chain_id,
        Err(e) => {
            tracing::warn!(connector = %session.connector, error = %e, "Provider unreachable");
            return vec![ProviderEvent::Disconnected];
        }
    };

    if chain_id != session.chain_id {
        events.push(ProviderEvent::ChainChanged(chain_id));
    }

    if let Some(account) = session.account {
        match session.client.accounts().await {
            Ok(accounts) if accounts.first() != Some(&account) => {
                events.push(ProviderEvent::AccountsChanged(accounts));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "Failed to poll accounts");
            }
        }
    }

    events
}

/// Poll the active session every `interval` until the task is aborted.
///
/// `interval` must be non-zero. Ticks are skipped while a connector is
/// activating, and events from a session that was replaced while it was
/// being polled are dropped by the manager.
pub fn spawn_provider_listener(
    manager: Arc<ConnectionManager>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::debug!(interval_ms = interval.as_millis() as u64, "Provider listener started");

        loop {
            ticker.tick().await;

            if manager.is_activating() {
                continue;
            }
            let Ok(session) = manager.session() else {
                continue;
            };

            manager.handle_events(poll_session(&session).await);
        }
    })
}
