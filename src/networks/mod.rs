//! Network registry.
//!
//! Maps chain IDs to a human-readable label and the contract addresses the
//! reserve and staking flows talk to. The built-in table can be replaced by
//! a JSON document loaded from disk or fetched over HTTP.

use std::collections::BTreeMap;

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    ethereum::constants::{
        ETHEREUM_MAINNET_CHAIN_ID, MAINNET_CDAI, MAINNET_DAI, MAINNET_RESERVE, MAINNET_STAKING,
        ROPSTEN_CDAI, ROPSTEN_CHAIN_ID, ROPSTEN_DAI, ROPSTEN_RESERVE, ROPSTEN_STAKING,
    },
};

/// Contract addresses deployed on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDeployment {
    /// Chain ID.
    pub chain_id: u64,
    /// Network label (e.g., "Mainnet").
    pub name: String,
    /// GoodReserve contract.
    pub reserve: Address,
    /// cDAI token accepted by the reserve.
    pub cdai: Address,
    /// GoodStaking contract.
    pub staking: Address,
    /// DAI token accepted by the staking contract.
    pub dai: Address,
}

/// On-disk shape of a network table.
#[derive(Debug, Deserialize)]
struct NetworkTable {
    networks: Vec<NetworkDeployment>,
}

/// Lookup table of supported networks keyed by chain ID.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: BTreeMap<u64, NetworkDeployment>,
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NetworkRegistry {
    /// The deployments the dApp ships with (Mainnet and Ropsten).
    pub fn builtin() -> Self {
        let deployments = [
            NetworkDeployment {
                chain_id: ETHEREUM_MAINNET_CHAIN_ID,
                name: "Mainnet".to_string(),
                reserve: MAINNET_RESERVE,
                cdai: MAINNET_CDAI,
                staking: MAINNET_STAKING,
                dai: MAINNET_DAI,
            },
            NetworkDeployment {
                chain_id: ROPSTEN_CHAIN_ID,
                name: "Ropsten".to_string(),
                reserve: ROPSTEN_RESERVE,
                cdai: ROPSTEN_CDAI,
                staking: ROPSTEN_STAKING,
                dai: ROPSTEN_DAI,
            },
        ];

        Self { networks: deployments.into_iter().map(|d| (d.chain_id, d)).collect() }
    }

    /// Build a registry from a list of deployments.
    ///
    /// Fails on an empty list or a repeated chain ID.
    pub fn from_deployments(deployments: Vec<NetworkDeployment>) -> Result<Self> {
        if deployments.is_empty() {
            return Err(AppError::Config("Network table must list at least one network".into()));
        }

        let mut networks = BTreeMap::new();
        for deployment in deployments {
            let chain_id = deployment.chain_id;
            if networks.insert(chain_id, deployment).is_some() {
                return Err(AppError::Config(format!(
                    "Network table lists chain {chain_id} more than once"
                )));
            }
        }

        Ok(Self { networks })
    }

    /// Parse a JSON network table: `{"networks": [{"chain_id": 1, ...}]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let table: NetworkTable = serde_json::from_str(json)
            .map_err(|e| AppError::Config(format!("Invalid network table: {e}")))?;
        Self::from_deployments(table.networks)
    }

    /// Load a network table from a file path or an http(s) URL.
    pub async fn load(source: &str) -> Result<Self> {
        tracing::info!(source = %source, "Loading network table");

        let body = if source.starts_with("http://") || source.starts_with("https://") {
            let response = reqwest::get(source)
                .await
                .map_err(|e| AppError::Config(format!("Failed to fetch {source}: {e}")))?;

            if !response.status().is_success() {
                return Err(AppError::Config(format!(
                    "Failed to fetch {source}: HTTP {}",
                    response.status()
                )));
            }

            response
                .text()
                .await
                .map_err(|e| AppError::Config(format!("Failed to read {source}: {e}")))?
        } else {
            tokio::fs::read_to_string(source)
                .await
                .map_err(|e| AppError::Config(format!("Failed to read {source}: {e}")))?
        };

        let registry = Self::from_json(&body)?;
        tracing::info!(networks = ?registry.supported_chain_ids(), "Network table loaded");
        Ok(registry)
    }

    /// Resolve the deployment for a chain ID.
    pub fn resolve(&self, chain_id: u64) -> Result<&NetworkDeployment> {
        self.networks.get(&chain_id).ok_or(AppError::UnsupportedChainId(chain_id))
    }

    /// Network label for a chain ID, if supported.
    pub fn label(&self, chain_id: u64) -> Option<&str> {
        self.networks.get(&chain_id).map(|d| d.name.as_str())
    }

    /// Whether the chain ID has a deployment.
    pub fn is_supported(&self, chain_id: u64) -> bool {
        self.networks.contains_key(&chain_id)
    }

    /// Supported chain IDs in ascending order.
    pub fn supported_chain_ids(&self) -> Vec<u64> {
        self.networks.keys().copied().collect()
    }

    /// The chain to switch to from `current`: the next supported ID, wrapping around.
    pub fn next_chain(&self, current: u64) -> Option<u64> {
        self.networks
            .range(current.saturating_add(1)..)
            .next()
            .or_else(|| self.networks.iter().next())
            .map(|(id, _)| *id)
            .filter(|id| *id != current)
    }
}
