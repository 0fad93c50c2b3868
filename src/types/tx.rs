//! Transaction status and report types.

use std::{collections::BTreeMap, fmt};

use alloy::primitives::TxHash;
use serde::{Serialize, Serializer};

use crate::error::TRANSACTION_FAILED;

/// State shown in the "Pending TX" card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxStatus {
    /// Nothing submitted yet.
    #[default]
    None,
    /// Broadcast, awaiting confirmation.
    InProgress(TxHash),
    /// Last transaction confirmed.
    Finished,
    /// Last approval confirmed.
    Unlocked,
    /// Last transaction failed.
    Failed,
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxStatus::None => f.write_str("None"),
            TxStatus::InProgress(_) => f.write_str("In progress..."),
            TxStatus::Finished => f.write_str("Finished"),
            TxStatus::Unlocked => f.write_str("Unlocked"),
            TxStatus::Failed => f.write_str(TRANSACTION_FAILED),
        }
    }
}

impl Serialize for TxStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Status a call reports once confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// A regular contract call.
    Finished,
    /// An ERC20 approval.
    Unlocked,
}

impl From<Completion> for TxStatus {
    fn from(completion: Completion) -> Self {
        match completion {
            Completion::Finished => TxStatus::Finished,
            Completion::Unlocked => TxStatus::Unlocked,
        }
    }
}

/// An event decoded from a receipt's logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedEvent {
    /// Event name.
    pub name: String,
    /// Event arguments, formatted for display.
    pub fields: BTreeMap<String, String>,
}

impl DecodedEvent {
    /// Start an event with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), fields: BTreeMap::new() }
    }

    /// Add a field.
    pub fn with(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.fields.insert(key.to_string(), value.to_string());
        self
    }
}

/// Outcome of one submitted contract call.
#[derive(Debug, Clone, Serialize)]
pub struct TxReport {
    /// Action that was submitted (e.g., "buy").
    pub action: String,
    /// Whether the transaction confirmed successfully.
    pub success: bool,
    /// Final status.
    pub status: TxStatus,
    /// Transaction hash, once broadcast.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// Provider gas estimate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_estimate: Option<String>,
    /// Gas limit sent with the transaction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_limit: Option<String>,
    /// Block the transaction was mined in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    /// Gas consumed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<String>,
    /// Decoded event, if one was expected and found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<DecodedEvent>,
    /// User-facing error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TxReport {
    /// A report for an action that has not produced anything yet.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            success: false,
            status: TxStatus::None,
            tx_hash: None,
            gas_estimate: None,
            gas_limit: None,
            block_number: None,
            gas_used: None,
            event: None,
            error: None,
        }
    }
}
