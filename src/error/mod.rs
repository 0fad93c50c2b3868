//! Error types and handling module.
//!
//! Defines all application-specific error types and conversions.

use rmcp::ErrorData as McpError;
use thiserror::Error;

/// Generic message shown for any failed contract transaction.
pub const TRANSACTION_FAILED: &str = "Transaction failed";

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Ethereum RPC errors.
    #[error("Ethereum RPC error: {0}")]
    Rpc(String),

    /// Transport errors.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid Ethereum address.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Rejected numeric input.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Wallet-related errors.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// No connector can provide a wallet.
    #[error("No wallet provider available: {0}")]
    NoProvider(String),

    /// The connected chain has no deployment configured.
    #[error("Unsupported chain id: {0}")]
    UnsupportedChainId(u64),

    /// The signer refused the request.
    #[error("User rejected request: {0}")]
    UserRejected(String),

    /// An operation needs an active wallet session.
    #[error("No wallet connected")]
    NotConnected,

    /// The session cannot sign (read-only connector).
    #[error("Connected wallet has no account")]
    NoAccount,

    /// A connector is busy or already connected.
    #[error("Connector unavailable: {0}")]
    ConnectorBusy(String),

    /// The connector does not support the requested action.
    #[error("Unsupported connector action: {0}")]
    Unsupported(String),

    /// Another transaction is still awaiting confirmation.
    #[error("A transaction is already pending")]
    TransactionPending,

    /// A submitted transaction failed or reverted.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pending transaction error.
    #[error("Pending transaction error: {0}")]
    PendingTransaction(String),
}

impl From<alloy::transports::TransportError> for AppError {
    fn from(err: alloy::transports::TransportError) -> Self {
        let message = err.to_string();
        if is_user_rejection(&message) {
            AppError::UserRejected(message)
        } else {
            AppError::Transport(message)
        }
    }
}

impl From<alloy::contract::Error> for AppError {
    fn from(err: alloy::contract::Error) -> Self {
        AppError::Rpc(err.to_string())
    }
}

impl From<alloy::providers::PendingTransactionError> for AppError {
    fn from(err: alloy::providers::PendingTransactionError) -> Self {
        AppError::PendingTransaction(err.to_string())
    }
}

impl From<alloy::signers::local::LocalSignerError> for AppError {
    fn from(err: alloy::signers::local::LocalSignerError) -> Self {
        AppError::Wallet(err.to_string())
    }
}

impl From<alloy::signers::Error> for AppError {
    fn from(err: alloy::signers::Error) -> Self {
        AppError::Wallet(err.to_string())
    }
}

impl From<alloy::hex::FromHexError> for AppError {
    fn from(err: alloy::hex::FromHexError) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<std::num::ParseIntError> for AppError {
    fn from(err: std::num::ParseIntError) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<AppError> for McpError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidAddress(_) | AppError::InvalidAmount(_) | AppError::Parse(_) => {
                McpError::invalid_params(err.to_string(), None)
            }
            AppError::Config(_)
            | AppError::NotConnected
            | AppError::NoAccount
            | AppError::ConnectorBusy(_)
            | AppError::Unsupported(_)
            | AppError::TransactionPending => McpError::invalid_request(err.to_string(), None),
            _ => McpError::internal_error(err.to_string(), None),
        }
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

/// Returns true when an RPC error message carries an EIP-1193 user rejection.
pub fn is_user_rejection(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("error code 4001")
        || lower.contains("user rejected")
        || lower.contains("user denied")
}

/// Coarse classification of wallet connection failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// No wallet backend is configured or reachable.
    NoProvider,
    /// The wallet is on a chain with no known deployment.
    UnsupportedChainId(u64),
    /// The user declined to expose an account.
    UserRejected,
    /// Anything else; the detail is only logged.
    Unknown(String),
}

impl ConnectionError {
    /// Static user-facing message for this error class.
    pub fn user_message(&self) -> &'static str {
        match self {
            ConnectionError::NoProvider => {
                "No Ethereum wallet provider configured. Set ETHEREUM_PRIVATE_KEY or \
                 ETHEREUM_MNEMONIC, or start a Frame-compatible signer."
            }
            ConnectionError::UnsupportedChainId(_) => "You're connected to an unsupported network.",
            ConnectionError::UserRejected => {
                "Please authorize this application to access your Ethereum account."
            }
            ConnectionError::Unknown(_) => {
                "An unknown error occurred. Check the logs for more details."
            }
        }
    }
}

impl From<&AppError> for ConnectionError {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::NoProvider(_) => ConnectionError::NoProvider,
            AppError::UnsupportedChainId(id) => ConnectionError::UnsupportedChainId(*id),
            AppError::UserRejected(_) => ConnectionError::UserRejected,
            other if is_user_rejection(&other.to_string()) => ConnectionError::UserRejected,
            other => ConnectionError::Unknown(other.to_string()),
        }
    }
}
