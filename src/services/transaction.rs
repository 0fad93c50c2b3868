//! Contract call submission and pending-transaction tracking.
//!
//! Every state-changing action goes through [`TransactionService::submit`]:
//! estimate gas, send, wait for the receipt, decode the expected event, and
//! settle the tracked status exactly once.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use alloy::{
    primitives::{Address, Bytes, Log, TxHash, U256},
    rpc::types::TransactionRequest,
    sol_types::{SolCall, SolEvent},
};
use serde::Serialize;

use crate::{
    error::{AppError, Result, TRANSACTION_FAILED},
    session::Session,
    types::{Completion, DecodedEvent, TxReport, TxStatus},
};

/// Decodes the event a call is expected to emit. Receives the contract
/// address and the receipt logs.
pub type EventDecoder = Box<dyn Fn(Address, &[Log]) -> Option<DecodedEvent> + Send + Sync>;

/// How the gas limit is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GasPolicy {
    /// Use the provider's estimate.
    Estimated,
    /// Estimate for the report, but send with a fixed limit.
    Fixed(u64),
}

/// A state-changing contract call ready to submit.
pub struct ContractCall {
    /// Action name used in logs and reports.
    pub label: &'static str,
    /// Contract address.
    pub to: Address,
    /// ABI-encoded call.
    pub calldata: Bytes,
    /// Gas limit policy.
    pub gas_policy: GasPolicy,
    /// Status reported on success.
    pub completion: Completion,
    /// Decoder for the expected event.
    pub decoder: Option<EventDecoder>,
}

impl ContractCall {
    /// Encode `call` for `to`.
    pub fn new<C: SolCall>(label: &'static str, to: Address, call: C) -> Self {
        Self {
            label,
            to,
            calldata: Bytes::from(call.abi_encode()),
            gas_policy: GasPolicy::Estimated,
            completion: Completion::Finished,
            decoder: None,
        }
    }

    /// Set the gas policy.
    pub fn gas(mut self, policy: GasPolicy) -> Self {
        self.gas_policy = policy;
        self
    }

    /// Set the status reported on success.
    pub fn completes_as(mut self, completion: Completion) -> Self {
        self.completion = completion;
        self
    }

    /// Decode the expected event from the receipt.
    pub fn decode_with(
        mut self,
        decoder: impl Fn(Address, &[Log]) -> Option<DecodedEvent> + Send + Sync + 'static,
    ) -> Self {
        self.decoder = Some(Box::new(decoder));
        self
    }

    /// Transaction sent from `from`, carrying no ETH.
    pub fn request(&self, from: Address) -> TransactionRequest {
        TransactionRequest::default()
            .from(from)
            .to(self.to)
            .input(self.calldata.clone().into())
            .value(U256::ZERO)
    }
}

impl fmt::Debug for ContractCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractCall")
            .field("label", &self.label)
            .field("to", &self.to)
            .field("calldata", &self.calldata)
            .field("gas_policy", &self.gas_policy)
            .field("completion", &self.completion)
            .field("decoder", &self.decoder.is_some())
            .finish()
    }
}

/// Status and error shown for one pending-transaction card.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TxState {
    /// Current status.
    pub status: TxStatus,
    /// Form error from the last submission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether a submission is in flight.
    pub pending: bool,
}

/// Tracks the status of one card's transactions.
///
/// Only one submission may be in flight; [`PendingTx`] settles it.
#[derive(Debug, Clone, Default)]
pub struct TxTracker {
    state: Arc<Mutex<TxState>>,
}

impl TxTracker {
    /// A tracker with nothing submitted.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TxState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> TxState {
        self.lock().clone()
    }

    /// Current status.
    pub fn status(&self) -> TxStatus {
        self.lock().status
    }

    /// Record a form error without touching the status.
    pub fn set_error(&self, error: impl Into<String>) {
        self.lock().error = Some(error.into());
    }

    /// Start a submission. Fails if one is already in flight.
    pub fn begin(&self) -> Result<PendingTx> {
        let mut state = self.lock();
        if state.pending {
            return Err(AppError::TransactionPending);
        }
        state.pending = true;
        state.error = None;
        Ok(PendingTx { tracker: self.clone(), settled: false })
    }

    fn settle(&self, status: TxStatus, error: Option<String>) {
        let mut state = self.lock();
        state.status = status;
        state.error = error;
        state.pending = false;
    }
}

/// An in-flight submission. Settles as failed if dropped unresolved.
#[derive(Debug)]
pub struct PendingTx {
    tracker: TxTracker,
    settled: bool,
}

impl PendingTx {
    /// The transaction was broadcast.
    pub fn submitted(&self, tx_hash: TxHash) {
        self.tracker.lock().status = TxStatus::InProgress(tx_hash);
    }

    /// The transaction confirmed.
    pub fn succeed(mut self, completion: Completion) -> TxStatus {
        self.settled = true;
        let status = TxStatus::from(completion);
        self.tracker.settle(status, None);
        status
    }

    /// The transaction failed or was never sent.
    pub fn fail(mut self, reason: &str) -> TxStatus {
        self.settled = true;
        tracing::warn!(reason = %reason, "Transaction failed");
        self.tracker.settle(TxStatus::Failed, Some(TRANSACTION_FAILED.to_string()));
        TxStatus::Failed
    }
}

impl Drop for PendingTx {
    fn drop(&mut self) {
        if !self.settled {
            self.tracker.settle(TxStatus::Failed, Some(TRANSACTION_FAILED.to_string()));
        }
    }
}

/// Submits contract calls through the session's client.
#[derive(Debug, Clone, Default)]
pub struct TransactionService;

impl TransactionService {
    /// Create the service.
    pub fn new() -> Self {
        Self
    }

    /// Run `call` to completion and settle `tracker`.
    ///
    /// Chain failures are reported in the returned [`TxReport`] and the
    /// tracker; only a missing account or a concurrent submission are
    /// returned as errors.
    pub async fn submit(
        &self,
        session: &Session,
        tracker: &TxTracker,
        call: ContractCall,
    ) -> Result<TxReport> {
        let account = session.require_account()?;
        let pending = tracker.begin()?;

        tracing::info!(
            action = call.label,
            from = %account,
            to = %call.to,
            chain_id = session.chain_id,
            "Submitting transaction"
        );

        let mut report = TxReport::new(call.label);
        match self.execute(session, account, &call, &pending, &mut report).await {
            Ok(()) => {
                report.success = true;
                report.status = pending.succeed(call.completion);
                tracing::info!(
                    action = call.label,
                    tx_hash = ?report.tx_hash,
                    status = %report.status,
                    "Transaction confirmed"
                );
            }
            Err(e) => {
                report.status = pending.fail(&e.to_string());
                report.error = Some(TRANSACTION_FAILED.to_string());
            }
        }

        Ok(report)
    }

    async fn execute(
        &self,
        session: &Session,
        account: Address,
        call: &ContractCall,
        pending: &PendingTx,
        report: &mut TxReport,
    ) -> Result<()> {
        let mut tx = call.request(account);

        let estimate = session.client.estimate_gas(&tx).await?;
        let gas_limit = match call.gas_policy {
            GasPolicy::Estimated => estimate,
            GasPolicy::Fixed(limit) => limit,
        };
        report.gas_estimate = Some(estimate.to_string());
        report.gas_limit = Some(gas_limit.to_string());
        tracing::debug!(action = call.label, estimate, gas_limit, "Gas estimated");

        tx = tx.gas_limit(gas_limit);

        let tx_hash = session.client.send_transaction(tx).await?;
        pending.submitted(tx_hash);
        report.tx_hash = Some(format!("{tx_hash:?}"));
        report.status = TxStatus::InProgress(tx_hash);

        let receipt = session.client.wait_for_receipt(tx_hash).await?;
        report.block_number = receipt.block_number;
        report.gas_used = Some(receipt.gas_used.to_string());

        if !receipt.success {
            return Err(AppError::TransactionFailed(format!("{tx_hash:?} reverted")));
        }

        if let Some(decoder) = &call.decoder {
            report.event = decoder(call.to, &receipt.logs);
            if report.event.is_none() {
                tracing::warn!(action = call.label, "Expected event not found in receipt");
            }
        }

        Ok(())
    }
}

/// First log emitted by `address` that decodes as `E`.
pub fn find_event<E: SolEvent>(address: Address, logs: &[Log]) -> Option<E> {
    logs.iter()
        .filter(|log| log.address == address)
        .find_map(|log| E::decode_log(log).ok())
        .map(|decoded| decoded.data)
}

/// Run a read-only contract call and decode its return value.
pub async fn call_contract<C: SolCall>(
    session: &Session,
    to: Address,
    call: C,
) -> Result<C::Return> {
    let mut tx = TransactionRequest::default().to(to).input(Bytes::from(call.abi_encode()).into());
    if let Some(account) = session.account {
        tx = tx.from(account);
    }

    let output = session.client.call(&tx).await?;
    C::abi_decode_returns(&output).map_err(|e| AppError::Parse(format!("{}: {e}", C::SIGNATURE)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ethereum::contracts::IERC20;

    #[test]
    fn test_tracker_rejects_concurrent_submission() {
        let tracker = TxTracker::new();
        let pending = tracker.begin().unwrap();
        assert!(matches!(tracker.begin(), Err(AppError::TransactionPending)));

        pending.succeed(Completion::Finished);
        assert!(tracker.begin().is_ok());
    }

    #[test]
    fn test_pending_settles_once() {
        let tracker = TxTracker::new();
        let pending = tracker.begin().unwrap();
        pending.submitted(TxHash::ZERO);
        assert_eq!(tracker.status(), TxStatus::InProgress(TxHash::ZERO));
        assert!(tracker.state().pending);

        assert_eq!(pending.succeed(Completion::Unlocked), TxStatus::Unlocked);
        let state = tracker.state();
        assert_eq!(state.status, TxStatus::Unlocked);
        assert!(!state.pending);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_dropped_pending_fails() {
        let tracker = TxTracker::new();
        drop(tracker.begin().unwrap());

        let state = tracker.state();
        assert_eq!(state.status, TxStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("Transaction failed"));
        assert!(!state.pending);
    }

    #[test]
    fn test_begin_clears_previous_error() {
        let tracker = TxTracker::new();
        tracker.begin().unwrap().fail("reverted");
        assert!(tracker.state().error.is_some());

        let pending = tracker.begin().unwrap();
        assert!(tracker.state().error.is_none());
        pending.succeed(Completion::Finished);
    }

    #[test]
    fn test_contract_call_request() {
        let to = Address::repeat_byte(0x11);
        let from = Address::repeat_byte(0x22);
        let call = ContractCall::new(
            "approve",
            to,
            IERC20::approveCall { spender: from, amount: U256::from(5) },
        )
        .completes_as(Completion::Unlocked);

        let tx = call.request(from);
        assert_eq!(tx.from, Some(from));
        assert_eq!(tx.to.and_then(|kind| kind.to().copied()), Some(to));
        assert_eq!(tx.value, Some(U256::ZERO));
        assert_eq!(tx.input.input().map(|d| &d[..4]), Some(&IERC20::approveCall::SELECTOR[..]));
        assert_eq!(call.gas_policy, GasPolicy::Estimated);
        assert_eq!(call.completion, Completion::Unlocked);
        assert!(call.decoder.is_none());
    }
}
