//! "Buy G$ with cDAI from Reserve" actions.

use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::{Address, Log};
use serde::Serialize;

use crate::{
    error::Result,
    ethereum::{
        constants::{CDAI_DECIMALS, GD_DECIMALS},
        contracts::{IGoodReserve, IERC20},
    },
    networks::NetworkDeployment,
    services::transaction::{find_event, ContractCall, TransactionService, TxState, TxTracker},
    session::Session,
    types::{format_units, BuyForm, Completion, DecodedEvent, TxReport},
};

/// Form and transaction status of the reserve card.
#[derive(Debug, Clone, Serialize)]
pub struct ReserveState {
    /// Current inputs.
    pub form: BuyForm,
    /// Pending transaction status.
    pub tx: TxState,
}

/// cDAI.approve(reserve, min_cdai).
pub fn unlock_cdai_call(network: &NetworkDeployment, form: &BuyForm) -> ContractCall {
    ContractCall::new(
        "unlock_cdai",
        network.cdai,
        IERC20::approveCall { spender: network.reserve, amount: form.min_cdai.value() },
    )
    .completes_as(Completion::Unlocked)
    .decode_with(|token, logs| decode_approval(token, logs, CDAI_DECIMALS))
}

/// reserve.buy(cdai, min_cdai, min_gd).
pub fn buy_call(network: &NetworkDeployment, form: &BuyForm) -> ContractCall {
    ContractCall::new(
        "buy_reserve",
        network.reserve,
        IGoodReserve::buyCall {
            buyWith: network.cdai,
            tokenAmount: form.min_cdai.value(),
            minReturn: form.min_gd.value(),
        },
    )
    .decode_with(decode_token_purchased)
}

/// Decode an ERC20 `Approval` emitted by `token`.
pub fn decode_approval(token: Address, logs: &[Log], decimals: u8) -> Option<DecodedEvent> {
    let approval = find_event::<IERC20::Approval>(token, logs)?;
    Some(
        DecodedEvent::new("Approval")
            .with("owner", format!("{:?}", approval.owner))
            .with("spender", format!("{:?}", approval.spender))
            .with("value", format_units(approval.value, decimals)),
    )
}

fn decode_token_purchased(reserve: Address, logs: &[Log]) -> Option<DecodedEvent> {
    let purchase = find_event::<IGoodReserve::TokenPurchased>(reserve, logs)?;
    Some(
        DecodedEvent::new("TokenPurchased")
            .with("caller", format!("{:?}", purchase.caller))
            .with("reserveToken", format!("{:?}", purchase.reserveToken))
            .with("reserveAmount", format_units(purchase.reserveAmount, CDAI_DECIMALS))
            .with("minReturn", format_units(purchase.minReturn, GD_DECIMALS))
            .with("actualReturn", format_units(purchase.actualReturn, GD_DECIMALS)),
    )
}

/// Service behind the reserve card.
#[derive(Debug, Clone, Default)]
pub struct ReserveService {
    transactions: TransactionService,
    tracker: TxTracker,
    form: Arc<Mutex<BuyForm>>,
}

impl ReserveService {
    /// Create the service with zeroed inputs.
    pub fn new(transactions: TransactionService) -> Self {
        Self { transactions, tracker: TxTracker::new(), form: Arc::default() }
    }

    fn form(&self) -> MutexGuard<'_, BuyForm> {
        self.form.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Update the inputs. Invalid input leaves both fields unchanged.
    pub fn set_inputs(&self, min_cdai: Option<&str>, min_gd: Option<&str>) -> Result<BuyForm> {
        let mut form = self.form();
        form.update(min_cdai, min_gd)?;
        tracing::debug!(
            min_cdai = form.min_cdai.raw(),
            min_gd = form.min_gd.raw(),
            "Buy form updated"
        );
        Ok(form.clone())
    }

    /// Form and status snapshot.
    pub fn state(&self) -> ReserveState {
        ReserveState { form: self.form().clone(), tx: self.tracker.state() }
    }

    /// Approve the reserve to take the current `min_cdai`.
    pub async fn unlock_cdai(&self, session: &Session) -> Result<TxReport> {
        let form = self.form().clone();
        self.unlock_cdai_with(session, &form).await
    }

    /// Approve the reserve to take `form.min_cdai`.
    pub async fn unlock_cdai_with(&self, session: &Session, form: &BuyForm) -> Result<TxReport> {
        let call = unlock_cdai_call(&session.network, form);
        self.transactions.submit(session, &self.tracker, call).await
    }

    /// Buy G$ with cDAI using the current inputs.
    pub async fn buy(&self, session: &Session) -> Result<TxReport> {
        let form = self.form().clone();
        self.buy_with(session, &form).await
    }

    /// Buy G$ with the amounts in `form`.
    pub async fn buy_with(&self, session: &Session, form: &BuyForm) -> Result<TxReport> {
        let call = buy_call(&session.network, form);
        self.transactions.submit(session, &self.tracker, call).await
    }
}
