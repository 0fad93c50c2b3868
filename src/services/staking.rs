//! "Stake DAI" actions.

use std::sync::{Arc, Mutex, MutexGuard};

use alloy::primitives::{Address, Log};
use serde::Serialize;

use crate::{
    error::Result,
    ethereum::{
        constants::{DAI_DECIMALS, STAKING_GAS_LIMIT},
        contracts::{IGoodStaking, IERC20},
    },
    networks::NetworkDeployment,
    services::{
        reserve::decode_approval,
        transaction::{find_event, ContractCall, GasPolicy, TransactionService, TxState, TxTracker},
    },
    session::Session,
    types::{format_units, Completion, DecodedEvent, StakeForm, TxReport},
};

/// Form and transaction status of the staking card.
#[derive(Debug, Clone, Serialize)]
pub struct StakingState {
    /// Current input.
    pub form: StakeForm,
    /// Pending transaction status.
    pub tx: TxState,
}

/// DAI.approve(staking, max_dai).
pub fn unlock_dai_call(network: &NetworkDeployment, form: &StakeForm) -> ContractCall {
    ContractCall::new(
        "unlock_dai",
        network.dai,
        IERC20::approveCall { spender: network.staking, amount: form.max_dai.value() },
    )
    .completes_as(Completion::Unlocked)
    .decode_with(|token, logs| decode_approval(token, logs, DAI_DECIMALS))
}

/// staking.stakeDAI(max_dai), sent with the fixed staking gas limit.
pub fn stake_call(network: &NetworkDeployment, form: &StakeForm) -> ContractCall {
    ContractCall::new(
        "stake_dai",
        network.staking,
        IGoodStaking::stakeDAICall { amount: form.max_dai.value() },
    )
    .gas(GasPolicy::Fixed(STAKING_GAS_LIMIT))
    .decode_with(decode_dai_staked)
}

/// staking.withdrawStake(), sent with the fixed staking gas limit.
pub fn withdraw_call(network: &NetworkDeployment) -> ContractCall {
    ContractCall::new("withdraw_stake", network.staking, IGoodStaking::withdrawStakeCall {})
        .gas(GasPolicy::Fixed(STAKING_GAS_LIMIT))
        .decode_with(decode_stake_withdraw)
}

fn decode_dai_staked(staking: Address, logs: &[Log]) -> Option<DecodedEvent> {
    let staked = find_event::<IGoodStaking::DAIStaked>(staking, logs)?;
    Some(
        DecodedEvent::new("DAIStaked")
            .with("staker", format!("{:?}", staked.staker))
            .with("daiValue", format_units(staked.daiValue, DAI_DECIMALS)),
    )
}

fn decode_stake_withdraw(staking: Address, logs: &[Log]) -> Option<DecodedEvent> {
    let withdraw = find_event::<IGoodStaking::DAIStakeWithdraw>(staking, logs)?;
    Some(
        DecodedEvent::new("DAIStakeWithdraw")
            .with("staker", format!("{:?}", withdraw.staker))
            .with("daiValue", format_units(withdraw.daiValue, DAI_DECIMALS))
            .with("daiActual", format_units(withdraw.daiActual, DAI_DECIMALS)),
    )
}

/// Service behind the staking card.
#[derive(Debug, Clone, Default)]
pub struct StakingService {
    transactions: TransactionService,
    tracker: TxTracker,
    form: Arc<Mutex<StakeForm>>,
}

impl StakingService {
    /// Create the service with a zeroed input.
    pub fn new(transactions: TransactionService) -> Self {
        Self { transactions, tracker: TxTracker::new(), form: Arc::default() }
    }

    fn form(&self) -> MutexGuard<'_, StakeForm> {
        self.form.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Update the amount. Invalid input leaves it unchanged.
    pub fn set_input(&self, max_dai: Option<&str>) -> Result<StakeForm> {
        let mut form = self.form();
        form.update(max_dai)?;
        tracing::debug!(max_dai = form.max_dai.raw(), "Stake form updated");
        Ok(form.clone())
    }

    /// Form and status snapshot.
    pub fn state(&self) -> StakingState {
        StakingState { form: self.form().clone(), tx: self.tracker.state() }
    }

    /// Approve the staking contract to take the current `max_dai`.
    pub async fn unlock_dai(&self, session: &Session) -> Result<TxReport> {
        let form = self.form().clone();
        self.unlock_dai_with(session, &form).await
    }

    /// Approve the staking contract to take `form.max_dai`.
    pub async fn unlock_dai_with(&self, session: &Session, form: &StakeForm) -> Result<TxReport> {
        let call = unlock_dai_call(&session.network, form);
        self.transactions.submit(session, &self.tracker, call).await
    }

    /// Stake the current `max_dai`.
    pub async fn stake(&self, session: &Session) -> Result<TxReport> {
        let form = self.form().clone();
        self.stake_with(session, &form).await
    }

    /// Stake `form.max_dai`.
    pub async fn stake_with(&self, session: &Session, form: &StakeForm) -> Result<TxReport> {
        let call = stake_call(&session.network, form);
        self.transactions.submit(session, &self.tracker, call).await
    }

    /// Withdraw the whole stake.
    pub async fn withdraw(&self, session: &Session) -> Result<TxReport> {
        let call = withdraw_call(&session.network);
        self.transactions.submit(session, &self.tracker, call).await
    }
}
