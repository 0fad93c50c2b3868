//! Business logic services module.

pub mod balance;
pub mod reserve;
pub mod staking;
pub mod transaction;

pub use balance::BalanceService;
pub use reserve::{ReserveService, ReserveState};
pub use staking::{StakingService, StakingState};
pub use transaction::{
    call_contract, find_event, ContractCall, GasPolicy, PendingTx, TransactionService, TxState,
    TxTracker,
};
