//! Smart contract bindings.

pub mod erc20;
pub mod good_reserve;
pub mod good_staking;

pub use erc20::{TokenMetadata, IERC20};
pub use good_reserve::IGoodReserve;
pub use good_staking::IGoodStaking;
