//! GoodStaking contract bindings.

use alloy::sol;

// GoodStaking: DAI staking whose interest funds the reserve.
sol! {
    #[sol(rpc)]
    interface IGoodStaking {
        function stakeDAI(uint256 amount) external;
        function withdrawStake() external;

        event DAIStaked(address indexed staker, uint256 daiValue);
        event DAIStakeWithdraw(address indexed staker, uint256 daiValue, uint256 daiActual);
    }
}
