//! GoodReserve contract bindings.

use alloy::sol;

// GoodReserve: mints G$ against a reserve token at the bonding-curve price.
sol! {
    #[sol(rpc)]
    interface IGoodReserve {
        function buy(address buyWith, uint256 tokenAmount, uint256 minReturn) external returns (uint256);

        event TokenPurchased(
            address indexed caller,
            address indexed reserveToken,
            uint256 reserveAmount,
            uint256 minReturn,
            uint256 actualReturn
        );
    }
}
