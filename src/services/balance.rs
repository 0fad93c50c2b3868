//! Balance and allowance queries for the connected account.

use alloy::primitives::Address;

use crate::{
    error::Result,
    ethereum::{
        constants::{CDAI_DECIMALS, DAI_DECIMALS},
        contracts::{TokenMetadata, IERC20},
    },
    services::transaction::call_contract,
    session::Session,
    types::{format_units, AccountOverview, AllowanceInfo, BalanceInfo, TokenInfo},
};

/// Service for querying the account card.
#[derive(Debug, Clone, Default)]
pub struct BalanceService;

impl BalanceService {
    /// Create a new balance service.
    pub fn new() -> Self {
        Self
    }

    /// ETH, cDAI and DAI balances plus the allowances the reserve and
    /// staking contracts need.
    pub async fn account_overview(&self, session: &Session) -> Result<AccountOverview> {
        let account = session.require_account()?;
        let network = &session.network;

        tracing::debug!(account = %account, network = %network.name, "Querying account overview");

        let eth = self.get_eth_balance(session, account).await?;

        let cdai = self.get_token_metadata(session, network.cdai, "cDAI", CDAI_DECIMALS).await;
        let dai = self.get_token_metadata(session, network.dai, "DAI", DAI_DECIMALS).await;

        let tokens = vec![
            self.get_erc20_balance(session, account, &cdai).await?,
            self.get_erc20_balance(session, account, &dai).await?,
        ];

        let allowances = vec![
            self.get_allowance(session, account, &cdai, "GoodReserve", network.reserve).await?,
            self.get_allowance(session, account, &dai, "GoodStaking", network.staking).await?,
        ];

        Ok(AccountOverview {
            address: format!("{account:?}"),
            network: network.name.clone(),
            eth,
            tokens,
            allowances,
        })
    }

    /// Get native ETH balance.
    async fn get_eth_balance(&self, session: &Session, address: Address) -> Result<BalanceInfo> {
        let balance = session.client.balance(address).await?;

        Ok(BalanceInfo {
            token: TokenInfo::eth(),
            balance: format_units(balance, 18),
            balance_raw: balance.to_string(),
        })
    }

    async fn get_erc20_balance(
        &self,
        session: &Session,
        address: Address,
        token: &TokenMetadata,
    ) -> Result<BalanceInfo> {
        let balance =
            call_contract(session, token.address, IERC20::balanceOfCall { account: address })
                .await?;

        Ok(BalanceInfo {
            token: TokenInfo::erc20(token.address, token.symbol.clone(), token.decimals),
            balance: format_units(balance, token.decimals),
            balance_raw: balance.to_string(),
        })
    }

    async fn get_allowance(
        &self,
        session: &Session,
        owner: Address,
        token: &TokenMetadata,
        spender_name: &str,
        spender: Address,
    ) -> Result<AllowanceInfo> {
        let allowance =
            call_contract(session, token.address, IERC20::allowanceCall { owner, spender })
                .await?;

        Ok(AllowanceInfo {
            token: TokenInfo::erc20(token.address, token.symbol.clone(), token.decimals),
            spender_name: spender_name.to_string(),
            spender: format!("{spender:?}"),
            allowance: format_units(allowance, token.decimals),
            allowance_raw: allowance.to_string(),
        })
    }

    /// Token metadata, falling back to the known symbol and decimals.
    pub async fn get_token_metadata(
        &self,
        session: &Session,
        token: Address,
        symbol: &str,
        decimals: u8,
    ) -> TokenMetadata {
        let symbol = call_contract(session, token, IERC20::symbolCall {})
            .await
            .unwrap_or_else(|_| symbol.to_string());

        let name = call_contract(session, token, IERC20::nameCall {})
            .await
            .unwrap_or_else(|_| symbol.clone());

        let decimals = call_contract(session, token, IERC20::decimalsCall {})
            .await
            .unwrap_or(decimals);

        TokenMetadata { name, symbol, decimals, address: token }
    }
}
