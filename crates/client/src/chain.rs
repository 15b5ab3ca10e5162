use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use fusion_swap_types::ChainId;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("chain {0} is not configured")]
    UnsupportedChain(ChainId),

    #[error("rpc call failed: {0}")]
    Rpc(String),

    #[error("transaction failed: {0}")]
    TransactionFailed(String),
}

/// Read access to balances and allowances, plus ERC-20 approvals
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn native_balance(&self, chain_id: ChainId, owner: Address) -> Result<U256, ChainError>;

    async fn token_balance(
        &self,
        chain_id: ChainId,
        token: Address,
        owner: Address,
    ) -> Result<U256, ChainError>;

    async fn allowance(
        &self,
        chain_id: ChainId,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError>;

    /// Send an `approve(spender, amount)` from `owner`; returns the transaction hash
    async fn approve(
        &self,
        chain_id: ChainId,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<B256, ChainError>;
}
