use async_trait::async_trait;
use fusion_swap_ratelimit::RateLimitSignal;
use fusion_swap_types::{
    ChainId, OrderHash, OrderParams, OrderStatus, PreparedOrder, Quote, QuoteParams, ReadyFills,
    Secret, SecretHash,
};
use thiserror::Error;

/// Operation names used for logging, queue labels and call accounting
pub mod ops {
    pub const GET_QUOTE: &str = "get_quote";
    pub const CREATE_ORDER: &str = "create_order";
    pub const SUBMIT_ORDER: &str = "submit_order";
    pub const READY_FILLS: &str = "ready_to_accept_secret_fills";
    pub const SUBMIT_SECRET: &str = "submit_secret";
    pub const ORDER_STATUS: &str = "order_status";
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("rate limited by swap API")]
    RateLimited,

    #[error("swap API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("order {0} not found")]
    OrderNotFound(OrderHash),

    #[error("insufficient liquidity: {0}")]
    InsufficientLiquidity(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Errors that make further calls about the same order pointless
    pub fn is_order_fatal(&self) -> bool {
        match self {
            ApiError::OrderNotFound(_) => true,
            ApiError::Status { status, .. } => matches!(status, 400 | 404),
            _ => false,
        }
    }
}

impl RateLimitSignal for ApiError {
    fn is_rate_limited(&self) -> bool {
        match self {
            ApiError::RateLimited => true,
            ApiError::Status { status, .. } => *status == 429,
            _ => false,
        }
    }
}

/// Cross-chain swap API
#[async_trait]
pub trait SwapApi: Send + Sync {
    async fn get_quote(&self, params: &QuoteParams) -> Result<Quote, ApiError>;

    /// Build an order committing to `params.hash_lock`
    async fn create_order(
        &self,
        quote: &Quote,
        params: &OrderParams,
    ) -> Result<PreparedOrder, ApiError>;

    /// Hand the signed order over for settlement
    async fn submit_order(
        &self,
        src_chain_id: ChainId,
        order: &serde_json::Value,
        quote_id: &str,
        secret_hashes: &[SecretHash],
    ) -> Result<(), ApiError>;

    /// Fills whose escrows are in place and which now wait for their secret
    async fn ready_to_accept_secret_fills(
        &self,
        order_hash: OrderHash,
    ) -> Result<ReadyFills, ApiError>;

    async fn submit_secret(&self, order_hash: OrderHash, secret: &Secret) -> Result<(), ApiError>;

    async fn order_status(&self, order_hash: OrderHash) -> Result<OrderStatus, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_classification() {
        assert!(ApiError::RateLimited.is_rate_limited());
        assert!(ApiError::Status {
            status: 429,
            body: "slow down".into()
        }
        .is_rate_limited());
        assert!(!ApiError::Status {
            status: 500,
            body: String::new()
        }
        .is_rate_limited());
        assert!(!ApiError::Transport("reset".into()).is_rate_limited());
    }

    #[test]
    fn test_order_fatal_classification() {
        assert!(ApiError::OrderNotFound(OrderHash::ZERO).is_order_fatal());
        assert!(ApiError::Status {
            status: 404,
            body: String::new()
        }
        .is_order_fatal());
        assert!(!ApiError::Status {
            status: 503,
            body: String::new()
        }
        .is_order_fatal());
        assert!(!ApiError::RateLimited.is_order_fatal());
    }
}
