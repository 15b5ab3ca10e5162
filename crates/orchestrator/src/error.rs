use std::time::Duration;

use fusion_swap_client::ApiError;
use fusion_swap_ratelimit::RequestError;
use fusion_swap_types::{FailureKind, HashLockError, OrderHash};
use thiserror::Error;

use crate::validator::ValidationError;

/// Builder error
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("missing required field: {field}")]
    MissingField { field: String },
}

/// Reason a swap attempt ended without an order reaching a terminal status
#[derive(Debug, Error)]
pub enum SwapError {
    #[error("quote request failed: {0}")]
    Quote(RequestError<ApiError>),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to build hash lock: {0}")]
    Commitment(#[from] HashLockError),

    #[error("order creation failed: {0}")]
    CreateOrder(RequestError<ApiError>),

    #[error("order submission failed: {0}")]
    SubmitOrder(RequestError<ApiError>),

    #[error("polling order {order_hash} failed: {source}")]
    Polling {
        order_hash: OrderHash,
        source: RequestError<ApiError>,
    },

    #[error("order {order_hash} not terminal after {iterations} polls ({elapsed:?})")]
    Stuck {
        order_hash: OrderHash,
        iterations: u32,
        elapsed: Duration,
    },

    #[error("polling of order {order_hash} aborted")]
    Aborted { order_hash: OrderHash },
}

impl SwapError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SwapError::Quote(err) => match err.inner() {
                Some(ApiError::InsufficientLiquidity(_)) => FailureKind::InsufficientLiquidity,
                _ => request_kind(err),
            },
            SwapError::Validation(err) => err.kind(),
            SwapError::Commitment(_) => FailureKind::InvalidCommitment,
            SwapError::CreateOrder(err) | SwapError::SubmitOrder(err) => request_kind(err),
            SwapError::Polling { source, .. } => request_kind(source),
            SwapError::Stuck { .. } => FailureKind::Stuck,
            SwapError::Aborted { .. } => FailureKind::Aborted,
        }
    }

    /// Order the error relates to, once one exists
    pub fn order_hash(&self) -> Option<OrderHash> {
        match self {
            SwapError::Polling { order_hash, .. }
            | SwapError::Stuck { order_hash, .. }
            | SwapError::Aborted { order_hash } => Some(*order_hash),
            _ => None,
        }
    }
}

fn request_kind(err: &RequestError<ApiError>) -> FailureKind {
    if err.is_max_retries() {
        FailureKind::MaxRetriesExceeded
    } else {
        FailureKind::ApiError
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn test_failure_kinds() {
        let limited = RequestError::MaxRetriesExceeded {
            operation: "get_quote".to_string(),
            max_retries: 5,
            last_error: ApiError::RateLimited,
        };
        assert_eq!(
            SwapError::Quote(limited).kind(),
            FailureKind::MaxRetriesExceeded
        );

        let no_route = RequestError::Failed {
            operation: "get_quote".to_string(),
            source: ApiError::InsufficientLiquidity("no route".into()),
        };
        assert_eq!(
            SwapError::Quote(no_route).kind(),
            FailureKind::InsufficientLiquidity
        );

        let rejected = RequestError::Failed {
            operation: "submit_order".to_string(),
            source: ApiError::Status {
                status: 400,
                body: "bad order".into(),
            },
        };
        assert_eq!(SwapError::SubmitOrder(rejected).kind(), FailureKind::ApiError);

        let balance = ValidationError::InsufficientBalance {
            required: U256::from(2u64),
            available: U256::from(1u64),
        };
        assert_eq!(
            SwapError::from(balance).kind(),
            FailureKind::InsufficientBalance
        );

        assert_eq!(
            SwapError::from(HashLockError::ZeroSecrets).kind(),
            FailureKind::InvalidCommitment
        );
    }

    #[test]
    fn test_order_hash_only_after_creation() {
        let hash = OrderHash::repeat_byte(0x01);
        assert_eq!(SwapError::Aborted { order_hash: hash }.order_hash(), Some(hash));
        assert_eq!(SwapError::from(HashLockError::ZeroSecrets).order_hash(), None);
    }
}
