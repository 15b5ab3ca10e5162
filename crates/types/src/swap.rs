use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::order::{OrderHash, OrderStatus};
use crate::quote::Preset;
use crate::ChainId;

/// Local identifier for one swap attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwapId(Uuid);

impl SwapId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SwapId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SwapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Caller input for one swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub wallet_address: Address,
    pub src_chain_id: ChainId,
    pub dst_chain_id: ChainId,
    pub src_token_address: Address,
    pub dst_token_address: Address,
    /// Source amount in base units
    pub amount: U256,
    /// Preferred preset; the quote's recommendation is used when absent or unsupported
    #[serde(default)]
    pub preset: Option<Preset>,
}

/// Per-attempt orchestration state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapState {
    Idle,
    Quoting,
    Validating,
    BuildingCommitment,
    CreatingOrder,
    Submitting,
    Polling,
    Executed,
    Expired,
    Refunded,
    Cancelled,
    Failed,
    /// Polling cap or timeout reached without a terminal order status
    Stuck,
    /// Polling stopped locally by the caller
    Aborted,
}

impl SwapState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SwapState::Executed
                | SwapState::Expired
                | SwapState::Refunded
                | SwapState::Cancelled
                | SwapState::Failed
                | SwapState::Stuck
                | SwapState::Aborted
        )
    }

    /// Terminal swap state for a terminal order status
    pub fn from_order_status(status: OrderStatus) -> Option<Self> {
        match status {
            OrderStatus::Executed => Some(SwapState::Executed),
            OrderStatus::Expired => Some(SwapState::Expired),
            OrderStatus::Refunded => Some(SwapState::Refunded),
            OrderStatus::Cancelled => Some(SwapState::Cancelled),
            OrderStatus::Pending | OrderStatus::Refunding | OrderStatus::Unknown => None,
        }
    }
}

/// Machine-readable reason a swap did not execute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    InsufficientBalance,
    InsufficientAllowance,
    InsufficientLiquidity,
    /// A balance or allowance read failed, or the chain is not configured
    PreflightFailed,
    MaxRetriesExceeded,
    ApiError,
    InvalidCommitment,
    /// Order reached a terminal status other than Executed
    OrderNotExecuted,
    Stuck,
    Aborted,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Outcome handed back to the caller of `execute_swap`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_hash: Option<OrderHash>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "status_name"
    )]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SwapResult {
    /// Result for an order that reached a terminal status
    pub fn finished(order_hash: OrderHash, status: OrderStatus) -> Self {
        if status.is_success() {
            Self {
                success: true,
                order_hash: Some(order_hash),
                status: Some(status),
                error: None,
                message: None,
            }
        } else {
            Self {
                success: false,
                order_hash: Some(order_hash),
                status: Some(status),
                error: Some(FailureKind::OrderNotExecuted),
                message: Some(format!("order finished with status {status}")),
            }
        }
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            success: false,
            order_hash: None,
            status: None,
            error: Some(kind),
            message: Some(message.into()),
        }
    }

    pub fn with_order(mut self, order_hash: OrderHash, status: Option<OrderStatus>) -> Self {
        self.order_hash = Some(order_hash);
        self.status = status;
        self
    }

    pub fn state(&self) -> SwapState {
        if let Some(state) = self.status.and_then(SwapState::from_order_status) {
            return state;
        }
        match self.error {
            Some(FailureKind::Stuck) => SwapState::Stuck,
            Some(FailureKind::Aborted) => SwapState::Aborted,
            _ => SwapState::Failed,
        }
    }
}

/// Order statuses are reported to callers in their display form ("Executed")
mod status_name {
    use super::OrderStatus;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        status: &Option<OrderStatus>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match status {
            Some(status) => serializer.serialize_some(status.as_str()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<OrderStatus>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        Ok(raw.map(|name| {
            serde_json::from_value(serde_json::Value::String(name.to_ascii_lowercase()))
                .unwrap_or(OrderStatus::Unknown)
        }))
    }
}

/// Progress notification broadcast by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapEvent {
    pub swap_id: SwapId,
    pub at: DateTime<Utc>,
    pub kind: SwapEventKind,
}

impl SwapEvent {
    pub fn new(swap_id: SwapId, kind: SwapEventKind) -> Self {
        Self {
            swap_id,
            at: Utc::now(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SwapEventKind {
    StateChanged {
        from: SwapState,
        to: SwapState,
    },
    QuoteReceived {
        secrets_count: u32,
        dst_amount: U256,
    },
    ApprovalSent {
        tx_hash: alloy_primitives::B256,
    },
    OrderCreated {
        order_hash: OrderHash,
    },
    PollIteration {
        iteration: u32,
        ready_fills: usize,
        status: Option<OrderStatus>,
    },
    SecretRevealed {
        idx: u32,
    },
    SecretSubmissionFailed {
        idx: u32,
        reason: String,
    },
    /// Ready fill index outside the committed secrets
    ProtocolViolation {
        idx: u32,
        secrets_count: u32,
    },
    Finished {
        state: SwapState,
        success: bool,
        error: Option<FailureKind>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executed_result_json() {
        let hash = OrderHash::repeat_byte(0xaa);
        let result = SwapResult::finished(hash, OrderStatus::Executed);
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["status"], "Executed");
        assert!(json.get("error").is_none());
        assert_eq!(result.state(), SwapState::Executed);
    }

    #[test]
    fn test_failure_result_json() {
        let result = SwapResult::failed(FailureKind::InsufficientBalance, "balance too low");
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "InsufficientBalance");
        assert!(json.get("orderHash").is_none());
        assert_eq!(result.state(), SwapState::Failed);
    }

    #[test]
    fn test_expired_result_is_not_success() {
        let result = SwapResult::finished(OrderHash::ZERO, OrderStatus::Expired);
        assert!(!result.success);
        assert_eq!(result.error, Some(FailureKind::OrderNotExecuted));
        assert_eq!(result.state(), SwapState::Expired);
    }

    #[test]
    fn test_result_status_parses_back() {
        let result = SwapResult::finished(OrderHash::ZERO, OrderStatus::Refunded);
        let json = serde_json::to_string(&result).unwrap();
        let parsed: SwapResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.status, Some(OrderStatus::Refunded));
    }

    #[test]
    fn test_stuck_and_aborted_states() {
        let stuck = SwapResult::failed(FailureKind::Stuck, "no terminal status")
            .with_order(OrderHash::ZERO, Some(OrderStatus::Pending));
        assert_eq!(stuck.state(), SwapState::Stuck);

        let aborted = SwapResult::failed(FailureKind::Aborted, "shutdown");
        assert_eq!(aborted.state(), SwapState::Aborted);
        assert!(aborted.state().is_terminal());
        assert!(!SwapState::Polling.is_terminal());
    }

    #[test]
    fn test_event_kind_tagging() {
        let event = SwapEvent::new(SwapId::new(), SwapEventKind::SecretRevealed { idx: 2 });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"]["type"], "secret_revealed");
        assert_eq!(json["kind"]["idx"], 2);
    }
}
