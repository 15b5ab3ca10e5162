use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hashlock::HashLock;
use crate::quote::Preset;
use crate::secret::SecretHash;

/// Identifier the API assigns to a created order
pub type OrderHash = B256;

/// Order lifecycle as reported by the swap API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    /// Refund in progress upstream, not yet final
    Refunding,
    Executed,
    Expired,
    Refunded,
    Cancelled,
    /// Anything this client does not recognise; treated as non-terminal
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Executed
                | OrderStatus::Expired
                | OrderStatus::Refunded
                | OrderStatus::Cancelled
        )
    }

    pub fn is_success(&self) -> bool {
        *self == OrderStatus::Executed
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Refunding => "Refunding",
            OrderStatus::Executed => "Executed",
            OrderStatus::Expired => "Expired",
            OrderStatus::Refunded => "Refunded",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the caller commits to when creating an order from a quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderParams {
    pub wallet_address: Address,
    pub hash_lock: HashLock,
    pub preset: Preset,
    pub secret_hashes: Vec<SecretHash>,
}

/// Order built by the API, ready for submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedOrder {
    pub order_hash: OrderHash,
    /// Opaque order payload, passed back verbatim on submission
    pub order: serde_json::Value,
    pub quote_id: String,
}

/// A fill whose escrows are deployed and which now waits for secret `idx`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyFill {
    pub idx: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_escrow_deploy_tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_escrow_deploy_tx_hash: Option<String>,
}

impl ReadyFill {
    pub fn new(idx: u32) -> Self {
        Self {
            idx,
            src_escrow_deploy_tx_hash: None,
            dst_escrow_deploy_tx_hash: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyFills {
    #[serde(default)]
    pub fills: Vec<ReadyFill>,
}

impl ReadyFills {
    pub fn from_indices(indices: impl IntoIterator<Item = u32>) -> Self {
        Self {
            fills: indices.into_iter().map(ReadyFill::new).collect(),
        }
    }

    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.fills.iter().map(|f| f.idx)
    }

    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }
}
