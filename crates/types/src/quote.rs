use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ChainId;

/// Named execution-speed/cost profile selected when creating an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    #[default]
    Fast,
    Medium,
    Slow,
    Custom,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Fast => "fast",
            Preset::Medium => "medium",
            Preset::Slow => "slow",
            Preset::Custom => "custom",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Preset::Fast),
            "medium" => Ok(Preset::Medium),
            "slow" => Ok(Preset::Slow),
            "custom" => Ok(Preset::Custom),
            other => Err(format!("unknown preset: {other}")),
        }
    }
}

/// Parameters for requesting a cross-chain quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteParams {
    pub src_chain_id: ChainId,
    pub dst_chain_id: ChainId,
    pub src_token_address: Address,
    pub dst_token_address: Address,
    /// Source amount in base units
    pub amount: U256,
    pub wallet_address: Address,
    /// Ask the API to estimate execution (required before placing an order)
    #[serde(default)]
    pub enable_estimate: bool,
}

/// A quote returned by the swap API. Treated as single use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    #[serde(default)]
    pub quote_id: Option<String>,
    pub src_chain_id: ChainId,
    pub dst_chain_id: ChainId,
    pub src_token_address: Address,
    pub dst_token_address: Address,
    pub src_token_amount: U256,
    pub dst_token_amount: U256,
    /// Number of secrets the order must commit to
    pub secrets_count: u32,
    pub recommended_preset: Preset,
    #[serde(default)]
    pub presets: Vec<Preset>,
}

impl Quote {
    pub fn supports_preset(&self, preset: Preset) -> bool {
        preset == self.recommended_preset || self.presets.contains(&preset)
    }

    /// Use `wanted` when the quote offers it, otherwise the recommended preset
    pub fn select_preset(&self, wanted: Option<Preset>) -> Preset {
        match wanted {
            Some(preset) if self.supports_preset(preset) => preset,
            _ => self.recommended_preset,
        }
    }

    pub fn is_multi_fill(&self) -> bool {
        self.secrets_count > 1
    }
}
