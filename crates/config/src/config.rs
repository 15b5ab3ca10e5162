//! Core configuration structures for the Fusion Swap executor

use alloy_primitives::{address, Address};
use fusion_swap_orchestrator::{OrchestratorConfig, PollingConfig, PreflightConfig};
use fusion_swap_ratelimit::{QueueConfig, RetryConfig};
use fusion_swap_types::{ChainId, Preset};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Router that spends the maker's tokens on every chain Fusion+ is deployed to
pub const FUSION_ROUTER: Address = address!("111111125421ca6dc452d289314280a0f8842a65");

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network configuration
    #[serde(default)]
    pub network: NetworkConfig,

    /// Swap API request pacing
    #[serde(default)]
    pub api: ApiConfig,

    /// Secret-reveal polling limits
    #[serde(default)]
    pub polling: PollingSettings,

    /// Pre-flight checks
    #[serde(default)]
    pub preflight: PreflightSettings,

    /// Swap defaults
    #[serde(default)]
    pub swap: SwapSettings,

    /// Chain configurations by name
    #[serde(default)]
    pub chains: HashMap<String, ChainConfig>,
}

/// Network environment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Environment type (mainnet, testnet, local)
    #[serde(default = "default_environment")]
    pub environment: Environment,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,

    /// Enable metrics collection
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Mainnet,
    Testnet,
    Local,
}

/// Swap API pacing and retry policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Minimum gap between the end of one API call and the start of the next
    #[serde(default = "default_min_request_interval_ms")]
    pub min_request_interval_ms: u64,

    /// Retries after a rate-limited attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,

    #[serde(default = "default_max_retry_delay_ms")]
    pub max_retry_delay_ms: u64,
}

/// Polling limits for the secret-reveal loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollingSettings {
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default = "default_poll_timeout_secs")]
    pub timeout_secs: u64,
}

/// Pre-flight check configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreflightSettings {
    /// Required allowance relative to the swap amount (12000 = 1.2x)
    #[serde(default = "default_allowance_buffer_bps")]
    pub allowance_buffer_bps: u32,

    /// Send an approval instead of failing on a short allowance
    #[serde(default)]
    pub auto_approve: bool,
}

/// Defaults applied to every swap request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapSettings {
    /// Preset used when a request names none; the quote's recommendation otherwise
    #[serde(default)]
    pub default_preset: Option<Preset>,
}

/// Configuration for an EVM chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// EIP-155 chain id
    pub chain_id: ChainId,

    /// RPC endpoint for a networked `ChainClient`; unused by the simulated chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,

    /// Spender the source token allowance must be granted to
    #[serde(default = "default_router")]
    pub router_address: Address,

    /// Native gas token symbol
    #[serde(default = "default_native_symbol")]
    pub native_symbol: String,
}

// Default value functions
fn default_environment() -> Environment {
    Environment::Local
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_min_request_interval_ms() -> u64 {
    15_000
}

fn default_max_retries() -> u32 {
    5
}

fn default_initial_retry_delay_ms() -> u64 {
    10_000
}

fn default_max_retry_delay_ms() -> u64 {
    300_000 // 5 minutes
}

fn default_poll_interval_ms() -> u64 {
    10_000
}

fn default_max_iterations() -> u32 {
    360
}

fn default_poll_timeout_secs() -> u64 {
    3_600 // 1 hour
}

fn default_allowance_buffer_bps() -> u32 {
    12_000
}

fn default_router() -> Address {
    FUSION_ROUTER
}

fn default_native_symbol() -> String {
    "ETH".to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: default_true(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            min_request_interval_ms: default_min_request_interval_ms(),
            max_retries: default_max_retries(),
            initial_retry_delay_ms: default_initial_retry_delay_ms(),
            max_retry_delay_ms: default_max_retry_delay_ms(),
        }
    }
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            max_iterations: default_max_iterations(),
            timeout_secs: default_poll_timeout_secs(),
        }
    }
}

impl Default for PreflightSettings {
    fn default() -> Self {
        Self {
            allowance_buffer_bps: default_allowance_buffer_bps(),
            auto_approve: false,
        }
    }
}

impl ChainConfig {
    pub fn new(chain_id: ChainId, rpc_url: impl Into<String>, native_symbol: &str) -> Self {
        Self {
            chain_id,
            rpc_url: Some(rpc_url.into()),
            router_address: FUSION_ROUTER,
            native_symbol: native_symbol.to_string(),
        }
    }
}

impl ApiConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_retry_delay_ms),
            max_delay: Duration::from_millis(self.max_retry_delay_ms),
        }
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            min_request_interval: Duration::from_millis(self.min_request_interval_ms),
        }
    }
}

impl PollingSettings {
    pub fn polling_config(&self) -> PollingConfig {
        PollingConfig {
            interval: Duration::from_millis(self.interval_ms),
            max_iterations: self.max_iterations,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl AppConfig {
    /// Fast pacing against the simulated backends
    pub fn local() -> Self {
        let mut chains = HashMap::new();
        chains.insert(
            "ethereum".to_string(),
            ChainConfig::new(ChainId::ETHEREUM, "http://localhost:8545", "ETH"),
        );
        chains.insert(
            "arbitrum".to_string(),
            ChainConfig::new(ChainId::ARBITRUM, "http://localhost:8547", "ETH"),
        );

        Self {
            network: NetworkConfig {
                environment: Environment::Local,
                log_level: "debug".to_string(),
                ..NetworkConfig::default()
            },
            api: ApiConfig {
                min_request_interval_ms: 50,
                max_retries: 3,
                initial_retry_delay_ms: 100,
                max_retry_delay_ms: 1_000,
            },
            polling: PollingSettings {
                interval_ms: 100,
                max_iterations: 100,
                timeout_secs: 60,
            },
            preflight: PreflightSettings {
                auto_approve: true,
                ..PreflightSettings::default()
            },
            swap: SwapSettings::default(),
            chains,
        }
    }

    /// Production pacing for the public Fusion+ API
    pub fn mainnet() -> Self {
        let chains = [
            ("ethereum", ChainId::ETHEREUM, "https://eth.llamarpc.com", "ETH"),
            ("optimism", ChainId::OPTIMISM, "https://mainnet.optimism.io", "ETH"),
            ("bsc", ChainId::BSC, "https://bsc-dataseed.bnbchain.org", "BNB"),
            ("polygon", ChainId::POLYGON, "https://polygon-rpc.com", "POL"),
            ("base", ChainId::BASE, "https://mainnet.base.org", "ETH"),
            ("arbitrum", ChainId::ARBITRUM, "https://arb1.arbitrum.io/rpc", "ETH"),
            ("avalanche", ChainId::AVALANCHE, "https://api.avax.network/ext/bc/C/rpc", "AVAX"),
        ]
        .into_iter()
        .map(|(name, id, rpc, symbol)| (name.to_string(), ChainConfig::new(id, rpc, symbol)))
        .collect();

        Self {
            network: NetworkConfig {
                environment: Environment::Mainnet,
                log_json: true,
                ..NetworkConfig::default()
            },
            chains,
            ..Self::default()
        }
    }

    pub fn chain(&self, chain_id: ChainId) -> Option<&ChainConfig> {
        self.chains.values().find(|c| c.chain_id == chain_id)
    }

    /// Router per configured chain
    pub fn preflight_config(&self) -> PreflightConfig {
        PreflightConfig {
            allowance_buffer_bps: self.preflight.allowance_buffer_bps,
            auto_approve: self.preflight.auto_approve,
            routers: self
                .chains
                .values()
                .map(|c| (c.chain_id, c.router_address))
                .collect(),
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            polling: self.polling.polling_config(),
            default_preset: self.swap.default_preset,
            ..OrchestratorConfig::default()
        }
    }
}
