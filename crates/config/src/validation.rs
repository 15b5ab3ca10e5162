//! Configuration validation

use crate::{AppConfig, ChainConfig, ConfigError, Result};
use alloy_primitives::Address;
use std::collections::HashSet;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate the entire application configuration
pub fn validate_config(config: &AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    // Validate network config
    if let Err(e) = validate_log_level(&config.network.log_level) {
        errors.push(e);
    }

    // Validate API pacing
    if config.api.min_request_interval_ms == 0 {
        errors.push(ValidationError::new(
            "api.min_request_interval_ms",
            "must be greater than 0",
        ));
    }

    if config.api.initial_retry_delay_ms == 0 {
        errors.push(ValidationError::new(
            "api.initial_retry_delay_ms",
            "must be greater than 0",
        ));
    }

    if config.api.max_retry_delay_ms < config.api.initial_retry_delay_ms {
        errors.push(ValidationError::new(
            "api.max_retry_delay_ms",
            "must be >= api.initial_retry_delay_ms",
        ));
    }

    // Validate polling
    if config.polling.interval_ms == 0 {
        errors.push(ValidationError::new(
            "polling.interval_ms",
            "must be greater than 0",
        ));
    }

    if config.polling.max_iterations == 0 {
        errors.push(ValidationError::new(
            "polling.max_iterations",
            "must be greater than 0",
        ));
    }

    if config.polling.timeout_secs == 0 {
        errors.push(ValidationError::new(
            "polling.timeout_secs",
            "must be greater than 0",
        ));
    }

    // Validate pre-flight
    if config.preflight.allowance_buffer_bps < 10_000 {
        errors.push(ValidationError::new(
            "preflight.allowance_buffer_bps",
            "must be >= 10000 (1x the swap amount)",
        ));
    }

    // Validate chains
    for (chain_name, chain_config) in &config.chains {
        if let Err(e) = validate_chain_config(chain_config) {
            errors.push(ValidationError::new(format!("chains.{chain_name}"), e));
        }
    }

    // Check for duplicate chain IDs
    let chain_ids: HashSet<_> = config.chains.values().map(|c| c.chain_id).collect();
    if chain_ids.len() != config.chains.len() {
        errors.push(ValidationError::new("chains", "duplicate chain IDs found"));
    }

    // Return all errors if any were found
    if !errors.is_empty() {
        let error_msg = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ConfigError::ValidationError(error_msg));
    }

    Ok(())
}

/// Validate a chain configuration
pub fn validate_chain_config(chain: &ChainConfig) -> std::result::Result<(), String> {
    if chain.chain_id.0 == 0 {
        return Err("chain_id must be greater than 0".to_string());
    }

    if let Some(url) = &chain.rpc_url {
        validate_url(url)?;
    }

    if chain.router_address == Address::ZERO {
        return Err("router_address must not be the zero address".to_string());
    }

    if chain.native_symbol.is_empty() {
        return Err("native_symbol is required".to_string());
    }

    Ok(())
}

/// Validate a URL
pub fn validate_url(url: &str) -> std::result::Result<(), String> {
    if url.is_empty() {
        return Err("URL cannot be empty".to_string());
    }

    // Basic URL validation - check for scheme
    if !url.starts_with("http://")
        && !url.starts_with("https://")
        && !url.starts_with("ws://")
        && !url.starts_with("wss://")
    {
        return Err("URL must start with http://, https://, ws://, or wss://".to_string());
    }

    Ok(())
}

/// Validate log level
fn validate_log_level(level: &str) -> std::result::Result<(), ValidationError> {
    match level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new(
            "network.log_level",
            format!(
                "invalid log level '{level}', must be one of: trace, debug, info, warn, error"
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ApiConfig, NetworkConfig, PollingSettings};
    use fusion_swap_types::ChainId;

    #[test]
    fn test_validate_presets() {
        assert!(validate_config(&AppConfig::default()).is_ok());
        assert!(validate_config(&AppConfig::local()).is_ok());
        assert!(validate_config(&AppConfig::mainnet()).is_ok());
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let config = AppConfig {
            network: NetworkConfig {
                log_level: "invalid".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_all_errors_reported_together() {
        let config = AppConfig {
            api: ApiConfig {
                min_request_interval_ms: 0,
                initial_retry_delay_ms: 5_000,
                max_retry_delay_ms: 1_000,
                ..Default::default()
            },
            polling: PollingSettings {
                max_iterations: 0,
                ..Default::default()
            },
            ..Default::default()
        };

        let Err(ConfigError::ValidationError(msg)) = validate_config(&config) else {
            panic!("expected validation error");
        };
        assert!(msg.contains("api.min_request_interval_ms"));
        assert!(msg.contains("api.max_retry_delay_ms"));
        assert!(msg.contains("polling.max_iterations"));
    }

    #[test]
    fn test_allowance_buffer_below_one() {
        let mut config = AppConfig::default();
        config.preflight.allowance_buffer_bps = 9_999;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_chain_config() {
        let valid_chain = ChainConfig::new(ChainId::ETHEREUM, "https://eth.example.org", "ETH");
        assert!(validate_chain_config(&valid_chain).is_ok());

        let zero_id = ChainConfig {
            chain_id: ChainId(0),
            ..valid_chain.clone()
        };
        assert!(validate_chain_config(&zero_id).is_err());

        let no_router = ChainConfig {
            router_address: Address::ZERO,
            ..valid_chain.clone()
        };
        assert!(validate_chain_config(&no_router).is_err());

        let bad_rpc = ChainConfig {
            rpc_url: Some("localhost:8545".to_string()),
            ..valid_chain
        };
        assert!(validate_chain_config(&bad_rpc).is_err());
    }

    #[test]
    fn test_chain_without_rpc_url_is_valid() {
        let toml = r#"
[chains.ethereum]
chain_id = 1
        "#;

        let config = crate::ConfigLoader::from_toml(toml).unwrap();
        assert_eq!(config.chains["ethereum"].rpc_url, None);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_duplicate_chain_ids() {
        let mut config = AppConfig::local();
        config.chains.insert(
            "mainnet-fork".to_string(),
            ChainConfig::new(ChainId::ETHEREUM, "http://localhost:9545", "ETH"),
        );
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://localhost:8080").is_ok());
        assert!(validate_url("ws://localhost:8080").is_ok());
        assert!(validate_url("wss://example.com").is_ok());

        assert!(validate_url("").is_err());
        assert!(validate_url("not-a-url").is_err());
        assert!(validate_url("ftp://example.com").is_err());
    }
}
