//! Configuration loading from multiple sources

use crate::{AppConfig, ConfigError, Result, ENV_PREFIX};
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use std::path::Path;
use tracing::debug;

/// Configuration loader with support for multiple formats and sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    ///
    /// Supports TOML, YAML, and JSON formats based on file extension
    pub fn from_file(path: &Path) -> Result<AppConfig> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::LoadError("No file extension found".to_string()))?;

        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading config file");

        match extension {
            "toml" => Self::from_toml(&content),
            "yaml" | "yml" => Self::from_yaml(&content),
            "json" => Self::from_json(&content),
            _ => Err(ConfigError::LoadError(format!(
                "Unsupported file extension: {}",
                extension
            ))),
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<AppConfig> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from YAML string
    pub fn from_yaml(content: &str) -> Result<AppConfig> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<AppConfig> {
        serde_json::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration from environment variables
    ///
    /// Uses default prefix "FUSION_SWAP"
    pub fn from_env() -> Result<AppConfig> {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Load configuration from environment variables with custom prefix
    ///
    /// Environment variables should be in the format: PREFIX_SECTION__KEY
    /// For example: FUSION_SWAP_API__MAX_RETRIES=3
    pub fn from_env_with_prefix(prefix: &str) -> Result<AppConfig> {
        Self::builder().add_env(prefix).build()
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Keys set in the environment replace the file's value for that key only.
    pub fn from_file_with_env(path: &Path, env_prefix: &str) -> Result<AppConfig> {
        Self::builder()
            .add_file(path, true)
            .add_env(env_prefix)
            .build()
    }

    /// Build configuration using the config crate's builder pattern
    ///
    /// This allows for more complex configuration scenarios with multiple sources
    pub fn builder() -> ConfigLoaderBuilder {
        ConfigLoaderBuilder {
            builder: Config::builder(),
        }
    }
}

/// Builder for layered configuration loading; later sources win per key
pub struct ConfigLoaderBuilder {
    builder: ConfigBuilder<config::builder::DefaultState>,
}

impl ConfigLoaderBuilder {
    /// Add a configuration file source
    pub fn add_file(mut self, path: &Path, required: bool) -> Self {
        let format = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        };

        self.builder = self
            .builder
            .add_source(File::from(path).format(format).required(required));
        self
    }

    /// Add environment variable source with prefix
    pub fn add_env(mut self, prefix: &str) -> Self {
        self.builder = self.builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
        self
    }

    /// Set a default value for a key
    pub fn set_default(mut self, key: &str, value: &str) -> Result<Self> {
        self.builder = self.builder.set_default(key, value)?;
        Ok(self)
    }

    /// Set a value that overrides every source
    pub fn set_override(mut self, key: &str, value: &str) -> Result<Self> {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Build the final configuration
    pub fn build(self) -> Result<AppConfig> {
        let config = self.builder.build()?;
        config.try_deserialize().map_err(ConfigError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use fusion_swap_types::{ChainId, Preset};
    use std::io::Write;

    #[test]
    fn test_load_from_toml() {
        let toml = r#"
            [network]
            environment = "mainnet"
            log_level = "debug"
            log_json = true

            [api]
            min_request_interval_ms = 20000
            max_retries = 3

            [polling]
            interval_ms = 5000

            [preflight]
            allowance_buffer_bps = 15000
            auto_approve = true

            [swap]
            default_preset = "medium"

            [chains.ethereum]
            chain_id = 1
            rpc_url = "https://eth.example.org"
        "#;

        let config = ConfigLoader::from_toml(toml).unwrap();
        assert_eq!(config.network.log_level, "debug");
        assert!(config.network.log_json);
        assert_eq!(config.api.min_request_interval_ms, 20_000);
        assert_eq!(config.api.max_retries, 3);
        // untouched keys keep their defaults
        assert_eq!(config.api.initial_retry_delay_ms, 10_000);
        assert_eq!(config.polling.interval_ms, 5_000);
        assert_eq!(config.polling.max_iterations, 360);
        assert_eq!(config.preflight.allowance_buffer_bps, 15_000);
        assert_eq!(config.swap.default_preset, Some(Preset::Medium));

        let eth = &config.chains["ethereum"];
        assert_eq!(eth.chain_id, ChainId::ETHEREUM);
        assert_eq!(eth.router_address, crate::FUSION_ROUTER);
        assert_eq!(eth.native_symbol, "ETH");
    }

    #[test]
    fn test_load_from_yaml() {
        let yaml = r#"
network:
  environment: testnet
  log_level: warn

polling:
  max_iterations: 10
  timeout_secs: 120

chains:
  polygon:
    chain_id: 137
    rpc_url: "https://polygon.example.org"
    router_address: "0x2222222222222222222222222222222222222222"
    native_symbol: POL
        "#;

        let config = ConfigLoader::from_yaml(yaml).unwrap();
        assert_eq!(config.network.environment, crate::Environment::Testnet);
        assert_eq!(config.polling.max_iterations, 10);

        let polygon = &config.chains["polygon"];
        assert_eq!(
            polygon.router_address,
            address!("2222222222222222222222222222222222222222")
        );
        assert_eq!(polygon.native_symbol, "POL");
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"
{
  "network": { "environment": "local", "log_level": "trace" },
  "api": { "max_retries": 0 },
  "chains": {
    "base": { "chain_id": 8453, "rpc_url": "https://base.example.org" }
  }
}
        "#;

        let config = ConfigLoader::from_json(json).unwrap();
        assert_eq!(config.network.log_level, "trace");
        assert_eq!(config.api.max_retries, 0);
        assert_eq!(config.chains["base"].chain_id, ChainId::BASE);
    }

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(ConfigLoader::from_toml("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let toml = r#"
[network]
environment = "local"
log_level = "debug"

[chains.arbitrum]
chain_id = 42161
rpc_url = "http://localhost:8547"
        "#;

        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(toml.as_bytes()).unwrap();

        let config = ConfigLoader::from_file(file.path()).unwrap();
        assert_eq!(config.network.log_level, "debug");
        assert_eq!(config.chains["arbitrum"].chain_id, ChainId::ARBITRUM);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let file = tempfile::Builder::new()
            .suffix(".ini")
            .tempfile()
            .unwrap();

        assert!(matches!(
            ConfigLoader::from_file(file.path()),
            Err(ConfigError::LoadError(_))
        ));
    }

    #[test]
    fn test_builder_layers_override_per_key() {
        let toml = r#"
[api]
min_request_interval_ms = 1000
max_retries = 2
        "#;

        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(toml.as_bytes()).unwrap();

        let config = ConfigLoader::builder()
            .add_file(file.path(), true)
            .set_override("api.max_retries", "7")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.api.min_request_interval_ms, 1_000);
        assert_eq!(config.api.max_retries, 7);
    }

    #[test]
    fn test_missing_optional_file_falls_back_to_defaults() {
        let config = ConfigLoader::builder()
            .add_file(Path::new("/nonexistent/fusion-swap.toml"), false)
            .build()
            .unwrap();
        assert_eq!(config, AppConfig::default());
    }
}
