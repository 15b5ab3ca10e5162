//! Integration tests for the config crate

use fusion_swap_config::{
    validate_config, AppConfig, ConfigError, ConfigLoader, Environment, FUSION_ROUTER,
};
use fusion_swap_types::{ChainId, Preset};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

fn shipped(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../config")
        .join(name)
}

#[test]
fn test_load_mainnet_config() {
    let config = ConfigLoader::from_file(&shipped("mainnet.toml"))
        .expect("Failed to load mainnet config");

    assert_eq!(config.network.environment, Environment::Mainnet);
    assert!(config.network.log_json);
    assert_eq!(config.swap.default_preset, Some(Preset::Fast));
    assert_eq!(
        config.chain(ChainId::ARBITRUM).map(|c| c.router_address),
        Some(FUSION_ROUTER)
    );
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_load_local_config_matches_preset() {
    let config = ConfigLoader::from_file(&shipped("local.toml"))
        .expect("Failed to load local config");

    assert_eq!(config, AppConfig::local());
}

#[test]
fn test_shipped_mainnet_pacing_matches_defaults() {
    let config = ConfigLoader::from_file(&shipped("mainnet.toml")).unwrap();
    let defaults = AppConfig::default();

    assert_eq!(config.api, defaults.api);
    assert_eq!(config.polling, defaults.polling);
    assert_eq!(
        config.api.queue_config().min_request_interval,
        Duration::from_secs(15)
    );
}

#[test]
fn test_env_overrides_single_key() {
    let toml = r#"
[api]
min_request_interval_ms = 2000
max_retries = 4

[chains.ethereum]
chain_id = 1
rpc_url = "https://eth.example.org"
    "#;

    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(toml.as_bytes()).unwrap();
    file.flush().unwrap();

    // prefix unique to this test; env is process-wide
    std::env::set_var("FUSION_SWAP_IT_OVERRIDE_API__MAX_RETRIES", "9");
    std::env::set_var("FUSION_SWAP_IT_OVERRIDE_PREFLIGHT__AUTO_APPROVE", "true");

    let config = ConfigLoader::from_file_with_env(file.path(), "FUSION_SWAP_IT_OVERRIDE")
        .expect("Failed to load config with env");

    assert_eq!(config.api.max_retries, 9);
    assert_eq!(config.api.min_request_interval_ms, 2_000);
    assert!(config.preflight.auto_approve);
    assert_eq!(config.chains["ethereum"].chain_id, ChainId::ETHEREUM);
}

#[test]
fn test_env_only_config() {
    std::env::set_var("FUSION_SWAP_IT_ENV_ONLY_POLLING__MAX_ITERATIONS", "12");
    std::env::set_var("FUSION_SWAP_IT_ENV_ONLY_NETWORK__LOG_LEVEL", "warn");

    let config = ConfigLoader::from_env_with_prefix("FUSION_SWAP_IT_ENV_ONLY")
        .expect("Failed to load config from env");

    assert_eq!(config.polling.max_iterations, 12);
    assert_eq!(config.network.log_level, "warn");
    assert_eq!(config.polling.interval_ms, 10_000);
}

#[test]
fn test_yaml_file_via_builder() {
    let yaml = r#"
network:
  environment: testnet
polling:
  interval_ms: 2500
swap:
  default_preset: slow
    "#;

    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file.flush().unwrap();

    let config = ConfigLoader::builder()
        .add_file(file.path(), true)
        .build()
        .expect("Failed to build config");

    assert_eq!(config.network.environment, Environment::Testnet);
    assert_eq!(config.polling.interval_ms, 2_500);
    assert_eq!(config.swap.default_preset, Some(Preset::Slow));
}

#[test]
fn test_invalid_config_rejected() {
    let toml = r#"
[network]
log_level = "loud"

[polling]
interval_ms = 0
    "#;

    let config = ConfigLoader::from_toml(toml).unwrap();
    match validate_config(&config) {
        Err(ConfigError::ValidationError(msg)) => {
            assert!(msg.contains("network.log_level"));
            assert!(msg.contains("polling.interval_ms"));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_bad_router_address_fails_to_parse() {
    let toml = r#"
[chains.ethereum]
chain_id = 1
rpc_url = "https://eth.example.org"
router_address = "0x1234"
    "#;

    assert!(matches!(
        ConfigLoader::from_toml(toml),
        Err(ConfigError::TomlError(_))
    ));
}
