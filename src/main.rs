//! Fusion Swap command-line runner
//!
//! Runs a single hash-lock swap end to end and prints the `SwapResult` as JSON.

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use anyhow::Context;
use clap::{Parser, ValueEnum};
use fusion_swap_client::{ops, SimulatedChain, SimulatedSwapApi};
use fusion_swap_config::{validate_config, AppConfig, ConfigLoader, ENV_PREFIX};
use fusion_swap_metrics::{init_tracing, MetricsCollector};
use fusion_swap_orchestrator::SwapOrchestrator;
use fusion_swap_ratelimit::{RequestQueue, RetryableExecutor};
use fusion_swap_types::{ChainId, Preset, SwapRequest, NATIVE_TOKEN};
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// In-memory swap API and chain
    Simulated,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (TOML, YAML or JSON); FUSION_SWAP_* variables override it
    #[arg(long, env = "FUSION_SWAP_CONFIG")]
    config: Option<PathBuf>,

    /// Backend to run against
    #[arg(long, value_enum, default_value = "simulated")]
    mode: Mode,

    /// Maker wallet
    #[arg(long, default_value = "0x00000000000000000000000000000000000a11ce")]
    wallet: Address,

    #[arg(long, default_value = "1")]
    src_chain: ChainId,

    #[arg(long, default_value = "42161")]
    dst_chain: ChainId,

    /// Source token; the 0xEeee... sentinel means the native asset
    #[arg(long, default_value_t = NATIVE_TOKEN)]
    src_token: Address,

    #[arg(long, default_value = "0xaf88d065e77c8cc2239327c5edb3a432268e5831")]
    dst_token: Address,

    /// Amount in the source token's base units
    #[arg(long, default_value = "1000000000000000000")]
    amount: String,

    /// Preset to request; the quote's recommendation when omitted or unsupported
    #[arg(long)]
    preset: Option<Preset>,

    /// Secrets the simulated API asks for per order
    #[arg(long, default_value = "1")]
    secrets_count: u32,

    /// Answer the first N simulated quote requests with a rate limit
    #[arg(long, default_value = "0")]
    rate_limited_quotes: u32,

    /// Stop polling after this many seconds
    #[arg(long)]
    cancel_after_secs: Option<u64>,

    /// Print Prometheus metrics after the swap
    #[arg(long)]
    print_metrics: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ConfigLoader::from_file_with_env(path, ENV_PREFIX)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AppConfig::local(),
    };
    validate_config(&config)?;

    init_tracing(&config.network.log_level, config.network.log_json)?;

    let amount = U256::from_str(&args.amount)
        .with_context(|| format!("invalid amount {}", args.amount))?;

    info!("Starting Fusion Swap");
    info!("  Mode: {:?}", args.mode);
    info!("  Environment: {:?}", config.network.environment);

    let (api, chain) = match args.mode {
        Mode::Simulated => simulated_backends(&args, &config, amount),
    };

    let queue = RequestQueue::new(
        config.api.queue_config(),
        RetryableExecutor::new(config.api.retry_config()),
    );

    let orchestrator = SwapOrchestrator::builder()
        .with_api(api)
        .with_chain(chain)
        .with_queue(queue)
        .with_preflight(config.preflight_config())
        .with_config(config.orchestrator_config())
        .build()?;

    let collector = Arc::new(MetricsCollector::new());
    let metrics_task = config
        .network
        .metrics_enabled
        .then(|| tokio::spawn(collector.clone().run(orchestrator.subscribe())));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let cancel_after = args.cancel_after_secs.map(Duration::from_secs);
    tokio::spawn(async move {
        let deadline = async {
            match cancel_after {
                Some(after) => tokio::time::sleep(after).await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => warn!("interrupted, stopping swap"),
            _ = deadline => warn!("cancel deadline reached, stopping swap"),
        }
        let _ = shutdown_tx.send(true);
    });

    let request = SwapRequest {
        wallet_address: args.wallet,
        src_chain_id: args.src_chain,
        dst_chain_id: args.dst_chain,
        src_token_address: args.src_token,
        dst_token_address: args.dst_token,
        amount,
        preset: args.preset,
    };

    let result = orchestrator
        .execute_swap_cancellable(request, shutdown_rx)
        .await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    // closing the event stream lets the collector drain before export
    drop(orchestrator);
    if let Some(task) = metrics_task {
        task.await?;
    }
    if args.print_metrics {
        println!("{}", collector.export_metrics()?);
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// A swap API that fills every secret and a chain where the wallet holds twice the amount
fn simulated_backends(
    args: &Args,
    config: &AppConfig,
    amount: U256,
) -> (Arc<SimulatedSwapApi>, Arc<SimulatedChain>) {
    let api = SimulatedSwapApi::new(args.secrets_count)
        .with_rate_limits(ops::GET_QUOTE, args.rate_limited_quotes)
        .with_latency(Duration::from_millis(20));

    let funds = amount.saturating_mul(U256::from(2u64));
    let chain = SimulatedChain::new()
        .with_chains(config.chains.values().map(|c| c.chain_id))
        .with_native_balance(args.src_chain, args.wallet, funds)
        .with_token_balance(args.src_chain, args.src_token, args.wallet, funds);

    (Arc::new(api), Arc::new(chain))
}
