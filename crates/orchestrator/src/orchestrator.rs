use std::sync::Arc;

use fusion_swap_client::{ops, ApiError, ChainClient, SwapApi};
use fusion_swap_ratelimit::{RequestError, RequestQueue};
use fusion_swap_types::{
    ChainId, HashLockBuilder, OrderHash, OrderParams, OrderStatus, Preset, PreparedOrder, Quote,
    SecretHash, SwapEvent, SwapEventKind, SwapId, SwapRequest, SwapResult, SwapState,
};
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::error::{BuilderError, SwapError};
use crate::reveal::{PollingConfig, SecretRevealer};
use crate::validator::{quote_params, PreflightConfig, PreflightValidator};

/// Configuration for the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub polling: PollingConfig,
    /// Preset requested when the swap request names none
    pub default_preset: Option<Preset>,
    /// Buffered events per subscriber before the slowest one starts lagging
    pub event_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            polling: PollingConfig::default(),
            default_preset: None,
            event_capacity: 256,
        }
    }
}

/// Per-attempt bookkeeping: current state, order identity and event fan-out
pub(crate) struct SwapRun {
    pub swap_id: SwapId,
    pub state: SwapState,
    pub order_hash: Option<OrderHash>,
    pub last_status: Option<OrderStatus>,
    events: broadcast::Sender<SwapEvent>,
}

impl SwapRun {
    fn new(events: broadcast::Sender<SwapEvent>) -> Self {
        Self {
            swap_id: SwapId::new(),
            state: SwapState::Idle,
            order_hash: None,
            last_status: None,
            events,
        }
    }

    pub fn transition(&mut self, to: SwapState) {
        let from = self.state;
        self.state = to;
        info!(swap_id = %self.swap_id, from = ?from, stage = ?to, "swap state changed");
        self.emit(SwapEventKind::StateChanged { from, to });
    }

    pub fn emit(&self, kind: SwapEventKind) {
        // Err only means nobody is subscribed
        let _ = self.events.send(SwapEvent::new(self.swap_id, kind));
    }
}

/// Builder for SwapOrchestrator
pub struct SwapOrchestratorBuilder {
    api: Option<Arc<dyn SwapApi>>,
    chain: Option<Arc<dyn ChainClient>>,
    queue: Option<RequestQueue>,
    preflight: PreflightConfig,
    config: OrchestratorConfig,
}

impl SwapOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            api: None,
            chain: None,
            queue: None,
            preflight: PreflightConfig::default(),
            config: OrchestratorConfig::default(),
        }
    }

    /// Set the swap API client
    pub fn with_api(mut self, api: Arc<dyn SwapApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Set the chain client used for balance and allowance checks
    pub fn with_chain(mut self, chain: Arc<dyn ChainClient>) -> Self {
        self.chain = Some(chain);
        self
    }

    /// Set the shared request queue
    pub fn with_queue(mut self, queue: RequestQueue) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn with_preflight(mut self, preflight: PreflightConfig) -> Self {
        self.preflight = preflight;
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<SwapOrchestrator, BuilderError> {
        let api = self.api.ok_or_else(|| BuilderError::MissingField {
            field: "api".to_string(),
        })?;

        let chain = self.chain.ok_or_else(|| BuilderError::MissingField {
            field: "chain".to_string(),
        })?;

        let queue = self.queue.ok_or_else(|| BuilderError::MissingField {
            field: "queue".to_string(),
        })?;

        Ok(SwapOrchestrator::new(
            api,
            chain,
            queue,
            self.preflight,
            self.config,
        ))
    }
}

impl Default for SwapOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives one swap from quote to terminal order status
pub struct SwapOrchestrator {
    api: Arc<dyn SwapApi>,
    queue: RequestQueue,
    validator: PreflightValidator,
    config: OrchestratorConfig,
    events: broadcast::Sender<SwapEvent>,
}

impl SwapOrchestrator {
    pub fn new(
        api: Arc<dyn SwapApi>,
        chain: Arc<dyn ChainClient>,
        queue: RequestQueue,
        preflight: PreflightConfig,
        config: OrchestratorConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let validator = PreflightValidator::new(chain, api.clone(), queue.clone(), preflight);
        Self {
            api,
            queue,
            validator,
            config,
            events,
        }
    }

    pub fn builder() -> SwapOrchestratorBuilder {
        SwapOrchestratorBuilder::new()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    /// Events for every swap this orchestrator runs from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SwapEvent> {
        self.events.subscribe()
    }

    /// Run a swap to completion. Always yields a structured result.
    pub async fn execute_swap(&self, request: SwapRequest) -> SwapResult {
        let (_keep_open, shutdown) = watch::channel(false);
        self.execute_swap_cancellable(request, shutdown).await
    }

    /// Like `execute_swap`, but polling stops once `shutdown` reads true.
    ///
    /// The flag is checked between poll iterations; an iteration in progress finishes first.
    ///
    /// A submitted order cannot be recalled; stopping only ends local polling and
    /// leaves the order to resolve upstream.
    pub async fn execute_swap_cancellable(
        &self,
        request: SwapRequest,
        mut shutdown: watch::Receiver<bool>,
    ) -> SwapResult {
        let mut run = SwapRun::new(self.events.clone());
        let started = Instant::now();
        info!(
            swap_id = %run.swap_id,
            wallet = %request.wallet_address,
            src_chain = %request.src_chain_id,
            dst_chain = %request.dst_chain_id,
            amount = %request.amount,
            "starting swap"
        );

        let result = match self.drive(&mut run, &request, &mut shutdown).await {
            Ok((order_hash, status)) => SwapResult::finished(order_hash, status),
            Err(err) => {
                let kind = err.kind();
                error!(swap_id = %run.swap_id, error = %err, kind = %kind, "swap failed");
                let result = SwapResult::failed(kind, err.to_string());
                match err.order_hash().or(run.order_hash) {
                    Some(order_hash) => result.with_order(order_hash, run.last_status),
                    None => result,
                }
            }
        };

        let state = result.state();
        run.transition(state);
        run.emit(SwapEventKind::Finished {
            state,
            success: result.success,
            error: result.error,
        });
        info!(
            swap_id = %run.swap_id,
            success = result.success,
            state = ?state,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "swap finished"
        );
        result
    }

    async fn drive(
        &self,
        run: &mut SwapRun,
        request: &SwapRequest,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(OrderHash, OrderStatus), SwapError> {
        run.transition(SwapState::Quoting);
        let quote = self.request_quote(request).await.map_err(SwapError::Quote)?;
        info!(
            swap_id = %run.swap_id,
            secrets_count = quote.secrets_count,
            dst_amount = %quote.dst_token_amount,
            "quote received"
        );
        run.emit(SwapEventKind::QuoteReceived {
            secrets_count: quote.secrets_count,
            dst_amount: quote.dst_token_amount,
        });

        run.transition(SwapState::Validating);
        let report = self.validator.validate(request).await?;
        if let Some(tx_hash) = report.approval_tx {
            run.emit(SwapEventKind::ApprovalSent { tx_hash });
        }

        run.transition(SwapState::BuildingCommitment);
        let commitment = HashLockBuilder::build(quote.secrets_count)?;

        run.transition(SwapState::CreatingOrder);
        let preset = quote.select_preset(request.preset.or(self.config.default_preset));
        let params = OrderParams {
            wallet_address: request.wallet_address,
            hash_lock: commitment.hash_lock,
            preset,
            secret_hashes: commitment.secret_hashes.clone(),
        };
        let order = self
            .create_order(quote, params)
            .await
            .map_err(SwapError::CreateOrder)?;
        run.order_hash = Some(order.order_hash);
        info!(swap_id = %run.swap_id, order_hash = %order.order_hash, preset = %preset, "order created");
        run.emit(SwapEventKind::OrderCreated {
            order_hash: order.order_hash,
        });

        run.transition(SwapState::Submitting);
        self.submit_order(request.src_chain_id, &order, &commitment.secret_hashes)
            .await
            .map_err(SwapError::SubmitOrder)?;

        run.transition(SwapState::Polling);
        let revealer = SecretRevealer {
            api: &self.api,
            queue: &self.queue,
            config: &self.config.polling,
        };
        let status = revealer
            .run(run, order.order_hash, &commitment, shutdown)
            .await?;

        if !status.is_success() {
            warn!(swap_id = %run.swap_id, order_hash = %order.order_hash, status = %status, "order not executed");
        }
        Ok((order.order_hash, status))
    }

    async fn request_quote(&self, request: &SwapRequest) -> Result<Quote, RequestError<ApiError>> {
        let api = self.api.clone();
        let params = quote_params(request, true);
        self.queue
            .enqueue(ops::GET_QUOTE, move || {
                let api = api.clone();
                let params = params.clone();
                async move { api.get_quote(&params).await }
            })
            .await
    }

    async fn create_order(
        &self,
        quote: Quote,
        params: OrderParams,
    ) -> Result<PreparedOrder, RequestError<ApiError>> {
        let api = self.api.clone();
        self.queue
            .enqueue(ops::CREATE_ORDER, move || {
                let api = api.clone();
                let quote = quote.clone();
                let params = params.clone();
                async move { api.create_order(&quote, &params).await }
            })
            .await
    }

    async fn submit_order(
        &self,
        src_chain_id: ChainId,
        order: &PreparedOrder,
        secret_hashes: &[SecretHash],
    ) -> Result<(), RequestError<ApiError>> {
        let api = self.api.clone();
        let payload = order.order.clone();
        let quote_id = order.quote_id.clone();
        let secret_hashes = secret_hashes.to_vec();
        self.queue
            .enqueue(ops::SUBMIT_ORDER, move || {
                let api = api.clone();
                let payload = payload.clone();
                let quote_id = quote_id.clone();
                let secret_hashes = secret_hashes.clone();
                async move {
                    api.submit_order(src_chain_id, &payload, &quote_id, &secret_hashes)
                        .await
                }
            })
            .await
    }
}
