use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;

use alloy_primitives::{keccak256, Address, B256, U256};
use async_trait::async_trait;
use fusion_swap_types::{
    ChainId, HashLock, OrderHash, OrderParams, OrderStatus, Preset, PreparedOrder, Quote,
    QuoteParams, ReadyFills, Secret, SecretHash,
};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;

use crate::api::{ops, ApiError, SwapApi};
use crate::chain::{ChainClient, ChainError};

fn bad_request(body: impl Into<String>) -> ApiError {
    ApiError::Status {
        status: 400,
        body: body.into(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SWAP API
// ═══════════════════════════════════════════════════════════════════════════

/// A secret the simulated API accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealedSecret {
    pub order_hash: OrderHash,
    pub idx: u32,
}

#[derive(Debug)]
struct SimOrder {
    src_chain_id: ChainId,
    secret_hashes: Vec<SecretHash>,
    submitted: bool,
    revealed: BTreeSet<u32>,
    ready_polls: usize,
    status_polls: usize,
}

#[derive(Debug, Default)]
struct ApiState {
    calls: HashMap<&'static str, u32>,
    /// quote id -> already used for an order
    quotes: HashMap<String, bool>,
    quote_seq: u64,
    orders: HashMap<OrderHash, SimOrder>,
    orders_by_quote: HashMap<String, OrderHash>,
    revealed: Vec<RevealedSecret>,
}

/// In-memory swap API with scriptable fills, statuses and failures.
///
/// Without a fill schedule one new fill becomes ready per poll, in index order.
/// Without a status schedule the order reports `Executed` once every secret has
/// been revealed and `Pending` before that.
pub struct SimulatedSwapApi {
    secrets_count: u32,
    rate_bps: u32,
    max_liquidity: Option<U256>,
    fill_schedule: Option<Vec<Vec<u32>>>,
    status_schedule: Option<Vec<OrderStatus>>,
    rate_limited: HashMap<&'static str, u32>,
    failing: HashMap<&'static str, ApiError>,
    latency: Duration,
    state: Mutex<ApiState>,
}

impl SimulatedSwapApi {
    pub fn new(secrets_count: u32) -> Self {
        Self {
            secrets_count,
            rate_bps: 9_970,
            max_liquidity: None,
            fill_schedule: None,
            status_schedule: None,
            rate_limited: HashMap::new(),
            failing: HashMap::new(),
            latency: Duration::ZERO,
            state: Mutex::new(ApiState::default()),
        }
    }

    /// Destination amount as a fraction of the source amount, in basis points
    pub fn with_rate_bps(mut self, rate_bps: u32) -> Self {
        self.rate_bps = rate_bps;
        self
    }

    /// Quotes above `max` fail with `InsufficientLiquidity`
    pub fn with_max_liquidity(mut self, max: U256) -> Self {
        self.max_liquidity = Some(max);
        self
    }

    /// Indices returned by the n-th ready-fills poll; later polls return none
    pub fn with_fill_schedule(mut self, schedule: Vec<Vec<u32>>) -> Self {
        self.fill_schedule = Some(schedule);
        self
    }

    /// Status returned by the n-th status poll; the last entry repeats
    pub fn with_status_schedule(mut self, schedule: Vec<OrderStatus>) -> Self {
        self.status_schedule = Some(schedule);
        self
    }

    /// First `times` calls of `operation` answer with a rate limit
    pub fn with_rate_limits(mut self, operation: &'static str, times: u32) -> Self {
        self.rate_limited.insert(operation, times);
        self
    }

    /// Every call of `operation` fails with `error`
    pub fn with_failure(mut self, operation: &'static str, error: ApiError) -> Self {
        self.failing.insert(operation, error);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Calls made to `operation`, including rate-limited and failed ones
    pub async fn call_count(&self, operation: &str) -> u32 {
        self.state
            .lock()
            .await
            .calls
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    /// Accepted secrets in the order they arrived
    pub async fn revealed(&self) -> Vec<RevealedSecret> {
        self.state.lock().await.revealed.clone()
    }

    pub async fn is_submitted(&self, order_hash: OrderHash) -> bool {
        self.state
            .lock()
            .await
            .orders
            .get(&order_hash)
            .map(|o| o.submitted)
            .unwrap_or(false)
    }

    async fn begin(&self, operation: &'static str) -> Result<(), ApiError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut state = self.state.lock().await;
        let count = state.calls.entry(operation).or_insert(0);
        *count += 1;

        if *count <= self.rate_limited.get(operation).copied().unwrap_or(0) {
            debug!(operation, call = *count, "simulated rate limit");
            return Err(ApiError::RateLimited);
        }
        if let Some(err) = self.failing.get(operation) {
            return Err(err.clone());
        }
        Ok(())
    }

    fn expected_hash_lock(secret_hashes: &[SecretHash]) -> Result<HashLock, ApiError> {
        match secret_hashes {
            [single] => Ok(HashLock::SingleFill(*single)),
            hashes => HashLock::for_multiple_fills(hashes).map_err(|e| bad_request(e.to_string())),
        }
    }
}

impl Default for SimulatedSwapApi {
    fn default() -> Self {
        Self::new(1)
    }
}

#[async_trait]
impl SwapApi for SimulatedSwapApi {
    async fn get_quote(&self, params: &QuoteParams) -> Result<Quote, ApiError> {
        self.begin(ops::GET_QUOTE).await?;

        if params.amount.is_zero() {
            return Err(bad_request("amount must be positive"));
        }
        if let Some(max) = self.max_liquidity {
            if params.amount > max {
                return Err(ApiError::InsufficientLiquidity(format!(
                    "no route for {} units of {}",
                    params.amount, params.src_token_address
                )));
            }
        }

        let mut state = self.state.lock().await;
        state.quote_seq += 1;
        let quote_id = format!("sim-quote-{}", state.quote_seq);
        state.quotes.insert(quote_id.clone(), false);

        let dst_amount =
            params.amount.saturating_mul(U256::from(self.rate_bps)) / U256::from(10_000u64);

        Ok(Quote {
            quote_id: Some(quote_id),
            src_chain_id: params.src_chain_id,
            dst_chain_id: params.dst_chain_id,
            src_token_address: params.src_token_address,
            dst_token_address: params.dst_token_address,
            src_token_amount: params.amount,
            dst_token_amount: dst_amount,
            secrets_count: self.secrets_count,
            recommended_preset: Preset::Fast,
            presets: vec![Preset::Fast, Preset::Medium, Preset::Slow],
        })
    }

    async fn create_order(
        &self,
        quote: &Quote,
        params: &OrderParams,
    ) -> Result<PreparedOrder, ApiError> {
        self.begin(ops::CREATE_ORDER).await?;

        let quote_id = quote
            .quote_id
            .clone()
            .ok_or_else(|| bad_request("quote has no id"))?;
        if params.secret_hashes.len() != quote.secrets_count as usize {
            return Err(bad_request(format!(
                "expected {} secret hashes, got {}",
                quote.secrets_count,
                params.secret_hashes.len()
            )));
        }
        if Self::expected_hash_lock(&params.secret_hashes)? != params.hash_lock {
            return Err(bad_request("hash lock does not match secret hashes"));
        }

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        match state.quotes.get_mut(&quote_id) {
            None => return Err(bad_request(format!("unknown quote {quote_id}"))),
            Some(true) => return Err(bad_request(format!("quote {quote_id} already used"))),
            Some(used) => *used = true,
        }

        let order_hash = keccak256(format!("{quote_id}:{}", params.wallet_address));
        state.orders.insert(
            order_hash,
            SimOrder {
                src_chain_id: quote.src_chain_id,
                secret_hashes: params.secret_hashes.clone(),
                submitted: false,
                revealed: BTreeSet::new(),
                ready_polls: 0,
                status_polls: 0,
            },
        );
        state.orders_by_quote.insert(quote_id.clone(), order_hash);

        Ok(PreparedOrder {
            order_hash,
            order: json!({
                "orderHash": order_hash,
                "maker": params.wallet_address,
                "hashLock": params.hash_lock.value(),
                "srcChainId": quote.src_chain_id,
                "dstChainId": quote.dst_chain_id,
                "makingAmount": quote.src_token_amount.to_string(),
                "takingAmount": quote.dst_token_amount.to_string(),
                "preset": params.preset,
            }),
            quote_id,
        })
    }

    async fn submit_order(
        &self,
        src_chain_id: ChainId,
        order: &serde_json::Value,
        quote_id: &str,
        secret_hashes: &[SecretHash],
    ) -> Result<(), ApiError> {
        self.begin(ops::SUBMIT_ORDER).await?;

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let order_hash = *state
            .orders_by_quote
            .get(quote_id)
            .ok_or_else(|| bad_request(format!("no order created for quote {quote_id}")))?;
        let sim = state
            .orders
            .get_mut(&order_hash)
            .ok_or(ApiError::OrderNotFound(order_hash))?;

        if order.get("orderHash") != Some(&json!(order_hash)) {
            return Err(bad_request("order payload does not match quote"));
        }
        if sim.src_chain_id != src_chain_id {
            return Err(bad_request(format!(
                "order belongs to chain {}, submitted on {src_chain_id}",
                sim.src_chain_id
            )));
        }
        if sim.secret_hashes != secret_hashes {
            return Err(bad_request("secret hashes do not match the order"));
        }
        if sim.submitted {
            return Err(ApiError::Status {
                status: 409,
                body: "order already submitted".to_string(),
            });
        }

        sim.submitted = true;
        debug!(order_hash = %order_hash, "simulated order submitted");
        Ok(())
    }

    async fn ready_to_accept_secret_fills(
        &self,
        order_hash: OrderHash,
    ) -> Result<ReadyFills, ApiError> {
        self.begin(ops::READY_FILLS).await?;

        let mut state = self.state.lock().await;
        let order = state
            .orders
            .get_mut(&order_hash)
            .ok_or(ApiError::OrderNotFound(order_hash))?;
        if !order.submitted {
            return Ok(ReadyFills::default());
        }

        let poll = order.ready_polls;
        order.ready_polls += 1;

        let indices = match &self.fill_schedule {
            Some(schedule) => schedule.get(poll).cloned().unwrap_or_default(),
            None => (0..order.secret_hashes.len() as u32)
                .find(|idx| !order.revealed.contains(idx))
                .into_iter()
                .collect(),
        };
        Ok(ReadyFills::from_indices(indices))
    }

    async fn submit_secret(&self, order_hash: OrderHash, secret: &Secret) -> Result<(), ApiError> {
        self.begin(ops::SUBMIT_SECRET).await?;

        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let order = state
            .orders
            .get_mut(&order_hash)
            .ok_or(ApiError::OrderNotFound(order_hash))?;

        let hash = secret.hash();
        let idx = order
            .secret_hashes
            .iter()
            .position(|h| *h == hash)
            .ok_or_else(|| bad_request("secret does not match any committed hash"))?
            as u32;

        order.revealed.insert(idx);
        state.revealed.push(RevealedSecret { order_hash, idx });
        debug!(order_hash = %order_hash, idx, "simulated secret accepted");
        Ok(())
    }

    async fn order_status(&self, order_hash: OrderHash) -> Result<OrderStatus, ApiError> {
        self.begin(ops::ORDER_STATUS).await?;

        let mut state = self.state.lock().await;
        let order = state
            .orders
            .get_mut(&order_hash)
            .ok_or(ApiError::OrderNotFound(order_hash))?;

        let poll = order.status_polls;
        order.status_polls += 1;

        let status = match &self.status_schedule {
            Some(schedule) => schedule
                .get(poll)
                .or(schedule.last())
                .copied()
                .unwrap_or(OrderStatus::Pending),
            None if order.submitted && order.revealed.len() == order.secret_hashes.len() => {
                OrderStatus::Executed
            }
            None => OrderStatus::Pending,
        };
        Ok(status)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// CHAIN
// ═══════════════════════════════════════════════════════════════════════════

/// An approval sent through the simulated chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Approval {
    pub chain_id: ChainId,
    pub token: Address,
    pub owner: Address,
    pub spender: Address,
    pub amount: U256,
    pub tx_hash: B256,
}

#[derive(Debug, Default)]
struct ChainState {
    native: HashMap<(ChainId, Address), U256>,
    tokens: HashMap<(ChainId, Address, Address), U256>,
    allowances: HashMap<(ChainId, Address, Address, Address), U256>,
    approvals: Vec<Approval>,
    reads: Vec<&'static str>,
}

/// In-memory balances and allowances across any number of chains.
/// Unset balances and allowances read as zero.
#[derive(Debug, Default)]
pub struct SimulatedChain {
    supported: HashSet<ChainId>,
    reject_approvals: bool,
    failing_reads: bool,
    state: Mutex<ChainState>,
}

impl SimulatedChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the listed chains; others fail with `UnsupportedChain`
    pub fn with_chains(mut self, chains: impl IntoIterator<Item = ChainId>) -> Self {
        self.supported = chains.into_iter().collect();
        self
    }

    pub fn with_native_balance(mut self, chain_id: ChainId, owner: Address, amount: U256) -> Self {
        self.state.get_mut().native.insert((chain_id, owner), amount);
        self
    }

    pub fn with_token_balance(
        mut self,
        chain_id: ChainId,
        token: Address,
        owner: Address,
        amount: U256,
    ) -> Self {
        self.state
            .get_mut()
            .tokens
            .insert((chain_id, token, owner), amount);
        self
    }

    pub fn with_allowance(
        mut self,
        chain_id: ChainId,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Self {
        self.state
            .get_mut()
            .allowances
            .insert((chain_id, token, owner, spender), amount);
        self
    }

    pub fn rejecting_approvals(mut self) -> Self {
        self.reject_approvals = true;
        self
    }

    pub fn failing_reads(mut self) -> Self {
        self.failing_reads = true;
        self
    }

    pub async fn approvals(&self) -> Vec<Approval> {
        self.state.lock().await.approvals.clone()
    }

    /// Read calls in the order they were made ("native_balance", "token_balance", "allowance")
    pub async fn reads(&self) -> Vec<&'static str> {
        self.state.lock().await.reads.clone()
    }

    fn check_chain(&self, chain_id: ChainId) -> Result<(), ChainError> {
        if !self.supported.is_empty() && !self.supported.contains(&chain_id) {
            return Err(ChainError::UnsupportedChain(chain_id));
        }
        Ok(())
    }

    async fn record_read(&self, chain_id: ChainId, kind: &'static str) -> Result<(), ChainError> {
        self.check_chain(chain_id)?;
        self.state.lock().await.reads.push(kind);
        if self.failing_reads {
            return Err(ChainError::Rpc(format!("{kind} unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for SimulatedChain {
    async fn native_balance(&self, chain_id: ChainId, owner: Address) -> Result<U256, ChainError> {
        self.record_read(chain_id, "native_balance").await?;
        let state = self.state.lock().await;
        Ok(state
            .native
            .get(&(chain_id, owner))
            .copied()
            .unwrap_or_default())
    }

    async fn token_balance(
        &self,
        chain_id: ChainId,
        token: Address,
        owner: Address,
    ) -> Result<U256, ChainError> {
        self.record_read(chain_id, "token_balance").await?;
        let state = self.state.lock().await;
        Ok(state
            .tokens
            .get(&(chain_id, token, owner))
            .copied()
            .unwrap_or_default())
    }

    async fn allowance(
        &self,
        chain_id: ChainId,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        self.record_read(chain_id, "allowance").await?;
        let state = self.state.lock().await;
        Ok(state
            .allowances
            .get(&(chain_id, token, owner, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn approve(
        &self,
        chain_id: ChainId,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<B256, ChainError> {
        self.check_chain(chain_id)?;
        if self.reject_approvals {
            return Err(ChainError::TransactionFailed("approve reverted".to_string()));
        }

        let mut state = self.state.lock().await;
        let tx_hash = keccak256(format!(
            "approve:{chain_id}:{token}:{owner}:{spender}:{amount}:{}",
            state.approvals.len()
        ));
        state
            .allowances
            .insert((chain_id, token, owner, spender), amount);
        state.approvals.push(Approval {
            chain_id,
            token,
            owner,
            spender,
            amount,
            tx_hash,
        });
        Ok(tx_hash)
    }
}
