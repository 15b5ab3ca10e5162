use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256, U512};
use fusion_swap_client::{ops, ApiError, ChainClient, ChainError, SwapApi};
use fusion_swap_ratelimit::{RequestError, RequestQueue};
use fusion_swap_types::{is_native, ChainId, FailureKind, QuoteParams, SwapRequest};
use thiserror::Error;
use tracing::{debug, info, warn};

const BPS_DENOMINATOR: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightConfig {
    /// Allowance required relative to the swap amount, in basis points (12000 = 1.2x)
    pub allowance_buffer_bps: u32,
    /// Send an approval when the allowance falls short instead of failing
    pub auto_approve: bool,
    /// Router the allowance must be granted to, per source chain
    pub routers: HashMap<ChainId, Address>,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            allowance_buffer_bps: 12_000,
            auto_approve: false,
            routers: HashMap::new(),
        }
    }
}

impl PreflightConfig {
    pub fn with_router(mut self, chain_id: ChainId, router: Address) -> Self {
        self.routers.insert(chain_id, router);
        self
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: U256, available: U256 },

    #[error("insufficient allowance for {spender}: required {required}, granted {granted}")]
    InsufficientAllowance {
        spender: Address,
        required: U256,
        granted: U256,
    },

    #[error("insufficient liquidity: {reason}")]
    InsufficientLiquidity { reason: String },

    #[error("no router configured for chain {0}")]
    UnsupportedChain(ChainId),

    #[error("approval transaction failed: {0}")]
    ApprovalFailed(ChainError),

    #[error("chain query failed: {0}")]
    Chain(#[from] ChainError),

    /// Trial quote failed for a reason other than liquidity
    #[error("trial quote failed: {0}")]
    Quote(RequestError<ApiError>),
}

impl ValidationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ValidationError::InsufficientBalance { .. } => FailureKind::InsufficientBalance,
            ValidationError::InsufficientAllowance { .. } | ValidationError::ApprovalFailed(_) => {
                FailureKind::InsufficientAllowance
            }
            ValidationError::InsufficientLiquidity { .. } => FailureKind::InsufficientLiquidity,
            ValidationError::UnsupportedChain(_) | ValidationError::Chain(_) => {
                FailureKind::PreflightFailed
            }
            ValidationError::Quote(err) if err.is_max_retries() => FailureKind::MaxRetriesExceeded,
            ValidationError::Quote(_) => FailureKind::ApiError,
        }
    }
}

/// What the checks observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightReport {
    pub balance: U256,
    /// `None` for native assets
    pub allowance: Option<U256>,
    pub approval_tx: Option<B256>,
}

/// `amount * buffer_bps / 10000`, rounded down, computed without overflow
pub fn required_allowance(amount: U256, buffer_bps: u32) -> U256 {
    let wide = U512::from(amount) * U512::from(buffer_bps) / U512::from(BPS_DENOMINATOR);
    U256::saturating_from(wide)
}

/// Balance, allowance and liquidity checks run before any order exists.
///
/// Checks run in that order and the first failure ends validation.
pub struct PreflightValidator {
    chain: Arc<dyn ChainClient>,
    api: Arc<dyn SwapApi>,
    queue: RequestQueue,
    config: PreflightConfig,
}

impl PreflightValidator {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        api: Arc<dyn SwapApi>,
        queue: RequestQueue,
        config: PreflightConfig,
    ) -> Self {
        Self {
            chain,
            api,
            queue,
            config,
        }
    }

    pub fn config(&self) -> &PreflightConfig {
        &self.config
    }

    pub async fn validate(&self, request: &SwapRequest) -> Result<PreflightReport, ValidationError> {
        let balance = self.check_balance(request).await?;
        let (allowance, approval_tx) = self.check_allowance(request).await?;
        self.check_liquidity(request).await?;

        Ok(PreflightReport {
            balance,
            allowance,
            approval_tx,
        })
    }

    pub async fn check_balance(&self, request: &SwapRequest) -> Result<U256, ValidationError> {
        let available = if is_native(&request.src_token_address) {
            self.chain
                .native_balance(request.src_chain_id, request.wallet_address)
                .await?
        } else {
            self.chain
                .token_balance(
                    request.src_chain_id,
                    request.src_token_address,
                    request.wallet_address,
                )
                .await?
        };

        if available < request.amount {
            warn!(
                wallet = %request.wallet_address,
                required = %request.amount,
                available = %available,
                "balance check failed"
            );
            return Err(ValidationError::InsufficientBalance {
                required: request.amount,
                available,
            });
        }

        debug!(available = %available, "balance check passed");
        Ok(available)
    }

    /// Native assets have no allowance and always pass
    pub async fn check_allowance(
        &self,
        request: &SwapRequest,
    ) -> Result<(Option<U256>, Option<B256>), ValidationError> {
        if is_native(&request.src_token_address) {
            debug!("native source asset, allowance check skipped");
            return Ok((None, None));
        }

        let spender = *self
            .config
            .routers
            .get(&request.src_chain_id)
            .ok_or(ValidationError::UnsupportedChain(request.src_chain_id))?;
        let required = required_allowance(request.amount, self.config.allowance_buffer_bps);

        let granted = self.read_allowance(request, spender).await?;
        if granted >= required {
            debug!(granted = %granted, required = %required, "allowance check passed");
            return Ok((Some(granted), None));
        }

        if !self.config.auto_approve {
            warn!(
                spender = %spender,
                granted = %granted,
                required = %required,
                "allowance check failed"
            );
            return Err(ValidationError::InsufficientAllowance {
                spender,
                required,
                granted,
            });
        }

        let tx_hash = self
            .chain
            .approve(
                request.src_chain_id,
                request.src_token_address,
                request.wallet_address,
                spender,
                required,
            )
            .await
            .map_err(ValidationError::ApprovalFailed)?;
        info!(tx_hash = %tx_hash, spender = %spender, amount = %required, "approval sent");

        let granted = self.read_allowance(request, spender).await?;
        if granted < required {
            warn!(granted = %granted, required = %required, "allowance still short after approval");
            return Err(ValidationError::InsufficientAllowance {
                spender,
                required,
                granted,
            });
        }
        Ok((Some(granted), Some(tx_hash)))
    }

    /// A trial quote for the exact swap must succeed
    pub async fn check_liquidity(&self, request: &SwapRequest) -> Result<(), ValidationError> {
        let params = quote_params(request, false);
        let api = self.api.clone();

        self.queue
            .enqueue(ops::GET_QUOTE, move || {
                let api = api.clone();
                let params = params.clone();
                async move { api.get_quote(&params).await }
            })
            .await
            .map(|quote| {
                debug!(dst_amount = %quote.dst_token_amount, "liquidity check passed");
            })
            .map_err(|e| {
                warn!(error = %e, "liquidity check failed");
                match e.inner() {
                    Some(ApiError::InsufficientLiquidity(reason)) => {
                        ValidationError::InsufficientLiquidity {
                            reason: reason.clone(),
                        }
                    }
                    _ => ValidationError::Quote(e),
                }
            })
    }

    async fn read_allowance(
        &self,
        request: &SwapRequest,
        spender: Address,
    ) -> Result<U256, ValidationError> {
        Ok(self
            .chain
            .allowance(
                request.src_chain_id,
                request.src_token_address,
                request.wallet_address,
                spender,
            )
            .await?)
    }
}

pub(crate) fn quote_params(request: &SwapRequest, enable_estimate: bool) -> QuoteParams {
    QuoteParams {
        src_chain_id: request.src_chain_id,
        dst_chain_id: request.dst_chain_id,
        src_token_address: request.src_token_address,
        dst_token_address: request.dst_token_address,
        amount: request.amount,
        wallet_address: request.wallet_address,
        enable_estimate,
    }
}
