use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use fusion_swap_client::{ops, ApiError, SwapApi};
use fusion_swap_ratelimit::{RequestError, RequestQueue};
use fusion_swap_types::{Commitment, OrderHash, OrderStatus, ReadyFills, Secret, SwapEventKind};
use tokio::sync::watch;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::error::SwapError;
use crate::orchestrator::SwapRun;

/// Limits on the secret-reveal loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingConfig {
    pub interval: Duration,
    /// Iterations before the swap is reported stuck
    pub max_iterations: u32,
    /// Wall-clock budget before the swap is reported stuck
    pub timeout: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_iterations: 360,
            timeout: Duration::from_secs(3600),
        }
    }
}

/// Resolves once `shutdown` reads true. A dropped sender never cancels.
pub(crate) async fn cancelled(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Polls ready fills and order status, handing out each secret once its fill is ready
pub(crate) struct SecretRevealer<'a> {
    pub api: &'a Arc<dyn SwapApi>,
    pub queue: &'a RequestQueue,
    pub config: &'a PollingConfig,
}

impl SecretRevealer<'_> {
    pub async fn run(
        &self,
        progress: &mut SwapRun,
        order_hash: OrderHash,
        commitment: &Commitment,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<OrderStatus, SwapError> {
        let started = Instant::now();
        let mut revealed: HashSet<u32> = HashSet::new();
        let mut iteration: u32 = 0;

        loop {
            if *shutdown.borrow() {
                warn!(order_hash = %order_hash, iteration, "polling aborted");
                return Err(SwapError::Aborted { order_hash });
            }
            iteration += 1;

            // not interrupted by shutdown; every queued secret submission gets its event
            let status = self
                .poll_once(progress, order_hash, commitment, &mut revealed, iteration)
                .await?;

            if let Some(status) = status {
                progress.last_status = Some(status);
                if status.is_terminal() {
                    info!(
                        order_hash = %order_hash,
                        status = %status,
                        iteration,
                        revealed = revealed.len(),
                        "order reached terminal status"
                    );
                    return Ok(status);
                }
            }

            let elapsed = started.elapsed();
            if iteration >= self.config.max_iterations || elapsed >= self.config.timeout {
                warn!(
                    order_hash = %order_hash,
                    iteration,
                    elapsed_secs = elapsed.as_secs(),
                    "order still not terminal, giving up"
                );
                return Err(SwapError::Stuck {
                    order_hash,
                    iterations: iteration,
                    elapsed,
                });
            }

            tokio::select! {
                _ = sleep(self.config.interval) => {}
                _ = cancelled(shutdown) => {
                    warn!(order_hash = %order_hash, iteration, "polling aborted");
                    return Err(SwapError::Aborted { order_hash });
                }
            }
        }
    }

    async fn poll_once(
        &self,
        progress: &mut SwapRun,
        order_hash: OrderHash,
        commitment: &Commitment,
        revealed: &mut HashSet<u32>,
        iteration: u32,
    ) -> Result<Option<OrderStatus>, SwapError> {
        let fills = match self.ready_fills(order_hash).await {
            Ok(fills) => fills,
            Err(err) => {
                recoverable(order_hash, err)?;
                ReadyFills::default()
            }
        };

        for idx in fills.indices() {
            if revealed.contains(&idx) {
                debug!(order_hash = %order_hash, idx, "secret already revealed");
                continue;
            }

            let Some(secret) = commitment.secret(idx) else {
                warn!(
                    order_hash = %order_hash,
                    idx,
                    secrets = commitment.len(),
                    "ready fill index outside committed secrets, skipping"
                );
                progress.emit(SwapEventKind::ProtocolViolation {
                    idx,
                    secrets_count: commitment.len() as u32,
                });
                continue;
            };

            match self.submit_secret(order_hash, secret.clone()).await {
                Ok(()) => {
                    revealed.insert(idx);
                    info!(order_hash = %order_hash, idx, "secret revealed");
                    progress.emit(SwapEventKind::SecretRevealed { idx });
                }
                Err(err) => {
                    warn!(order_hash = %order_hash, idx, error = %err, "secret submission failed");
                    progress.emit(SwapEventKind::SecretSubmissionFailed {
                        idx,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let status = match self.order_status(order_hash).await {
            Ok(status) => Some(status),
            Err(err) => {
                recoverable(order_hash, err)?;
                None
            }
        };

        debug!(
            order_hash = %order_hash,
            iteration,
            ready_fills = fills.fills.len(),
            status = ?status,
            "poll iteration complete"
        );
        progress.emit(SwapEventKind::PollIteration {
            iteration,
            ready_fills: fills.fills.len(),
            status,
        });
        Ok(status)
    }

    async fn ready_fills(&self, order_hash: OrderHash) -> Result<ReadyFills, RequestError<ApiError>> {
        let api = self.api.clone();
        self.queue
            .enqueue(ops::READY_FILLS, move || {
                let api = api.clone();
                async move { api.ready_to_accept_secret_fills(order_hash).await }
            })
            .await
    }

    async fn submit_secret(
        &self,
        order_hash: OrderHash,
        secret: Secret,
    ) -> Result<(), RequestError<ApiError>> {
        let api = self.api.clone();
        self.queue
            .enqueue(ops::SUBMIT_SECRET, move || {
                let api = api.clone();
                let secret = secret.clone();
                async move { api.submit_secret(order_hash, &secret).await }
            })
            .await
    }

    async fn order_status(&self, order_hash: OrderHash) -> Result<OrderStatus, RequestError<ApiError>> {
        let api = self.api.clone();
        self.queue
            .enqueue(ops::ORDER_STATUS, move || {
                let api = api.clone();
                async move { api.order_status(order_hash).await }
            })
            .await
    }
}

/// Logs a failed poll call, or turns it into a swap error when retrying is pointless
fn recoverable(order_hash: OrderHash, err: RequestError<ApiError>) -> Result<(), SwapError> {
    let fatal = match &err {
        RequestError::QueueClosed { .. } => true,
        other => other.inner().map(ApiError::is_order_fatal).unwrap_or(false),
    };
    if fatal {
        return Err(SwapError::Polling {
            order_hash,
            source: err,
        });
    }

    warn!(order_hash = %order_hash, error = %err, "poll call failed, retrying next interval");
    Ok(())
}
