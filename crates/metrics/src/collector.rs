use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use fusion_swap_types::{SwapEvent, SwapEventKind, SwapId, SwapState};
use prometheus::{Encoder, TextEncoder};
use tokio::sync::broadcast::{self, error::RecvError};
use ::tracing::{debug, warn};

use crate::metrics::*;

/// Turns the orchestrator's event stream into Prometheus metrics
pub struct MetricsCollector {
    /// Start time of every swap that has not finished yet
    started: Mutex<HashMap<SwapId, DateTime<Utc>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            started: Mutex::new(HashMap::new()),
        }
    }

    /// Swaps seen starting but not yet finished
    pub fn in_flight(&self) -> usize {
        self.started
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Consume events until every sender is gone
    pub async fn run(self: Arc<Self>, mut events: broadcast::Receiver<SwapEvent>) {
        loop {
            match events.recv().await {
                Ok(event) => self.record_event(&event),
                Err(RecvError::Lagged(skipped)) => {
                    EVENTS_LAGGED.inc_by(skipped);
                    warn!(skipped, "metrics collector lagging behind swap events");
                }
                Err(RecvError::Closed) => {
                    debug!("swap event stream closed");
                    break;
                }
            }
        }
    }

    pub fn record_event(&self, event: &SwapEvent) {
        match &event.kind {
            SwapEventKind::StateChanged { from, to } => {
                STATE_TRANSITIONS.with_label_values(&[state_label(*to)]).inc();
                if *from == SwapState::Idle {
                    self.record_swap_started(event.swap_id, event.at);
                }
            }
            SwapEventKind::QuoteReceived { secrets_count, .. } => {
                QUOTE_SECRETS.observe(f64::from(*secrets_count));
            }
            SwapEventKind::ApprovalSent { .. } => APPROVALS_SENT.inc(),
            SwapEventKind::OrderCreated { .. } => ORDERS_CREATED.inc(),
            SwapEventKind::PollIteration { .. } => POLL_ITERATIONS.inc(),
            SwapEventKind::SecretRevealed { .. } => SECRETS_REVEALED.inc(),
            SwapEventKind::SecretSubmissionFailed { .. } => SECRET_SUBMISSION_FAILURES.inc(),
            SwapEventKind::ProtocolViolation { .. } => PROTOCOL_VIOLATIONS.inc(),
            SwapEventKind::Finished { state, error, .. } => {
                SWAP_OUTCOMES.with_label_values(&[state_label(*state)]).inc();
                if let Some(kind) = error {
                    let kind = kind.to_string();
                    SWAP_FAILURES.with_label_values(&[kind.as_str()]).inc();
                }
                self.record_swap_finished(event.swap_id, event.at);
            }
        }
    }

    fn record_swap_started(&self, swap_id: SwapId, at: DateTime<Utc>) {
        SWAPS_STARTED.inc();
        ACTIVE_SWAPS.inc();
        self.started
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(swap_id, at);
    }

    fn record_swap_finished(&self, swap_id: SwapId, at: DateTime<Utc>) {
        let started = self
            .started
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&swap_id);

        // a swap that started before this collector subscribed was never counted as active
        if let Some(started) = started {
            ACTIVE_SWAPS.dec();
            let elapsed = (at - started).num_milliseconds().max(0) as f64 / 1000.0;
            SWAP_DURATION.observe(elapsed);
        }
    }

    /// Export all metrics in Prometheus text format
    pub fn export_metrics(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::EncodingError(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingError(e.to_string()))
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn state_label(state: SwapState) -> &'static str {
    match state {
        SwapState::Idle => "idle",
        SwapState::Quoting => "quoting",
        SwapState::Validating => "validating",
        SwapState::BuildingCommitment => "building_commitment",
        SwapState::CreatingOrder => "creating_order",
        SwapState::Submitting => "submitting",
        SwapState::Polling => "polling",
        SwapState::Executed => "executed",
        SwapState::Expired => "expired",
        SwapState::Refunded => "refunded",
        SwapState::Cancelled => "cancelled",
        SwapState::Failed => "failed",
        SwapState::Stuck => "stuck",
        SwapState::Aborted => "aborted",
    }
}

/// Metrics error types
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("encoding error: {0}")]
    EncodingError(String),
}
