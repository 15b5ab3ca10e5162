use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

lazy_static! {
    // ═══════════════════════════════════════════════════════════════════════════
    // SWAP METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Total number of swaps started
    pub static ref SWAPS_STARTED: IntCounter = register_int_counter!(
        "fusion_swap_swaps_started_total",
        "Total number of swaps started"
    )
    .expect("register fusion_swap_swaps_started_total");

    /// Swaps by final state
    pub static ref SWAP_OUTCOMES: IntCounterVec = register_int_counter_vec!(
        "fusion_swap_swap_outcomes_total",
        "Total finished swaps by final state",
        &["state"]
    )
    .expect("register fusion_swap_swap_outcomes_total");

    /// Unsuccessful swaps by failure kind
    pub static ref SWAP_FAILURES: IntCounterVec = register_int_counter_vec!(
        "fusion_swap_swap_failures_total",
        "Total unsuccessful swaps by failure kind",
        &["kind"]
    )
    .expect("register fusion_swap_swap_failures_total");

    /// State transitions by target state
    pub static ref STATE_TRANSITIONS: IntCounterVec = register_int_counter_vec!(
        "fusion_swap_state_transitions_total",
        "Total swap state transitions by target state",
        &["to"]
    )
    .expect("register fusion_swap_state_transitions_total");

    /// Swaps started but not yet finished
    pub static ref ACTIVE_SWAPS: IntGauge = register_int_gauge!(
        "fusion_swap_swaps_active",
        "Current number of swaps in progress"
    )
    .expect("register fusion_swap_swaps_active");

    /// Wall-clock swap duration (in seconds)
    pub static ref SWAP_DURATION: Histogram = register_histogram!(
        "fusion_swap_swap_duration_secs",
        "Swap duration from quote request to final state in seconds",
        vec![1.0, 10.0, 30.0, 60.0, 300.0, 900.0, 1800.0, 3600.0]
    )
    .expect("register fusion_swap_swap_duration_secs");

    // ═══════════════════════════════════════════════════════════════════════════
    // QUOTE / ORDER METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Secrets per quoted order
    pub static ref QUOTE_SECRETS: Histogram = register_histogram!(
        "fusion_swap_quote_secrets",
        "Number of secrets required per quote",
        vec![1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0]
    )
    .expect("register fusion_swap_quote_secrets");

    /// Total number of orders created
    pub static ref ORDERS_CREATED: IntCounter = register_int_counter!(
        "fusion_swap_orders_created_total",
        "Total number of orders created"
    )
    .expect("register fusion_swap_orders_created_total");

    /// Total number of token approvals sent during pre-flight
    pub static ref APPROVALS_SENT: IntCounter = register_int_counter!(
        "fusion_swap_approvals_sent_total",
        "Total number of token approvals sent"
    )
    .expect("register fusion_swap_approvals_sent_total");

    // ═══════════════════════════════════════════════════════════════════════════
    // SECRET REVEAL METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Total number of poll iterations
    pub static ref POLL_ITERATIONS: IntCounter = register_int_counter!(
        "fusion_swap_poll_iterations_total",
        "Total number of order polling iterations"
    )
    .expect("register fusion_swap_poll_iterations_total");

    /// Total number of secrets accepted by the API
    pub static ref SECRETS_REVEALED: IntCounter = register_int_counter!(
        "fusion_swap_secrets_revealed_total",
        "Total number of secrets revealed"
    )
    .expect("register fusion_swap_secrets_revealed_total");

    /// Total number of failed secret submissions
    pub static ref SECRET_SUBMISSION_FAILURES: IntCounter = register_int_counter!(
        "fusion_swap_secret_submission_failures_total",
        "Total number of failed secret submissions"
    )
    .expect("register fusion_swap_secret_submission_failures_total");

    /// Ready fills naming a secret index the order never committed to
    pub static ref PROTOCOL_VIOLATIONS: IntCounter = register_int_counter!(
        "fusion_swap_protocol_violations_total",
        "Total number of out-of-range ready fill indices"
    )
    .expect("register fusion_swap_protocol_violations_total");

    // ═══════════════════════════════════════════════════════════════════════════
    // SYSTEM METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Error-level log events by target
    pub static ref ERROR_EVENTS: IntCounterVec = register_int_counter_vec!(
        "fusion_swap_error_events_total",
        "Total error-level log events by target",
        &["target"]
    )
    .expect("register fusion_swap_error_events_total");

    /// Events the collector missed because it fell behind the broadcast
    pub static ref EVENTS_LAGGED: IntCounter = register_int_counter!(
        "fusion_swap_events_lagged_total",
        "Total swap events skipped by a lagging metrics collector"
    )
    .expect("register fusion_swap_events_lagged_total");
}
