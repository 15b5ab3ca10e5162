//! Metrics and monitoring for the Fusion Swap executor
//!
//! Prometheus metrics are derived from the `SwapEvent` stream each orchestrator
//! broadcasts, so the orchestrator itself carries no metrics code.
//!
//! # Example
//!
//! ```no_run
//! use fusion_swap_metrics::{init_tracing, MetricsCollector};
//! use std::sync::Arc;
//!
//! # fn events() -> tokio::sync::broadcast::Receiver<fusion_swap_types::SwapEvent> { unimplemented!() }
//! #[tokio::main]
//! async fn main() {
//!     init_tracing("info", false).unwrap();
//!
//!     let collector = Arc::new(MetricsCollector::new());
//!     tokio::spawn(collector.clone().run(events()));
//!
//!     println!("{}", collector.export_metrics().unwrap());
//! }
//! ```

pub mod collector;
pub mod metrics;
pub mod tracing;

pub use collector::{MetricsCollector, MetricsError};
pub use self::tracing::{init_tracing, MetricsLayer, TracingError};
