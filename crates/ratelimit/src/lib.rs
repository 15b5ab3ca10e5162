//! Request pacing for the Fusion Swap executor
//!
//! - `RetryableExecutor`: retries rate-limited requests with doubling backoff
//! - `RequestQueue`: one shared FIFO that spaces out every external call
//! - `ExponentialBackoff`: the delay schedule both rely on

pub mod backoff;
pub mod error;
pub mod queue;
pub mod retry;

pub use backoff::ExponentialBackoff;
pub use error::RequestError;
pub use queue::{QueueConfig, RequestQueue};
pub use retry::{RateLimitSignal, RetryConfig, RetryableExecutor};
