//! External collaborators of the swap executor
//!
//! `SwapApi` covers quoting, order creation, submission and the secret-reveal
//! endpoints. `ChainClient` covers balance and allowance reads plus approvals.
//! The `simulated` module ships in-memory implementations of both.

pub mod api;
pub mod chain;
pub mod simulated;

pub use api::{ops, ApiError, SwapApi};
pub use chain::{ChainClient, ChainError};
pub use simulated::{SimulatedChain, SimulatedSwapApi};
