pub mod error;
pub mod orchestrator;
pub mod reveal;
pub mod validator;


// Re-export main types
pub use error::{BuilderError, SwapError};
pub use orchestrator::{OrchestratorConfig, SwapOrchestrator, SwapOrchestratorBuilder};
pub use reveal::PollingConfig;
pub use validator::{
    required_allowance, PreflightConfig, PreflightReport, PreflightValidator, ValidationError,
};
