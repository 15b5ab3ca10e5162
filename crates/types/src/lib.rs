pub mod asset;
pub mod hashlock;
pub mod order;
pub mod quote;
pub mod secret;
pub mod swap;

pub use asset::*;
pub use hashlock::*;
pub use order::*;
pub use quote::*;
pub use secret::*;
pub use swap::*;
