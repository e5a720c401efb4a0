//! Types library for the settlement core
//!
//! This library provides the type definitions shared between the authoritative
//! settlement contracts and the off-chain settlement simulator. Both sides must
//! agree on these shapes bit-for-bit, so everything here is deterministic:
//! 256-bit unsigned fixed-point amounts, content-addressed order hashes, and
//! sorted collections in comparison artifacts.
//!
//! # Modules
//! - `ids`: Order hashes and canonical trading pair keys
//! - `order`: Orders, rings, and ring batches
//! - `fee`: Integer percentage arithmetic (basis 1000, rounding toward zero)
//! - `report`: The comparison artifact shared by simulator and executor

pub mod fee;
pub mod ids;
pub mod order;
pub mod report;

// Re-exported so downstream crates use one source for the primitive types.
pub use alloy_primitives::{Address, B256, U256};

/// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fee::*;
    pub use crate::ids::*;
    pub use crate::order::*;
    pub use crate::report::*;
    pub use crate::{Address, B256, U256};
}
