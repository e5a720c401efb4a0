//! Settlement Simulator
//!
//! Deterministic off-chain replay of ring settlement:
//! - captures detached snapshots of the delegate ledger and token balances
//! - replays submissions through the same planning code the authoritative
//!   path uses, so the projected outcome is bit-exact
//! - produces the same [`types::report::Report`] the authoritative path
//!   returns, suitable for direct equality comparison
//!
//! # Determinism
//! All computation is pure: no system time, no RNG, no external calls.
//! Identical snapshots and batches always produce identical reports.

pub mod simulation;
pub mod snapshot;

pub use simulation::SettlementSimulator;
pub use snapshot::BalanceSnapshot;

/// Crate version constant
pub const SIMULATOR_VERSION: &str = "1.0.0";
