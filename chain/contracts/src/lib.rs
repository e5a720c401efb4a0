//! Settlement core: authoritative ledger and ring settlement
//!
//! This crate implements the authoritative settlement layer of the exchange:
//! the fill/cancellation ledger mutated on behalf of order owners by
//! authorized caller contracts, the atomic batch transfer executor, and the
//! ring settlement path that ties them together.
//!
//! # Modules
//! - `errors`: Error taxonomy for ledger, token, transfer, and settlement calls
//! - `events`: Append-only contract events emitted by state mutations
//! - `security`: Authorization registry and contract lifecycle state machine
//! - `codec`: Fixed-width big-endian batch wire format
//! - `token`: External token balance collaborator interface
//! - `delegate`: The fill and cancellation ledger (`TradeDelegate`)
//! - `transfer`: All-or-nothing batch transfer executor
//! - `oracle`: Read-only order validity queries
//! - `settlement`: Ring fill calculation and authoritative submission
//! - `shared`: Single-writer concurrency wrapper around the delegate

pub mod codec;
pub mod delegate;
pub mod errors;
pub mod events;
pub mod oracle;
pub mod security;
pub mod settlement;
pub mod shared;
pub mod token;
pub mod transfer;

/// Contract ABI version, frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";
