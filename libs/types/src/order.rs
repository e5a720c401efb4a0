//! Order, ring, and batch types
//!
//! An order is a signed intent to exchange `amount_s` of `token_s` for
//! `amount_b` of `token_b`. A ring is a matched cycle of orders proposed to
//! settle against each other; a batch bundles orders, rings, and the fee
//! recipient for one settlement call.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ids::{OrderHash, TradingPairKey};

/// A settlement order.
///
/// Only the fields hashed by [`Order::hash`] identify the order; recipient
/// and fee routing are execution parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Account the order settles on behalf of
    pub owner: Address,
    /// Token being sold
    pub token_s: Address,
    /// Token being bought
    pub token_b: Address,
    /// Maximum quantity of `token_s` to sell (fixed-point scaled)
    pub amount_s: U256,
    /// Quantity of `token_b` expected for a full fill
    pub amount_b: U256,
    /// Earliest timestamp (seconds) at which the order is live
    pub valid_since: u64,
    /// Fee taken from the bought amount, in units of 1/1000 (base 1000)
    pub fee_percentage: u16,
    /// Share of the fee routed to `wallet`, in units of 1/100 (base 100)
    pub wallet_split_percentage: u16,
    /// Optional wallet receiving the split share of the fee
    pub wallet: Option<Address>,
    /// Recipient of bought tokens; `None` means the owner
    pub token_recipient: Option<Address>,
}

impl Order {
    /// Create an order with no fee and default routing.
    pub fn new(
        owner: Address,
        token_s: Address,
        token_b: Address,
        amount_s: U256,
        amount_b: U256,
        valid_since: u64,
    ) -> Self {
        Self {
            owner,
            token_s,
            token_b,
            amount_s,
            amount_b,
            valid_since,
            fee_percentage: 0,
            wallet_split_percentage: 0,
            wallet: None,
            token_recipient: None,
        }
    }

    /// Content hash over the immutable fields.
    ///
    /// Fixed field order, fixed-width big-endian encoding, so the hash is
    /// stable across processes and releases.
    pub fn hash(&self) -> OrderHash {
        let mut hasher = Sha256::new();
        hasher.update(self.owner.as_slice());
        hasher.update(self.token_s.as_slice());
        hasher.update(self.token_b.as_slice());
        hasher.update(self.amount_s.to_be_bytes::<32>());
        hasher.update(self.amount_b.to_be_bytes::<32>());
        hasher.update(self.valid_since.to_be_bytes());
        hasher.update(self.fee_percentage.to_be_bytes());
        let digest: [u8; 32] = hasher.finalize().into();
        OrderHash::from_bytes(digest)
    }

    /// Canonical key of the (token_s, token_b) pair.
    pub fn trading_pair(&self) -> TradingPairKey {
        TradingPairKey::from_tokens(self.token_s, self.token_b)
    }

    /// Effective recipient of bought tokens.
    pub fn recipient(&self) -> Address {
        self.token_recipient.unwrap_or(self.owner)
    }
}

/// A matched cycle of orders, referenced by index into the batch order list.
///
/// Order `i` sells the token that order `i - 1` (cyclically) buys, so a valid
/// ring closes: `token_b[i] == token_s[i + 1 mod n]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ring {
    pub order_indices: Vec<usize>,
}

impl Ring {
    pub fn new(order_indices: Vec<usize>) -> Self {
        Self { order_indices }
    }

    /// Number of orders in the ring.
    pub fn len(&self) -> usize {
        self.order_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order_indices.is_empty()
    }
}

/// One settlement submission: the order set, the proposed rings over it, and
/// the identity collecting the non-wallet share of fees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingBatch {
    pub orders: Vec<Order>,
    pub rings: Vec<Ring>,
    pub fee_recipient: Address,
}
