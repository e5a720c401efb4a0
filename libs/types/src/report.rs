//! Settlement report: the comparison artifact
//!
//! Both the authoritative executor and the off-chain simulator produce a
//! [`Report`]: the token movements, the per-beneficiary fee balances, and the
//! per-order filled amounts resulting from one batch. The two are diffed
//! field-by-field; transfer lists compare as multisets so emission order
//! never matters.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::ids::OrderHash;

/// One token movement: `amount` of `token` from `from` to `to`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransferItem {
    pub token: Address,
    pub from: Address,
    pub to: Address,
    pub amount: U256,
}

/// Observable effects of one settlement batch.
///
/// Maps are `BTreeMap` so iteration, serialization, and comparison are
/// deterministic. Equality treats `transfers` as a multiset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    /// Token movements, in emission order
    pub transfers: Vec<TransferItem>,
    /// Accumulated fee balances: token -> beneficiary -> amount
    pub fee_balances: BTreeMap<Address, BTreeMap<Address, U256>>,
    /// Resulting filled amount per settled order hash
    pub filled: BTreeMap<OrderHash, U256>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the batch produced no observable effect.
    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty() && self.fee_balances.is_empty() && self.filled.is_empty()
    }

    /// Record a token movement.
    pub fn add_transfer(&mut self, token: Address, from: Address, to: Address, amount: U256) {
        self.transfers.push(TransferItem {
            token,
            from,
            to,
            amount,
        });
    }

    /// Accumulate a fee balance for (token, beneficiary).
    pub fn add_fee(&mut self, token: Address, beneficiary: Address, amount: U256) {
        if amount.is_zero() {
            return;
        }
        let entry = self
            .fee_balances
            .entry(token)
            .or_default()
            .entry(beneficiary)
            .or_insert(U256::ZERO);
        *entry += amount;
    }

    /// Record the resulting filled amount for an order hash.
    pub fn record_filled(&mut self, hash: OrderHash, amount: U256) {
        self.filled.insert(hash, amount);
    }

    /// Transfers in canonical (sorted) order, for multiset comparison.
    pub fn canonical_transfers(&self) -> Vec<TransferItem> {
        let mut sorted = self.transfers.clone();
        sorted.sort();
        sorted
    }
}

impl PartialEq for Report {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_transfers() == other.canonical_transfers()
            && self.fee_balances == other.fee_balances
            && self.filled == other.filled
    }
}

impl Eq for Report {}
