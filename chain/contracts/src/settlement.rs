//! Ring settlement
//!
//! Turns a [`RingBatch`] into token movements and fill writebacks:
//! - structural checks reject malformed rings outright
//! - rings touching an invalid order, or with nothing to fill, are skipped
//! - fills are scaled down around the ring until every participant receives
//!   at least its quoted rate, with floor rounding throughout
//! - rounding margin accrues to the batch fee recipient
//!
//! Planning is a pure function over detached state, so the authoritative
//! submitter and off-chain replay produce identical plans from identical
//! inputs.

use alloy_primitives::{Address, U256};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};
use types::fee::{mul_div_floor, proportion, FEE_PERCENTAGE_BASE, WALLET_SPLIT_BASE};
use types::ids::OrderHash;
use types::order::{Order, Ring, RingBatch};
use types::report::{Report, TransferItem};

use crate::codec::{self, FillUpdate};
use crate::delegate::{LedgerSnapshot, TradeDelegate};
use crate::errors::{BatchError, DelegateError, SettlementError};
use crate::token::TokenLedger;
use crate::transfer;

/// Spendable amount per (token, owner): the minimum of balance and the
/// allowance granted to the settlement principal. Missing entries read as
/// zero, so orders in unknown tokens simply cannot fill.
#[derive(Debug, Clone, Default)]
pub struct SpendableMap {
    amounts: HashMap<(Address, Address), U256>,
}

impl SpendableMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, token: Address, owner: Address, amount: U256) {
        self.amounts.insert((token, owner), amount);
    }

    pub fn get(&self, token: Address, owner: Address) -> U256 {
        self.amounts
            .get(&(token, owner))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Collect spendables for every (token_s, owner) pair in the batch.
    pub fn from_ledger<L: TokenLedger>(ledger: &L, spender: Address, batch: &RingBatch) -> Self {
        let mut map = Self::new();
        for order in &batch.orders {
            let key = (order.token_s, order.owner);
            if map.amounts.contains_key(&key) {
                continue;
            }
            let balance = ledger
                .balance_of(order.token_s, order.owner)
                .unwrap_or(U256::ZERO);
            let approved = ledger
                .allowance(order.token_s, order.owner, spender)
                .unwrap_or(U256::ZERO);
            map.insert(order.token_s, order.owner, balance.min(approved));
        }
        map
    }
}

/// Outcome of planning one batch: what to move, what to write back, and the
/// report mirrored to observers.
#[derive(Debug, Clone, Default)]
pub struct SettlementPlan {
    pub transfers: Vec<TransferItem>,
    pub fill_updates: Vec<FillUpdate>,
    pub report: Report,
    pub rings_settled: usize,
    pub rings_skipped: usize,
}

fn validate_ring(batch: &RingBatch, ring: &Ring, ring_index: usize) -> Result<(), SettlementError> {
    if ring.len() < 2 {
        return Err(SettlementError::InvalidRing {
            index: ring_index,
            reason: "fewer than two orders".into(),
        });
    }
    let mut seen = HashSet::new();
    for &order_index in &ring.order_indices {
        if order_index >= batch.orders.len() {
            return Err(SettlementError::OrderIndexOutOfRange { index: order_index });
        }
        if !seen.insert(order_index) {
            return Err(SettlementError::InvalidRing {
                index: ring_index,
                reason: "duplicate order index".into(),
            });
        }
    }
    for (pos, &order_index) in ring.order_indices.iter().enumerate() {
        let next = ring.order_indices[(pos + 1) % ring.len()];
        if batch.orders[order_index].token_b != batch.orders[next].token_s {
            return Err(SettlementError::InvalidRing {
                index: ring_index,
                reason: "token chain does not close".into(),
            });
        }
    }
    Ok(())
}

fn validate_percentages(orders: &[Order]) -> Result<(), SettlementError> {
    for order in orders {
        if order.fee_percentage > FEE_PERCENTAGE_BASE {
            return Err(SettlementError::InvalidFeePercentage {
                value: order.fee_percentage,
                base: FEE_PERCENTAGE_BASE,
            });
        }
        if order.wallet_split_percentage > WALLET_SPLIT_BASE {
            return Err(SettlementError::InvalidFeePercentage {
                value: order.wallet_split_percentage,
                base: WALLET_SPLIT_BASE,
            });
        }
    }
    Ok(())
}

/// Scale sell fills so every order receives at least its quoted rate.
///
/// Starts from each order's seed fill and shrinks around the ring until no
/// order is owed more than its successor actually sells. Each pass can only
/// shrink, but rings whose rates barely fail to reconcile (rate product a
/// hair above 1) shed only a unit or so per sweep and never stabilize
/// within the budget. Such a ring collapses to all-zero fills and is
/// skipped by the planner rather than settled at a violated rate.
fn scale_fills(orders: &[&Order], mut fills: Vec<U256>) -> Vec<U256> {
    let n = orders.len();
    for _ in 0..=n {
        let mut changed = false;
        for i in (0..n).rev() {
            let next = (i + 1) % n;
            let entitled = mul_div_floor(fills[i], orders[i].amount_b, orders[i].amount_s);
            if entitled > fills[next] {
                fills[i] = mul_div_floor(fills[next], orders[i].amount_s, orders[i].amount_b);
                changed = true;
            }
        }
        if !changed {
            return fills;
        }
    }
    // Sweep budget exhausted. Only accept the result if it actually reached
    // a fixed point; otherwise no leg of the ring fills at all.
    for i in 0..n {
        let next = (i + 1) % n;
        let entitled = mul_div_floor(fills[i], orders[i].amount_b, orders[i].amount_s);
        if entitled > fills[next] {
            return vec![U256::ZERO; n];
        }
    }
    fills
}

/// Plan a batch against detached ledger and balance state.
///
/// Structural errors abort the whole batch before anything is planned.
/// Skipped rings contribute nothing and are not errors.
pub fn plan_settlement(
    batch: &RingBatch,
    snapshot: &LedgerSnapshot,
    spendable: &SpendableMap,
) -> Result<SettlementPlan, SettlementError> {
    validate_percentages(&batch.orders)?;
    for (ring_index, ring) in batch.rings.iter().enumerate() {
        validate_ring(batch, ring, ring_index)?;
    }

    let mut plan = SettlementPlan::default();
    // Running state across rings in the batch: fills already planned for a
    // hash, and spendable already committed per (token, owner).
    let mut planned_filled: HashMap<OrderHash, U256> = HashMap::new();
    let mut committed: HashMap<(Address, Address), U256> = HashMap::new();

    for (ring_index, ring) in batch.rings.iter().enumerate() {
        let orders: Vec<&Order> = ring
            .order_indices
            .iter()
            .map(|&i| &batch.orders[i])
            .collect();
        let hashes: Vec<OrderHash> = orders.iter().map(|o| o.hash()).collect();

        let all_valid = orders.iter().zip(&hashes).all(|(order, &hash)| {
            snapshot.is_order_valid(order.owner, hash, order.valid_since, order.trading_pair())
        });
        if !all_valid {
            debug!(ring = ring_index, "ring skipped: invalid order");
            plan.rings_skipped += 1;
            continue;
        }

        // Seed fills: capped by what is left of the order and by what the
        // owner can still spend after earlier rings in this batch.
        let seeds: Vec<U256> = orders
            .iter()
            .zip(&hashes)
            .map(|(order, &hash)| {
                let filled = planned_filled
                    .get(&hash)
                    .copied()
                    .unwrap_or_else(|| snapshot.filled(hash));
                let remaining = order.amount_s.saturating_sub(filled);
                let used = committed
                    .get(&(order.token_s, order.owner))
                    .copied()
                    .unwrap_or(U256::ZERO);
                let available = spendable
                    .get(order.token_s, order.owner)
                    .saturating_sub(used);
                remaining.min(available)
            })
            .collect();

        let fills = scale_fills(&orders, seeds);
        if fills.iter().any(|f| f.is_zero()) {
            debug!(ring = ring_index, "ring skipped: zero fill");
            plan.rings_skipped += 1;
            continue;
        }

        let n = orders.len();
        for i in 0..n {
            let next = (i + 1) % n;
            let buyer = orders[i];
            let seller = orders[next];
            let token = buyer.token_b;
            let incoming = fills[next];

            let entitled = mul_div_floor(fills[i], buyer.amount_b, buyer.amount_s);
            let margin = incoming.saturating_sub(entitled);
            let fee = proportion(entitled, buyer.fee_percentage, FEE_PERCENTAGE_BASE);
            let wallet_fee = match buyer.wallet {
                Some(_) => proportion(fee, buyer.wallet_split_percentage, WALLET_SPLIT_BASE),
                None => U256::ZERO,
            };
            let recipient_amount = entitled - fee;
            let protocol_amount = (fee - wallet_fee) + margin;

            if !recipient_amount.is_zero() {
                plan.push_transfer(token, seller.owner, buyer.recipient(), recipient_amount);
            }
            if !wallet_fee.is_zero() {
                if let Some(wallet) = buyer.wallet {
                    plan.push_transfer(token, seller.owner, wallet, wallet_fee);
                    plan.report.add_fee(token, wallet, wallet_fee);
                }
            }
            if !protocol_amount.is_zero() {
                plan.push_transfer(token, seller.owner, batch.fee_recipient, protocol_amount);
                plan.report.add_fee(token, batch.fee_recipient, protocol_amount);
            }
        }

        for i in 0..n {
            let order = orders[i];
            let hash = hashes[i];
            let filled = planned_filled
                .get(&hash)
                .copied()
                .unwrap_or_else(|| snapshot.filled(hash));
            planned_filled.insert(hash, filled + fills[i]);
            *committed
                .entry((order.token_s, order.owner))
                .or_insert(U256::ZERO) += fills[i];
        }
        plan.rings_settled += 1;
    }

    for (hash, amount) in &planned_filled {
        plan.fill_updates.push(FillUpdate {
            hash: *hash,
            amount: *amount,
        });
        plan.report.record_filled(*hash, *amount);
    }
    plan.fill_updates.sort_by_key(|update| update.hash);

    Ok(plan)
}

impl SettlementPlan {
    fn push_transfer(&mut self, token: Address, from: Address, to: Address, amount: U256) {
        self.report.add_transfer(token, from, to, amount);
        self.transfers.push(TransferItem {
            token,
            from,
            to,
            amount,
        });
    }
}

/// Authoritative settlement entry point.
///
/// Owns a principal address that must be authorized on the delegate and
/// approved as spender by every order owner.
#[derive(Debug, Clone, Copy)]
pub struct RingSubmitter {
    address: Address,
}

impl RingSubmitter {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Plan and execute a batch: move tokens atomically, then write filled
    /// amounts back through the delegate's encoded batch path.
    pub fn submit_rings<L: TokenLedger>(
        &self,
        delegate: &mut TradeDelegate,
        ledger: &mut L,
        batch: &RingBatch,
    ) -> Result<Report, SettlementError> {
        delegate.check_access(self.address)?;

        let snapshot = delegate.snapshot();
        let spendable = SpendableMap::from_ledger(ledger, self.address, batch);
        let plan = plan_settlement(batch, &snapshot, &spendable)?;

        // The writeback must be known to fit its wire bound before any token
        // moves, or a post-transfer decode failure would strand the balances.
        if plan.fill_updates.len() > codec::MAX_BATCH_RECORDS {
            return Err(SettlementError::Delegate(DelegateError::MalformedBatch(
                BatchError::TooManyRecords {
                    count: plan.fill_updates.len(),
                    max: codec::MAX_BATCH_RECORDS,
                },
            )));
        }
        let encoded = codec::encode_fill_updates(&plan.fill_updates);

        transfer::apply_transfers(ledger, self.address, &plan.transfers)?;
        delegate.batch_update_filled(self.address, &encoded)?;

        info!(
            rings_settled = plan.rings_settled,
            rings_skipped = plan.rings_skipped,
            transfers = plan.transfers.len(),
            "batch settled"
        );
        Ok(plan.report)
    }
}
