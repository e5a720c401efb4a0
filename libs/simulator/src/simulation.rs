//! Settlement replay engine
//!
//! Replays ring submissions against detached snapshots, producing the exact
//! report the authoritative path would produce for the same inputs. The
//! planning code is shared, so any divergence between a simulated and an
//! authoritative report indicates divergent input state, never divergent
//! arithmetic.

use alloy_primitives::{Address, U256};
use tracing::debug;

use contracts::delegate::{LedgerSnapshot, TradeDelegate};
use contracts::errors::SettlementError;
use contracts::settlement::plan_settlement;
use contracts::token::TokenLedger;
use types::ids::OrderHash;
use types::order::RingBatch;
use types::report::Report;

use crate::snapshot::BalanceSnapshot;

/// Deterministic settlement replay over snapshot state.
///
/// Successive `simulate` calls chain: each replay runs against the state
/// the previous one projected, matching a sequence of authoritative
/// submissions.
#[derive(Debug, Clone)]
pub struct SettlementSimulator {
    ledger: LedgerSnapshot,
    balances: BalanceSnapshot,
}

impl SettlementSimulator {
    pub fn new(ledger: LedgerSnapshot, balances: BalanceSnapshot) -> Self {
        Self { ledger, balances }
    }

    /// Snapshot a live delegate and token ledger for the orders in `batch`.
    pub fn capture<L: TokenLedger>(
        delegate: &TradeDelegate,
        token_ledger: &L,
        spender: Address,
        batch: &RingBatch,
    ) -> Self {
        Self {
            ledger: delegate.snapshot(),
            balances: BalanceSnapshot::capture(token_ledger, spender, batch),
        }
    }

    /// Replay one submission, mutating the snapshots to the projected
    /// post-settlement state.
    pub fn simulate(&mut self, batch: &RingBatch) -> Result<Report, SettlementError> {
        let spendable = self.balances.spendable_map(batch);
        let plan = plan_settlement(batch, &self.ledger, &spendable)?;

        self.balances
            .apply(&plan.transfers)
            .map_err(contracts::errors::TransferError::from)?;
        for update in &plan.fill_updates {
            self.ledger.set_filled(update.hash, update.amount);
        }

        debug!(
            rings_settled = plan.rings_settled,
            rings_skipped = plan.rings_skipped,
            "replay complete"
        );
        Ok(plan.report)
    }

    /// Projected balance after all replays so far.
    pub fn projected_balance(&self, token: Address, owner: Address) -> U256 {
        self.balances.balance(token, owner)
    }

    /// Projected filled amount after all replays so far.
    pub fn projected_filled(&self, hash: OrderHash) -> U256 {
        self.ledger.filled(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::token::InMemoryTokenLedger;
    use types::order::{Order, Ring};

    const ADMIN: Address = Address::repeat_byte(0xAA);
    const SUBMITTER: Address = Address::repeat_byte(0xBB);

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    fn pair_batch() -> RingBatch {
        let a = Order::new(
            addr(1),
            addr(0x10),
            addr(0x20),
            U256::from(1000u64),
            U256::from(500u64),
            1,
        );
        let b = Order::new(
            addr(2),
            addr(0x20),
            addr(0x10),
            U256::from(500u64),
            U256::from(1000u64),
            1,
        );
        RingBatch {
            orders: vec![a, b],
            rings: vec![Ring::new(vec![0, 1])],
            fee_recipient: addr(0xFE),
        }
    }

    fn funded_world() -> (TradeDelegate, InMemoryTokenLedger) {
        let mut delegate = TradeDelegate::new(ADMIN);
        delegate.record_deployment(SUBMITTER);
        delegate.authorize_address(ADMIN, SUBMITTER).unwrap();

        let mut ledger = InMemoryTokenLedger::new();
        for token in [addr(0x10), addr(0x20)] {
            ledger.register_token(token);
        }
        ledger.set_balance(addr(0x10), addr(1), U256::from(1000u64));
        ledger.approve(addr(0x10), addr(1), SUBMITTER, U256::from(1000u64));
        ledger.set_balance(addr(0x20), addr(2), U256::from(500u64));
        ledger.approve(addr(0x20), addr(2), SUBMITTER, U256::from(500u64));
        (delegate, ledger)
    }

    #[test]
    fn test_replay_projects_balances_and_fills() {
        let (delegate, ledger) = funded_world();
        let batch = pair_batch();
        let mut sim = SettlementSimulator::capture(&delegate, &ledger, SUBMITTER, &batch);

        let report = sim.simulate(&batch).unwrap();
        assert_eq!(report.transfers.len(), 2);
        assert_eq!(
            sim.projected_balance(addr(0x20), addr(1)),
            U256::from(500u64)
        );
        assert_eq!(
            sim.projected_filled(batch.orders[0].hash()),
            U256::from(1000u64)
        );
        // The live world is untouched.
        assert_eq!(delegate.filled(batch.orders[0].hash()), U256::ZERO);
        assert_eq!(
            ledger.balance_of(addr(0x10), addr(1)).unwrap(),
            U256::from(1000u64)
        );
    }

    #[test]
    fn test_second_replay_sees_first_replays_state() {
        let (delegate, ledger) = funded_world();
        let batch = pair_batch();
        let mut sim = SettlementSimulator::capture(&delegate, &ledger, SUBMITTER, &batch);

        let first = sim.simulate(&batch).unwrap();
        assert_eq!(first.transfers.len(), 2);

        // Orders are now fully filled, so the same batch settles nothing.
        let second = sim.simulate(&batch).unwrap();
        assert!(second.transfers.is_empty());
    }
}
