//! Balance snapshots
//!
//! A detached copy of the token balances and allowances a settlement batch
//! can touch. Captured once from a live ledger, then mutated freely during
//! replay without affecting real balances.

use alloy_primitives::{Address, U256};
use std::collections::HashMap;

use contracts::errors::TokenError;
use contracts::settlement::SpendableMap;
use contracts::token::TokenLedger;
use types::order::RingBatch;
use types::report::TransferItem;

/// Point-in-time token balances, keyed by (token, owner).
///
/// Allowances are captured for a single spender, the settlement principal,
/// since that is the only spender replay ever exercises.
#[derive(Debug, Clone, Default)]
pub struct BalanceSnapshot {
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address), U256>,
}

impl BalanceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&mut self, token: Address, owner: Address, amount: U256) {
        self.balances.insert((token, owner), amount);
    }

    pub fn set_allowance(&mut self, token: Address, owner: Address, amount: U256) {
        self.allowances.insert((token, owner), amount);
    }

    pub fn balance(&self, token: Address, owner: Address) -> U256 {
        self.balances
            .get(&(token, owner))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    pub fn allowance(&self, token: Address, owner: Address) -> U256 {
        self.allowances
            .get(&(token, owner))
            .copied()
            .unwrap_or(U256::ZERO)
    }

    /// Capture every balance a batch can read or write: owner sell-side
    /// funds with their allowances, plus buy-side recipient, wallet, and
    /// fee recipient balances.
    pub fn capture<L: TokenLedger>(ledger: &L, spender: Address, batch: &RingBatch) -> Self {
        let mut snapshot = Self::new();
        for order in &batch.orders {
            let balance = ledger
                .balance_of(order.token_s, order.owner)
                .unwrap_or(U256::ZERO);
            let approved = ledger
                .allowance(order.token_s, order.owner, spender)
                .unwrap_or(U256::ZERO);
            snapshot.set_balance(order.token_s, order.owner, balance);
            snapshot.set_allowance(order.token_s, order.owner, approved);

            let mut holders = vec![order.recipient(), batch.fee_recipient];
            if let Some(wallet) = order.wallet {
                holders.push(wallet);
            }
            for holder in holders {
                let key = (order.token_b, holder);
                if !snapshot.balances.contains_key(&key) {
                    let balance = ledger
                        .balance_of(order.token_b, holder)
                        .unwrap_or(U256::ZERO);
                    snapshot.set_balance(order.token_b, holder, balance);
                }
            }
        }
        snapshot
    }

    /// Spendable amounts as the planner sees them: min(balance, allowance)
    /// per sell-side (token, owner) pair.
    pub fn spendable_map(&self, batch: &RingBatch) -> SpendableMap {
        let mut map = SpendableMap::new();
        for order in &batch.orders {
            let balance = self.balance(order.token_s, order.owner);
            let approved = self.allowance(order.token_s, order.owner);
            map.insert(order.token_s, order.owner, balance.min(approved));
        }
        map
    }

    /// Apply planned transfers to the snapshot, mirroring what the token
    /// ledger would do. Zero amounts and self-transfers are skipped just
    /// like the executor skips them.
    pub fn apply(&mut self, transfers: &[TransferItem]) -> Result<(), TokenError> {
        for item in transfers {
            if item.amount.is_zero() || item.from == item.to {
                continue;
            }
            let from_balance = self.balance(item.token, item.from);
            if from_balance < item.amount {
                return Err(TokenError::InsufficientFunds {
                    token: item.token.to_string(),
                    required: item.amount.to_string(),
                    available: from_balance.to_string(),
                });
            }
            self.balances
                .insert((item.token, item.from), from_balance - item.amount);

            let approved = self.allowance(item.token, item.from);
            if approved < item.amount {
                return Err(TokenError::InsufficientAllowance {
                    token: item.token.to_string(),
                    required: item.amount.to_string(),
                    approved: approved.to_string(),
                });
            }
            self.allowances
                .insert((item.token, item.from), approved - item.amount);

            let credited = self
                .balance(item.token, item.to)
                .checked_add(item.amount)
                .ok_or(TokenError::Overflow)?;
            self.balances.insert((item.token, item.to), credited);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::token::InMemoryTokenLedger;
    use types::order::{Order, Ring};

    const SPENDER: Address = Address::repeat_byte(0x99);

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    fn batch() -> RingBatch {
        let a = Order::new(
            addr(1),
            addr(0x10),
            addr(0x20),
            U256::from(100u64),
            U256::from(100u64),
            1,
        );
        let b = Order::new(
            addr(2),
            addr(0x20),
            addr(0x10),
            U256::from(100u64),
            U256::from(100u64),
            1,
        );
        RingBatch {
            orders: vec![a, b],
            rings: vec![Ring::new(vec![0, 1])],
            fee_recipient: addr(0xFE),
        }
    }

    #[test]
    fn test_capture_takes_min_relevant_state() {
        let mut ledger = InMemoryTokenLedger::new();
        ledger.register_token(addr(0x10));
        ledger.register_token(addr(0x20));
        ledger.set_balance(addr(0x10), addr(1), U256::from(60u64));
        ledger.approve(addr(0x10), addr(1), SPENDER, U256::from(40u64));

        let snapshot = BalanceSnapshot::capture(&ledger, SPENDER, &batch());
        assert_eq!(snapshot.balance(addr(0x10), addr(1)), U256::from(60u64));
        assert_eq!(snapshot.allowance(addr(0x10), addr(1)), U256::from(40u64));

        let spendable = snapshot.spendable_map(&batch());
        assert_eq!(spendable.get(addr(0x10), addr(1)), U256::from(40u64));
        assert_eq!(spendable.get(addr(0x20), addr(2)), U256::ZERO);
    }

    #[test]
    fn test_apply_moves_snapshot_balances_only() {
        let mut ledger = InMemoryTokenLedger::new();
        ledger.register_token(addr(0x10));
        ledger.set_balance(addr(0x10), addr(1), U256::from(50u64));
        ledger.approve(addr(0x10), addr(1), SPENDER, U256::from(50u64));

        let mut snapshot = BalanceSnapshot::capture(&ledger, SPENDER, &batch());
        snapshot
            .apply(&[TransferItem {
                token: addr(0x10),
                from: addr(1),
                to: addr(2),
                amount: U256::from(30u64),
            }])
            .unwrap();

        assert_eq!(snapshot.balance(addr(0x10), addr(1)), U256::from(20u64));
        assert_eq!(snapshot.balance(addr(0x10), addr(2)), U256::from(30u64));
        assert_eq!(
            ledger.balance_of(addr(0x10), addr(1)).unwrap(),
            U256::from(50u64)
        );
    }

    #[test]
    fn test_apply_rejects_overdraw() {
        let mut snapshot = BalanceSnapshot::new();
        snapshot.set_balance(addr(0x10), addr(1), U256::from(10u64));
        let err = snapshot
            .apply(&[TransferItem {
                token: addr(0x10),
                from: addr(1),
                to: addr(2),
                amount: U256::from(11u64),
            }])
            .unwrap_err();
        assert!(matches!(err, TokenError::InsufficientFunds { .. }));
    }
}
