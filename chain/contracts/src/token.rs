//! External token balance collaborator
//!
//! Token balance and allowance semantics are owned by the token contracts
//! themselves; this module only fixes the interface the settlement core
//! drives them through, plus an in-memory reference implementation used by
//! tests and the simulator's snapshot source.

use alloy_primitives::{Address, U256};
use std::collections::{HashMap, HashSet};

use crate::errors::TokenError;

/// Interface to the external token balance collaborator.
///
/// `spender` is the settlement contract moving funds on the owner's prior
/// approval. Implementations must be sequentially consistent: a
/// `transfer_from` observes every earlier `transfer_from` on the same value.
pub trait TokenLedger {
    /// Current balance of `owner` in `token`.
    fn balance_of(&self, token: Address, owner: Address) -> Result<U256, TokenError>;

    /// Remaining amount `spender` may move out of `owner`'s balance.
    fn allowance(&self, token: Address, owner: Address, spender: Address)
        -> Result<U256, TokenError>;

    /// Move `amount` of `token` from `from` to `to` on behalf of `spender`.
    ///
    /// Zero amounts and self-transfers succeed without a net balance change.
    fn transfer_from(
        &mut self,
        spender: Address,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError>;
}

/// In-memory token ledger with ERC20-style balances and allowances.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenLedger {
    tokens: HashSet<Address>,
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address, Address), U256>,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token contract. Transfers in unregistered tokens fail.
    pub fn register_token(&mut self, token: Address) {
        self.tokens.insert(token);
    }

    /// Overwrite `owner`'s balance in `token`.
    pub fn set_balance(&mut self, token: Address, owner: Address, amount: U256) {
        self.balances.insert((token, owner), amount);
    }

    /// Approve `spender` to move up to `amount` out of `owner`'s balance.
    pub fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((token, owner, spender), amount);
    }

    fn require_token(&self, token: Address) -> Result<(), TokenError> {
        if self.tokens.contains(&token) {
            Ok(())
        } else {
            Err(TokenError::UnknownToken {
                token: token.to_string(),
            })
        }
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn balance_of(&self, token: Address, owner: Address) -> Result<U256, TokenError> {
        self.require_token(token)?;
        Ok(self
            .balances
            .get(&(token, owner))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, TokenError> {
        self.require_token(token)?;
        Ok(self
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    fn transfer_from(
        &mut self,
        spender: Address,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        self.require_token(token)?;

        let balance = self.balance_of(token, from)?;
        if balance < amount {
            return Err(TokenError::InsufficientFunds {
                token: token.to_string(),
                required: amount.to_string(),
                available: balance.to_string(),
            });
        }

        let approved = self.allowance(token, from, spender)?;
        if approved < amount {
            return Err(TokenError::InsufficientAllowance {
                token: token.to_string(),
                required: amount.to_string(),
                approved: approved.to_string(),
            });
        }

        // Debit then credit; from == to nets out to no change.
        self.balances.insert((token, from), balance - amount);
        let credited = self
            .balances
            .get(&(token, to))
            .copied()
            .unwrap_or(U256::ZERO)
            .checked_add(amount)
            .ok_or(TokenError::Overflow)?;
        self.balances.insert((token, to), credited);

        self.allowances
            .insert((token, from, spender), approved - amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    fn ledger_with_token() -> InMemoryTokenLedger {
        let mut ledger = InMemoryTokenLedger::new();
        ledger.register_token(addr(0x10));
        ledger
    }

    #[test]
    fn test_transfer_moves_balance_and_burns_allowance() {
        let mut ledger = ledger_with_token();
        ledger.set_balance(addr(0x10), addr(1), U256::from(100u64));
        ledger.approve(addr(0x10), addr(1), addr(9), U256::from(100u64));

        ledger
            .transfer_from(addr(9), addr(0x10), addr(1), addr(2), U256::from(40u64))
            .unwrap();

        assert_eq!(
            ledger.balance_of(addr(0x10), addr(1)).unwrap(),
            U256::from(60u64)
        );
        assert_eq!(
            ledger.balance_of(addr(0x10), addr(2)).unwrap(),
            U256::from(40u64)
        );
        assert_eq!(
            ledger.allowance(addr(0x10), addr(1), addr(9)).unwrap(),
            U256::from(60u64)
        );
    }

    #[test]
    fn test_unknown_token_rejected() {
        let mut ledger = InMemoryTokenLedger::new();
        let err = ledger
            .transfer_from(addr(9), addr(0x10), addr(1), addr(2), U256::from(1u64))
            .unwrap_err();
        assert!(matches!(err, TokenError::UnknownToken { .. }));
    }

    #[test]
    fn test_overdraw_rejected() {
        let mut ledger = ledger_with_token();
        ledger.set_balance(addr(0x10), addr(1), U256::from(10u64));
        ledger.approve(addr(0x10), addr(1), addr(9), U256::from(100u64));
        let err = ledger
            .transfer_from(addr(9), addr(0x10), addr(1), addr(2), U256::from(11u64))
            .unwrap_err();
        assert!(matches!(err, TokenError::InsufficientFunds { .. }));
    }

    #[test]
    fn test_missing_allowance_rejected() {
        let mut ledger = ledger_with_token();
        ledger.set_balance(addr(0x10), addr(1), U256::from(10u64));
        let err = ledger
            .transfer_from(addr(9), addr(0x10), addr(1), addr(2), U256::from(5u64))
            .unwrap_err();
        assert!(matches!(err, TokenError::InsufficientAllowance { .. }));
    }

    #[test]
    fn test_self_transfer_is_balance_neutral() {
        let mut ledger = ledger_with_token();
        ledger.set_balance(addr(0x10), addr(1), U256::from(10u64));
        ledger.approve(addr(0x10), addr(1), addr(9), U256::from(10u64));
        ledger
            .transfer_from(addr(9), addr(0x10), addr(1), addr(1), U256::from(10u64))
            .unwrap();
        assert_eq!(
            ledger.balance_of(addr(0x10), addr(1)).unwrap(),
            U256::from(10u64)
        );
    }

    #[test]
    fn test_zero_transfer_succeeds_without_allowance() {
        let mut ledger = ledger_with_token();
        ledger
            .transfer_from(addr(9), addr(0x10), addr(1), addr(2), U256::ZERO)
            .unwrap();
    }
}
