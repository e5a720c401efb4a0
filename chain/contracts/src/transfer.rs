//! Atomic batch token transfers
//!
//! Settlement moves many token amounts in one shot. The executor decodes an
//! encoded transfer batch, verifies the full batch is feasible against a
//! balance overlay, and only then drives the token ledger. A batch either
//! applies completely or leaves every balance untouched.

use alloy_primitives::{Address, U256};
use std::collections::HashMap;
use tracing::debug;
use types::report::TransferItem;

use crate::codec;
use crate::delegate::TradeDelegate;
use crate::errors::{TokenError, TransferError};
use crate::token::TokenLedger;

/// Staged view of balances and allowances during feasibility checking.
///
/// Transfers are checked in batch order, so an amount credited by an
/// earlier transfer can fund a later one, exactly as sequential execution
/// would allow.
#[derive(Debug, Default)]
pub struct BalanceOverlay {
    balances: HashMap<(Address, Address), U256>,
    allowances: HashMap<(Address, Address), U256>,
}

impl BalanceOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    fn balance<L: TokenLedger>(
        &mut self,
        ledger: &L,
        token: Address,
        owner: Address,
    ) -> Result<U256, TokenError> {
        if let Some(cached) = self.balances.get(&(token, owner)) {
            return Ok(*cached);
        }
        let balance = ledger.balance_of(token, owner)?;
        self.balances.insert((token, owner), balance);
        Ok(balance)
    }

    fn allowance<L: TokenLedger>(
        &mut self,
        ledger: &L,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, TokenError> {
        if let Some(cached) = self.allowances.get(&(token, owner)) {
            return Ok(*cached);
        }
        let approved = ledger.allowance(token, owner, spender)?;
        self.allowances.insert((token, owner), approved);
        Ok(approved)
    }

    /// Stage one transfer, failing if the overlay cannot cover it.
    pub fn stage<L: TokenLedger>(
        &mut self,
        ledger: &L,
        spender: Address,
        item: &TransferItem,
    ) -> Result<(), TokenError> {
        let balance = self.balance(ledger, item.token, item.from)?;
        if balance < item.amount {
            return Err(TokenError::InsufficientFunds {
                token: item.token.to_string(),
                required: item.amount.to_string(),
                available: balance.to_string(),
            });
        }
        let approved = self.allowance(ledger, item.token, item.from, spender)?;
        if approved < item.amount {
            return Err(TokenError::InsufficientAllowance {
                token: item.token.to_string(),
                required: item.amount.to_string(),
                approved: approved.to_string(),
            });
        }

        self.balances
            .insert((item.token, item.from), balance - item.amount);
        self.allowances
            .insert((item.token, item.from), approved - item.amount);
        let credited = self
            .balance(ledger, item.token, item.to)?
            .checked_add(item.amount)
            .ok_or(TokenError::Overflow)?;
        self.balances.insert((item.token, item.to), credited);
        Ok(())
    }
}

/// Decode and apply an encoded transfer batch atomically.
///
/// `caller` must be an authorized address and the delegate must be active.
/// `spender` is the settlement contract the owners approved. Records with a
/// zero amount or identical endpoints are validated as part of the batch
/// but skipped at application time, since they cannot move value.
pub fn execute_batch<L: TokenLedger>(
    delegate: &TradeDelegate,
    ledger: &mut L,
    caller: Address,
    spender: Address,
    data: &[u8],
) -> Result<Vec<TransferItem>, TransferError> {
    delegate.check_access(caller)?;
    let items = codec::decode_transfers(data)?;
    apply_transfers(ledger, spender, &items)?;
    Ok(items)
}

/// Apply already-decoded transfers atomically.
pub fn apply_transfers<L: TokenLedger>(
    ledger: &mut L,
    spender: Address,
    items: &[TransferItem],
) -> Result<(), TransferError> {
    let mut overlay = BalanceOverlay::new();
    for item in items {
        if item.amount.is_zero() || item.from == item.to {
            continue;
        }
        overlay.stage(ledger, spender, item)?;
    }

    debug!(transfers = items.len(), "batch feasible, applying");
    for item in items {
        if item.amount.is_zero() || item.from == item.to {
            continue;
        }
        ledger.transfer_from(spender, item.token, item.from, item.to, item.amount)?;
    }
    Ok(())
}
