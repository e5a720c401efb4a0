//! Order validity oracle
//!
//! Bridges order structures to the delegate's batched validity check. Orders
//! are encoded into cutoff-check records, submitted in chunks of at most
//! [`codec::MAX_VALIDITY_RECORDS`], and the resulting bitsets are unpacked
//! back into per-order flags.

use alloy_primitives::U256;
use tracing::debug;
use types::order::Order;

use crate::codec::{self, ValidityCheck};
use crate::delegate::TradeDelegate;
use crate::errors::DelegateError;

fn check_for(order: &Order) -> ValidityCheck {
    ValidityCheck {
        owner: order.owner,
        hash: order.hash(),
        valid_since: order.valid_since,
        pair: order.trading_pair(),
    }
}

/// Run the batched validity check on already-encoded records.
pub fn check_validity(delegate: &TradeDelegate, data: &[u8]) -> Result<U256, DelegateError> {
    delegate.batch_check_cutoffs_and_cancelled(data)
}

/// Flag each order as tradable or not, preserving input order.
pub fn order_validity(
    delegate: &TradeDelegate,
    orders: &[Order],
) -> Result<Vec<bool>, DelegateError> {
    let mut flags = Vec::with_capacity(orders.len());
    for chunk in orders.chunks(codec::MAX_VALIDITY_RECORDS) {
        let checks: Vec<ValidityCheck> = chunk.iter().map(check_for).collect();
        let data = codec::encode_validity_checks(&checks);
        let bits = delegate.batch_check_cutoffs_and_cancelled(&data)?;
        for i in 0..chunk.len() {
            flags.push(bits & (U256::from(1u8) << i) != U256::ZERO);
        }
    }
    debug!(
        total = orders.len(),
        valid = flags.iter().filter(|v| **v).count(),
        "validity check complete"
    );
    Ok(flags)
}
