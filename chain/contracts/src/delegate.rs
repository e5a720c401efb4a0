//! Trade delegate ledger
//!
//! Single authoritative store for settlement bookkeeping:
//! - filled amounts per order hash, overwritten absolutely (not accumulated)
//! - per-owner cancellation of individual order hashes
//! - per-owner global cutoffs and per-trading-pair cutoffs, monotonic
//! - batch validity checks answered as a 256-bit bitset
//!
//! Mutations require an authorized caller and the Active lifecycle state.
//! Reads are unrestricted. Every mutation appends a [`ContractEvent`].

use alloy_primitives::{Address, U256};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};
use types::ids::{OrderHash, TradingPairKey};

use crate::codec::{self, FillUpdate, ValidityCheck};
use crate::errors::DelegateError;
use crate::events::{
    AddressAuthorized, AddressDeauthorized, ContractEvent, FilledUpdated, LifecycleChanged,
    OrderCancelled, OwnerCutoffSet, TradingPairCutoffSet,
};
use crate::security::{AuthorizationRegistry, LifecycleGuard, LifecycleState};

/// Authoritative fill and cancellation ledger.
#[derive(Debug, Clone)]
pub struct TradeDelegate {
    auth: AuthorizationRegistry,
    lifecycle: LifecycleGuard,
    filled: BTreeMap<OrderHash, U256>,
    cancelled: HashSet<(Address, OrderHash)>,
    owner_cutoffs: HashMap<Address, u64>,
    pair_cutoffs: HashMap<(Address, TradingPairKey), u64>,
    events: Vec<ContractEvent>,
}

impl TradeDelegate {
    pub fn new(admin: Address) -> Self {
        Self {
            auth: AuthorizationRegistry::new(admin),
            lifecycle: LifecycleGuard::new(),
            filled: BTreeMap::new(),
            cancelled: HashSet::new(),
            owner_cutoffs: HashMap::new(),
            pair_cutoffs: HashMap::new(),
            events: Vec::new(),
        }
    }

    // ───────────────────────── Access control ─────────────────────────

    /// Record that `address` denotes a deployed principal eligible for
    /// authorization.
    pub fn record_deployment(&mut self, address: Address) {
        self.auth.record_deployment(address);
    }

    /// Grant mutate access to `address`. Admin-only.
    pub fn authorize_address(
        &mut self,
        caller: Address,
        address: Address,
    ) -> Result<(), DelegateError> {
        self.auth.authorize(caller, address)?;
        info!(%address, "caller authorized");
        self.events
            .push(ContractEvent::AddressAuthorized(AddressAuthorized {
                address,
            }));
        Ok(())
    }

    /// Revoke mutate access from `address`. Admin-only.
    pub fn deauthorize_address(
        &mut self,
        caller: Address,
        address: Address,
    ) -> Result<(), DelegateError> {
        self.auth.deauthorize(caller, address)?;
        info!(%address, "caller deauthorized");
        self.events
            .push(ContractEvent::AddressDeauthorized(AddressDeauthorized {
                address,
            }));
        Ok(())
    }

    pub fn is_address_authorized(&self, address: Address) -> bool {
        self.auth.is_authorized(address)
    }

    pub fn authorized_count(&self) -> usize {
        self.auth.active_count()
    }

    /// Fail unless `caller` is authorized and the ledger is Active.
    ///
    /// Callers that move funds before writing back check this first, so a
    /// doomed submission never touches token balances.
    pub fn check_access(&self, caller: Address) -> Result<(), DelegateError> {
        if !self.auth.is_authorized(caller) {
            return Err(DelegateError::Unauthorized);
        }
        self.lifecycle.require_active()
    }

    // ───────────────────────── Lifecycle ─────────────────────────

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Halt mutations. Admin-only, Active only.
    pub fn suspend(&mut self, caller: Address) -> Result<(), DelegateError> {
        if !self.auth.is_admin(caller) {
            return Err(DelegateError::Unauthorized);
        }
        let from = self.lifecycle.state();
        let to = self.lifecycle.suspend()?;
        info!(%from, %to, "lifecycle transition");
        self.events
            .push(ContractEvent::LifecycleChanged(LifecycleChanged {
                from,
                to,
            }));
        Ok(())
    }

    /// Restore mutations after a suspension. Admin-only.
    pub fn resume(&mut self, caller: Address) -> Result<(), DelegateError> {
        if !self.auth.is_admin(caller) {
            return Err(DelegateError::Unauthorized);
        }
        let from = self.lifecycle.state();
        let to = self.lifecycle.resume()?;
        info!(%from, %to, "lifecycle transition");
        self.events
            .push(ContractEvent::LifecycleChanged(LifecycleChanged {
                from,
                to,
            }));
        Ok(())
    }

    /// Permanently retire the ledger. Admin-only, reachable only from
    /// Suspended.
    pub fn kill(&mut self, caller: Address) -> Result<(), DelegateError> {
        if !self.auth.is_admin(caller) {
            return Err(DelegateError::Unauthorized);
        }
        let from = self.lifecycle.state();
        let to = self.lifecycle.kill()?;
        info!(%from, %to, "lifecycle transition");
        self.events
            .push(ContractEvent::LifecycleChanged(LifecycleChanged {
                from,
                to,
            }));
        Ok(())
    }

    // ───────────────────────── Filled amounts ─────────────────────────

    /// Filled amount recorded for `hash`, zero if never written.
    pub fn filled(&self, hash: OrderHash) -> U256 {
        self.filled.get(&hash).copied().unwrap_or(U256::ZERO)
    }

    /// Overwrite the filled amount of a single order hash.
    pub fn set_filled(
        &mut self,
        caller: Address,
        hash: OrderHash,
        amount: U256,
    ) -> Result<(), DelegateError> {
        self.check_access(caller)?;
        self.write_filled(hash, amount);
        Ok(())
    }

    /// Decode an encoded fill batch and apply every record in order.
    ///
    /// Records are absolute overwrites, so a hash appearing twice ends at
    /// the amount of its last record.
    pub fn batch_update_filled(
        &mut self,
        caller: Address,
        data: &[u8],
    ) -> Result<(), DelegateError> {
        self.check_access(caller)?;
        let updates = codec::decode_fill_updates(data)?;
        debug!(records = updates.len(), "applying fill batch");
        for FillUpdate { hash, amount } in updates {
            self.write_filled(hash, amount);
        }
        Ok(())
    }

    fn write_filled(&mut self, hash: OrderHash, amount: U256) {
        self.filled.insert(hash, amount);
        self.events
            .push(ContractEvent::FilledUpdated(FilledUpdated { hash, amount }));
    }

    // ───────────────────────── Cancellation ─────────────────────────

    /// Cancel one order hash for `owner`. Idempotent.
    pub fn set_cancelled(
        &mut self,
        caller: Address,
        owner: Address,
        hash: OrderHash,
    ) -> Result<(), DelegateError> {
        self.check_access(caller)?;
        if self.cancelled.insert((owner, hash)) {
            info!(%owner, %hash, "order cancelled");
            self.events
                .push(ContractEvent::OrderCancelled(OrderCancelled {
                    owner,
                    hash,
                }));
        }
        Ok(())
    }

    pub fn is_cancelled(&self, owner: Address, hash: OrderHash) -> bool {
        self.cancelled.contains(&(owner, hash))
    }

    /// Advance `owner`'s global cutoff. Regressions fail; writing the
    /// current value again is a no-op success.
    pub fn set_owner_cutoff(
        &mut self,
        caller: Address,
        owner: Address,
        cutoff: u64,
    ) -> Result<(), DelegateError> {
        self.check_access(caller)?;
        let current = self.owner_cutoff(owner);
        if cutoff < current {
            return Err(DelegateError::CutoffRegression {
                attempted: cutoff,
                current,
            });
        }
        if cutoff == current {
            return Ok(());
        }
        self.owner_cutoffs.insert(owner, cutoff);
        info!(%owner, cutoff, "owner cutoff advanced");
        self.events
            .push(ContractEvent::OwnerCutoffSet(OwnerCutoffSet {
                owner,
                cutoff,
            }));
        Ok(())
    }

    /// Advance `owner`'s cutoff for a single trading pair. Monotonic per
    /// (owner, pair), with the same no-op rule as the global cutoff.
    pub fn set_trading_pair_cutoff(
        &mut self,
        caller: Address,
        owner: Address,
        pair: TradingPairKey,
        cutoff: u64,
    ) -> Result<(), DelegateError> {
        self.check_access(caller)?;
        let current = self.trading_pair_cutoff(owner, pair);
        if cutoff < current {
            return Err(DelegateError::CutoffRegression {
                attempted: cutoff,
                current,
            });
        }
        if cutoff == current {
            return Ok(());
        }
        self.pair_cutoffs.insert((owner, pair), cutoff);
        info!(%owner, %pair, cutoff, "trading pair cutoff advanced");
        self.events
            .push(ContractEvent::TradingPairCutoffSet(TradingPairCutoffSet {
                owner,
                pair,
                cutoff,
            }));
        Ok(())
    }

    pub fn owner_cutoff(&self, owner: Address) -> u64 {
        self.owner_cutoffs.get(&owner).copied().unwrap_or(0)
    }

    pub fn trading_pair_cutoff(&self, owner: Address, pair: TradingPairKey) -> u64 {
        self.pair_cutoffs.get(&(owner, pair)).copied().unwrap_or(0)
    }

    // ───────────────────────── Validity ─────────────────────────

    /// An order is valid while it is not cancelled and its `valid_since`
    /// strictly exceeds both applicable cutoffs.
    pub fn is_order_valid(
        &self,
        owner: Address,
        hash: OrderHash,
        valid_since: u64,
        pair: TradingPairKey,
    ) -> bool {
        !self.is_cancelled(owner, hash)
            && valid_since > self.owner_cutoff(owner)
            && valid_since > self.trading_pair_cutoff(owner, pair)
    }

    /// Evaluate an encoded batch of cutoff-check records.
    ///
    /// Bit `i` of the result (counting from the least significant bit) is
    /// set when record `i` describes a currently valid order. Read-only, so
    /// neither authorization nor the Active state is required.
    pub fn batch_check_cutoffs_and_cancelled(
        &self,
        data: &[u8],
    ) -> Result<U256, DelegateError> {
        let checks = codec::decode_validity_checks(data)?;
        let mut bits = U256::ZERO;
        for (i, check) in checks.iter().enumerate() {
            let ValidityCheck {
                owner,
                hash,
                valid_since,
                pair,
            } = *check;
            if self.is_order_valid(owner, hash, valid_since, pair) {
                bits |= U256::from(1u8) << i;
            }
        }
        Ok(bits)
    }

    // ───────────────────────── Observation ─────────────────────────

    /// All events emitted so far, in emission order.
    pub fn events(&self) -> &[ContractEvent] {
        &self.events
    }

    /// Immutable copy of the validity- and fill-relevant state, for
    /// off-chain replay.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            filled: self.filled.clone(),
            cancelled: self.cancelled.clone(),
            owner_cutoffs: self.owner_cutoffs.clone(),
            pair_cutoffs: self.pair_cutoffs.clone(),
        }
    }
}

/// Detached copy of the delegate's bookkeeping, sufficient to answer
/// validity and fill queries without the live ledger.
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    filled: BTreeMap<OrderHash, U256>,
    cancelled: HashSet<(Address, OrderHash)>,
    owner_cutoffs: HashMap<Address, u64>,
    pair_cutoffs: HashMap<(Address, TradingPairKey), u64>,
}

impl LedgerSnapshot {
    pub fn filled(&self, hash: OrderHash) -> U256 {
        self.filled.get(&hash).copied().unwrap_or(U256::ZERO)
    }

    /// Overwrite a filled amount within the snapshot only.
    pub fn set_filled(&mut self, hash: OrderHash, amount: U256) {
        self.filled.insert(hash, amount);
    }

    pub fn is_order_valid(
        &self,
        owner: Address,
        hash: OrderHash,
        valid_since: u64,
        pair: TradingPairKey,
    ) -> bool {
        let owner_cutoff = self.owner_cutoffs.get(&owner).copied().unwrap_or(0);
        let pair_cutoff = self
            .pair_cutoffs
            .get(&(owner, pair))
            .copied()
            .unwrap_or(0);
        !self.cancelled.contains(&(owner, hash))
            && valid_since > owner_cutoff
            && valid_since > pair_cutoff
    }
}
