//! Authorization registry and contract lifecycle
//!
//! Two distinct identity classes meet here: the *admin* (a single principal
//! fixed at construction, allowed to mutate the registry and drive the
//! lifecycle) and *authorized callers* (contracts permitted to mutate ledger
//! state on behalf of order owners). Order owners themselves are neither.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::errors::DelegateError;

/// Contract lifecycle state.
///
/// `Active -> Suspended -> Active` is the recoverable path; `Suspended ->
/// Killed` is terminal. Killing from Active directly is forbidden so an
/// operator always passes through a reversible stop first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    Active,
    Suspended,
    Killed,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Active => "Active",
            LifecycleState::Suspended => "Suspended",
            LifecycleState::Killed => "Killed",
        };
        write!(f, "{name}")
    }
}

/// Lifecycle state machine guard.
#[derive(Debug, Clone)]
pub struct LifecycleGuard {
    state: LifecycleState,
}

impl LifecycleGuard {
    /// Create a guard in the initial `Active` state.
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Active,
        }
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// True while mutating operations are permitted.
    pub fn is_active(&self) -> bool {
        self.state == LifecycleState::Active
    }

    /// Fail with `InvalidState` unless Active.
    pub fn require_active(&self) -> Result<(), DelegateError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(DelegateError::InvalidState { state: self.state })
        }
    }

    /// Active -> Suspended.
    pub fn suspend(&mut self) -> Result<LifecycleState, DelegateError> {
        match self.state {
            LifecycleState::Active => {
                self.state = LifecycleState::Suspended;
                Ok(self.state)
            }
            state => Err(DelegateError::InvalidState { state }),
        }
    }

    /// Suspended -> Active.
    pub fn resume(&mut self) -> Result<LifecycleState, DelegateError> {
        match self.state {
            LifecycleState::Suspended => {
                self.state = LifecycleState::Active;
                Ok(self.state)
            }
            state => Err(DelegateError::InvalidState { state }),
        }
    }

    /// Suspended -> Killed. Terminal.
    pub fn kill(&mut self) -> Result<LifecycleState, DelegateError> {
        match self.state {
            LifecycleState::Suspended => {
                self.state = LifecycleState::Killed;
                Ok(self.state)
            }
            state => Err(DelegateError::InvalidState { state }),
        }
    }
}

impl Default for LifecycleGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Whitelist of caller contracts permitted to mutate ledger state.
///
/// Entries carry an active flag rather than being removed outright, so a
/// deauthorized caller can be re-authorized without losing its slot, and the
/// registry records which principals the environment has deployed (only
/// deployed contracts are registrable).
#[derive(Debug, Clone)]
pub struct AuthorizationRegistry {
    admin: Address,
    callers: HashMap<Address, bool>,
    deployed: HashSet<Address>,
}

impl AuthorizationRegistry {
    /// Create a registry owned by `admin`.
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            callers: HashMap::new(),
            deployed: HashSet::new(),
        }
    }

    /// The admin principal.
    pub fn admin(&self) -> Address {
        self.admin
    }

    /// Check admin identity.
    pub fn is_admin(&self, caller: Address) -> bool {
        caller == self.admin
    }

    /// Record that `address` denotes a deployed, registrable principal.
    ///
    /// Knowing which addresses hold code is environment knowledge, so this is
    /// not admin-gated; only `authorize` is.
    pub fn record_deployment(&mut self, address: Address) {
        self.deployed.insert(address);
    }

    /// Grant mutate access to `address`. Admin-only.
    pub fn authorize(&mut self, caller: Address, address: Address) -> Result<(), DelegateError> {
        if !self.is_admin(caller) {
            return Err(DelegateError::Unauthorized);
        }
        if address == Address::ZERO || !self.deployed.contains(&address) {
            return Err(DelegateError::InvalidAddress);
        }
        match self.callers.get(&address) {
            Some(true) => Err(DelegateError::AlreadyAuthorized),
            _ => {
                self.callers.insert(address, true);
                Ok(())
            }
        }
    }

    /// Revoke mutate access from `address`. Admin-only.
    pub fn deauthorize(&mut self, caller: Address, address: Address) -> Result<(), DelegateError> {
        if !self.is_admin(caller) {
            return Err(DelegateError::Unauthorized);
        }
        match self.callers.get_mut(&address) {
            Some(active) if *active => {
                *active = false;
                Ok(())
            }
            _ => Err(DelegateError::NotAuthorized),
        }
    }

    /// Pure query: is `address` currently an active authorized caller?
    pub fn is_authorized(&self, address: Address) -> bool {
        self.callers.get(&address).copied().unwrap_or(false)
    }

    /// Number of currently active callers.
    pub fn active_count(&self) -> usize {
        self.callers.values().filter(|active| **active).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    fn registry_with_deployed(admin: Address, contracts: &[Address]) -> AuthorizationRegistry {
        let mut registry = AuthorizationRegistry::new(admin);
        for contract in contracts {
            registry.record_deployment(*contract);
        }
        registry
    }

    // --- AuthorizationRegistry tests ---

    #[test]
    fn test_admin_can_authorize_deployed_contract() {
        let mut registry = registry_with_deployed(addr(1), &[addr(2)]);
        registry.authorize(addr(1), addr(2)).unwrap();
        assert!(registry.is_authorized(addr(2)));
    }

    #[test]
    fn test_non_admin_cannot_authorize() {
        let mut registry = registry_with_deployed(addr(1), &[addr(2)]);
        let err = registry.authorize(addr(9), addr(2)).unwrap_err();
        assert_eq!(err, DelegateError::Unauthorized);
        assert!(!registry.is_authorized(addr(2)));
    }

    #[test]
    fn test_cannot_authorize_zero_address() {
        let mut registry = registry_with_deployed(addr(1), &[Address::ZERO]);
        let err = registry.authorize(addr(1), Address::ZERO).unwrap_err();
        assert_eq!(err, DelegateError::InvalidAddress);
    }

    #[test]
    fn test_cannot_authorize_non_deployed_principal() {
        // addr(5) is an externally owned account, not a contract
        let mut registry = registry_with_deployed(addr(1), &[addr(2)]);
        let err = registry.authorize(addr(1), addr(5)).unwrap_err();
        assert_eq!(err, DelegateError::InvalidAddress);
    }

    #[test]
    fn test_cannot_authorize_twice() {
        let mut registry = registry_with_deployed(addr(1), &[addr(2)]);
        registry.authorize(addr(1), addr(2)).unwrap();
        let err = registry.authorize(addr(1), addr(2)).unwrap_err();
        assert_eq!(err, DelegateError::AlreadyAuthorized);
    }

    #[test]
    fn test_deauthorize_then_reauthorize() {
        let mut registry = registry_with_deployed(addr(1), &[addr(2)]);
        registry.authorize(addr(1), addr(2)).unwrap();
        registry.deauthorize(addr(1), addr(2)).unwrap();
        assert!(!registry.is_authorized(addr(2)));
        registry.authorize(addr(1), addr(2)).unwrap();
        assert!(registry.is_authorized(addr(2)));
    }

    #[test]
    fn test_cannot_deauthorize_unknown_address() {
        let mut registry = registry_with_deployed(addr(1), &[addr(2)]);
        let err = registry.deauthorize(addr(1), addr(2)).unwrap_err();
        assert_eq!(err, DelegateError::NotAuthorized);
    }

    #[test]
    fn test_cannot_deauthorize_twice() {
        let mut registry = registry_with_deployed(addr(1), &[addr(2)]);
        registry.authorize(addr(1), addr(2)).unwrap();
        registry.deauthorize(addr(1), addr(2)).unwrap();
        let err = registry.deauthorize(addr(1), addr(2)).unwrap_err();
        assert_eq!(err, DelegateError::NotAuthorized);
    }

    #[test]
    fn test_active_count_tracks_net_effect() {
        let mut registry = registry_with_deployed(addr(1), &[addr(2), addr(3), addr(4)]);
        registry.authorize(addr(1), addr(2)).unwrap();
        registry.authorize(addr(1), addr(3)).unwrap();
        registry.authorize(addr(1), addr(4)).unwrap();
        registry.deauthorize(addr(1), addr(3)).unwrap();
        assert_eq!(registry.active_count(), 2);
    }

    // --- LifecycleGuard tests ---

    #[test]
    fn test_lifecycle_starts_active() {
        let guard = LifecycleGuard::new();
        assert_eq!(guard.state(), LifecycleState::Active);
        assert!(guard.require_active().is_ok());
    }

    #[test]
    fn test_suspend_and_resume() {
        let mut guard = LifecycleGuard::new();
        guard.suspend().unwrap();
        assert_eq!(guard.state(), LifecycleState::Suspended);
        assert!(guard.require_active().is_err());
        guard.resume().unwrap();
        assert!(guard.require_active().is_ok());
    }

    #[test]
    fn test_kill_requires_suspended() {
        let mut guard = LifecycleGuard::new();
        let err = guard.kill().unwrap_err();
        assert_eq!(
            err,
            DelegateError::InvalidState {
                state: LifecycleState::Active
            }
        );
        guard.suspend().unwrap();
        guard.kill().unwrap();
        assert_eq!(guard.state(), LifecycleState::Killed);
    }

    #[test]
    fn test_killed_is_terminal() {
        let mut guard = LifecycleGuard::new();
        guard.suspend().unwrap();
        guard.kill().unwrap();
        assert!(guard.resume().is_err());
        assert!(guard.suspend().is_err());
        assert!(guard.kill().is_err());
        assert_eq!(guard.state(), LifecycleState::Killed);
    }

    #[test]
    fn test_resume_requires_suspended() {
        let mut guard = LifecycleGuard::new();
        assert!(guard.resume().is_err());
    }
}
