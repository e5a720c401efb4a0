//! Contract events
//!
//! Events are immutable records appended by state-changing operations. The
//! delegate keeps them in an append-only log so an observer can reconstruct
//! every authorization, lifecycle, and cancellation change in order.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use types::ids::{OrderHash, TradingPairKey};

use crate::security::LifecycleState;

/// A caller contract was granted mutate access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressAuthorized {
    pub address: Address,
}

/// A caller contract lost mutate access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDeauthorized {
    pub address: Address,
}

/// Lifecycle state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleChanged {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

/// An owner's global cutoff moved forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerCutoffSet {
    pub owner: Address,
    pub cutoff: u64,
}

/// An owner's cutoff for one trading pair moved forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingPairCutoffSet {
    pub owner: Address,
    pub pair: TradingPairKey,
    pub cutoff: u64,
}

/// A single order was cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub owner: Address,
    pub hash: OrderHash,
}

/// A filled amount was overwritten for an order hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilledUpdated {
    pub hash: OrderHash,
    pub amount: U256,
}

/// Enum wrapper for all contract events, enabling uniform handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractEvent {
    AddressAuthorized(AddressAuthorized),
    AddressDeauthorized(AddressDeauthorized),
    LifecycleChanged(LifecycleChanged),
    OwnerCutoffSet(OwnerCutoffSet),
    TradingPairCutoffSet(TradingPairCutoffSet),
    OrderCancelled(OrderCancelled),
    FilledUpdated(FilledUpdated),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_event_serialization() {
        let event = ContractEvent::LifecycleChanged(LifecycleChanged {
            from: LifecycleState::Active,
            to: LifecycleState::Suspended,
        });
        let json = serde_json::to_string(&event).unwrap();
        let deser: ContractEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_cutoff_event_serialization() {
        let event = ContractEvent::TradingPairCutoffSet(TradingPairCutoffSet {
            owner: Address::repeat_byte(0x05),
            pair: TradingPairKey::from_low_u64(666),
            cutoff: 2000,
        });
        let json = serde_json::to_string(&event).unwrap();
        let deser: ContractEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(event, deser);
    }

    #[test]
    fn test_event_enum_variant() {
        let event = ContractEvent::OrderCancelled(OrderCancelled {
            owner: Address::repeat_byte(0x01),
            hash: OrderHash::from_low_u64(666),
        });
        assert!(matches!(event, ContractEvent::OrderCancelled(_)));
    }
}
