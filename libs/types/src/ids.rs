//! Identifier types for settlement entities
//!
//! Order hashes are 32-byte content hashes of an order's immutable fields.
//! Trading pair keys are canonical 20-byte combinations of two token
//! addresses, independent of argument order.

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content hash identifying an order.
///
/// Computed over the order's immutable fields; two orders with identical
/// terms share a hash and therefore share fill accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderHash(B256);

impl OrderHash {
    /// Create from raw 32 bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(B256::from(bytes))
    }

    /// Create a hash whose low 8 bytes hold `value` (big-endian).
    ///
    /// Convenient for fixtures that refer to orders by small numbers.
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Self(B256::from(bytes))
    }

    /// Raw 32-byte view.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0 .0
    }

    /// Inner fixed-bytes value.
    pub fn as_b256(&self) -> &B256 {
        &self.0
    }
}

impl From<B256> for OrderHash {
    fn from(h: B256) -> Self {
        Self(h)
    }
}

impl fmt::Display for OrderHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canonical identifier for a trading pair.
///
/// Built as the bytewise XOR of the two token addresses, so
/// `from_tokens(a, b) == from_tokens(b, a)` by construction. Cutoffs keyed by
/// this value therefore cancel both directions of the pair at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradingPairKey([u8; 20]);

impl TradingPairKey {
    /// Derive the canonical key for the (a, b) pair.
    pub fn from_tokens(a: Address, b: Address) -> Self {
        let mut key = [0u8; 20];
        for (i, byte) in key.iter_mut().enumerate() {
            *byte = a.0[i] ^ b.0[i];
        }
        Self(key)
    }

    /// Create from raw 20 bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Create a key whose low 8 bytes hold `value` (big-endian).
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Raw 20-byte view.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for TradingPairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x")?;
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_order_independent() {
        let a = Address::repeat_byte(0x11);
        let b = Address::repeat_byte(0x42);
        assert_eq!(
            TradingPairKey::from_tokens(a, b),
            TradingPairKey::from_tokens(b, a)
        );
    }

    #[test]
    fn test_pair_key_distinguishes_pairs() {
        let a = Address::repeat_byte(0x11);
        let b = Address::repeat_byte(0x42);
        let c = Address::repeat_byte(0x43);
        assert_ne!(
            TradingPairKey::from_tokens(a, b),
            TradingPairKey::from_tokens(a, c)
        );
    }

    #[test]
    fn test_order_hash_from_low_u64() {
        let h = OrderHash::from_low_u64(0x1234);
        let bytes = h.as_bytes();
        assert_eq!(&bytes[..30], &[0u8; 30]);
        assert_eq!(bytes[30], 0x12);
        assert_eq!(bytes[31], 0x34);
    }

    #[test]
    fn test_order_hash_serde_round_trip() {
        let h = OrderHash::from_low_u64(999);
        let json = serde_json::to_string(&h).unwrap();
        let back: OrderHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }
}
