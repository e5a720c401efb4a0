//! Batch wire format
//!
//! Every batch operation moves over a flat byte sequence of fixed-width
//! records built from 32-byte slots, big-endian throughout. The off-chain
//! simulator encodes batches with this exact codec, so the layout is part of
//! the protocol: a record kind has one width, addresses sit left-padded in
//! their slot, and the trading pair key sits *right*-padded in its slot. The
//! asymmetry between the two paddings is frozen; decoders on both sides
//! depend on it.

use alloy_primitives::{Address, U256};
use types::ids::{OrderHash, TradingPairKey};
use types::report::TransferItem;

use crate::errors::BatchError;

/// Width of one wire slot.
pub const SLOT: usize = 32;

/// Transfer record: token | from | to | amount.
pub const TRANSFER_RECORD_WIDTH: usize = 4 * SLOT;

/// Fill record: hash | amount.
pub const FILL_RECORD_WIDTH: usize = 2 * SLOT;

/// Cutoff-check record: owner | hash | valid_since | pair key.
pub const CUTOFF_RECORD_WIDTH: usize = 4 * SLOT;

/// Bound on transfer and fill batches.
pub const MAX_BATCH_RECORDS: usize = 1024;

/// Bound on cutoff-check batches: the validity result is a 256-bit bitset.
pub const MAX_VALIDITY_RECORDS: usize = 256;

/// One fill-update record: overwrite the filled amount for a hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillUpdate {
    pub hash: OrderHash,
    pub amount: U256,
}

/// One cutoff-check record, evaluated against the ledger's three
/// cancellation mechanisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityCheck {
    pub owner: Address,
    pub hash: OrderHash,
    pub valid_since: u64,
    pub pair: TradingPairKey,
}

// ───────────────────────── Slot primitives ─────────────────────────

/// Addresses occupy the low 20 bytes of their slot (left-padded).
fn push_address(buf: &mut Vec<u8>, address: Address) {
    buf.extend_from_slice(&[0u8; 12]);
    buf.extend_from_slice(address.as_slice());
}

fn push_u256(buf: &mut Vec<u8>, value: U256) {
    buf.extend_from_slice(&value.to_be_bytes::<32>());
}

fn push_hash(buf: &mut Vec<u8>, hash: OrderHash) {
    buf.extend_from_slice(hash.as_bytes());
}

/// Pair keys occupy the *high* 20 bytes of their slot (right-padded),
/// while addresses, also 20 bytes, pad on the left. The asymmetry is part
/// of the frozen wire format.
fn push_pair_key(buf: &mut Vec<u8>, pair: TradingPairKey) {
    buf.extend_from_slice(pair.as_bytes());
    buf.extend_from_slice(&[0u8; 12]);
}

fn read_address(slot: &[u8]) -> Address {
    Address::from_slice(&slot[12..32])
}

fn read_u256(slot: &[u8]) -> U256 {
    U256::from_be_slice(&slot[..32])
}

fn read_hash(slot: &[u8]) -> OrderHash {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&slot[..32]);
    OrderHash::from_bytes(bytes)
}

fn read_pair_key(slot: &[u8]) -> TradingPairKey {
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&slot[..20]);
    TradingPairKey::from_bytes(bytes)
}

/// Timestamps travel in a full slot but must fit 64 bits.
fn read_timestamp(slot: &[u8], field: &'static str) -> Result<u64, BatchError> {
    if slot[..24].iter().any(|byte| *byte != 0) {
        return Err(BatchError::FieldOverflow { field });
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&slot[24..32]);
    Ok(u64::from_be_bytes(bytes))
}

fn record_count(data: &[u8], width: usize, max: usize) -> Result<usize, BatchError> {
    if data.len() % width != 0 {
        return Err(BatchError::Misaligned {
            length: data.len(),
            width,
        });
    }
    let count = data.len() / width;
    if count > max {
        return Err(BatchError::TooManyRecords { count, max });
    }
    Ok(count)
}

// ───────────────────────── Transfer records ─────────────────────────

/// Encode transfer items into their wire batch.
pub fn encode_transfers(items: &[TransferItem]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(items.len() * TRANSFER_RECORD_WIDTH);
    for item in items {
        push_address(&mut buf, item.token);
        push_address(&mut buf, item.from);
        push_address(&mut buf, item.to);
        push_u256(&mut buf, item.amount);
    }
    buf
}

/// Decode a transfer batch. Fails on misaligned input or oversized batches.
pub fn decode_transfers(data: &[u8]) -> Result<Vec<TransferItem>, BatchError> {
    let count = record_count(data, TRANSFER_RECORD_WIDTH, MAX_BATCH_RECORDS)?;
    let mut items = Vec::with_capacity(count);
    for record in data.chunks_exact(TRANSFER_RECORD_WIDTH) {
        items.push(TransferItem {
            token: read_address(&record[0..32]),
            from: read_address(&record[32..64]),
            to: read_address(&record[64..96]),
            amount: read_u256(&record[96..128]),
        });
    }
    Ok(items)
}

// ───────────────────────── Fill records ─────────────────────────

/// Encode fill updates into their wire batch.
pub fn encode_fill_updates(updates: &[FillUpdate]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(updates.len() * FILL_RECORD_WIDTH);
    for update in updates {
        push_hash(&mut buf, update.hash);
        push_u256(&mut buf, update.amount);
    }
    buf
}

/// Decode a fill-update batch.
pub fn decode_fill_updates(data: &[u8]) -> Result<Vec<FillUpdate>, BatchError> {
    let count = record_count(data, FILL_RECORD_WIDTH, MAX_BATCH_RECORDS)?;
    let mut updates = Vec::with_capacity(count);
    for record in data.chunks_exact(FILL_RECORD_WIDTH) {
        updates.push(FillUpdate {
            hash: read_hash(&record[0..32]),
            amount: read_u256(&record[32..64]),
        });
    }
    Ok(updates)
}

// ───────────────────────── Cutoff-check records ─────────────────────────

/// Encode validity checks into their wire batch.
pub fn encode_validity_checks(checks: &[ValidityCheck]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(checks.len() * CUTOFF_RECORD_WIDTH);
    for check in checks {
        push_address(&mut buf, check.owner);
        push_hash(&mut buf, check.hash);
        push_u256(&mut buf, U256::from(check.valid_since));
        push_pair_key(&mut buf, check.pair);
    }
    buf
}

/// Decode a cutoff-check batch. At most [`MAX_VALIDITY_RECORDS`] records.
pub fn decode_validity_checks(data: &[u8]) -> Result<Vec<ValidityCheck>, BatchError> {
    let count = record_count(data, CUTOFF_RECORD_WIDTH, MAX_VALIDITY_RECORDS)?;
    let mut checks = Vec::with_capacity(count);
    for record in data.chunks_exact(CUTOFF_RECORD_WIDTH) {
        checks.push(ValidityCheck {
            owner: read_address(&record[0..32]),
            hash: read_hash(&record[32..64]),
            valid_since: read_timestamp(&record[64..96], "valid_since")?,
            pair: read_pair_key(&record[96..128]),
        });
    }
    Ok(checks)
}
