//! Contract-specific error types
//!
//! Every error is call-scoped and atomic: a failed call leaves no partial
//! mutation behind, and nothing is retried internally.

use thiserror::Error;

use crate::security::LifecycleState;

/// Wire format decoding failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("Batch length {length} is not a multiple of the {width}-byte record width")]
    Misaligned { length: usize, width: usize },

    #[error("Batch holds {count} records, exceeding the bound of {max}")]
    TooManyRecords { count: usize, max: usize },

    #[error("Field '{field}' exceeds its representable range")]
    FieldOverflow { field: &'static str },
}

/// Ledger and registry errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DelegateError {
    #[error("Caller is not an authorized, active principal")]
    Unauthorized,

    #[error("Operation requires the Active state, contract is {state}")]
    InvalidState { state: LifecycleState },

    #[error("Malformed batch: {0}")]
    MalformedBatch(#[from] BatchError),

    #[error("Cutoff regression: attempted {attempted} is below current {current}")]
    CutoffRegression { attempted: u64, current: u64 },

    #[error("Address is already authorized")]
    AlreadyAuthorized,

    #[error("Address is not an active authorized caller")]
    NotAuthorized,

    #[error("Address is not a registrable principal")]
    InvalidAddress,
}

/// Failures reported by the external token collaborator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Unknown token: {token}")]
    UnknownToken { token: String },

    #[error("Insufficient funds in {token}: required {required}, available {available}")]
    InsufficientFunds {
        token: String,
        required: String,
        available: String,
    },

    #[error("Insufficient allowance in {token}: required {required}, approved {approved}")]
    InsufficientAllowance {
        token: String,
        required: String,
        approved: String,
    },

    #[error("Arithmetic overflow in balance calculation")]
    Overflow,
}

/// Batch transfer execution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Delegate error: {0}")]
    Delegate(#[from] DelegateError),

    #[error("Malformed batch: {0}")]
    MalformedBatch(#[from] BatchError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}

/// Ring settlement errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error("Delegate error: {0}")]
    Delegate(#[from] DelegateError),

    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    #[error("Ring {index} is malformed: {reason}")]
    InvalidRing { index: usize, reason: String },

    #[error("Order {index} references no order in the batch")]
    OrderIndexOutOfRange { index: usize },

    #[error("Fee percentage {value} exceeds base {base}")]
    InvalidFeePercentage { value: u16, base: u16 },
}
