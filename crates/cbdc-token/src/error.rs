//! Error taxonomy for token operations
//!
//! Every failure is surfaced synchronously as the operation's result.
//! A failed operation must leave no partial balance, supply, or
//! allowance update behind; checks and guarded arithmetic run before
//! the first write.

use cbdc_identity::IdentityError;
use cbdc_ledger::LedgerError;
use cbdc_state::StateError;
use cbdc_types::{MathError, MetadataError, TransactionKind};
use thiserror::Error;

/// Result type for token operations
pub type Result<T> = std::result::Result<T, TokenError>;

/// Errors from token operations
#[derive(Debug, Error)]
pub enum TokenError {
    /// Contract options have not been set yet
    #[error("contract options need to be set before calling any function, call Initialize() first")]
    NotInitialized,

    /// Initialize was already run
    #[error("contract is already initialized")]
    AlreadyInitialized,

    /// Role or organization check failed
    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// The operation requires a strictly positive amount
    #[error("{kind} amount must be a positive integer, got {amount}")]
    NonPositiveAmount {
        kind: TransactionKind,
        amount: i64,
    },

    /// Transfer values may be zero but never negative
    #[error("transfer amount cannot be negative, got {amount}")]
    NegativeAmount { amount: i64 },

    /// Approval caps may be zero but never negative
    #[error("approval value cannot be negative, got {value}")]
    NegativeApproval { value: i64 },

    /// Self-transfers are rejected under the configured policy
    #[error("transfers from an account to itself are not permitted")]
    SelfTransferRejected,

    /// The account has no recorded balance
    #[error("account {account} has no recorded balance")]
    AccountNotFound { account: String },

    /// The account cannot cover the requested amount
    #[error("account {account} has insufficient funds: available {available}, required {required}")]
    InsufficientBalance {
        account: String,
        available: i64,
        required: i64,
    },

    /// The total supply cannot cover the requested burn
    #[error("insufficient total supply: available {available}, required {required}")]
    InsufficientSupply { available: i64, required: i64 },

    /// The spender's allowance cannot cover the requested transfer
    #[error("spender does not have enough allowance: available {available}, required {required}")]
    InsufficientAllowance { available: i64, required: i64 },

    /// Guarded arithmetic failed
    #[error(transparent)]
    Math(#[from] MathError),

    /// Metadata validation failed
    #[error("invalid token metadata: {0}")]
    Metadata(#[from] MetadataError),

    /// The caller's identity token could not be decoded
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// The bookkeeping layer failed
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The world state failed
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// An event payload or record failed to serialize
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TokenError {
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }
}
