//! Overflow-checked arithmetic over the ledger's amount domain.
//!
//! Amounts are `i64`. Negative values are representable at the API
//! boundary (and rejected by operation-level validation); the guards
//! here only refuse results that wrap. Sufficiency checks (balance,
//! allowance) belong to the callers, not to this module.

use thiserror::Error;

/// Result type for guarded arithmetic
pub type Result<T> = std::result::Result<T, MathError>;

/// Errors from guarded arithmetic
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    /// The signed sum wrapped
    #[error("addition overflow: {a} + {b}")]
    AdditionOverflow { a: i64, b: i64 },

    /// The signed difference wrapped
    #[error("subtraction underflow: {a} - {b}")]
    SubtractionUnderflow { a: i64, b: i64 },
}

/// Add two amounts, failing if the sum wraps.
pub fn add(a: i64, b: i64) -> Result<i64> {
    a.checked_add(b)
        .ok_or(MathError::AdditionOverflow { a, b })
}

/// Subtract `b` from `a`, failing if the difference wraps.
///
/// `sub(x, 0)` and negative subtrahends are arithmetic successes.
pub fn sub(a: i64, b: i64) -> Result<i64> {
    a.checked_sub(b)
        .ok_or(MathError::SubtractionUnderflow { a, b })
}
