//! CBDC Token - The operation surface of the token ledger
//!
//! [`TokenContract`] composes the access evaluator, the guarded
//! arithmetic, and the ledger store into the public operation set:
//!
//! - Initialize (one-time, metadata-presence guarded)
//! - Mint / Burn (central issuer only, supply-conserving)
//! - Transfer / Approve / TransferFrom
//! - Read accessors (BalanceOf, ClientAccountBalance, Allowance,
//!   TotalSupply, Name, Symbol, Decimals, UserInfo)
//!
//! Every mutating operation appends a transaction record and emits a
//! notification event in the same unit of work as its balance writes.
//!
//! # Invariants
//!
//! 1. Total supply equals the sum of all account balances after every
//!    operation
//! 2. No committed state holds a negative balance or allowance
//! 3. A failed operation changes nothing

pub mod contract;
pub mod error;

pub use contract::{TokenConfig, TokenContract, UserInfo};
pub use error::{Result, TokenError};
