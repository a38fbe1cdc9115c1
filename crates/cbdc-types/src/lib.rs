//! CBDC Types - Canonical domain types for the token ledger core
//!
//! This crate contains all foundational types for the ledger with zero
//! dependencies on other cbdc crates:
//!
//! - Overflow-checked amount arithmetic (`math`)
//! - Transaction records and operation kinds
//! - Token metadata
//! - Notification event payloads
//! - Query filter and pagination types
//!
//! # Architectural Invariants
//!
//! 1. Balances and total supply are never negative at a committed state
//! 2. Total supply equals the sum of all account balances
//! 3. Every mutating operation leaves exactly one transaction record
//! 4. Arithmetic never wraps silently

pub mod event;
pub mod math;
pub mod metadata;
pub mod query;
pub mod record;

pub use event::*;
pub use math::*;
pub use metadata::*;
pub use query::*;
pub use record::*;

use serde::{Deserialize, Serialize};

/// Fixed placeholder identifier used as the notional source of minted
/// tokens and destination of burned tokens in events and records.
pub const ZERO_ADDRESS: &str = "0x0";

/// Where account balances, allowances, and transaction detail live.
///
/// Token metadata stays in the shared world state in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrivacyMode {
    /// Balances and transaction records in the shared world state.
    Public,
    /// Balances and transaction records in a restricted partition only
    /// the central authority's peers can read.
    Partitioned,
}

impl Default for PrivacyMode {
    fn default() -> Self {
        Self::Partitioned
    }
}
