//! CBDC State - The injected world-state capability
//!
//! Every component of the ledger core depends on the [`LedgerContext`]
//! trait, never on a concrete store. The enclosing platform supplies the
//! real implementation with optimistic-concurrency commit semantics; the
//! [`MemoryLedgerContext`] here provides read-your-writes in-memory
//! state for tests and demos.
//!
//! # Invariants
//!
//! 1. Reads within a unit of work observe that unit's own writes
//! 2. The core never constructs storage keys outside [`composite_key`]
//!    for multi-component lookups
//! 3. Conflict detection and atomic commit are the platform's job, not
//!    this crate's

pub mod memory;

pub use memory::MemoryLedgerContext;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for world-state operations
pub type Result<T> = std::result::Result<T, StateError>;

/// Errors surfaced by a world-state backend
#[derive(Debug, Clone, Error)]
pub enum StateError {
    /// The backing store failed to serve the request
    #[error("state backend error: {message}")]
    Backend { message: String },

    /// The caller's partition access was denied by the platform
    #[error("access to partition {partition} denied")]
    PartitionDenied { partition: String },

    /// No caller identity is attached to this invocation
    #[error("no caller identity available")]
    NoCaller,
}

impl StateError {
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

/// A named sub-store of the world state
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Partition {
    /// The shared world state, readable by every participant
    Public,
    /// A restricted partition with its own platform-enforced access policy
    Restricted(String),
}

impl Partition {
    /// Name used by backends to address this partition
    pub fn name(&self) -> &str {
        match self {
            Self::Public => "public",
            Self::Restricted(name) => name,
        }
    }
}

/// The caller identity attached to an invocation
///
/// `id` is the opaque, base64-encoded certificate-subject token; the
/// identity parser turns it into typed attributes. `membership_id` is
/// the raw organizational-membership identifier the platform asserts
/// independently of the certificate subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerInfo {
    pub id: String,
    pub membership_id: String,
}

impl CallerInfo {
    pub fn new(id: impl Into<String>, membership_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            membership_id: membership_id.into(),
        }
    }
}

/// Delimiter used in composite keys, per platform convention.
const COMPOSITE_KEY_DELIMITER: char = '\u{0}';

/// Combine a prefix and ordered components into one lookup key.
pub fn composite_key(object_type: &str, components: &[&str]) -> String {
    let mut key = String::with_capacity(object_type.len() + 16);
    key.push(COMPOSITE_KEY_DELIMITER);
    key.push_str(object_type);
    for component in components {
        key.push(COMPOSITE_KEY_DELIMITER);
        key.push_str(component);
    }
    key
}

/// The platform capability threaded through every ledger call.
///
/// All reads and writes performed through one context are expected to
/// commit together or not at all; the platform rejects the whole unit of
/// work on a conflicting concurrent mutation.
#[async_trait]
pub trait LedgerContext: Send + Sync {
    /// Point read of a named value. `None` means the key is absent.
    async fn get_state(&self, partition: &Partition, key: &str) -> Result<Option<Vec<u8>>>;

    /// Point write of a named value (last-write-wins overwrite).
    async fn put_state(&self, partition: &Partition, key: &str, value: Vec<u8>) -> Result<()>;

    /// Range scan over keys sharing a composite-key prefix, returning
    /// matching records with their keys in key order.
    async fn get_by_prefix(
        &self,
        partition: &Partition,
        object_type: &str,
    ) -> Result<Vec<(String, Vec<u8>)>>;

    /// Emit a notification event, delivered to subscribers after commit.
    async fn set_event(&self, name: &str, payload: Vec<u8>) -> Result<()>;

    /// The caller identity attached to this invocation.
    fn caller(&self) -> Result<CallerInfo>;

    /// The platform's identifier for the current unit of work.
    fn tx_id(&self) -> String;

    /// The platform's timestamp for the current unit of work.
    fn tx_timestamp(&self) -> DateTime<Utc>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composite_key_shape() {
        let key = composite_key("allowance", &["owner", "spender"]);
        assert_eq!(key, "\u{0}allowance\u{0}owner\u{0}spender");
    }

    #[test]
    fn test_composite_key_prefix_containment() {
        let prefix = composite_key("balance", &[]);
        let key = composite_key("balance", &["acct-1"]);
        assert!(key.starts_with(&prefix));

        // A different object type must not collide with the prefix scan.
        let other = composite_key("balances", &["acct-1"]);
        assert!(!other.starts_with(&format!("{prefix}{COMPOSITE_KEY_DELIMITER}")));
    }

    #[test]
    fn test_partition_names() {
        assert_eq!(Partition::Public.name(), "public");
        assert_eq!(
            Partition::Restricted("cbdcPrivate".to_string()).name(),
            "cbdcPrivate"
        );
    }
}
