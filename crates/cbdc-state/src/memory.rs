//! In-memory world state for tests and demos
//!
//! Models each operation as its own unit of work: reads observe prior
//! writes immediately, every `tx_id()` call mints a fresh identifier,
//! and emitted events are captured for assertions. Platform-enforced
//! partition access policies are out of scope here; the restricted
//! partition is simply a separate namespace.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{CallerInfo, LedgerContext, Partition, Result, StateError};

type PartitionMap = HashMap<String, BTreeMap<String, Vec<u8>>>;

/// An in-memory [`LedgerContext`]
///
/// Cheap to clone; clones share the same underlying store. Use
/// [`as_caller`](Self::as_caller) to derive per-invocation handles with
/// different caller identities over the same state.
#[derive(Clone)]
pub struct MemoryLedgerContext {
    partitions: Arc<RwLock<PartitionMap>>,
    events: Arc<RwLock<Vec<(String, Vec<u8>)>>>,
    caller: Option<CallerInfo>,
}

impl MemoryLedgerContext {
    /// Create an empty store with no caller identity attached.
    pub fn new() -> Self {
        Self {
            partitions: Arc::new(RwLock::new(HashMap::new())),
            events: Arc::new(RwLock::new(Vec::new())),
            caller: None,
        }
    }

    /// Derive a handle over the same state with a caller identity.
    pub fn as_caller(&self, id: impl Into<String>, membership_id: impl Into<String>) -> Self {
        Self {
            partitions: Arc::clone(&self.partitions),
            events: Arc::clone(&self.events),
            caller: Some(CallerInfo::new(id, membership_id)),
        }
    }

    /// All events emitted so far, in emission order.
    pub async fn events(&self) -> Vec<(String, Vec<u8>)> {
        self.events.read().await.clone()
    }

    /// The most recently emitted event.
    pub async fn last_event(&self) -> Option<(String, Vec<u8>)> {
        self.events.read().await.last().cloned()
    }
}

impl Default for MemoryLedgerContext {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerContext for MemoryLedgerContext {
    async fn get_state(&self, partition: &Partition, key: &str) -> Result<Option<Vec<u8>>> {
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(partition.name())
            .and_then(|p| p.get(key))
            .cloned())
    }

    async fn put_state(&self, partition: &Partition, key: &str, value: Vec<u8>) -> Result<()> {
        let mut partitions = self.partitions.write().await;
        partitions
            .entry(partition.name().to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn get_by_prefix(
        &self,
        partition: &Partition,
        object_type: &str,
    ) -> Result<Vec<(String, Vec<u8>)>> {
        // Trailing delimiter keeps "tx" from matching "txextra" keys.
        let prefix = format!("\u{0}{object_type}\u{0}");
        let partitions = self.partitions.read().await;
        Ok(partitions
            .get(partition.name())
            .map(|p| {
                p.range(prefix.clone()..)
                    .take_while(|(key, _)| key.starts_with(&prefix))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn set_event(&self, name: &str, payload: Vec<u8>) -> Result<()> {
        self.events
            .write()
            .await
            .push((name.to_string(), payload));
        Ok(())
    }

    fn caller(&self) -> Result<CallerInfo> {
        self.caller.clone().ok_or(StateError::NoCaller)
    }

    fn tx_id(&self) -> String {
        format!("tx_{}", Uuid::new_v4())
    }

    fn tx_timestamp(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite_key;

    #[tokio::test]
    async fn test_read_your_writes() {
        let ctx = MemoryLedgerContext::new();
        let partition = Partition::Public;

        assert_eq!(ctx.get_state(&partition, "k").await.unwrap(), None);

        ctx.put_state(&partition, "k", b"42".to_vec()).await.unwrap();
        assert_eq!(
            ctx.get_state(&partition, "k").await.unwrap(),
            Some(b"42".to_vec())
        );
    }

    #[tokio::test]
    async fn test_partitions_are_disjoint() {
        let ctx = MemoryLedgerContext::new();
        let restricted = Partition::Restricted("cbdcPrivate".to_string());

        ctx.put_state(&restricted, "k", b"secret".to_vec())
            .await
            .unwrap();
        assert_eq!(ctx.get_state(&Partition::Public, "k").await.unwrap(), None);
        assert!(ctx.get_state(&restricted, "k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_prefix_scan() {
        let ctx = MemoryLedgerContext::new();
        let partition = Partition::Public;

        for id in ["a", "b", "c"] {
            let key = composite_key("tx", &[id]);
            ctx.put_state(&partition, &key, id.as_bytes().to_vec())
                .await
                .unwrap();
        }
        // Same partition, different object type: must not be scanned.
        ctx.put_state(&partition, &composite_key("txextra", &["z"]), b"z".to_vec())
            .await
            .unwrap();

        let records = ctx.get_by_prefix(&partition, "tx").await.unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|(key, _)| key.contains("\u{0}tx\u{0}")));
    }

    #[tokio::test]
    async fn test_caller_handles_share_state() {
        let store = MemoryLedgerContext::new();
        assert!(matches!(store.caller(), Err(StateError::NoCaller)));

        let alice = store.as_caller("alice-id", "Org1MSP");
        alice
            .put_state(&Partition::Public, "k", b"1".to_vec())
            .await
            .unwrap();

        let bob = store.as_caller("bob-id", "Org2MSP");
        assert!(bob.get_state(&Partition::Public, "k").await.unwrap().is_some());
        assert_eq!(bob.caller().unwrap().membership_id, "Org2MSP");
    }

    #[tokio::test]
    async fn test_tx_ids_are_unique() {
        let ctx = MemoryLedgerContext::new();
        let first = ctx.tx_id();
        let second = ctx.tx_id();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_events_are_captured() {
        let ctx = MemoryLedgerContext::new();
        ctx.set_event("Transfer", b"{}".to_vec()).await.unwrap();
        ctx.set_event("Approval", b"{}".to_vec()).await.unwrap();

        let events = ctx.events().await;
        assert_eq!(events.len(), 2);
        assert_eq!(ctx.last_event().await.unwrap().0, "Approval");
    }
}
