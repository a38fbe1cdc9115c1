//! CBDC Ledger - The balance/allowance/supply bookkeeping layer
//!
//! A thin, schema-aware layer over the world state. The store owns the
//! key schema and the partition routing; invariants (non-negative
//! balances, supply conservation) are the operations' responsibility.
//!
//! Balances, total supply, and allowances are stored as ASCII decimal
//! strings. Reads distinguish absence (`None`) from zero so each
//! operation can apply its own absence policy; writes are last-write-
//! wins overwrites.
//!
//! In `PrivacyMode::Partitioned`, balances, allowances, and transaction
//! records live in a restricted partition; token metadata stays in the
//! shared world state and remains readable everywhere.

use cbdc_state::{composite_key, LedgerContext, Partition, StateError};
use cbdc_types::{PrivacyMode, TokenMetadata, TransactionRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Result type for ledger store operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors from the bookkeeping layer
#[derive(Debug, Error)]
pub enum LedgerError {
    /// World-state access failed
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// A stored value could not be decoded
    #[error("corrupt stored value at key {key}: {message}")]
    CorruptValue { key: String, message: String },

    /// A record failed to serialize or deserialize
    #[error("record serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The ledger's key layout, passed in at construction so multiple
/// ledger instances can coexist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySchema {
    pub name_key: String,
    pub symbol_key: String,
    pub decimals_key: String,
    pub total_supply_key: String,
    pub balance_prefix: String,
    pub allowance_prefix: String,
    pub record_prefix: String,
    /// Name of the restricted partition used in partitioned mode
    pub restricted_collection: String,
}

impl Default for KeySchema {
    fn default() -> Self {
        Self {
            name_key: "name".to_string(),
            symbol_key: "symbol".to_string(),
            decimals_key: "decimals".to_string(),
            total_supply_key: "totalSupply".to_string(),
            balance_prefix: "balance".to_string(),
            allowance_prefix: "allowance".to_string(),
            record_prefix: "tx".to_string(),
            restricted_collection: "cbdcPrivate".to_string(),
        }
    }
}

/// Schema-aware accessor over a [`LedgerContext`]
#[derive(Debug, Clone)]
pub struct LedgerStore {
    schema: KeySchema,
    privacy: PrivacyMode,
}

impl LedgerStore {
    pub fn new(schema: KeySchema, privacy: PrivacyMode) -> Self {
        Self { schema, privacy }
    }

    pub fn schema(&self) -> &KeySchema {
        &self.schema
    }

    pub fn privacy(&self) -> PrivacyMode {
        self.privacy
    }

    /// Partition holding balances, allowances, and transaction records.
    pub fn account_partition(&self) -> Partition {
        match self.privacy {
            PrivacyMode::Public => Partition::Public,
            PrivacyMode::Partitioned => {
                Partition::Restricted(self.schema.restricted_collection.clone())
            }
        }
    }

    /// Metadata is public in both privacy modes.
    fn metadata_partition(&self) -> Partition {
        Partition::Public
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Presence of the name key is the initialization sentinel.
    pub async fn is_initialized(&self, ctx: &dyn LedgerContext) -> Result<bool> {
        let name = ctx
            .get_state(&self.metadata_partition(), &self.schema.name_key)
            .await?;
        Ok(name.is_some())
    }

    pub async fn put_metadata(
        &self,
        ctx: &dyn LedgerContext,
        metadata: &TokenMetadata,
    ) -> Result<()> {
        let partition = self.metadata_partition();
        ctx.put_state(
            &partition,
            &self.schema.name_key,
            metadata.name.clone().into_bytes(),
        )
        .await?;
        ctx.put_state(
            &partition,
            &self.schema.symbol_key,
            metadata.symbol.clone().into_bytes(),
        )
        .await?;
        ctx.put_state(
            &partition,
            &self.schema.decimals_key,
            metadata.decimals.to_string().into_bytes(),
        )
        .await?;
        Ok(())
    }

    pub async fn get_name(&self, ctx: &dyn LedgerContext) -> Result<Option<String>> {
        self.read_string(ctx, &self.metadata_partition(), &self.schema.name_key)
            .await
    }

    pub async fn get_symbol(&self, ctx: &dyn LedgerContext) -> Result<Option<String>> {
        self.read_string(ctx, &self.metadata_partition(), &self.schema.symbol_key)
            .await
    }

    pub async fn get_decimals(&self, ctx: &dyn LedgerContext) -> Result<Option<u8>> {
        let raw = self
            .read_string(ctx, &self.metadata_partition(), &self.schema.decimals_key)
            .await?;
        match raw {
            None => Ok(None),
            Some(text) => text
                .parse::<u8>()
                .map(Some)
                .map_err(|err| LedgerError::CorruptValue {
                    key: self.schema.decimals_key.clone(),
                    message: err.to_string(),
                }),
        }
    }

    // ========================================================================
    // Balances
    // ========================================================================

    fn balance_key(&self, account: &str) -> String {
        composite_key(&self.schema.balance_prefix, &[account])
    }

    /// Read a balance; `None` means the account has never been credited.
    pub async fn get_balance(
        &self,
        ctx: &dyn LedgerContext,
        account: &str,
    ) -> Result<Option<i64>> {
        self.read_amount(ctx, &self.account_partition(), &self.balance_key(account))
            .await
    }

    pub async fn put_balance(
        &self,
        ctx: &dyn LedgerContext,
        account: &str,
        amount: i64,
    ) -> Result<()> {
        debug!(account, amount, "writing balance");
        ctx.put_state(
            &self.account_partition(),
            &self.balance_key(account),
            amount.to_string().into_bytes(),
        )
        .await?;
        Ok(())
    }

    // ========================================================================
    // Total supply
    // ========================================================================

    /// Read the total supply; absent means no tokens were ever minted.
    pub async fn get_supply(&self, ctx: &dyn LedgerContext) -> Result<i64> {
        let supply = self
            .read_amount(
                ctx,
                &self.metadata_partition(),
                &self.schema.total_supply_key,
            )
            .await?;
        Ok(supply.unwrap_or(0))
    }

    pub async fn put_supply(&self, ctx: &dyn LedgerContext, amount: i64) -> Result<()> {
        debug!(amount, "writing total supply");
        ctx.put_state(
            &self.metadata_partition(),
            &self.schema.total_supply_key,
            amount.to_string().into_bytes(),
        )
        .await?;
        Ok(())
    }

    // ========================================================================
    // Allowances
    // ========================================================================

    fn allowance_key(&self, owner: &str, spender: &str) -> String {
        composite_key(&self.schema.allowance_prefix, &[owner, spender])
    }

    /// Read an allowance; absent means none was ever granted, i.e. 0.
    pub async fn get_allowance(
        &self,
        ctx: &dyn LedgerContext,
        owner: &str,
        spender: &str,
    ) -> Result<i64> {
        let allowance = self
            .read_amount(
                ctx,
                &self.account_partition(),
                &self.allowance_key(owner, spender),
            )
            .await?;
        Ok(allowance.unwrap_or(0))
    }

    pub async fn put_allowance(
        &self,
        ctx: &dyn LedgerContext,
        owner: &str,
        spender: &str,
        value: i64,
    ) -> Result<()> {
        debug!(owner, spender, value, "writing allowance");
        ctx.put_state(
            &self.account_partition(),
            &self.allowance_key(owner, spender),
            value.to_string().into_bytes(),
        )
        .await?;
        Ok(())
    }

    // ========================================================================
    // Transaction records
    // ========================================================================

    /// Append the record for the current unit of work.
    pub async fn append_record(
        &self,
        ctx: &dyn LedgerContext,
        record: &TransactionRecord,
    ) -> Result<()> {
        let key = composite_key(&self.schema.record_prefix, &[&record.tx_id]);
        let payload = serde_json::to_vec(record)?;
        ctx.put_state(&self.account_partition(), &key, payload)
            .await?;
        Ok(())
    }

    /// All transaction records, in key order.
    pub async fn records(&self, ctx: &dyn LedgerContext) -> Result<Vec<TransactionRecord>> {
        let entries = ctx
            .get_by_prefix(&self.account_partition(), &self.schema.record_prefix)
            .await?;
        entries
            .into_iter()
            .map(|(_, bytes)| serde_json::from_slice(&bytes).map_err(LedgerError::from))
            .collect()
    }

    // ========================================================================
    // Raw value decoding
    // ========================================================================

    async fn read_string(
        &self,
        ctx: &dyn LedgerContext,
        partition: &Partition,
        key: &str,
    ) -> Result<Option<String>> {
        let bytes = ctx.get_state(partition, key).await?;
        match bytes {
            None => Ok(None),
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| LedgerError::CorruptValue {
                    key: key.to_string(),
                    message: "not UTF-8".to_string(),
                }),
        }
    }

    async fn read_amount(
        &self,
        ctx: &dyn LedgerContext,
        partition: &Partition,
        key: &str,
    ) -> Result<Option<i64>> {
        let text = self.read_string(ctx, partition, key).await?;
        match text {
            None => Ok(None),
            Some(text) => text
                .parse::<i64>()
                .map(Some)
                .map_err(|err| LedgerError::CorruptValue {
                    key: key.to_string(),
                    message: err.to_string(),
                }),
        }
    }
}

impl Default for LedgerStore {
    fn default() -> Self {
        Self::new(KeySchema::default(), PrivacyMode::default())
    }
}
