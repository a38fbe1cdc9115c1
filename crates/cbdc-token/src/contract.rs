//! The token contract: operations composing access control, guarded
//! arithmetic, and the ledger store over a platform context.
//!
//! Lifecycle: Uninitialized -> Initialized (one-time, guarded by the
//! metadata-presence sentinel) -> every other operation, repeatable.
//! Each operation runs inside one platform unit of work; all checks and
//! guarded arithmetic happen before the first write, so a failure
//! leaves no partial update behind.

use cbdc_access::{AccessEvaluator, AccessPolicy};
use cbdc_identity::ClientIdentity;
use cbdc_ledger::{KeySchema, LedgerStore};
use cbdc_state::{CallerInfo, LedgerContext};
use cbdc_types::{
    math, ApprovalEvent, PrivacyMode, TokenMetadata, TransactionKind, TransactionRecord,
    TransferEvent, APPROVAL_EVENT, TRANSFER_EVENT, ZERO_ADDRESS,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, TokenError};

/// Configuration for a token contract instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub access: AccessPolicy,
    pub schema: KeySchema,
    pub privacy: PrivacyMode,
}

/// The caller's identity as seen by the contract
///
/// Mirrors the information the platform and the identity parser can
/// jointly assert about the current invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub client_id: String,
    pub user_name: String,
    pub org: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_unit: Option<String>,
    pub membership_id: String,
    pub tx_id: String,
}

/// The CBDC token contract
#[derive(Debug, Clone)]
pub struct TokenContract {
    access: AccessEvaluator,
    store: LedgerStore,
    privacy: PrivacyMode,
}

impl TokenContract {
    pub fn new(config: TokenConfig) -> Self {
        Self {
            access: AccessEvaluator::new(config.access),
            store: LedgerStore::new(config.schema, config.privacy),
            privacy: config.privacy,
        }
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn access(&self) -> &AccessEvaluator {
        &self.access
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Set the token options and mark the contract initialized.
    ///
    /// One-time: fails with [`TokenError::AlreadyInitialized`] if the
    /// metadata sentinel is already present. Caller restrictions follow
    /// the configured [`InitializePolicy`](cbdc_access::InitializePolicy).
    pub async fn initialize(
        &self,
        ctx: &dyn LedgerContext,
        name: &str,
        symbol: &str,
        decimals: u8,
    ) -> Result<bool> {
        if self.store.is_initialized(ctx).await? {
            return Err(TokenError::AlreadyInitialized);
        }

        let caller = ctx.caller()?;
        if !self.access.may_initialize(&caller.membership_id) {
            return Err(TokenError::unauthorized(
                "client is not authorized to initialize the contract",
            ));
        }

        let metadata = TokenMetadata::new(name, symbol, decimals)?;
        self.store.put_metadata(ctx, &metadata).await?;

        info!(
            name = %metadata.name,
            symbol = %metadata.symbol,
            decimals = metadata.decimals,
            "contract initialized"
        );
        Ok(true)
    }

    // ========================================================================
    // Issuance
    // ========================================================================

    /// Create new tokens on the minter's own account.
    pub async fn mint(&self, ctx: &dyn LedgerContext, amount: i64) -> Result<()> {
        self.require_initialized(ctx).await?;

        let caller = ctx.caller()?;
        if !self.access.is_central_issuer(&caller.membership_id) {
            return Err(TokenError::unauthorized(
                "client is not authorized to mint new tokens",
            ));
        }
        if amount <= 0 {
            return Err(TokenError::NonPositiveAmount {
                kind: TransactionKind::Mint,
                amount,
            });
        }

        let minter = caller.id;
        // The minter's account is created on first credit.
        let current_balance = self.store.get_balance(ctx, &minter).await?.unwrap_or(0);
        let current_supply = self.store.get_supply(ctx).await?;

        let updated_balance = math::add(current_balance, amount)?;
        let updated_supply = math::add(current_supply, amount)?;

        self.store.put_balance(ctx, &minter, updated_balance).await?;
        self.store.put_supply(ctx, updated_supply).await?;

        let record =
            self.build_record(ctx, TransactionKind::Mint, ZERO_ADDRESS, &minter, amount, None);
        self.store.append_record(ctx, &record).await?;
        self.emit_transfer(ctx, ZERO_ADDRESS, &minter, amount).await?;

        info!(
            account = %minter,
            previous = current_balance,
            updated = updated_balance,
            "minter balance updated"
        );
        Ok(())
    }

    /// Destroy tokens from the minter's own account.
    pub async fn burn(&self, ctx: &dyn LedgerContext, amount: i64) -> Result<()> {
        self.require_initialized(ctx).await?;

        let caller = ctx.caller()?;
        if !self.access.is_central_issuer(&caller.membership_id) {
            return Err(TokenError::unauthorized(
                "client is not authorized to burn tokens",
            ));
        }
        if amount <= 0 {
            return Err(TokenError::NonPositiveAmount {
                kind: TransactionKind::Burn,
                amount,
            });
        }

        let minter = caller.id;
        let current_balance = self
            .store
            .get_balance(ctx, &minter)
            .await?
            .ok_or_else(|| TokenError::AccountNotFound {
                account: minter.clone(),
            })?;
        if current_balance < amount {
            return Err(TokenError::InsufficientBalance {
                account: minter,
                available: current_balance,
                required: amount,
            });
        }

        let current_supply = self.store.get_supply(ctx).await?;
        if current_supply < amount {
            return Err(TokenError::InsufficientSupply {
                available: current_supply,
                required: amount,
            });
        }

        let updated_balance = math::sub(current_balance, amount)?;
        let updated_supply = math::sub(current_supply, amount)?;

        self.store.put_balance(ctx, &minter, updated_balance).await?;
        self.store.put_supply(ctx, updated_supply).await?;

        let record =
            self.build_record(ctx, TransactionKind::Burn, &minter, ZERO_ADDRESS, amount, None);
        self.store.append_record(ctx, &record).await?;
        self.emit_transfer(ctx, &minter, ZERO_ADDRESS, amount).await?;

        info!(
            account = %minter,
            previous = current_balance,
            updated = updated_balance,
            "minter balance updated"
        );
        Ok(())
    }

    // ========================================================================
    // Transfers
    // ========================================================================

    /// Move tokens from the caller's account to `recipient`.
    pub async fn transfer(
        &self,
        ctx: &dyn LedgerContext,
        recipient: &str,
        amount: i64,
    ) -> Result<()> {
        self.require_initialized(ctx).await?;

        let caller = ctx.caller()?;
        self.apply_transfer(ctx, &caller.id, recipient, amount).await?;

        let record = self.build_record(
            ctx,
            TransactionKind::Transfer,
            &caller.id,
            recipient,
            amount,
            None,
        );
        self.store.append_record(ctx, &record).await?;
        self.emit_transfer(ctx, &caller.id, recipient, amount).await?;
        Ok(())
    }

    /// Grant `spender` a withdrawal cap of `value` from the caller's
    /// account. Unconditionally overwrites any previous cap.
    pub async fn approve(&self, ctx: &dyn LedgerContext, spender: &str, value: i64) -> Result<()> {
        self.require_initialized(ctx).await?;

        if value < 0 {
            return Err(TokenError::NegativeApproval { value });
        }

        let owner = ctx.caller()?.id;
        self.store.put_allowance(ctx, &owner, spender, value).await?;

        let record = self.build_record(
            ctx,
            TransactionKind::Approve,
            &owner,
            spender,
            value,
            Some(spender),
        );
        self.store.append_record(ctx, &record).await?;

        let payload = serde_json::to_vec(&ApprovalEvent {
            owner: owner.clone(),
            spender: spender.to_string(),
            value,
        })?;
        ctx.set_event(APPROVAL_EVENT, payload).await?;

        info!(owner = %owner, spender, value, "withdrawal approved");
        Ok(())
    }

    /// Move tokens from `from` to `to` on the strength of the caller's
    /// allowance, decrementing it by `value`.
    pub async fn transfer_from(
        &self,
        ctx: &dyn LedgerContext,
        from: &str,
        to: &str,
        value: i64,
    ) -> Result<()> {
        self.require_initialized(ctx).await?;

        let spender = ctx.caller()?.id;
        let current_allowance = self.store.get_allowance(ctx, from, &spender).await?;
        if current_allowance < value {
            return Err(TokenError::InsufficientAllowance {
                available: current_allowance,
                required: value,
            });
        }

        self.apply_transfer(ctx, from, to, value).await?;

        let updated_allowance = math::sub(current_allowance, value)?;
        self.store
            .put_allowance(ctx, from, &spender, updated_allowance)
            .await?;

        let record = self.build_record(
            ctx,
            TransactionKind::TransferFrom,
            from,
            to,
            value,
            Some(&spender),
        );
        self.store.append_record(ctx, &record).await?;
        self.emit_transfer(ctx, from, to, value).await?;

        info!(
            spender = %spender,
            previous = current_allowance,
            updated = updated_allowance,
            "spender allowance updated"
        );
        Ok(())
    }

    /// The shared transfer primitive.
    ///
    /// Zero-value transfers are permitted; negative values never are.
    /// `from` must have a recorded, sufficient balance; `to` is created
    /// at zero when absent. Both new balances are computed before either
    /// write.
    async fn apply_transfer(
        &self,
        ctx: &dyn LedgerContext,
        from: &str,
        to: &str,
        value: i64,
    ) -> Result<()> {
        if value < 0 {
            return Err(TokenError::NegativeAmount { amount: value });
        }
        if from == to && self.access.rejects_self_transfer() {
            return Err(TokenError::SelfTransferRejected);
        }

        let from_balance = self
            .store
            .get_balance(ctx, from)
            .await?
            .ok_or_else(|| TokenError::AccountNotFound {
                account: from.to_string(),
            })?;
        if from_balance < value {
            return Err(TokenError::InsufficientBalance {
                account: from.to_string(),
                available: from_balance,
                required: value,
            });
        }

        // A permitted self-transfer nets to zero; writing debit and
        // credit separately against the same key would double-apply.
        if from == to {
            self.store.put_balance(ctx, from, from_balance).await?;
            return Ok(());
        }

        let to_balance = self.store.get_balance(ctx, to).await?.unwrap_or(0);

        let from_updated = math::sub(from_balance, value)?;
        let to_updated = math::add(to_balance, value)?;

        self.store.put_balance(ctx, from, from_updated).await?;
        self.store.put_balance(ctx, to, to_updated).await?;

        info!(
            account = %from,
            previous = from_balance,
            updated = from_updated,
            "sender balance updated"
        );
        info!(
            account = %to,
            previous = to_balance,
            updated = to_updated,
            "recipient balance updated"
        );
        Ok(())
    }

    // ========================================================================
    // Read accessors
    // ========================================================================

    /// Balance of an arbitrary account.
    ///
    /// In partitioned mode this is gated on the caller's right to view
    /// the target account.
    pub async fn balance_of(&self, ctx: &dyn LedgerContext, account: &str) -> Result<i64> {
        self.require_initialized(ctx).await?;

        if self.privacy == PrivacyMode::Partitioned {
            let caller = self.parsed_caller(ctx)?;
            if !self.access.can_view_account(&caller, account) {
                return Err(TokenError::unauthorized(
                    "client is not authorized to view this account",
                ));
            }
        }

        self.store
            .get_balance(ctx, account)
            .await?
            .ok_or_else(|| TokenError::AccountNotFound {
                account: account.to_string(),
            })
    }

    /// Balance of the calling client's own account.
    pub async fn client_account_balance(&self, ctx: &dyn LedgerContext) -> Result<i64> {
        self.require_initialized(ctx).await?;

        let caller = ctx.caller()?;
        self.store
            .get_balance(ctx, &caller.id)
            .await?
            .ok_or(TokenError::AccountNotFound { account: caller.id })
    }

    /// The calling client's account identifier.
    pub async fn client_account_id(&self, ctx: &dyn LedgerContext) -> Result<String> {
        self.require_initialized(ctx).await?;
        Ok(ctx.caller()?.id)
    }

    /// Remaining withdrawal cap `owner` has granted `spender`.
    pub async fn allowance(
        &self,
        ctx: &dyn LedgerContext,
        owner: &str,
        spender: &str,
    ) -> Result<i64> {
        self.require_initialized(ctx).await?;
        let allowance = self.store.get_allowance(ctx, owner, spender).await?;
        Ok(allowance)
    }

    /// Total number of tokens in circulation.
    pub async fn total_supply(&self, ctx: &dyn LedgerContext) -> Result<i64> {
        self.require_initialized(ctx).await?;
        let supply = self.store.get_supply(ctx).await?;
        Ok(supply)
    }

    pub async fn name(&self, ctx: &dyn LedgerContext) -> Result<String> {
        self.require_initialized(ctx).await?;
        Ok(self.store.get_name(ctx).await?.unwrap_or_default())
    }

    pub async fn symbol(&self, ctx: &dyn LedgerContext) -> Result<String> {
        self.require_initialized(ctx).await?;
        Ok(self.store.get_symbol(ctx).await?.unwrap_or_default())
    }

    pub async fn decimals(&self, ctx: &dyn LedgerContext) -> Result<u8> {
        self.require_initialized(ctx).await?;
        Ok(self.store.get_decimals(ctx).await?.unwrap_or_default())
    }

    /// The caller's identity as the platform and parser see it.
    pub async fn user_info(&self, ctx: &dyn LedgerContext) -> Result<UserInfo> {
        self.require_initialized(ctx).await?;

        let caller = ctx.caller()?;
        let identity = ClientIdentity::parse(&caller.id)?;
        Ok(UserInfo {
            client_id: caller.id,
            user_name: identity.user_name,
            org: identity.org,
            org_unit: identity.org_unit,
            membership_id: caller.membership_id,
            tx_id: ctx.tx_id(),
        })
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn require_initialized(&self, ctx: &dyn LedgerContext) -> Result<()> {
        if self.store.is_initialized(ctx).await? {
            Ok(())
        } else {
            Err(TokenError::NotInitialized)
        }
    }

    fn parsed_caller(&self, ctx: &dyn LedgerContext) -> Result<ClientIdentity> {
        let caller: CallerInfo = ctx.caller()?;
        Ok(ClientIdentity::parse(&caller.id)?)
    }

    fn build_record(
        &self,
        ctx: &dyn LedgerContext,
        kind: TransactionKind,
        from: &str,
        to: &str,
        amount: i64,
        spender: Option<&str>,
    ) -> TransactionRecord {
        TransactionRecord {
            tx_id: ctx.tx_id(),
            timestamp: ctx.tx_timestamp(),
            from: from.to_string(),
            to: to.to_string(),
            amount,
            kind,
            spender: spender.map(str::to_string),
            from_org: derive_org(from),
            to_org: derive_org(to),
        }
    }

    async fn emit_transfer(
        &self,
        ctx: &dyn LedgerContext,
        from: &str,
        to: &str,
        value: i64,
    ) -> Result<()> {
        let payload = serde_json::to_vec(&TransferEvent {
            from: from.to_string(),
            to: to.to_string(),
            value,
        })?;
        ctx.set_event(TRANSFER_EVENT, payload).await?;
        Ok(())
    }
}

impl Default for TokenContract {
    fn default() -> Self {
        Self::new(TokenConfig::default())
    }
}

/// Organizational affiliation of an endpoint, when its id parses as an
/// identity token. The zero-address sentinel has none.
fn derive_org(id: &str) -> Option<String> {
    if id == ZERO_ADDRESS {
        return None;
    }
    ClientIdentity::parse(id).ok().map(|identity| identity.org)
}
