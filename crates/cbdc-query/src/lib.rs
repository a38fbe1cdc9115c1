//! CBDC Query - Read-only retrieval of transaction history
//!
//! Independent of the mutation flow but sharing the ledger store's
//! record format and the access evaluator. Two surfaces:
//!
//! - [`QueryEngine::query_user_transactions`]: records where one named
//!   account is an endpoint, gated on the caller's right to view that
//!   account
//! - [`QueryEngine::query_all_transactions`]: everything the caller's
//!   role allows them to see
//!
//! Both narrow by optional predicates (kind, inclusive amount range,
//! counterparty) and paginate client-side over the full filtered result
//! set with clamped page size and offset.

use cbdc_access::AccessEvaluator;
use cbdc_identity::{ClientIdentity, IdentityError};
use cbdc_ledger::{LedgerError, LedgerStore};
use cbdc_state::{LedgerContext, StateError};
use cbdc_types::{PageRequest, TransactionFilter, TransactionPage, TransactionRecord};
use thiserror::Error;
use tracing::debug;

/// Result type for query operations
pub type Result<T> = std::result::Result<T, QueryError>;

/// Errors from the query engine
#[derive(Debug, Error)]
pub enum QueryError {
    /// Queries are unavailable before Initialize
    #[error("contract options need to be set before calling any function, call Initialize() first")]
    NotInitialized,

    /// The caller may not view the requested account's history
    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    /// The caller's identity token could not be decoded
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    /// The bookkeeping layer failed
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The world state failed
    #[error("state error: {0}")]
    State(#[from] StateError),
}

/// Caller-scoped retrieval over the ledger store's records
#[derive(Debug, Clone)]
pub struct QueryEngine {
    access: AccessEvaluator,
    store: LedgerStore,
}

impl QueryEngine {
    pub fn new(access: AccessEvaluator, store: LedgerStore) -> Self {
        Self { access, store }
    }

    /// Page through transactions where `user_id` is an endpoint.
    ///
    /// Allowed for the account itself, the central authority, and
    /// same-organization administrators.
    pub async fn query_user_transactions(
        &self,
        ctx: &dyn LedgerContext,
        user_id: &str,
        filter: &TransactionFilter,
        page: &PageRequest,
    ) -> Result<TransactionPage> {
        self.require_initialized(ctx).await?;

        let caller = self.parsed_caller(ctx)?;
        if !self.access.can_view_account(&caller, user_id) {
            return Err(QueryError::Unauthorized {
                reason: "client is not authorized to view this account's transactions"
                    .to_string(),
            });
        }

        let matched = self
            .collect_records(ctx, |record| {
                record.involves(user_id) && filter.matches(record)
            })
            .await?;

        debug!(user = %caller.user_name, matched = matched.len(), "user transaction query");
        Ok(TransactionPage::paginate(matched, page))
    }

    /// Page through every transaction the caller's role may see:
    /// the central authority sees everything, an organization
    /// administrator sees transactions touching their organization,
    /// ordinary callers see only their own.
    pub async fn query_all_transactions(
        &self,
        ctx: &dyn LedgerContext,
        filter: &TransactionFilter,
        page: &PageRequest,
    ) -> Result<TransactionPage> {
        self.require_initialized(ctx).await?;

        let caller = self.parsed_caller(ctx)?;
        let matched = self
            .collect_records(ctx, |record| {
                self.access.can_view_record(&caller, record) && filter.matches(record)
            })
            .await?;

        debug!(user = %caller.user_name, matched = matched.len(), "all transaction query");
        Ok(TransactionPage::paginate(matched, page))
    }

    /// Scan, filter, and order records deterministically.
    async fn collect_records(
        &self,
        ctx: &dyn LedgerContext,
        keep: impl Fn(&TransactionRecord) -> bool,
    ) -> Result<Vec<TransactionRecord>> {
        let mut records: Vec<TransactionRecord> = self
            .store
            .records(ctx)
            .await?
            .into_iter()
            .filter(|record| keep(record))
            .collect();
        records.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.tx_id.cmp(&b.tx_id))
        });
        Ok(records)
    }

    async fn require_initialized(&self, ctx: &dyn LedgerContext) -> Result<()> {
        if self.store.is_initialized(ctx).await? {
            Ok(())
        } else {
            Err(QueryError::NotInitialized)
        }
    }

    fn parsed_caller(&self, ctx: &dyn LedgerContext) -> Result<ClientIdentity> {
        let caller = ctx.caller()?;
        Ok(ClientIdentity::parse(&caller.id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use cbdc_state::MemoryLedgerContext;
    use cbdc_token::TokenContract;
    use cbdc_types::TransactionKind;

    const ISSUER_MSP: &str = "CentralBankMSP";

    fn identity_token(cn: &str, ou: &str) -> String {
        BASE64.encode(format!("x509::CN={cn},OU={ou}::O=TestCA"))
    }

    /// Seeds a ledger with a mint and a fan of transfers, returning the
    /// shared store and the engine wired to the same configuration.
    async fn seeded() -> (MemoryLedgerContext, QueryEngine, Accounts) {
        let store = MemoryLedgerContext::new();
        let contract = TokenContract::default();
        let engine = QueryEngine::new(contract.access().clone(), contract.store().clone());

        let accounts = Accounts {
            minter: identity_token("minter@centralbank.example.com", "client"),
            alice: identity_token("Alice@org1.example.com", "client"),
            bob: identity_token("Bob@org2.example.com", "client"),
        };

        let minter = store.as_caller(&accounts.minter, ISSUER_MSP);
        contract.initialize(&minter, "CBDC", "CBDC", 2).await.unwrap();
        contract.mint(&minter, 1000).await.unwrap();
        contract.transfer(&minter, &accounts.alice, 300).await.unwrap();
        contract.transfer(&minter, &accounts.bob, 200).await.unwrap();

        let alice = store.as_caller(&accounts.alice, "Org1MSP");
        contract.transfer(&alice, &accounts.bob, 50).await.unwrap();

        (store, engine, accounts)
    }

    struct Accounts {
        minter: String,
        alice: String,
        bob: String,
    }

    #[tokio::test]
    async fn test_query_requires_initialization() {
        let store = MemoryLedgerContext::new();
        let contract = TokenContract::default();
        let engine = QueryEngine::new(contract.access().clone(), contract.store().clone());

        let ctx = store.as_caller(identity_token("User1@org1.example.com", "client"), "Org1MSP");
        let result = engine
            .query_all_transactions(&ctx, &TransactionFilter::default(), &PageRequest::default())
            .await;
        assert!(matches!(result, Err(QueryError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_self_query_sees_own_endpoints_only() {
        let (store, engine, accounts) = seeded().await;

        let alice = store.as_caller(&accounts.alice, "Org1MSP");
        let page = engine
            .query_user_transactions(
                &alice,
                &accounts.alice,
                &TransactionFilter::default(),
                &PageRequest::default(),
            )
            .await
            .unwrap();

        // minter->alice and alice->bob
        assert_eq!(page.total_count, 2);
        assert!(page
            .transactions
            .iter()
            .all(|record| record.involves(&accounts.alice)));
        assert!(!page.has_more);
        assert_eq!(page.next_offset, -1);
    }

    #[tokio::test]
    async fn test_user_query_authorization() {
        let (store, engine, accounts) = seeded().await;

        // Another ordinary user may not read alice's history.
        let bob = store.as_caller(&accounts.bob, "Org2MSP");
        let result = engine
            .query_user_transactions(
                &bob,
                &accounts.alice,
                &TransactionFilter::default(),
                &PageRequest::default(),
            )
            .await;
        assert!(matches!(result, Err(QueryError::Unauthorized { .. })));

        // The central authority may.
        let auditor = store.as_caller(
            identity_token("auditor@centralbank.example.com", "client"),
            ISSUER_MSP,
        );
        let page = engine
            .query_user_transactions(
                &auditor,
                &accounts.alice,
                &TransactionFilter::default(),
                &PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);

        // A same-organization administrator may as well.
        let admin = store.as_caller(identity_token("Admin@org1.example.com", "admin"), "Org1MSP");
        let page = engine
            .query_user_transactions(
                &admin,
                &accounts.alice,
                &TransactionFilter::default(),
                &PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);
    }

    #[tokio::test]
    async fn test_filters_narrow_results() {
        let (store, engine, accounts) = seeded().await;
        let auditor = store.as_caller(
            identity_token("auditor@centralbank.example.com", "client"),
            ISSUER_MSP,
        );

        let page = engine
            .query_user_transactions(
                &auditor,
                &accounts.minter,
                &TransactionFilter {
                    kind: Some(TransactionKind::Transfer),
                    min_amount: Some(250),
                    ..Default::default()
                },
                &PageRequest::default(),
            )
            .await
            .unwrap();
        // Only minter->alice (300) survives kind + amount narrowing.
        assert_eq!(page.total_count, 1);
        assert_eq!(page.transactions[0].amount, 300);

        let page = engine
            .query_user_transactions(
                &auditor,
                &accounts.minter,
                &TransactionFilter {
                    counterparty: Some(accounts.bob.clone()),
                    ..Default::default()
                },
                &PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.transactions[0].to, accounts.bob);
    }

    #[tokio::test]
    async fn test_role_scoped_query_all() {
        let (store, engine, accounts) = seeded().await;

        // Central authority sees all four records (mint + 3 transfers).
        let auditor = store.as_caller(
            identity_token("auditor@centralbank.example.com", "client"),
            ISSUER_MSP,
        );
        let page = engine
            .query_all_transactions(&auditor, &TransactionFilter::default(), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_count, 4);

        // An org1 administrator sees records touching org1: the
        // minter->alice transfer and alice->bob.
        let admin = store.as_caller(identity_token("Admin@org1.example.com", "admin"), "Org1MSP");
        let page = engine
            .query_all_transactions(&admin, &TransactionFilter::default(), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);

        // An ordinary caller sees only their own records.
        let bob = store.as_caller(&accounts.bob, "Org2MSP");
        let page = engine
            .query_all_transactions(&bob, &TransactionFilter::default(), &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);
        assert!(page
            .transactions
            .iter()
            .all(|record| record.involves(&accounts.bob)));
    }

    #[tokio::test]
    async fn test_pagination_walks_the_result_set() {
        let (store, engine, _accounts) = seeded().await;
        let auditor = store.as_caller(
            identity_token("auditor@centralbank.example.com", "client"),
            ISSUER_MSP,
        );

        let filter = TransactionFilter::default();
        let first = engine
            .query_all_transactions(&auditor, &filter, &PageRequest::new(3, 0))
            .await
            .unwrap();
        assert_eq!(first.transactions.len(), 3);
        assert_eq!(first.total_count, 4);
        assert!(first.has_more);
        assert_eq!(first.next_offset, 3);

        let second = engine
            .query_all_transactions(&auditor, &filter, &PageRequest::new(3, first.next_offset))
            .await
            .unwrap();
        assert_eq!(second.transactions.len(), 1);
        assert!(!second.has_more);
        assert_eq!(second.next_offset, -1);

        // No overlap between pages.
        assert!(second
            .transactions
            .iter()
            .all(|record| !first.transactions.contains(record)));

        // Out-of-range requests are clamped, not rejected.
        let clamped = engine
            .query_all_transactions(&auditor, &filter, &PageRequest::new(500, -3))
            .await
            .unwrap();
        assert_eq!(clamped.page_size, 100);
        assert_eq!(clamped.offset, 0);
        assert_eq!(clamped.transactions.len(), 4);
    }
}
