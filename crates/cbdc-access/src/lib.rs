//! CBDC Access - Capability checks for accounts and transaction records
//!
//! Authorization reduces to the relationship between the caller's
//! derived identity and the target:
//!
//! 1. Self-access is always granted
//! 2. The central authority (by derived organization) reads everything
//! 3. An organization administrator reads accounts and records affiliated
//!    with their own organization
//! 4. Everything else is denied
//!
//! Mint and Burn are gated separately on the caller's raw
//! organizational-membership identifier, which the platform asserts
//! independently of the certificate subject. That check never goes
//! through the identity parser.

use cbdc_identity::ClientIdentity;
use cbdc_types::TransactionRecord;
use serde::{Deserialize, Serialize};

/// Who may run Initialize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitializePolicy {
    /// Only the central issuer's members may initialize
    CentralIssuerOnly,
    /// Any caller may initialize (first writer wins)
    Unrestricted,
}

/// Whether an account may transfer to itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelfTransferPolicy {
    Allowed,
    Rejected,
}

/// Configuration for access decisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessPolicy {
    /// Derived organization granted all read access
    pub central_authority_domain: String,
    /// Raw membership identifier required for Mint/Burn
    pub central_issuer_msp: String,
    /// Subject OU marking an organization administrator
    pub admin_org_unit: String,
    /// Who may run Initialize
    pub initialize: InitializePolicy,
    /// Whether self-transfers are accepted
    pub self_transfer: SelfTransferPolicy,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            central_authority_domain: "centralbank.example.com".to_string(),
            central_issuer_msp: "CentralBankMSP".to_string(),
            admin_org_unit: "admin".to_string(),
            initialize: InitializePolicy::CentralIssuerOnly,
            self_transfer: SelfTransferPolicy::Rejected,
        }
    }
}

/// Evaluates capability checks against an [`AccessPolicy`]
#[derive(Debug, Clone)]
pub struct AccessEvaluator {
    policy: AccessPolicy,
}

impl AccessEvaluator {
    pub fn new(policy: AccessPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Whether the caller holds the central-authority read role.
    pub fn is_central_authority(&self, caller: &ClientIdentity) -> bool {
        caller.org == self.policy.central_authority_domain
    }

    /// Whether the caller is an administrator within their organization.
    pub fn is_org_admin(&self, caller: &ClientIdentity) -> bool {
        caller.org_unit.as_deref() == Some(self.policy.admin_org_unit.as_str())
    }

    /// The strict issuance gate: raw membership identifier equality.
    pub fn is_central_issuer(&self, membership_id: &str) -> bool {
        membership_id == self.policy.central_issuer_msp
    }

    /// Whether a caller with this membership identifier may Initialize.
    pub fn may_initialize(&self, membership_id: &str) -> bool {
        match self.policy.initialize {
            InitializePolicy::CentralIssuerOnly => self.is_central_issuer(membership_id),
            InitializePolicy::Unrestricted => true,
        }
    }

    /// Whether a self-transfer must be rejected.
    pub fn rejects_self_transfer(&self) -> bool {
        self.policy.self_transfer == SelfTransferPolicy::Rejected
    }

    /// May `caller` view the balance, account record, or history of
    /// `target_id`?
    ///
    /// Account ids are identity tokens, so the target's organizational
    /// affiliation is recovered by parsing the id itself. A target id
    /// that does not parse is only visible to itself and the central
    /// authority.
    pub fn can_view_account(&self, caller: &ClientIdentity, target_id: &str) -> bool {
        if caller.id == target_id {
            return true;
        }
        if self.is_central_authority(caller) {
            return true;
        }
        if self.is_org_admin(caller) {
            if let Ok(target) = ClientIdentity::parse(target_id) {
                return target.org == caller.org;
            }
        }
        false
    }

    /// Role-scoped record visibility, used by the query engine's
    /// broad query: central authority sees everything, an organization
    /// administrator sees records touching their organization, everyone
    /// else sees only records where they are an endpoint.
    pub fn can_view_record(&self, caller: &ClientIdentity, record: &TransactionRecord) -> bool {
        if record.involves(&caller.id) {
            return true;
        }
        if self.is_central_authority(caller) {
            return true;
        }
        if self.is_org_admin(caller) {
            return record.from_org.as_deref() == Some(caller.org.as_str())
                || record.to_org.as_deref() == Some(caller.org.as_str());
        }
        false
    }
}

impl Default for AccessEvaluator {
    fn default() -> Self {
        Self::new(AccessPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use cbdc_types::TransactionKind;
    use chrono::Utc;

    fn identity_token(cn: &str, ou: &str) -> String {
        BASE64.encode(format!("x509::CN={cn},OU={ou}::O=TestCA"))
    }

    fn parse(token: &str) -> ClientIdentity {
        ClientIdentity::parse(token).unwrap()
    }

    fn record(from: &str, to: &str, from_org: &str, to_org: &str) -> TransactionRecord {
        TransactionRecord {
            tx_id: "tx-1".to_string(),
            timestamp: Utc::now(),
            from: from.to_string(),
            to: to.to_string(),
            amount: 10,
            kind: TransactionKind::Transfer,
            spender: None,
            from_org: Some(from_org.to_string()),
            to_org: Some(to_org.to_string()),
        }
    }

    #[test]
    fn test_self_access_always_granted() {
        let evaluator = AccessEvaluator::default();
        let token = identity_token("User1@org1.example.com", "client");
        let caller = parse(&token);
        assert!(evaluator.can_view_account(&caller, &token));
    }

    #[test]
    fn test_central_authority_reads_everything() {
        let evaluator = AccessEvaluator::default();
        let caller = parse(&identity_token("auditor@centralbank.example.com", "client"));
        assert!(evaluator.is_central_authority(&caller));
        assert!(evaluator.can_view_account(&caller, "opaque-unparseable-id"));
    }

    #[test]
    fn test_org_admin_scoped_to_own_org() {
        let evaluator = AccessEvaluator::default();
        let admin = parse(&identity_token("Admin@org1.example.com", "admin"));
        assert!(evaluator.is_org_admin(&admin));

        let same_org = identity_token("User2@org1.example.com", "client");
        let other_org = identity_token("User3@org2.example.com", "client");
        assert!(evaluator.can_view_account(&admin, &same_org));
        assert!(!evaluator.can_view_account(&admin, &other_org));
    }

    #[test]
    fn test_ordinary_caller_denied() {
        let evaluator = AccessEvaluator::default();
        let caller = parse(&identity_token("User1@org1.example.com", "client"));
        let target = identity_token("User2@org1.example.com", "client");
        assert!(!evaluator.can_view_account(&caller, &target));
    }

    #[test]
    fn test_issuer_gate_uses_raw_membership() {
        let evaluator = AccessEvaluator::default();
        assert!(evaluator.is_central_issuer("CentralBankMSP"));
        assert!(!evaluator.is_central_issuer("Org1MSP"));
        // The derived central-authority domain does not satisfy the gate.
        assert!(!evaluator.is_central_issuer("centralbank.example.com"));
    }

    #[test]
    fn test_initialize_policy() {
        let evaluator = AccessEvaluator::default();
        assert!(evaluator.may_initialize("CentralBankMSP"));
        assert!(!evaluator.may_initialize("Org1MSP"));

        let open = AccessEvaluator::new(AccessPolicy {
            initialize: InitializePolicy::Unrestricted,
            ..AccessPolicy::default()
        });
        assert!(open.may_initialize("Org1MSP"));
    }

    #[test]
    fn test_record_visibility_scoping() {
        let evaluator = AccessEvaluator::default();
        let entry = record("a", "b", "org1.example.com", "org2.example.com");

        let central = parse(&identity_token("auditor@centralbank.example.com", "client"));
        assert!(evaluator.can_view_record(&central, &entry));

        let org1_admin = parse(&identity_token("Admin@org1.example.com", "admin"));
        assert!(evaluator.can_view_record(&org1_admin, &entry));

        let org3_admin = parse(&identity_token("Admin@org3.example.com", "admin"));
        assert!(!evaluator.can_view_record(&org3_admin, &entry));

        let ordinary = parse(&identity_token("User1@org1.example.com", "client"));
        assert!(!evaluator.can_view_record(&ordinary, &entry));
    }
}
