//! Transaction records
//!
//! One immutable record is appended per mutating operation, in the same
//! unit of work as the balance mutation it describes. In
//! `PrivacyMode::Partitioned` the records live in the restricted
//! partition; only the aggregate facts (supply, metadata) stay public.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of operation a transaction record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransactionKind {
    Mint,
    Burn,
    Transfer,
    Approve,
    TransferFrom,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mint => "mint",
            Self::Burn => "burn",
            Self::Transfer => "transfer",
            Self::Approve => "approve",
            Self::TransferFrom => "transferFrom",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable, append-only transaction record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Platform transaction identifier
    pub tx_id: String,
    /// Platform transaction timestamp
    pub timestamp: DateTime<Utc>,
    /// Source account (the zero-address sentinel for mints)
    pub from: String,
    /// Destination account (the zero-address sentinel for burns)
    pub to: String,
    /// Amount moved (the approved cap for approvals)
    pub amount: i64,
    /// Operation kind
    pub kind: TransactionKind,
    /// Delegated spender, for transferFrom and approve
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spender: Option<String>,
    /// Organizational affiliation of `from`, when derivable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_org: Option<String>,
    /// Organizational affiliation of `to`, when derivable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_org: Option<String>,
}

impl TransactionRecord {
    /// Whether `account` is either endpoint of this record
    pub fn involves(&self, account: &str) -> bool {
        self.from == account || self.to == account
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> TransactionRecord {
        TransactionRecord {
            tx_id: "tx-1".to_string(),
            timestamp: Utc::now(),
            from: "alice".to_string(),
            to: "bob".to_string(),
            amount: 100,
            kind: TransactionKind::Transfer,
            spender: None,
            from_org: Some("org1.example.com".to_string()),
            to_org: Some("org2.example.com".to_string()),
        }
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(TransactionKind::TransferFrom.as_str(), "transferFrom");
        assert_eq!(
            serde_json::to_string(&TransactionKind::TransferFrom).unwrap(),
            "\"transferFrom\""
        );
    }

    #[test]
    fn test_involves() {
        let record = sample_record();
        assert!(record.involves("alice"));
        assert!(record.involves("bob"));
        assert!(!record.involves("carol"));
    }

    #[test]
    fn test_optional_fields_omitted() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("spender"));
        assert!(json.contains("fromOrg"));
    }
}
