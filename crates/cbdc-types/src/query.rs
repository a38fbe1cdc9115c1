//! Query filter and pagination types
//!
//! Pagination is offset-based and applied client-side over the full
//! filtered result set; `next_offset` is -1 once the set is exhausted.

use crate::{TransactionKind, TransactionRecord};
use serde::{Deserialize, Serialize};

/// Largest page a single query may return
pub const MAX_PAGE_SIZE: usize = 100;

/// Optional predicates narrowing a transaction query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    /// Inclusive lower bound on amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_amount: Option<i64>,
    /// Inclusive upper bound on amount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_amount: Option<i64>,
    /// Restrict to one operation kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<TransactionKind>,
    /// Restrict to records with this account as an endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
}

impl TransactionFilter {
    /// Whether `record` satisfies every set predicate.
    pub fn matches(&self, record: &TransactionRecord) -> bool {
        if let Some(min) = self.min_amount {
            if record.amount < min {
                return false;
            }
        }
        if let Some(max) = self.max_amount {
            if record.amount > max {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if record.kind != kind {
                return false;
            }
        }
        if let Some(ref counterparty) = self.counterparty {
            if !record.involves(counterparty) {
                return false;
            }
        }
        true
    }
}

/// A pagination request, as received from the caller.
///
/// Raw values may be out of range; `clamped()` normalizes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page_size: i64,
    pub offset: i64,
}

impl PageRequest {
    pub fn new(page_size: i64, offset: i64) -> Self {
        Self { page_size, offset }
    }

    /// Clamp page size into 1..=MAX_PAGE_SIZE and offset to >= 0.
    pub fn clamped(&self) -> (usize, usize) {
        let page_size = self.page_size.clamp(1, MAX_PAGE_SIZE as i64) as usize;
        let offset = self.offset.max(0) as usize;
        (page_size, offset)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page_size: 20,
            offset: 0,
        }
    }
}

/// One page of a transaction query plus pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPage {
    pub transactions: Vec<TransactionRecord>,
    /// Size of the full filtered result set
    pub total_count: usize,
    /// Page size after clamping
    pub page_size: usize,
    /// Offset after clamping
    pub offset: usize,
    /// Whether records remain past this page
    pub has_more: bool,
    /// Offset of the next page, or -1 when exhausted
    pub next_offset: i64,
}

impl TransactionPage {
    /// Slice one page out of the full filtered result set.
    pub fn paginate(filtered: Vec<TransactionRecord>, request: &PageRequest) -> Self {
        let (page_size, offset) = request.clamped();
        let total_count = filtered.len();

        let transactions: Vec<TransactionRecord> = filtered
            .into_iter()
            .skip(offset)
            .take(page_size)
            .collect();

        let has_more = offset + transactions.len() < total_count;
        let next_offset = if has_more {
            (offset + transactions.len()) as i64
        } else {
            -1
        };

        Self {
            transactions,
            total_count,
            page_size,
            offset,
            has_more,
            next_offset,
        }
    }
}
