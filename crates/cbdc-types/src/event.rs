//! Notification event payloads
//!
//! Events are emitted through the platform context and delivered to
//! external subscribers after the unit of work commits. Payload shapes
//! follow the common token-standard convention.

use serde::{Deserialize, Serialize};

/// Event name for balance movements (mint, burn, transfer, transferFrom)
pub const TRANSFER_EVENT: &str = "Transfer";

/// Event name for allowance grants
pub const APPROVAL_EVENT: &str = "Approval";

/// Payload of a `Transfer` event
///
/// Mints use the zero-address sentinel as `from`, burns as `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    pub from: String,
    pub to: String,
    pub value: i64,
}

/// Payload of an `Approval` event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalEvent {
    pub owner: String,
    pub spender: String,
    pub value: i64,
}
