use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::MutationKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("value is empty")]
    Empty,
    #[error("value must not be negative: {0}")]
    Negative(String),
    #[error("malformed number: {0}")]
    Malformed(String),
    #[error("too many decimal places in {input} (max {max_decimals})")]
    TooPrecise { input: String, max_decimals: usize },
    #[error("number out of range: {0}")]
    Overflow(String),
    #[error("malformed address: {0}")]
    Address(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryName {
    AvailableTokens,
    ReserveBalance,
    PaymentTokenBalance,
    RedemptionFee,
    WorkOrderCount,
    WorkOrder(u64),
    Owner,
}

impl std::fmt::Display for QueryName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AvailableTokens => f.write_str("available tokens"),
            Self::ReserveBalance => f.write_str("reserve balance"),
            Self::PaymentTokenBalance => f.write_str("payment token balance"),
            Self::RedemptionFee => f.write_str("redemption fee"),
            Self::WorkOrderCount => f.write_str("work order count"),
            Self::WorkOrder(id) => write!(f, "work order #{id}"),
            Self::Owner => f.write_str("owner"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("read of {query} failed: {cause}")]
pub struct ReadFailure {
    pub query: QueryName,
    pub cause: String,
}

impl ReadFailure {
    pub fn new(query: QueryName, cause: impl Into<String>) -> Self {
        Self {
            query,
            cause: cause.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    UserDeclined,
    Reverted,
    Network,
    Unsupported,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} was not applied ({reason:?}): {message}")]
pub struct MutationFailure {
    pub kind: MutationKind,
    pub reason: RejectionReason,
    pub message: String,
}

impl MutationFailure {
    pub fn new(kind: MutationKind, reason: RejectionReason, message: impl Into<String>) -> Self {
        Self {
            kind,
            reason,
            message: message.into(),
        }
    }
}
