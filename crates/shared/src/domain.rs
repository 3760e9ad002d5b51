use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{amount::Amount, error::ValidationFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WorkOrderId(pub u64);

impl fmt::Display for WorkOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = ValidationFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| ValidationFailure::Address(trimmed.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    Open,
    Paid,
    Cancelled,
}

impl WorkOrderStatus {
    /// A paid order is reported as paid even if the active flag lingers.
    pub fn from_flags(is_active: bool, is_paid: bool) -> Self {
        if is_paid {
            Self::Paid
        } else if is_active {
            Self::Open
        } else {
            Self::Cancelled
        }
    }

    pub fn is_active(self) -> bool {
        self == Self::Open
    }

    pub fn is_paid(self) -> bool {
        self == Self::Paid
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Open => "Active",
            Self::Paid => "Paid",
            Self::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentDetails {
    pub model: String,
    pub serial: String,
    pub tonnage: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: WorkOrderId,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<EquipmentDetails>,
    pub yield_amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve_amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_issued: Option<Amount>,
    pub status: WorkOrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl WorkOrder {
    pub fn is_paid(&self) -> bool {
        self.status.is_paid()
    }
}

/// Aggregate token and fee readings. `None` means never fetched successfully.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    pub available_tokens: Option<Amount>,
    pub reserve_balance: Option<Amount>,
    pub payment_token_balance: Option<Amount>,
    pub redemption_fee_percent: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractVariant {
    ReserveBacked,
    Equipment,
}

impl FromStr for ContractVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reserve" | "reserve_backed" | "v1" => Ok(Self::ReserveBacked),
            "equipment" | "v2" => Ok(Self::Equipment),
            other => Err(format!("unknown contract variant: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerCapabilities {
    pub variant: ContractVariant,
    pub owner_query: bool,
}

impl LedgerCapabilities {
    pub fn new(variant: ContractVariant, owner_query: bool) -> Self {
        Self {
            variant,
            owner_query,
        }
    }

    pub fn reserve_fund(&self) -> bool {
        self.variant == ContractVariant::ReserveBacked
    }

    pub fn equipment_fields(&self) -> bool {
        self.variant == ContractVariant::Equipment
    }
}
