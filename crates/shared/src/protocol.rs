use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    amount::Amount,
    domain::{EquipmentDetails, WorkOrderId},
    error::ValidationFailure,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Buy,
    Redeem,
    Mint,
    Cancel,
    WithdrawFees,
    SetFee,
}

impl MutationKind {
    /// Kinds that only the contract owner may successfully submit.
    pub fn is_administrative(self) -> bool {
        matches!(
            self,
            Self::Mint | Self::Cancel | Self::WithdrawFees | Self::SetFee
        )
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Buy => "buy",
            Self::Redeem => "redeem",
            Self::Mint => "mint",
            Self::Cancel => "cancel",
            Self::WithdrawFees => "withdraw-fees",
            Self::SetFee => "set-fee",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentInput {
    pub model: String,
    pub serial: String,
    pub tonnage: String,
}

/// A mutation as entered by the user: numeric fields are still raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MutationRequest {
    Buy {
        amount: String,
    },
    Redeem {
        amount: String,
    },
    Mint {
        yield_amount: String,
        description: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        equipment: Option<EquipmentInput>,
    },
    Cancel {
        work_order_id: String,
    },
    WithdrawFees,
    SetFee {
        percent: String,
    },
}

impl MutationRequest {
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Buy { .. } => MutationKind::Buy,
            Self::Redeem { .. } => MutationKind::Redeem,
            Self::Mint { .. } => MutationKind::Mint,
            Self::Cancel { .. } => MutationKind::Cancel,
            Self::WithdrawFees => MutationKind::WithdrawFees,
            Self::SetFee { .. } => MutationKind::SetFee,
        }
    }

    /// Checks that every numeric field parses; nothing else is enforced locally.
    pub fn validate(&self) -> Result<LedgerMutation, ValidationFailure> {
        Ok(match self {
            Self::Buy { amount } => LedgerMutation::Buy {
                amount: Amount::parse(amount)?,
            },
            Self::Redeem { amount } => LedgerMutation::Redeem {
                amount: Amount::parse(amount)?,
            },
            Self::Mint {
                yield_amount,
                description,
                equipment,
            } => LedgerMutation::Mint {
                yield_amount: Amount::parse(yield_amount)?,
                description: description.clone(),
                equipment: equipment
                    .as_ref()
                    .map(|input| {
                        Ok::<_, ValidationFailure>(EquipmentDetails {
                            model: input.model.clone(),
                            serial: input.serial.clone(),
                            tonnage: parse_whole_number(&input.tonnage)?,
                        })
                    })
                    .transpose()?,
            },
            Self::Cancel { work_order_id } => LedgerMutation::Cancel {
                work_order_id: WorkOrderId(parse_whole_number(work_order_id)?),
            },
            Self::WithdrawFees => LedgerMutation::WithdrawFees,
            Self::SetFee { percent } => LedgerMutation::SetFee {
                percent: parse_whole_number(percent)?,
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerMutation {
    Buy {
        amount: Amount,
    },
    Redeem {
        amount: Amount,
    },
    Mint {
        yield_amount: Amount,
        description: String,
        equipment: Option<EquipmentDetails>,
    },
    Cancel {
        work_order_id: WorkOrderId,
    },
    WithdrawFees,
    SetFee {
        percent: u64,
    },
}

impl LedgerMutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Buy { .. } => MutationKind::Buy,
            Self::Redeem { .. } => MutationKind::Redeem,
            Self::Mint { .. } => MutationKind::Mint,
            Self::Cancel { .. } => MutationKind::Cancel,
            Self::WithdrawFees => MutationKind::WithdrawFees,
            Self::SetFee { .. } => MutationKind::SetFee,
        }
    }
}

pub fn parse_whole_number(input: &str) -> Result<u64, ValidationFailure> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationFailure::Empty);
    }
    if trimmed.starts_with('-') {
        return Err(ValidationFailure::Negative(trimmed.to_string()));
    }
    if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationFailure::Malformed(trimmed.to_string()));
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| ValidationFailure::Overflow(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_buy_amount() {
        let request = MutationRequest::Buy {
            amount: "1.5".into(),
        };
        assert_eq!(
            request.validate(),
            Ok(LedgerMutation::Buy {
                amount: Amount::parse("1.5").expect("amount"),
            })
        );
    }

    #[test]
    fn rejects_negative_redeem() {
        let request = MutationRequest::Redeem {
            amount: "-2".into(),
        };
        assert!(matches!(
            request.validate(),
            Err(ValidationFailure::Negative(_))
        ));
    }

    #[test]
    fn rejects_fractional_work_order_id() {
        let request = MutationRequest::Cancel {
            work_order_id: "1.5".into(),
        };
        assert!(matches!(
            request.validate(),
            Err(ValidationFailure::Malformed(_))
        ));
    }

    #[test]
    fn mint_parses_equipment_tonnage() {
        let request = MutationRequest::Mint {
            yield_amount: "10".into(),
            description: "excavation".into(),
            equipment: Some(EquipmentInput {
                model: "CAT 320".into(),
                serial: "SN-9".into(),
                tonnage: "abc".into(),
            }),
        };
        assert!(matches!(
            request.validate(),
            Err(ValidationFailure::Malformed(_))
        ));
    }

    #[test]
    fn administrative_kinds() {
        assert!(!MutationKind::Buy.is_administrative());
        assert!(!MutationKind::Redeem.is_administrative());
        assert!(MutationKind::Mint.is_administrative());
        assert!(MutationKind::SetFee.is_administrative());
    }

    #[test]
    fn request_serializes_with_type_tag() {
        let json = serde_json::to_value(MutationRequest::SetFee {
            percent: "3".into(),
        })
        .expect("serialize");
        assert_eq!(json["type"], "set_fee");
        assert_eq!(json["payload"]["percent"], "3");
    }
}
