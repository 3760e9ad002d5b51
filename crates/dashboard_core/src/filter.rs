use primitive_types::{U256, U512};
use serde::{Deserialize, Serialize};
use shared::{amount::Amount, domain::WorkOrder};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Case-insensitive substring matched against model, serial and description.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub unpaid_only: bool,
}

impl FilterCriteria {
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            search: Some(text.into()),
            unpaid_only: false,
        }
    }

    pub fn unpaid_only() -> Self {
        Self {
            search: None,
            unpaid_only: true,
        }
    }

    pub fn matches(&self, order: &WorkOrder) -> bool {
        if self.unpaid_only && order.is_paid() {
            return false;
        }

        let Some(needle) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
        else {
            return true;
        };
        let needle = needle.to_lowercase();

        let mut fields = vec![order.description.as_str()];
        if let Some(equipment) = &order.equipment {
            fields.push(equipment.model.as_str());
            fields.push(equipment.serial.as_str());
        }
        fields
            .into_iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

pub fn visible_indices(orders: &[WorkOrder], criteria: &FilterCriteria) -> Vec<usize> {
    orders
        .iter()
        .enumerate()
        .filter(|(_, order)| criteria.matches(order))
        .map(|(index, _)| index)
        .collect()
}

/// Totals over the unfiltered collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregates {
    pub total_yield: Amount,
    pub paid_yield: Amount,
    pub unpaid_yield: Amount,
    /// Paid share in tenths of a percent; `None` when the total yield is zero.
    pub paid_percent_tenths: Option<u32>,
}

impl Aggregates {
    pub fn compute(orders: &[WorkOrder]) -> Self {
        let paid_yield: Amount = orders
            .iter()
            .filter(|order| order.is_paid())
            .map(|order| order.yield_amount)
            .sum();
        let unpaid_yield: Amount = orders
            .iter()
            .filter(|order| !order.is_paid())
            .map(|order| order.yield_amount)
            .sum();
        let total_yield = paid_yield.saturating_add(unpaid_yield);

        Self {
            total_yield,
            paid_yield,
            unpaid_yield,
            paid_percent_tenths: paid_tenths(paid_yield, total_yield),
        }
    }

    pub fn paid_percent(&self) -> f64 {
        self.paid_percent_tenths
            .map(|tenths| f64::from(tenths) / 10.0)
            .unwrap_or(0.0)
    }

    pub fn paid_percent_label(&self) -> String {
        match self.paid_percent_tenths {
            Some(tenths) => format!("{}.{}%", tenths / 10, tenths % 10),
            None => "0%".to_string(),
        }
    }

    pub fn total_yield_label(&self) -> String {
        self.total_yield.to_fixed(2)
    }
}

fn paid_tenths(paid: Amount, total: Amount) -> Option<u32> {
    if total.is_zero() {
        return None;
    }
    // paid * 1000 / total, rounded half up; widened so large totals stay exact.
    let total = U512::from(total.raw());
    let numerator = paid.raw().full_mul(U256::from(2000u64)) + total;
    let tenths = numerator / (total * U512::from(2u64));
    Some(tenths.min(U512::from(1000u64)).low_u32())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{EquipmentDetails, WorkOrderId, WorkOrderStatus};

    fn order(id: u64, yield_units: u64, status: WorkOrderStatus) -> WorkOrder {
        WorkOrder {
            id: WorkOrderId(id),
            description: format!("order {id}"),
            equipment: None,
            yield_amount: Amount::from_units(yield_units),
            reserve_amount: None,
            tokens_issued: None,
            status,
            created_at: None,
        }
    }

    #[test]
    fn paid_and_unpaid_partition_total() {
        let orders = vec![
            order(0, 5, WorkOrderStatus::Paid),
            order(1, 3, WorkOrderStatus::Open),
            order(2, 7, WorkOrderStatus::Cancelled),
        ];
        let agg = Aggregates::compute(&orders);
        assert_eq!(
            agg.total_yield,
            agg.paid_yield.saturating_add(agg.unpaid_yield)
        );
        assert_eq!(agg.total_yield, Amount::from_units(15));
    }

    #[test]
    fn paid_share_of_mixed_collection() {
        let orders = vec![
            order(0, 5, WorkOrderStatus::Paid),
            order(1, 3, WorkOrderStatus::Open),
        ];
        let agg = Aggregates::compute(&orders);
        assert_eq!(agg.total_yield_label(), "8.00");
        assert_eq!(agg.paid_percent_label(), "62.5%");
        assert!((agg.paid_percent() - 62.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_collection_has_zero_share() {
        let agg = Aggregates::compute(&[]);
        assert_eq!(agg.total_yield_label(), "0.00");
        assert_eq!(agg.paid_percent_label(), "0%");
        assert_eq!(agg.paid_percent(), 0.0);
    }

    #[test]
    fn zero_yield_orders_have_zero_share() {
        let agg = Aggregates::compute(&[order(0, 0, WorkOrderStatus::Paid)]);
        assert_eq!(agg.paid_percent_tenths, None);
        assert_eq!(agg.paid_percent_label(), "0%");
    }

    #[test]
    fn share_stays_within_bounds_and_rounds() {
        let all_paid = Aggregates::compute(&[order(0, 4, WorkOrderStatus::Paid)]);
        assert_eq!(all_paid.paid_percent_label(), "100.0%");

        let third = Aggregates::compute(&[
            order(0, 1, WorkOrderStatus::Paid),
            order(1, 2, WorkOrderStatus::Open),
        ]);
        assert_eq!(third.paid_percent_label(), "33.3%");

        let two_thirds = Aggregates::compute(&[
            order(0, 2, WorkOrderStatus::Paid),
            order(1, 1, WorkOrderStatus::Open),
        ]);
        assert_eq!(two_thirds.paid_percent_label(), "66.7%");
        assert!((0.0..=100.0).contains(&two_thirds.paid_percent()));
    }

    #[test]
    fn share_is_exact_for_very_large_yields() {
        let quarter = Amount::from_raw(U256::MAX / 4);
        let mut paid = order(0, 0, WorkOrderStatus::Paid);
        paid.yield_amount = quarter;
        let mut open = order(1, 0, WorkOrderStatus::Open);
        open.yield_amount = quarter;
        assert_eq!(
            Aggregates::compute(&[paid.clone(), open]).paid_percent_label(),
            "50.0%"
        );

        let eighth = Amount::from_raw(U256::MAX / 8);
        paid.yield_amount = eighth;
        let mut rest = order(1, 0, WorkOrderStatus::Open);
        rest.yield_amount = Amount::from_raw(eighth.raw() * 3);
        assert_eq!(
            Aggregates::compute(&[paid, rest]).paid_percent_label(),
            "25.0%"
        );
    }

    #[test]
    fn unpaid_only_keeps_open_and_cancelled() {
        let orders = vec![
            order(0, 5, WorkOrderStatus::Paid),
            order(1, 3, WorkOrderStatus::Open),
        ];
        assert_eq!(visible_indices(&orders, &FilterCriteria::unpaid_only()), vec![1]);
    }

    #[test]
    fn search_is_case_insensitive_over_equipment_fields() {
        let mut dozer = order(0, 1, WorkOrderStatus::Open);
        dozer.equipment = Some(EquipmentDetails {
            model: "D6 Dozer".into(),
            serial: "CAT-0042".into(),
            tonnage: 20,
        });
        let plain = order(1, 1, WorkOrderStatus::Open);
        let orders = vec![dozer, plain];

        assert_eq!(visible_indices(&orders, &FilterCriteria::search("dozer")), vec![0]);
        assert_eq!(visible_indices(&orders, &FilterCriteria::search("cat-00")), vec![0]);
        assert_eq!(visible_indices(&orders, &FilterCriteria::search("ORDER 1")), vec![1]);
        assert_eq!(visible_indices(&orders, &FilterCriteria::search("  ")), vec![0, 1]);
    }
}
