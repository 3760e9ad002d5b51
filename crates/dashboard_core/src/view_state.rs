use std::sync::Arc;

use chrono::{DateTime, Utc};
use shared::domain::{LedgerStats, WorkOrder};

use crate::filter::{visible_indices, Aggregates, FilterCriteria};

/// Snapshot of the last successful sync plus the filter applied to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    stats: LedgerStats,
    orders: Arc<Vec<WorkOrder>>,
    filter: FilterCriteria,
    visible: Vec<usize>,
    aggregates: Aggregates,
    generation: u64,
    refreshed_at: Option<DateTime<Utc>>,
}

impl ViewState {
    pub fn stats(&self) -> &LedgerStats {
        &self.stats
    }

    /// Full collection in ledger order, ignoring the filter.
    pub fn orders(&self) -> &[WorkOrder] {
        &self.orders
    }

    pub fn visible_orders(&self) -> impl Iterator<Item = &WorkOrder> + '_ {
        self.visible.iter().filter_map(|index| self.orders.get(*index))
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn filter(&self) -> &FilterCriteria {
        &self.filter
    }

    pub fn aggregates(&self) -> &Aggregates {
        &self.aggregates
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }

    pub(crate) fn with_refresh(
        &self,
        stats: LedgerStats,
        orders: Vec<WorkOrder>,
        refreshed_at: DateTime<Utc>,
    ) -> Self {
        let visible = visible_indices(&orders, &self.filter);
        let aggregates = Aggregates::compute(&orders);
        Self {
            stats,
            orders: Arc::new(orders),
            filter: self.filter.clone(),
            visible,
            aggregates,
            generation: self.generation + 1,
            refreshed_at: Some(refreshed_at),
        }
    }

    pub(crate) fn with_filter(&self, filter: FilterCriteria) -> Self {
        Self {
            stats: self.stats.clone(),
            orders: Arc::clone(&self.orders),
            visible: visible_indices(&self.orders, &filter),
            aggregates: Aggregates::compute(&self.orders),
            filter,
            generation: self.generation,
            refreshed_at: self.refreshed_at,
        }
    }
}
