//! Renderer-agnostic projection of a [`ViewState`] into display strings.

use serde::Serialize;
use shared::domain::{LedgerStats, WorkOrder};

use crate::{session::AccountSession, view_state::ViewState};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsView {
    pub available_tokens: Option<String>,
    pub reserve_balance: Option<String>,
    pub payment_token_balance: Option<String>,
    pub redemption_fee: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkOrderRow {
    pub id: u64,
    pub status: String,
    pub yield_amount: String,
    pub reserve_amount: Option<String>,
    pub tokens_issued: Option<String>,
    pub model: Option<String>,
    pub serial: Option<String>,
    pub tonnage: Option<String>,
    pub description: String,
    pub created: Option<String>,
    pub paid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub stats: StatsView,
    pub rows: Vec<WorkOrderRow>,
    pub total_orders: usize,
    pub total_yield: String,
    pub paid_percent: String,
    pub show_admin_controls: bool,
    pub account: Option<String>,
}

fn stats_view(stats: &LedgerStats) -> StatsView {
    StatsView {
        available_tokens: stats.available_tokens.map(|v| v.to_string()),
        reserve_balance: stats.reserve_balance.map(|v| v.to_string()),
        payment_token_balance: stats.payment_token_balance.map(|v| v.to_string()),
        redemption_fee: stats.redemption_fee_percent.map(|v| format!("{v}%")),
    }
}

fn row(order: &WorkOrder) -> WorkOrderRow {
    WorkOrderRow {
        id: order.id.0,
        status: order.status.label().to_string(),
        yield_amount: order.yield_amount.to_string(),
        reserve_amount: order.reserve_amount.map(|v| v.to_string()),
        tokens_issued: order.tokens_issued.map(|v| v.to_string()),
        model: order.equipment.as_ref().map(|e| e.model.clone()),
        serial: order.equipment.as_ref().map(|e| e.serial.clone()),
        tonnage: order.equipment.as_ref().map(|e| e.tonnage.to_string()),
        description: order.description.clone(),
        created: order
            .created_at
            .map(|at| at.format("%Y-%m-%d").to_string()),
        paid: order.is_paid(),
    }
}

pub fn build_view(state: &ViewState, session: Option<&AccountSession>) -> DashboardView {
    let aggregates = state.aggregates();
    DashboardView {
        stats: stats_view(state.stats()),
        rows: state.visible_orders().map(row).collect(),
        total_orders: state.orders().len(),
        total_yield: aggregates.total_yield_label(),
        paid_percent: aggregates.paid_percent_label(),
        show_admin_controls: session.is_some_and(|s| s.is_administrator),
        account: session.map(|s| s.address.to_string()),
    }
}
