use std::fmt::Write as _;

use dashboard_core::{view_model::WorkOrderRow, DashboardView};
use shared::domain::ContractVariant;

type Column = (&'static str, fn(&WorkOrderRow) -> String);

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "-".to_string())
}

fn col(header: &'static str, cell: fn(&WorkOrderRow) -> String) -> Column {
    (header, cell)
}

fn columns(variant: ContractVariant) -> Vec<Column> {
    match variant {
        ContractVariant::ReserveBacked => vec![
            col("ID", |r| r.id.to_string()),
            col("Yield", |r| r.yield_amount.clone()),
            col("Reserve", |r| opt(&r.reserve_amount)),
            col("Tokens", |r| opt(&r.tokens_issued)),
            col("Status", |r| r.status.clone()),
            col("Description", |r| r.description.clone()),
            col("Date", |r| opt(&r.created)),
        ],
        ContractVariant::Equipment => vec![
            col("ID", |r| r.id.to_string()),
            col("Model", |r| opt(&r.model)),
            col("Serial", |r| opt(&r.serial)),
            col("Tonnage", |r| opt(&r.tonnage)),
            col("Yield", |r| r.yield_amount.clone()),
            col("Status", |r| r.status.clone()),
            col("Description", |r| r.description.clone()),
        ],
    }
}

fn stat_line(out: &mut String, label: &str, value: &Option<String>) {
    let _ = writeln!(out, "{label:<24}{}", value.as_deref().unwrap_or("n/a"));
}

pub fn render(view: &DashboardView, variant: ContractVariant) -> String {
    let mut out = String::new();

    if let Some(account) = &view.account {
        let role = if view.show_admin_controls {
            " (administrator)"
        } else {
            ""
        };
        let _ = writeln!(out, "Account: {account}{role}");
    }
    stat_line(&mut out, "Available tokens:", &view.stats.available_tokens);
    if variant == ContractVariant::ReserveBacked {
        stat_line(&mut out, "Reserve fund:", &view.stats.reserve_balance);
    }
    stat_line(
        &mut out,
        "Payment token balance:",
        &view.stats.payment_token_balance,
    );
    stat_line(&mut out, "Redemption fee:", &view.stats.redemption_fee);
    let _ = writeln!(out, "{:<24}{}", "Total yield:", view.total_yield);
    let _ = writeln!(out, "{:<24}{}", "Paid:", view.paid_percent);
    let _ = writeln!(out);

    let columns = columns(variant);
    let cells: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| columns.iter().map(|(_, cell)| cell(row)).collect())
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, (header, _))| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(header.len()))
                .max()
                .unwrap_or_default()
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|((header, _), width)| format!("{header:<width$}", width = *width))
        .collect();
    let _ = writeln!(out, "{}", header.join("  ").trim_end());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("  "));

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}", width = *width))
            .collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    }

    let _ = writeln!(
        out,
        "\n{} of {} work orders shown",
        view.rows.len(),
        view.total_orders
    );
    out
}
