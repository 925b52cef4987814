//! Text and JSON rendering of the order view.

use orderview_core::OrderView;
use orderview_types::{Order, QueryResult};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Shown while no load has completed.
pub const LOADING_TEXT: &str = "Loading orders...";
/// Shown when loaded orders are all filtered out.
pub const EMPTY_TEXT: &str = "No orders found";

/// Rounds an amount to two fraction digits for display, halves away from
/// zero.
pub fn format_amount(amount: Decimal) -> String {
	let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
	rounded.rescale(2);
	rounded.to_string()
}

/// Renders the view as a plain-text table.
pub fn render_text(view: &OrderView) -> String {
	match view {
		OrderView::Loading => LOADING_TEXT.to_string(),
		OrderView::Failed(message) => message.clone(),
		OrderView::Empty => EMPTY_TEXT.to_string(),
		OrderView::Orders(result) => render_table(result),
	}
}

fn render_table(result: &QueryResult) -> String {
	let headers = ["ID", "Customer", "Total", "Status", "Created"];
	let rows: Vec<[String; 5]> = result.visible_orders.iter().map(row).collect();

	let mut widths = headers.map(str::len);
	for cells in &rows {
		for (width, cell) in widths.iter_mut().zip(cells) {
			*width = (*width).max(cell.chars().count());
		}
	}

	let mut out = String::new();
	push_line(&mut out, &headers.map(str::to_string), &widths);
	push_line(&mut out, &widths.map(|w| "-".repeat(w)), &widths);
	for cells in &rows {
		push_line(&mut out, cells, &widths);
	}
	out.push('\n');
	out.push_str(&format!("Total revenue: {}", format_amount(result.total_revenue)));
	out
}

fn row(order: &Order) -> [String; 5] {
	[
		order.id.to_string(),
		order.customer_name.clone(),
		format_amount(order.total),
		order.status.to_string(),
		order.created_at.clone(),
	]
}

fn push_line(out: &mut String, cells: &[String; 5], widths: &[usize; 5]) {
	let line = cells
		.iter()
		.zip(widths)
		.map(|(cell, width)| format!("{:<width$}", cell, width = *width))
		.collect::<Vec<_>>()
		.join("  ");
	out.push_str(line.trim_end());
	out.push('\n');
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonView<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	status: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	message: Option<&'a str>,
	orders: &'a [Order],
	total_revenue: String,
}

/// Renders the view as JSON.
pub fn render_json(view: &OrderView) -> Result<String, serde_json::Error> {
	let json = match view {
		OrderView::Loading => JsonView {
			status: Some("loading"),
			message: None,
			orders: &[],
			total_revenue: format_amount(Decimal::ZERO),
		},
		OrderView::Failed(message) => JsonView {
			status: Some("failed"),
			message: Some(message.as_str()),
			orders: &[],
			total_revenue: format_amount(Decimal::ZERO),
		},
		OrderView::Empty => JsonView {
			status: None,
			message: Some(EMPTY_TEXT),
			orders: &[],
			total_revenue: format_amount(Decimal::ZERO),
		},
		OrderView::Orders(result) => JsonView {
			status: None,
			message: None,
			orders: &result.visible_orders,
			total_revenue: format_amount(result.total_revenue),
		},
	};
	serde_json::to_string_pretty(&json)
}
