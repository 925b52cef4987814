//! Order record types for the order view.
//!
//! Orders are fetched wholesale from an order source and never mutated in
//! place; a successful load replaces the whole collection.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A purchase record as returned by the order-listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
	/// Unique identifier for this order.
	pub id: u64,
	/// Name of the customer who placed the order.
	pub customer_name: String,
	/// Order amount. Never negative.
	pub total: Decimal,
	/// Current fulfilment status.
	pub status: OrderStatus,
	/// Creation time as fixed-width ISO-8601 text.
	///
	/// Kept as text: ordering compares the raw strings, which matches
	/// chronological order only because the format is fixed-width.
	pub created_at: String,
}

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
	/// Order placed but not yet paid.
	Pending,
	/// Payment received.
	Paid,
	/// Order has left the warehouse.
	Shipped,
	/// Order was cancelled.
	Cancelled,
}

impl OrderStatus {
	/// Returns the wire representation of the status.
	pub fn as_str(&self) -> &'static str {
		match self {
			OrderStatus::Pending => "pending",
			OrderStatus::Paid => "paid",
			OrderStatus::Shipped => "shipped",
			OrderStatus::Cancelled => "cancelled",
		}
	}

	/// Returns an iterator over all statuses.
	pub fn all() -> impl Iterator<Item = Self> {
		[Self::Pending, Self::Paid, Self::Shipped, Self::Cancelled].into_iter()
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for OrderStatus {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let needle = s.trim().to_ascii_lowercase();
		Self::all()
			.find(|status| status.as_str() == needle)
			.ok_or_else(|| format!("unknown order status '{}'", s))
	}
}
