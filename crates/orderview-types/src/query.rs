//! Filter criteria and query result types.
//!
//! Criteria are owned by the display and passed into the query on every
//! recomputation. Each field is an explicit option so that "no constraint"
//! never has to be inferred from an empty string or a zero.

use crate::{Order, OrderStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while producing filter criteria from user input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CriteriaError {
	/// Minimum total is not a number or is negative.
	#[error("Invalid minimum total '{0}': expected a non-negative number")]
	InvalidMinTotal(String),
	/// Status is neither "all" nor a known order status.
	#[error("Invalid status filter '{0}'")]
	InvalidStatus(String),
}

/// Status constraint of a query.
///
/// Serialized as `"all"` or the bare status name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum StatusFilter {
	/// Every status passes.
	#[default]
	All,
	/// Only orders with exactly this status pass.
	Only(OrderStatus),
}

impl StatusFilter {
	/// Returns true if the given status passes this filter.
	pub fn matches(&self, status: OrderStatus) -> bool {
		match self {
			StatusFilter::All => true,
			StatusFilter::Only(expected) => *expected == status,
		}
	}
}

impl fmt::Display for StatusFilter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StatusFilter::All => f.write_str("all"),
			StatusFilter::Only(status) => status.fmt(f),
		}
	}
}

impl FromStr for StatusFilter {
	type Err = CriteriaError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.trim().eq_ignore_ascii_case("all") {
			return Ok(StatusFilter::All);
		}
		s.parse::<OrderStatus>()
			.map(StatusFilter::Only)
			.map_err(|_| CriteriaError::InvalidStatus(s.to_string()))
	}
}

impl From<StatusFilter> for String {
	fn from(filter: StatusFilter) -> Self {
		filter.to_string()
	}
}

impl TryFrom<String> for StatusFilter {
	type Error = CriteriaError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

/// User-specified predicate parameters narrowing the visible order set.
///
/// The default value places no constraint on any field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
	/// Case-insensitive substring matched against the customer name.
	pub search_text: Option<String>,
	/// Status constraint.
	#[serde(default)]
	pub status: StatusFilter,
	/// Inclusive lower bound on the order total.
	pub min_total: Option<Decimal>,
}

impl FilterCriteria {
	/// Creates criteria with no constraints.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the customer-name search text.
	pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
		self.search_text = Some(text.into());
		self
	}

	/// Sets the status constraint.
	pub fn with_status(mut self, status: StatusFilter) -> Self {
		self.status = status;
		self
	}

	/// Sets the minimum total.
	pub fn with_min_total(mut self, min_total: Decimal) -> Self {
		self.min_total = Some(min_total);
		self
	}

	/// Validates raw minimum-total input from the user.
	///
	/// Blank input means no constraint. Anything that is not a
	/// non-negative number is rejected here so that it never reaches the
	/// query.
	pub fn parse_min_total(input: &str) -> Result<Option<Decimal>, CriteriaError> {
		let trimmed = input.trim();
		if trimmed.is_empty() {
			return Ok(None);
		}

		let value = Decimal::from_str(trimmed)
			.or_else(|_| Decimal::from_scientific(trimmed))
			.map_err(|_| CriteriaError::InvalidMinTotal(input.to_string()))?;
		if value.is_sign_negative() && !value.is_zero() {
			return Err(CriteriaError::InvalidMinTotal(input.to_string()));
		}
		Ok(Some(value))
	}
}

/// Filtered and sorted order view plus its aggregate revenue.
///
/// Always derived from an order snapshot and criteria, never stored on
/// its own.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
	/// Orders passing every filter, newest first.
	pub visible_orders: Vec<Order>,
	/// Exact, unrounded sum of `visible_orders[*].total`.
	pub total_revenue: Decimal,
}

impl QueryResult {
	/// Returns true when no order passed the filters.
	pub fn is_empty(&self) -> bool {
		self.visible_orders.is_empty()
	}
}
