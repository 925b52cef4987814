//! Order source module for the order view.
//!
//! An order source supplies the raw order collection. The transport is up to
//! the implementation: orders may come from configuration, a JSON file or an
//! HTTP order-listing endpoint. Every implementation is registered by name
//! and built from its `[source.implementations.<name>]` table.

use async_trait::async_trait;
use orderview_types::{ConfigSchema, ImplementationRegistry, Order};
use std::collections::HashSet;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod http;
	pub mod memory;
}

/// Errors that can occur while listing orders.
#[derive(Debug, Error)]
pub enum SourceError {
	/// The remote endpoint could not be reached or answered with an error.
	#[error("Network error: {0}")]
	Network(String),
	/// Local I/O failed.
	#[error("IO error: {0}")]
	Io(String),
	/// The payload could not be decoded or violates order invariants.
	#[error("Malformed order data: {0}")]
	Malformed(String),
	/// The implementation's configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Capability that supplies the order collection.
///
/// Calls must be idempotent and must not change the order data.
#[async_trait]
pub trait OrderSource: Send + Sync {
	/// Returns the configuration schema for this implementation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Lists all orders, in the order the backend returns them.
	async fn list_orders(&self) -> Result<Vec<Order>, SourceError>;
}

/// Type alias for order source factory functions.
pub type SourceFactory = fn(&toml::Value) -> Result<Box<dyn OrderSource>, SourceError>;

/// Registry trait for order source implementations.
pub trait SourceRegistry: ImplementationRegistry<Factory = SourceFactory> {}

/// Get all registered order source implementations.
///
/// Returns `(name, factory)` pairs used to resolve the configured primary
/// source.
pub fn get_all_implementations() -> Vec<(&'static str, SourceFactory)> {
	use implementations::{file, http, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(http::Registry::NAME, http::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Checks a fetched collection before it is accepted.
///
/// Rejects duplicate ids, negative totals and creation times that are not
/// ISO-8601 dates or date-times. A missing UTC offset is accepted.
pub fn validate_orders(orders: &[Order]) -> Result<(), SourceError> {
	let mut seen = HashSet::with_capacity(orders.len());

	for order in orders {
		if !seen.insert(order.id) {
			return Err(SourceError::Malformed(format!(
				"duplicate order id {}",
				order.id
			)));
		}
		if order.total.is_sign_negative() && !order.total.is_zero() {
			return Err(SourceError::Malformed(format!(
				"order {} has negative total {}",
				order.id, order.total
			)));
		}
		if !is_iso8601(&order.created_at) {
			return Err(SourceError::Malformed(format!(
				"order {} has invalid createdAt '{}': expected an ISO-8601 date or date-time",
				order.id, order.created_at
			)));
		}
	}

	Ok(())
}

fn is_iso8601(value: &str) -> bool {
	chrono::DateTime::parse_from_rfc3339(value).is_ok()
		|| chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
		|| chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// Decodes a JSON array of orders.
pub(crate) fn decode_orders(bytes: &[u8]) -> Result<Vec<Order>, SourceError> {
	serde_json::from_slice(bytes).map_err(|e| SourceError::Malformed(e.to_string()))
}
