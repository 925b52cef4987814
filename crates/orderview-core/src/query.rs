//! Filter, sort and aggregate pipeline over an order snapshot.
//!
//! The query is a pure function of its inputs. It holds no state, performs
//! no I/O and never retains or mutates the snapshot it is given, so it can
//! be called from any thread without synchronization.

use orderview_types::{FilterCriteria, Order, QueryResult};
use rust_decimal::Decimal;

/// Produces the visible order view from a snapshot and criteria.
pub struct OrderQuery;

impl OrderQuery {
	/// Runs filter -> sort -> aggregate.
	///
	/// - Filters: customer-name search (case-insensitive substring), exact
	///   status, inclusive minimum total. An absent criterion always passes.
	/// - Sort: descending by `created_at`, comparing the raw ISO strings.
	///   The sort is stable, so equal timestamps keep their input order.
	/// - Aggregate: exact sum of the visible totals, unrounded.
	pub fn run(orders: &[Order], criteria: &FilterCriteria) -> QueryResult {
		let search = criteria
			.search_text
			.as_deref()
			.filter(|text| !text.is_empty())
			.map(str::to_lowercase);

		let mut visible_orders: Vec<Order> = orders
			.iter()
			.filter(|order| {
				search
					.as_deref()
					.is_none_or(|needle| order.customer_name.to_lowercase().contains(needle))
			})
			.filter(|order| criteria.status.matches(order.status))
			.filter(|order| criteria.min_total.is_none_or(|min| order.total >= min))
			.cloned()
			.collect();

		visible_orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));

		let total_revenue = visible_orders.iter().map(|order| order.total).sum::<Decimal>();

		QueryResult {
			visible_orders,
			total_revenue,
		}
	}
}
