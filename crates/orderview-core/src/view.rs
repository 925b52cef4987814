//! Display-facing view derived from the load state and criteria.

use crate::query::OrderQuery;
use orderview_types::{FilterCriteria, LoadState, QueryResult};

/// What the display should show right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderView {
	/// No load has completed yet; show a progress indicator.
	Loading,
	/// The last load failed; carries the static user-facing message.
	Failed(String),
	/// Orders are loaded but none pass the filters.
	Empty,
	/// Orders passing the filters, with their revenue.
	Orders(QueryResult),
}

impl OrderView {
	/// Derives the view for a state snapshot.
	pub fn derive(state: &LoadState, criteria: &FilterCriteria) -> Self {
		match state {
			LoadState::Idle | LoadState::Loading => OrderView::Loading,
			LoadState::Failed(message) => OrderView::Failed(message.clone()),
			LoadState::Ready(orders) => {
				let result = OrderQuery::run(orders, criteria);
				if result.is_empty() {
					OrderView::Empty
				} else {
					OrderView::Orders(result)
				}
			},
		}
	}
}
