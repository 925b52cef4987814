//! Load lifecycle types for the order store.

use crate::Order;
use serde::{Deserialize, Serialize};

/// Message surfaced to the display when a load fails.
///
/// The underlying error detail goes to diagnostics only.
pub const LOAD_FAILURE_MESSAGE: &str = "Failed to load orders";

/// Current phase of the store's fetch lifecycle.
///
/// ```text
/// Idle    --refresh--> Loading
/// Loading --success--> Ready(orders)
/// Loading --failure--> Failed(message)
/// Ready   --refresh--> Loading
/// Failed  --refresh--> Loading
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
	/// No load has been issued yet.
	#[default]
	Idle,
	/// At least one load is in flight.
	Loading,
	/// The most recently applied load succeeded.
	Ready(Vec<Order>),
	/// The most recently applied load failed.
	Failed(String),
}

impl LoadState {
	/// Returns the orders of a `Ready` state, if any.
	pub fn orders(&self) -> Option<&[Order]> {
		match self {
			LoadState::Ready(orders) => Some(orders),
			_ => None,
		}
	}

	/// Returns true while no load has completed since the last refresh.
	pub fn is_pending(&self) -> bool {
		matches!(self, LoadState::Idle | LoadState::Loading)
	}
}

/// Decides which completion wins when several loads are in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionPolicy {
	/// Only the most recently issued load may update the state. Earlier
	/// loads that resolve later are discarded.
	#[default]
	LastIssued,
	/// Every completion updates the state, so whichever load resolves
	/// last wins even if it was issued first.
	LastResolved,
}
