//! Core of the order view.
//!
//! Provides the [`OrderStore`], which loads orders from an order source and
//! tracks the loading/error state, and the [`OrderQuery`], a pure
//! filter -> sort -> aggregate pipeline over an order snapshot. The display
//! reads both through [`OrderView`].

pub mod builder;
pub mod diagnostics;
pub mod query;
pub mod store;
pub mod view;

pub use builder::{BuilderError, OrderViewBuilder};
pub use diagnostics::{DiagnosticsSink, TracingDiagnostics};
pub use query::OrderQuery;
pub use store::{Invalidation, OrderStore, RefreshOutcome};
pub use view::OrderView;
