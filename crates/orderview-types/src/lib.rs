//! Common types for the order view.
//!
//! Shared data model used by every crate in the workspace: order records,
//! the load lifecycle, filter criteria and query results, plus the schema
//! validation used for implementation configuration.

/// Order records and statuses.
pub mod order;
/// Filter criteria and query results.
pub mod query;
/// Implementation registry trait.
pub mod registry;
/// Load lifecycle state and completion policy.
pub mod state;
/// Configuration schema validation.
pub mod validation;

pub use order::*;
pub use query::*;
pub use registry::ImplementationRegistry;
pub use state::*;
pub use validation::*;
