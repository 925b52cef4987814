//! Diagnostics sink for load failures.

use orderview_source::SourceError;

/// Fire-and-forget recorder for load failures.
///
/// Implementations must never panic and must not block the caller.
#[cfg_attr(test, mockall::automock)]
pub trait DiagnosticsSink: Send + Sync {
	/// Records a failed load.
	fn record(&self, error: &SourceError);
}

/// Records load failures through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
	fn record(&self, error: &SourceError) {
		tracing::error!(target: "orderview::diagnostics", error = %error, "Failed to load orders");
	}
}
