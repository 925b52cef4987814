//! Builder wiring an order store from configuration.
//!
//! Resolves the configured primary source through a factory map, validates
//! its configuration table against the implementation's schema and attaches
//! the diagnostics sink.

use crate::diagnostics::{DiagnosticsSink, TracingDiagnostics};
use crate::store::OrderStore;
use orderview_config::Config;
use orderview_source::{OrderSource, SourceError};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while building an order store.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Source error: {0}")]
	Source(String),
}

/// Builder for an [`OrderStore`] with a pluggable order source.
pub struct OrderViewBuilder {
	config: Config,
	diagnostics: Arc<dyn DiagnosticsSink>,
}

impl OrderViewBuilder {
	/// Creates a builder that records failures through `tracing`.
	pub fn new(config: Config) -> Self {
		Self {
			config,
			diagnostics: Arc::new(TracingDiagnostics),
		}
	}

	/// Replaces the diagnostics sink.
	pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
		self.diagnostics = diagnostics;
		self
	}

	/// Builds the store from the primary source's factory.
	pub fn build<F>(self, factories: &HashMap<String, F>) -> Result<OrderStore, BuilderError>
	where
		F: Fn(&toml::Value) -> Result<Box<dyn OrderSource>, SourceError>,
	{
		let primary = &self.config.source.primary;
		let source_config = self.config.source.primary_config().ok_or_else(|| {
			BuilderError::Config(format!(
				"Primary source '{}' not found in implementations",
				primary
			))
		})?;
		let factory = factories.get(primary).ok_or_else(|| {
			BuilderError::Config(format!("Unknown source implementation '{}'", primary))
		})?;

		let source = factory(source_config).map_err(|e| {
			tracing::error!(
				component = "source",
				implementation = %primary,
				error = %e,
				"Failed to create source implementation"
			);
			BuilderError::Source(format!(
				"Failed to create source implementation '{}': {}",
				primary, e
			))
		})?;
		source.config_schema().validate(source_config).map_err(|e| {
			BuilderError::Config(format!(
				"Invalid configuration for source '{}': {}",
				primary, e
			))
		})?;
		tracing::info!(component = "source", implementation = %primary, "Loaded");

		let policy = self.config.store.completion;
		tracing::info!(component = "store", completion = ?policy, "Configured");

		Ok(OrderStore::new(Arc::from(source), self.diagnostics, policy))
	}
}
