//! File-backed order source.
//!
//! Reads a JSON array of orders from disk on every load, so edits to the
//! file show up on the next refresh.

use crate::{decode_orders, OrderSource, SourceError, SourceFactory, SourceRegistry};
use async_trait::async_trait;
use orderview_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Order, Schema, ValidationError,
};
use std::path::PathBuf;
use tokio::fs;

/// Order source reading a JSON file.
pub struct FileOrderSource {
	path: PathBuf,
}

impl FileOrderSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}
}

#[async_trait]
impl OrderSource for FileOrderSource {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileOrderSourceSchema)
	}

	async fn list_orders(&self) -> Result<Vec<Order>, SourceError> {
		let bytes = fs::read(&self.path)
			.await
			.map_err(|e| SourceError::Io(format!("{}: {}", self.path.display(), e)))?;
		let orders = decode_orders(&bytes)?;
		tracing::debug!(path = %self.path.display(), count = orders.len(), "Read orders");
		Ok(orders)
	}
}

/// Configuration schema for FileOrderSource.
pub struct FileOrderSourceSchema;

impl ConfigSchema for FileOrderSourceSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("path", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(path) if !path.trim().is_empty() => Ok(()),
					_ => Err("path cannot be empty".to_string()),
				}
			})],
			vec![],
		);
		schema.validate(config)
	}
}

/// Factory function to create a file order source from configuration.
///
/// Configuration parameters:
/// - `path`: JSON file holding an array of orders (required)
pub fn create_source(config: &toml::Value) -> Result<Box<dyn OrderSource>, SourceError> {
	let path = config
		.get("path")
		.and_then(|v| v.as_str())
		.ok_or_else(|| SourceError::Configuration("path is required".into()))?;

	Ok(Box::new(FileOrderSource::new(path)))
}

/// Registry for the file order source.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = SourceFactory;

	fn factory() -> Self::Factory {
		create_source
	}
}

impl SourceRegistry for Registry {}
