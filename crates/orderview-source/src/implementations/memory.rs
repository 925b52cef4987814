//! In-memory order source.
//!
//! Serves a fixed collection given inline in configuration. Useful for
//! demos and for running the view without a backend.

use crate::{OrderSource, SourceError, SourceFactory, SourceRegistry};
use async_trait::async_trait;
use orderview_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Order, Schema, ValidationError,
};

/// Order source backed by a fixed list.
pub struct MemoryOrderSource {
	orders: Vec<Order>,
}

impl MemoryOrderSource {
	/// Creates a source that always returns the given orders.
	pub fn new(orders: Vec<Order>) -> Self {
		Self { orders }
	}
}

#[async_trait]
impl OrderSource for MemoryOrderSource {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryOrderSourceSchema)
	}

	async fn list_orders(&self) -> Result<Vec<Order>, SourceError> {
		Ok(self.orders.clone())
	}
}

/// Configuration schema for MemoryOrderSource.
pub struct MemoryOrderSourceSchema;

impl ConfigSchema for MemoryOrderSourceSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("orders", FieldType::Array(Box::new(FieldType::Any)))],
		);
		schema.validate(config)?;

		parse_orders(config)
			.map(|_| ())
			.map_err(|e| ValidationError::DeserializationError(e.to_string()))
	}
}

fn parse_orders(config: &toml::Value) -> Result<Vec<Order>, SourceError> {
	match config.get("orders") {
		Some(orders) => orders
			.clone()
			.try_into()
			.map_err(|e| SourceError::Configuration(format!("Invalid memory orders: {}", e))),
		None => Ok(Vec::new()),
	}
}

/// Factory function to create a memory order source from configuration.
///
/// Configuration parameters:
/// - `orders`: array of order tables using the payload field names
///   (`id`, `customerName`, `total`, `status`, `createdAt`). Defaults to empty.
pub fn create_source(config: &toml::Value) -> Result<Box<dyn OrderSource>, SourceError> {
	Ok(Box::new(MemoryOrderSource::new(parse_orders(config)?)))
}

/// Registry for the memory order source.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = SourceFactory;

	fn factory() -> Self::Factory {
		create_source
	}
}

impl SourceRegistry for Registry {}
