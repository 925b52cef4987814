//! HTTP order source.
//!
//! Fetches the order collection from an order-listing endpoint that answers
//! `GET <url>` with a JSON array of orders.

use crate::{decode_orders, OrderSource, SourceError, SourceFactory, SourceRegistry};
use async_trait::async_trait;
use orderview_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Order, Schema, ValidationError,
};
use std::time::Duration;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Order source backed by an HTTP endpoint.
pub struct HttpOrderSource {
	client: reqwest::Client,
	url: String,
}

impl HttpOrderSource {
	/// Creates a source for the given endpoint.
	///
	/// The timeout bounds a single request at the transport level.
	pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| SourceError::Configuration(format!("Failed to build client: {}", e)))?;

		Ok(Self {
			client,
			url: url.into(),
		})
	}
}

#[async_trait]
impl OrderSource for HttpOrderSource {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpOrderSourceSchema)
	}

	async fn list_orders(&self) -> Result<Vec<Order>, SourceError> {
		let response = self
			.client
			.get(&self.url)
			.header(reqwest::header::ACCEPT, "application/json")
			.send()
			.await
			.map_err(|e| SourceError::Network(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			return Err(SourceError::Network(format!(
				"{} answered with status {}",
				self.url, status
			)));
		}

		let body = response
			.bytes()
			.await
			.map_err(|e| SourceError::Network(e.to_string()))?;
		let orders = decode_orders(&body)?;
		tracing::debug!(url = %self.url, count = orders.len(), "Fetched orders");
		Ok(orders)
	}
}

/// Configuration schema for HttpOrderSource.
pub struct HttpOrderSourceSchema;

impl ConfigSchema for HttpOrderSourceSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("url", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
						Ok(())
					},
					_ => Err("url must start with http:// or https://".to_string()),
				}
			})],
			vec![Field::new(
				"timeout_seconds",
				FieldType::Integer {
					min: Some(1),
					max: Some(300),
				},
			)],
		);
		schema.validate(config)
	}
}

/// Factory function to create an HTTP order source from configuration.
///
/// Configuration parameters:
/// - `url`: order-listing endpoint (required)
/// - `timeout_seconds`: per-request timeout (default: 30)
pub fn create_source(config: &toml::Value) -> Result<Box<dyn OrderSource>, SourceError> {
	let url = config
		.get("url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| SourceError::Configuration("url is required".into()))?;

	let timeout_seconds = match config.get("timeout_seconds") {
		Some(value) => value
			.as_integer()
			.and_then(|v| u64::try_from(v).ok())
			.filter(|v| *v > 0)
			.ok_or_else(|| {
				SourceError::Configuration(format!(
					"timeout_seconds must be a positive integer, got {}",
					value
				))
			})?,
		None => DEFAULT_TIMEOUT_SECONDS,
	};

	Ok(Box::new(HttpOrderSource::new(
		url,
		Duration::from_secs(timeout_seconds),
	)?))
}

/// Registry for the HTTP order source.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = SourceFactory;

	fn factory() -> Self::Factory {
		create_source
	}
}

impl SourceRegistry for Registry {}
