//! Configuration module for the order view.
//!
//! Loads configuration from TOML, resolving `${VAR}` and
//! `${VAR:-default}` environment references before parsing, and validates
//! the cross-section rules a running store depends on.

use orderview_types::CompletionPolicy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message only; the default rendering repeats the input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Order store behaviour.
	#[serde(default)]
	pub store: StoreConfig,
	/// Where orders are loaded from.
	pub source: SourceConfig,
}

/// Order store behaviour.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StoreConfig {
	/// Which completion wins when several loads overlap.
	#[serde(default)]
	pub completion: CompletionPolicy,
}

/// Order source selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
	/// Which implementation to load orders from.
	pub primary: String,
	/// Map of source implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

impl SourceConfig {
	/// Returns the configuration table of the primary implementation.
	pub fn primary_config(&self) -> Option<&toml::Value> {
		self.implementations.get(&self.primary)
	}
}

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of `VAR_NAME`, or with the text
/// after `:-` in `${VAR_NAME:-default}` when the variable is unset.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	// Bounded input keeps the regex scan cheap
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match (std::env::var(var_name.as_str()), cap.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				return Err(ConfigError::Validation(format!(
					"Environment variable '{}' not found",
					var_name.as_str()
				)))
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file.
	pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = tokio::fs::read_to_string(path).await.map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				e.kind(),
				format!("Cannot read {}: {}", path.display(), e),
			))
		})?;
		content.parse()
	}

	/// Validates the configuration.
	///
	/// - At least one source implementation is configured
	/// - The primary source is named and present in the implementations
	fn validate(&self) -> Result<(), ConfigError> {
		if self.source.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one source implementation must be configured".into(),
			));
		}
		if self.source.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Source primary implementation cannot be empty".into(),
			));
		}
		if self.source.primary_config().is_none() {
			return Err(ConfigError::Validation(format!(
				"Primary source '{}' not found in implementations",
				self.source.primary
			)));
		}
		Ok(())
	}
}

/// Parses configuration from a TOML string.
///
/// Environment variables are resolved first and the result is validated.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
