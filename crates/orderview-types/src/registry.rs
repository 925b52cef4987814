//! Registry trait for named, self-registering implementations.

/// Base trait for implementation registries.
///
/// Every order source implementation provides a `Registry` type declaring
/// the name it is configured under and the factory that builds it.
pub trait ImplementationRegistry {
	/// Name used in configuration, e.g. `"http"` for
	/// `[source.implementations.http]`.
	const NAME: &'static str;

	/// Factory function type for this kind of implementation.
	type Factory;

	/// Returns the factory that builds this implementation from its
	/// configuration table.
	fn factory() -> Self::Factory;
}
