//! Order store: load lifecycle and state machine.
//!
//! The store owns the authoritative order snapshot and the loading/error
//! state. Every `refresh` starts a new independent load; loads are never
//! cancelled and no timeout is enforced, so a load that never resolves
//! leaves the store in `Loading`.
//!
//! When several loads overlap, the configured [`CompletionPolicy`] decides
//! which completion wins. Each load takes a ticket from a monotonically
//! increasing sequence; under `LastIssued` a completion is applied only if
//! its ticket is still the latest issued, under `LastResolved` every
//! completion is applied in arrival order.

use crate::diagnostics::DiagnosticsSink;
use orderview_source::{validate_orders, OrderSource, SourceError};
use orderview_types::{CompletionPolicy, LoadState, Order, LOAD_FAILURE_MESSAGE};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Result of a single refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
	/// The completion updated the store state.
	Applied,
	/// A newer load was issued meanwhile; the completion was discarded.
	Superseded,
}

/// Explicit signal that the loaded orders may be stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
	/// The user asked for a reload.
	UserRequest,
	/// A collaborator changed order data.
	DataChanged,
	/// A periodic refresh fired.
	Scheduled,
}

struct Shared {
	source: Arc<dyn OrderSource>,
	diagnostics: Arc<dyn DiagnosticsSink>,
	policy: CompletionPolicy,
	/// Latest ticket issued. Held while the state is written so that the
	/// ticket check and the write are one step.
	issued: Mutex<u64>,
	state: watch::Sender<Arc<LoadState>>,
	mounted: AtomicBool,
}

/// Owns the order snapshot and the load state machine.
///
/// Clones share the same state.
#[derive(Clone)]
pub struct OrderStore {
	shared: Arc<Shared>,
}

impl OrderStore {
	/// Creates a store in the `Idle` state.
	pub fn new(
		source: Arc<dyn OrderSource>,
		diagnostics: Arc<dyn DiagnosticsSink>,
		policy: CompletionPolicy,
	) -> Self {
		let (state, _) = watch::channel(Arc::new(LoadState::Idle));
		Self {
			shared: Arc::new(Shared {
				source,
				diagnostics,
				policy,
				issued: Mutex::new(0),
				state,
				mounted: AtomicBool::new(false),
			}),
		}
	}

	/// Returns the completion policy in effect.
	pub fn policy(&self) -> CompletionPolicy {
		self.shared.policy
	}

	/// Returns the current state without side effects.
	pub fn current_state(&self) -> Arc<LoadState> {
		self.shared.state.borrow().clone()
	}

	/// Returns the current state, starting the initial load the first time
	/// an idle store is observed.
	///
	/// The initial load runs on the current Tokio runtime and the returned
	/// snapshot is already `Loading`. Later calls are plain snapshots.
	pub fn observe(&self) -> Arc<LoadState> {
		let first_observation = !self.shared.mounted.swap(true, Ordering::SeqCst);
		if first_observation && *self.current_state() == LoadState::Idle {
			match tokio::runtime::Handle::try_current() {
				Ok(handle) => {
					let ticket = self.begin();
					let store = self.clone();
					handle.spawn(async move {
						store.load(ticket).await;
					});
				},
				Err(e) => {
					tracing::warn!(error = %e, "No runtime available, initial load not started");
					self.shared.mounted.store(false, Ordering::SeqCst);
				},
			}
		}
		self.current_state()
	}

	/// Subscribes to state changes.
	pub fn subscribe(&self) -> watch::Receiver<Arc<LoadState>> {
		self.shared.state.subscribe()
	}

	/// Starts a new load and returns a future that completes with it.
	///
	/// Always legal. The ticket is issued and the state becomes `Loading`
	/// before this returns, then `Ready` or `Failed` once the returned
	/// future completes, unless the completion policy discards it.
	pub fn refresh(&self) -> impl Future<Output = RefreshOutcome> + Send + 'static {
		let ticket = self.begin();
		let store = self.clone();
		async move { store.load(ticket).await }
	}

	/// Refreshes once per received invalidation until the channel closes.
	///
	/// Signals are handled one at a time, so loads started here never
	/// overlap each other.
	pub fn spawn_invalidation_listener(
		&self,
		mut signals: mpsc::UnboundedReceiver<Invalidation>,
	) -> JoinHandle<()> {
		let store = self.clone();
		tokio::spawn(async move {
			while let Some(reason) = signals.recv().await {
				tracing::info!(?reason, "Orders invalidated");
				store.refresh().await;
			}
			tracing::debug!("Invalidation channel closed");
		})
	}

	fn lock_issued(&self) -> MutexGuard<'_, u64> {
		self.shared
			.issued
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
	}

	/// Issues a ticket and enters `Loading`.
	fn begin(&self) -> u64 {
		let mut issued = self.lock_issued();
		*issued += 1;
		self.shared.state.send_replace(Arc::new(LoadState::Loading));
		tracing::debug!(ticket = *issued, "Issued order load");
		*issued
	}

	async fn load(&self, ticket: u64) -> RefreshOutcome {
		let result = match self.shared.source.list_orders().await {
			Ok(orders) => validate_orders(&orders).map(|_| orders),
			Err(e) => Err(e),
		};
		self.complete(ticket, result)
	}

	fn complete(&self, ticket: u64, result: Result<Vec<Order>, SourceError>) -> RefreshOutcome {
		if let Err(e) = &result {
			tracing::warn!(ticket, error = %e, "Order load failed");
			self.shared.diagnostics.record(e);
		}

		let issued = self.lock_issued();
		if self.shared.policy == CompletionPolicy::LastIssued && ticket != *issued {
			tracing::debug!(ticket, latest = *issued, "Discarding superseded order load");
			return RefreshOutcome::Superseded;
		}

		let next = match result {
			Ok(orders) => {
				tracing::info!(ticket, count = orders.len(), "Loaded orders");
				LoadState::Ready(orders)
			},
			Err(_) => LoadState::Failed(LOAD_FAILURE_MESSAGE.to_string()),
		};
		self.shared.state.send_replace(Arc::new(next));
		drop(issued);

		RefreshOutcome::Applied
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::diagnostics::MockDiagnosticsSink;
	use async_trait::async_trait;
	use orderview_types::{ConfigSchema, OrderStatus, Schema, ValidationError};
	use rust_decimal::Decimal;
	use std::collections::VecDeque;
	use std::sync::atomic::AtomicUsize;
	use tokio::sync::oneshot;

	struct NoSchema;

	impl ConfigSchema for NoSchema {
		fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
			Schema::new(vec![], vec![]).validate(config)
		}
	}

	/// Source answering each call with the next scripted result.
	struct ScriptedSource {
		responses: Mutex<VecDeque<Result<Vec<Order>, SourceError>>>,
		calls: AtomicUsize,
	}

	impl ScriptedSource {
		fn new(responses: Vec<Result<Vec<Order>, SourceError>>) -> Arc<Self> {
			Arc::new(Self {
				responses: Mutex::new(responses.into()),
				calls: AtomicUsize::new(0),
			})
		}

		fn calls(&self) -> usize {
			self.calls.load(Ordering::SeqCst)
		}
	}

	#[async_trait]
	impl OrderSource for ScriptedSource {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(NoSchema)
		}

		async fn list_orders(&self) -> Result<Vec<Order>, SourceError> {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.responses
				.lock()
				.unwrap()
				.pop_front()
				.unwrap_or_else(|| Ok(Vec::new()))
		}
	}

	/// Source whose calls stay pending until the test resolves them.
	struct GatedSource {
		gates: Mutex<VecDeque<oneshot::Receiver<Result<Vec<Order>, SourceError>>>>,
	}

	impl GatedSource {
		fn new(count: usize) -> (Arc<Self>, Vec<oneshot::Sender<Result<Vec<Order>, SourceError>>>) {
			let (senders, receivers): (Vec<_>, VecDeque<_>) =
				(0..count).map(|_| oneshot::channel()).unzip();
			(
				Arc::new(Self {
					gates: Mutex::new(receivers),
				}),
				senders,
			)
		}
	}

	#[async_trait]
	impl OrderSource for GatedSource {
		fn config_schema(&self) -> Box<dyn ConfigSchema> {
			Box::new(NoSchema)
		}

		async fn list_orders(&self) -> Result<Vec<Order>, SourceError> {
			let gate = self.gates.lock().unwrap().pop_front();
			match gate {
				Some(gate) => gate
					.await
					.unwrap_or_else(|_| Err(SourceError::Network("gate dropped".into()))),
				None => Err(SourceError::Network("no gate left".into())),
			}
		}
	}

	fn order(id: u64, customer: &str, total: i64, status: OrderStatus, created_at: &str) -> Order {
		Order {
			id,
			customer_name: customer.to_string(),
			total: Decimal::from(total),
			status,
			created_at: created_at.to_string(),
		}
	}

	fn alice_and_bob() -> Vec<Order> {
		vec![
			order(1, "Alice", 10, OrderStatus::Paid, "2024-01-01T00:00:00Z"),
			order(2, "Bob", 20, OrderStatus::Pending, "2024-01-02T00:00:00Z"),
		]
	}

	fn quiet_diagnostics() -> Arc<MockDiagnosticsSink> {
		let mut diagnostics = MockDiagnosticsSink::new();
		diagnostics.expect_record().never();
		Arc::new(diagnostics)
	}

	#[tokio::test]
	async fn test_starts_idle_without_loading() {
		let source = ScriptedSource::new(vec![]);
		let store = OrderStore::new(source.clone(), quiet_diagnostics(), CompletionPolicy::LastIssued);

		assert_eq!(*store.current_state(), LoadState::Idle);
		assert_eq!(source.calls(), 0);
	}

	#[tokio::test]
	async fn test_refresh_success() {
		let source = ScriptedSource::new(vec![Ok(alice_and_bob())]);
		let store = OrderStore::new(source.clone(), quiet_diagnostics(), CompletionPolicy::LastIssued);

		assert_eq!(store.refresh().await, RefreshOutcome::Applied);
		assert_eq!(*store.current_state(), LoadState::Ready(alice_and_bob()));
		assert_eq!(source.calls(), 1);
	}

	#[tokio::test]
	async fn test_refresh_failure_records_diagnostics() {
		let source = ScriptedSource::new(vec![Err(SourceError::Network("connection refused".into()))]);
		let mut diagnostics = MockDiagnosticsSink::new();
		diagnostics
			.expect_record()
			.withf(|error| matches!(error, SourceError::Network(msg) if msg == "connection refused"))
			.times(1)
			.return_const(());
		let store = OrderStore::new(source, Arc::new(diagnostics), CompletionPolicy::LastIssued);

		store.refresh().await;

		assert_eq!(
			*store.current_state(),
			LoadState::Failed("Failed to load orders".to_string())
		);
	}

	#[tokio::test]
	async fn test_malformed_payload_is_a_load_failure() {
		let mut duplicate = alice_and_bob();
		duplicate[1].id = 1;
		let source = ScriptedSource::new(vec![Ok(duplicate)]);
		let mut diagnostics = MockDiagnosticsSink::new();
		diagnostics
			.expect_record()
			.withf(|error| matches!(error, SourceError::Malformed(_)))
			.times(1)
			.return_const(());
		let store = OrderStore::new(source, Arc::new(diagnostics), CompletionPolicy::LastIssued);

		store.refresh().await;

		assert_eq!(
			*store.current_state(),
			LoadState::Failed(LOAD_FAILURE_MESSAGE.to_string())
		);
	}

	#[tokio::test]
	async fn test_success_after_failure_clears_error() {
		let source = ScriptedSource::new(vec![
			Err(SourceError::Network("timeout".into())),
			Ok(alice_and_bob()),
		]);
		let mut diagnostics = MockDiagnosticsSink::new();
		diagnostics.expect_record().times(1).return_const(());
		let store = OrderStore::new(source, Arc::new(diagnostics), CompletionPolicy::LastIssued);

		store.refresh().await;
		assert!(matches!(*store.current_state(), LoadState::Failed(_)));

		store.refresh().await;
		assert_eq!(*store.current_state(), LoadState::Ready(alice_and_bob()));
	}

	#[tokio::test]
	async fn test_refresh_replaces_orders_wholesale() {
		let first = alice_and_bob();
		let second = vec![order(3, "Carol", 5, OrderStatus::Shipped, "2024-01-03T00:00:00Z")];
		let source = ScriptedSource::new(vec![Ok(first), Ok(second.clone())]);
		let store = OrderStore::new(source, quiet_diagnostics(), CompletionPolicy::LastIssued);

		store.refresh().await;
		let before = store.current_state();
		store.refresh().await;

		assert_eq!(before.orders().map(|o| o.len()), Some(2));
		assert_eq!(*store.current_state(), LoadState::Ready(second));
	}

	#[tokio::test]
	async fn test_refresh_enters_loading_while_pending() {
		let (source, mut gates) = GatedSource::new(1);
		let store = OrderStore::new(source, quiet_diagnostics(), CompletionPolicy::LastIssued);

		let refresh = store.refresh();
		tokio::pin!(refresh);
		assert!(futures::poll!(&mut refresh).is_pending());
		assert_eq!(*store.current_state(), LoadState::Loading);

		gates.remove(0).send(Ok(alice_and_bob())).unwrap();
		assert_eq!(refresh.await, RefreshOutcome::Applied);
		assert_eq!(*store.current_state(), LoadState::Ready(alice_and_bob()));
	}

	#[tokio::test]
	async fn test_refresh_enters_loading_before_first_poll() {
		let (source, mut gates) = GatedSource::new(2);
		let store = OrderStore::new(source, quiet_diagnostics(), CompletionPolicy::LastIssued);

		let refresh = store.refresh();
		assert_eq!(*store.current_state(), LoadState::Loading);

		// Calls issue tickets in call order, not poll order
		let later = store.refresh();
		drop(refresh);
		gates.remove(0).send(Ok(alice_and_bob())).unwrap();
		assert_eq!(later.await, RefreshOutcome::Applied);
		assert_eq!(*store.current_state(), LoadState::Ready(alice_and_bob()));
	}

	#[tokio::test]
	async fn test_refresh_from_ready_enters_loading() {
		let (source, mut gates) = GatedSource::new(2);
		let store = OrderStore::new(source, quiet_diagnostics(), CompletionPolicy::LastIssued);

		let first = store.refresh();
		gates.remove(0).send(Ok(alice_and_bob())).unwrap();
		first.await;
		assert_eq!(*store.current_state(), LoadState::Ready(alice_and_bob()));

		let second = store.refresh();
		tokio::pin!(second);
		assert_eq!(*store.current_state(), LoadState::Loading);
		assert!(futures::poll!(&mut second).is_pending());
		assert_eq!(*store.current_state(), LoadState::Loading);

		let newer = vec![order(3, "Carol", 5, OrderStatus::Shipped, "2024-01-03T00:00:00Z")];
		gates.remove(0).send(Ok(newer.clone())).unwrap();
		assert_eq!(second.await, RefreshOutcome::Applied);
		assert_eq!(*store.current_state(), LoadState::Ready(newer));
	}

	#[tokio::test]
	async fn test_refresh_from_failed_enters_loading() {
		let (source, mut gates) = GatedSource::new(2);
		let mut diagnostics = MockDiagnosticsSink::new();
		diagnostics.expect_record().times(1).return_const(());
		let store = OrderStore::new(source, Arc::new(diagnostics), CompletionPolicy::LastIssued);

		let first = store.refresh();
		gates
			.remove(0)
			.send(Err(SourceError::Network("connection reset".into())))
			.unwrap();
		first.await;
		assert!(matches!(*store.current_state(), LoadState::Failed(_)));

		let second = store.refresh();
		tokio::pin!(second);
		assert_eq!(*store.current_state(), LoadState::Loading);
		assert!(futures::poll!(&mut second).is_pending());
		assert_eq!(*store.current_state(), LoadState::Loading);

		gates.remove(0).send(Ok(alice_and_bob())).unwrap();
		assert_eq!(second.await, RefreshOutcome::Applied);
		assert_eq!(*store.current_state(), LoadState::Ready(alice_and_bob()));
	}

	#[tokio::test]
	async fn test_last_issued_wins_when_older_load_resolves_last() {
		let (source, mut gates) = GatedSource::new(2);
		let store = OrderStore::new(source, quiet_diagnostics(), CompletionPolicy::LastIssued);
		let older = vec![order(1, "Alice", 10, OrderStatus::Paid, "2024-01-01T00:00:00Z")];
		let newer = alice_and_bob();

		let first = store.refresh();
		let second = store.refresh();
		tokio::pin!(first);
		tokio::pin!(second);
		assert!(futures::poll!(&mut first).is_pending());
		assert!(futures::poll!(&mut second).is_pending());

		let second_gate = gates.remove(1);
		let first_gate = gates.remove(0);

		second_gate.send(Ok(newer.clone())).unwrap();
		assert_eq!(second.await, RefreshOutcome::Applied);
		assert_eq!(*store.current_state(), LoadState::Ready(newer.clone()));

		first_gate.send(Ok(older)).unwrap();
		assert_eq!(first.await, RefreshOutcome::Superseded);
		assert_eq!(*store.current_state(), LoadState::Ready(newer));
	}

	#[tokio::test]
	async fn test_last_issued_ignores_older_load_resolving_first() {
		let (source, mut gates) = GatedSource::new(2);
		let store = OrderStore::new(source, quiet_diagnostics(), CompletionPolicy::LastIssued);
		let older = vec![order(1, "Alice", 10, OrderStatus::Paid, "2024-01-01T00:00:00Z")];

		let first = store.refresh();
		let second = store.refresh();
		tokio::pin!(first);
		tokio::pin!(second);
		assert!(futures::poll!(&mut first).is_pending());
		assert!(futures::poll!(&mut second).is_pending());

		let second_gate = gates.remove(1);
		let first_gate = gates.remove(0);

		first_gate.send(Ok(older)).unwrap();
		assert_eq!(first.await, RefreshOutcome::Superseded);
		assert_eq!(*store.current_state(), LoadState::Loading);

		second_gate.send(Ok(alice_and_bob())).unwrap();
		assert_eq!(second.await, RefreshOutcome::Applied);
		assert_eq!(*store.current_state(), LoadState::Ready(alice_and_bob()));
	}

	#[tokio::test]
	async fn test_last_resolved_wins_under_last_resolved_policy() {
		let (source, mut gates) = GatedSource::new(2);
		let store = OrderStore::new(source, quiet_diagnostics(), CompletionPolicy::LastResolved);
		let older = vec![order(1, "Alice", 10, OrderStatus::Paid, "2024-01-01T00:00:00Z")];

		let first = store.refresh();
		let second = store.refresh();
		tokio::pin!(first);
		tokio::pin!(second);
		assert!(futures::poll!(&mut first).is_pending());
		assert!(futures::poll!(&mut second).is_pending());

		let second_gate = gates.remove(1);
		let first_gate = gates.remove(0);

		second_gate.send(Ok(alice_and_bob())).unwrap();
		assert_eq!(second.await, RefreshOutcome::Applied);

		first_gate.send(Ok(older.clone())).unwrap();
		assert_eq!(first.await, RefreshOutcome::Applied);
		assert_eq!(*store.current_state(), LoadState::Ready(older));
	}

	#[tokio::test]
	async fn test_superseded_failure_is_still_recorded() {
		let (source, mut gates) = GatedSource::new(2);
		let mut diagnostics = MockDiagnosticsSink::new();
		diagnostics.expect_record().times(1).return_const(());
		let store = OrderStore::new(source, Arc::new(diagnostics), CompletionPolicy::LastIssued);

		let first = store.refresh();
		let second = store.refresh();
		tokio::pin!(first);
		tokio::pin!(second);
		assert!(futures::poll!(&mut first).is_pending());
		assert!(futures::poll!(&mut second).is_pending());

		let second_gate = gates.remove(1);
		let first_gate = gates.remove(0);

		second_gate.send(Ok(alice_and_bob())).unwrap();
		second.await;
		first_gate
			.send(Err(SourceError::Network("late failure".into())))
			.unwrap();
		assert_eq!(first.await, RefreshOutcome::Superseded);
		assert_eq!(*store.current_state(), LoadState::Ready(alice_and_bob()));
	}

	#[tokio::test]
	async fn test_observe_starts_initial_load_once() {
		let source = ScriptedSource::new(vec![Ok(alice_and_bob())]);
		let store = OrderStore::new(source.clone(), quiet_diagnostics(), CompletionPolicy::LastIssued);
		let mut updates = store.subscribe();

		assert_eq!(*store.observe(), LoadState::Loading);

		updates
			.wait_for(|state| matches!(**state, LoadState::Ready(_)))
			.await
			.unwrap();
		assert_eq!(*store.observe(), LoadState::Ready(alice_and_bob()));
		assert_eq!(source.calls(), 1);
	}

	#[tokio::test]
	async fn test_observe_after_explicit_refresh_does_not_reload() {
		let source = ScriptedSource::new(vec![Ok(alice_and_bob())]);
		let store = OrderStore::new(source.clone(), quiet_diagnostics(), CompletionPolicy::LastIssued);

		store.refresh().await;
		assert_eq!(*store.observe(), LoadState::Ready(alice_and_bob()));
		tokio::task::yield_now().await;
		assert_eq!(source.calls(), 1);
	}

	#[test]
	fn test_observe_without_runtime_stays_idle() {
		let source = ScriptedSource::new(vec![]);
		let store = OrderStore::new(source.clone(), quiet_diagnostics(), CompletionPolicy::LastIssued);

		assert_eq!(*store.observe(), LoadState::Idle);
		assert_eq!(source.calls(), 0);
	}

	#[tokio::test]
	async fn test_invalidation_listener_refreshes() {
		let first = vec![order(1, "Alice", 10, OrderStatus::Paid, "2024-01-01T00:00:00Z")];
		let source = ScriptedSource::new(vec![Ok(first), Ok(alice_and_bob())]);
		let store = OrderStore::new(source.clone(), quiet_diagnostics(), CompletionPolicy::LastIssued);
		let (tx, rx) = mpsc::unbounded_channel();
		let listener = store.spawn_invalidation_listener(rx);

		tx.send(Invalidation::UserRequest).unwrap();
		tx.send(Invalidation::DataChanged).unwrap();
		drop(tx);
		listener.await.unwrap();

		assert_eq!(source.calls(), 2);
		assert_eq!(*store.current_state(), LoadState::Ready(alice_and_bob()));
	}
}
