//! Command-line display for the order view.
//!
//! Loads orders from the configured source, applies the filter criteria
//! given on the command line and prints the resulting table and revenue.
//! With `--watch` the orders are reloaded periodically and the view is
//! printed again after every completed load.

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use orderview_config::Config;
use orderview_core::{Invalidation, OrderStore, OrderView, OrderViewBuilder};
use orderview_source::{get_all_implementations, SourceFactory};
use orderview_types::{CriteriaError, FilterCriteria, LoadState, StatusFilter};
use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};

mod render;

/// Command-line arguments for the order view.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	/// Only show orders whose customer name contains this text
	#[arg(short, long)]
	search: Option<String>,

	/// Only show orders with this status (all, pending, paid, shipped, cancelled)
	#[arg(long, default_value = "all")]
	status: StatusFilter,

	/// Only show orders with at least this total
	#[arg(long)]
	min_total: Option<String>,

	/// Print JSON instead of a table
	#[arg(long)]
	json: bool,

	/// Reload every N seconds until interrupted
	#[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
	watch: Option<u64>,
}

impl Args {
	/// Builds filter criteria, rejecting malformed input.
	fn criteria(&self) -> Result<FilterCriteria, CriteriaError> {
		let min_total = match &self.min_total {
			Some(raw) => FilterCriteria::parse_min_total(raw)?,
			None => None,
		};

		Ok(FilterCriteria {
			search_text: self.search.clone().filter(|text| !text.is_empty()),
			status: self.status,
			min_total,
		})
	}
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	let criteria = match args.criteria() {
		Ok(criteria) => criteria,
		Err(e) => Args::command().error(ErrorKind::ValueValidation, e).exit(),
	};

	let config = Config::from_file(&args.config).await?;
	tracing::info!(source = %config.source.primary, "Loaded configuration");

	let store = OrderViewBuilder::new(config).build(&source_factories())?;
	let mut updates = store.subscribe();

	store.observe();
	let state = wait_until_settled(&mut updates).await?;
	print_view(&state, &criteria, args.json)?;

	if let Some(seconds) = args.watch {
		let period = Duration::from_secs(seconds);
		watch_orders(&store, updates, &criteria, args.json, period, interrupted()).await?;
	}

	Ok(())
}

/// Collects every registered source factory by name.
fn source_factories() -> HashMap<String, SourceFactory> {
	get_all_implementations()
		.into_iter()
		.map(|(name, factory)| (name.to_string(), factory))
		.collect()
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves.
async fn interrupted() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
		std::future::pending::<()>().await;
	}
}

/// Waits until no load is pending and returns the settled state.
async fn wait_until_settled(
	updates: &mut watch::Receiver<Arc<LoadState>>,
) -> Result<Arc<LoadState>, watch::error::RecvError> {
	let state = updates.wait_for(|state| !state.is_pending()).await?;
	Ok(state.clone())
}

fn print_view(
	state: &LoadState,
	criteria: &FilterCriteria,
	json: bool,
) -> Result<(), serde_json::Error> {
	let view = OrderView::derive(state, criteria);
	let output = if json {
		render::render_json(&view)?
	} else {
		render::render_text(&view)
	};
	println!("{}", output);
	Ok(())
}

/// Reloads on a fixed interval and prints each settled state until
/// `shutdown` resolves.
async fn watch_orders(
	store: &OrderStore,
	mut updates: watch::Receiver<Arc<LoadState>>,
	criteria: &FilterCriteria,
	json: bool,
	period: Duration,
	shutdown: impl Future<Output = ()>,
) -> Result<(), Box<dyn std::error::Error>> {
	tokio::pin!(shutdown);
	let (signals, receiver) = mpsc::unbounded_channel();
	let listener = store.spawn_invalidation_listener(receiver);

	let mut ticker = tokio::time::interval(period);
	// The first tick completes immediately and the initial load already ran
	ticker.tick().await;

	loop {
		tokio::select! {
			_ = ticker.tick() => {
				signals.send(Invalidation::Scheduled)?;
			}
			changed = updates.changed() => {
				changed?;
				let state = updates.borrow_and_update().clone();
				if !state.is_pending() {
					println!();
					print_view(&state, criteria, json)?;
				}
			}
			_ = &mut shutdown => {
				tracing::info!("Interrupted, stopping");
				break;
			}
		}
	}

	drop(signals);
	listener.await?;
	Ok(())
}
