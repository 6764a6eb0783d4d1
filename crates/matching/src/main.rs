// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Exchange service entry point
//!
//! This binary wires up the exchange:
//! - File-backed dataset storage under the data directory
//! - Record store (write-back cache over the datasets)
//! - Broadcaster (event fan-out)
//! - Matching engine (books, settlement, liquidity provider)
//! - Quote scheduler (periodic top-of-book republishing)
//!
//! Set `BOURSE_CONFIG` to load a configuration file; `BOURSE_*`
//! environment variables override it.

use std::{env, sync::Arc};

use anyhow::{Context, Result};
use tokio::{signal, sync::broadcast::error::RecvError};
use tracing::{debug, info, warn};

use bourse_matching::{
	Broadcaster, Catalog, ExchangeConfig, ExchangeService, MatchingEngine, QuoteScheduler,
};
use bourse_store::{FileStorage, RecordStore};

fn load_config() -> ExchangeConfig {
	let loaded = match env::var("BOURSE_CONFIG") {
		Ok(path) => ExchangeConfig::from_file(&path),
		Err(_) => ExchangeConfig::from_env(),
	};
	loaded.unwrap_or_else(|e| {
		info!(target: "server", error = %e, "Using default configuration");
		ExchangeConfig::default()
	})
}

#[tokio::main]
async fn main() -> Result<()> {
	// Initialize logging first
	bourse_matching::logging::init_logging()?;

	let config = load_config();

	info!(target: "server", "Starting Bourse exchange");
	info!(target: "server", "Data directory: {}", config.data_dir.display());
	info!(
		target: "server",
		"Flush interval: {}ms, idle timeout: {}ms",
		config.store.flush_interval_ms, config.store.idle_timeout_ms
	);

	std::fs::create_dir_all(&config.data_dir).with_context(|| {
		format!(
			"Failed to create data directory: {}",
			config.data_dir.display()
		)
	})?;

	let storage = Arc::new(FileStorage::new(config.data_dir.clone()));
	let store = RecordStore::new(storage, config.store.clone());
	let broadcaster = Broadcaster::new(config.broadcast_capacity);
	let engine = MatchingEngine::new(
		store.clone(),
		Catalog::new(config.datasets.clone()),
		config.engine.clone(),
		broadcaster.clone(),
	);
	let service = ExchangeService::new(engine.clone());

	let instruments = service
		.instruments()
		.await
		.context("Failed to load instruments")?;
	info!(target: "server", "Instruments: {}", instruments.len());

	// Stand-in for the transport layer until one subscribes
	let mut events = broadcaster.subscribe();
	let event_log = tokio::spawn(async move {
		loop {
			match events.recv().await {
				Ok(event) => debug!(target: "broadcast", ?event, "Event"),
				Err(RecvError::Lagged(skipped)) => {
					warn!(target: "broadcast", skipped, "Event log lagging");
				}
				Err(RecvError::Closed) => break,
			}
		}
	});

	let scheduler = QuoteScheduler::start(engine, config.scheduler.clone());

	signal::ctrl_c()
		.await
		.context("Failed to listen for shutdown signal")?;

	info!(target: "server", "Shutting down...");
	scheduler.shutdown().await;
	event_log.abort();
	store
		.flush_all()
		.await
		.context("Failed to flush datasets on shutdown")?;

	info!(target: "server", "Shutdown complete");
	Ok(())
}
