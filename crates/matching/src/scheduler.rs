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

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info, warn};

use crate::engine::MatchingEngine;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
	/// Pause before each ticker's quote refresh
	pub refresh_delay_ms: u64,
}

impl Default for SchedulerConfig {
	fn default() -> Self {
		Self {
			refresh_delay_ms: 10_000,
		}
	}
}

impl SchedulerConfig {
	pub fn refresh_delay(&self) -> Duration {
		Duration::from_millis(self.refresh_delay_ms)
	}
}

/// Background loop republishing every ticker's quote
///
/// One pass visits the instruments in order, waiting the refresh delay
/// before each. The ticker list is re-read at the start of every pass, so
/// new instruments join on the next one. A failing ticker is logged and
/// skipped.
pub struct QuoteScheduler {
	handle: Option<JoinHandle<()>>,
	shutdown: watch::Sender<bool>,
}

impl QuoteScheduler {
	/// Start the loop on the current tokio runtime
	pub fn start(engine: MatchingEngine, config: SchedulerConfig) -> Self {
		let (shutdown, signal) = watch::channel(false);

		let handle = tokio::spawn(async move {
			info!(target: "scheduler", delay_ms = config.refresh_delay_ms, "Quote scheduler started");
			Self::run_refresh_loop(&engine, &config, signal).await;
			info!(target: "scheduler", "Quote scheduler stopped");
		});

		Self {
			handle: Some(handle),
			shutdown,
		}
	}

	/// Sleep for `delay`; `false` once shutdown was requested
	async fn pause(delay: Duration, signal: &mut watch::Receiver<bool>) -> bool {
		if *signal.borrow() {
			return false;
		}
		tokio::select! {
			_ = tokio::time::sleep(delay) => true,
			_ = signal.changed() => false,
		}
	}

	async fn run_refresh_loop(
		engine: &MatchingEngine,
		config: &SchedulerConfig,
		mut signal: watch::Receiver<bool>,
	) {
		let delay = config.refresh_delay();

		loop {
			let tickers: Vec<String> = match engine.instruments().await {
				Ok(instruments) => instruments.into_iter().map(|row| row.ticker).collect(),
				Err(e) => {
					error!(target: "scheduler", error = %e, "Failed to list instruments");
					Vec::new()
				}
			};

			if tickers.is_empty() && !Self::pause(delay, &mut signal).await {
				return;
			}

			for ticker in tickers {
				if !Self::pause(delay, &mut signal).await {
					return;
				}
				match engine.refresh_quote(&ticker).await {
					Ok(quote) => {
						debug!(target: "scheduler", %ticker, buy_p = ?quote.buy_p, sell_p = ?quote.sell_p, "Quote republished");
					}
					Err(e) => {
						warn!(target: "scheduler", %ticker, error = %e, "Quote refresh failed");
					}
				}
			}
		}
	}

	pub async fn shutdown(mut self) {
		info!(target: "scheduler", "Shutting down quote scheduler");
		self.shutdown.send_replace(true);

		if let Some(handle) = self.handle.take()
			&& let Err(e) = handle.await
		{
			warn!(target: "scheduler", error = ?e, "Quote scheduler task panicked");
		}
	}
}

impl Drop for QuoteScheduler {
	fn drop(&mut self) {
		self.shutdown.send_replace(true);
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use bourse_sdk::Instrument;
	use bourse_store::{MemoryStorage, RecordStore, StoreConfig};
	use rust_decimal_macros::dec;

	use super::*;
	use crate::{broadcast::Broadcaster, catalog::Catalog, engine::EngineConfig};

	fn create_test_engine() -> MatchingEngine {
		let store = RecordStore::new(Arc::new(MemoryStorage::new()), StoreConfig::default());
		MatchingEngine::new(
			store,
			Catalog::default(),
			EngineConfig::default(),
			Broadcaster::default(),
		)
	}

	#[tokio::test(start_paused = true)]
	async fn test_refreshes_each_ticker_after_delay() {
		let engine = create_test_engine();
		for ticker in ["ACME", "BOLT"] {
			engine
				.add_instrument(Instrument::new(ticker, 100, dec!(10000), dec!(90), dec!(110)))
				.await
				.unwrap();
		}

		let scheduler = QuoteScheduler::start(engine.clone(), SchedulerConfig::default());

		tokio::time::sleep(Duration::from_secs(5)).await;
		assert!(engine.quote("ACME").await.unwrap().is_none());

		tokio::time::sleep(Duration::from_secs(6)).await;
		assert!(engine.quote("ACME").await.unwrap().is_some());
		assert!(engine.quote("BOLT").await.unwrap().is_none());

		tokio::time::sleep(Duration::from_secs(10)).await;
		assert!(engine.quote("BOLT").await.unwrap().is_some());

		scheduler.shutdown().await;
	}

	#[tokio::test(start_paused = true)]
	async fn test_shutdown_interrupts_wait() {
		let engine = create_test_engine();
		let scheduler = QuoteScheduler::start(engine, SchedulerConfig::default());

		tokio::time::sleep(Duration::from_millis(10)).await;
		scheduler.shutdown().await;
	}
}
