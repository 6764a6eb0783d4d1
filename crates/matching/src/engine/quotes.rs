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

use bourse_sdk::{BroadcastEvent, Instrument, MarketSummary, Quote, Side};
use chrono::Utc;
use tracing::{debug, instrument};

use super::{EngineError, MatchingEngine};

impl MatchingEngine {
	/// Recompute, store and broadcast a ticker's top-of-book quote
	#[instrument(skip(self))]
	pub async fn refresh_quote(&self, ticker: &str) -> Result<Quote, EngineError> {
		let _guard = self.inner.locks.acquire(ticker).await;
		self.publish_quote(ticker).await
	}

	/// [`refresh_quote`](Self::refresh_quote) with the ticker lock held
	pub(crate) async fn publish_quote(&self, ticker: &str) -> Result<Quote, EngineError> {
		let best_ask = self.resting_book(ticker, Side::Sell).await?.best_price();
		let best_bid = self.resting_book(ticker, Side::Buy).await?.best_price();
		let quote = Quote {
			ticker: ticker.to_string(),
			buy_p: best_ask,
			sell_p: best_bid,
			updated: Utc::now(),
		};

		let quotes = self.inner.catalog.quotes()?;
		let row = quote.clone();
		self.inner
			.store
			.update_or_default(&quotes, |rows: &mut Vec<Quote>| {
				match rows.iter_mut().find(|existing| existing.ticker == row.ticker) {
					Some(existing) => *existing = row,
					None => rows.push(row),
				}
			})
			.await?;

		// Only this ticker's row changes, so concurrent tickers never
		// overwrite each other's summaries
		let overview = self.inner.catalog.overview()?;
		let summary = MarketSummary::from(&quote);
		self.inner
			.store
			.update_or_default(&overview, |rows: &mut Vec<MarketSummary>| {
				rows.retain(|existing| existing.ticker != summary.ticker);
				rows.push(summary);
				rows.sort_by(|a, b| b.updated.cmp(&a.updated));
			})
			.await?;

		debug!(target: "engine", %ticker, buy_p = ?quote.buy_p, sell_p = ?quote.sell_p, "Quote refreshed");
		self.inner
			.broadcaster
			.broadcast(BroadcastEvent::Update { data: quote.clone() });
		Ok(quote)
	}

	/// Last published quote of a ticker
	pub async fn quote(&self, ticker: &str) -> Result<Option<Quote>, EngineError> {
		let quotes = self.inner.catalog.quotes()?;
		let rows: Vec<Quote> = self.inner.store.read_or_default(&quotes).await?;
		Ok(rows.into_iter().find(|row| row.ticker == ticker))
	}

	/// Every ticker's latest summary, most recently updated first
	pub async fn market_overview(&self) -> Result<Vec<MarketSummary>, EngineError> {
		let overview = self.inner.catalog.overview()?;
		Ok(self.inner.store.read_or_default(&overview).await?)
	}

	pub async fn instruments(&self) -> Result<Vec<Instrument>, EngineError> {
		let instruments = self.inner.catalog.instruments()?;
		Ok(self.inner.store.read_or_default(&instruments).await?)
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use bourse_store::{MemoryStorage, RecordStore, StoreConfig};
	use rust_decimal_macros::dec;

	use super::*;
	use crate::{broadcast::Broadcaster, catalog::Catalog, engine::EngineConfig};

	#[tokio::test]
	async fn test_overview_sorted_by_recency() {
		let store = RecordStore::new(Arc::new(MemoryStorage::new()), StoreConfig::default());
		let engine = MatchingEngine::new(
			store,
			Catalog::default(),
			EngineConfig::default(),
			Broadcaster::default(),
		);
		for ticker in ["ACME", "BOLT"] {
			engine
				.add_instrument(Instrument::new(ticker, 100, dec!(10000), dec!(90), dec!(110)))
				.await
				.unwrap();
		}

		let mut events = engine.broadcaster().subscribe();
		engine.refresh_quote("ACME").await.unwrap();
		engine.refresh_quote("BOLT").await.unwrap();
		engine.refresh_quote("ACME").await.unwrap();

		let overview = engine.market_overview().await.unwrap();
		assert_eq!(overview.len(), 2);
		assert!(overview[0].updated >= overview[1].updated);
		assert_eq!(engine.quote("BOLT").await.unwrap().unwrap().buy_p, None);

		let event = events.recv().await.unwrap();
		assert!(matches!(event, BroadcastEvent::Update { data } if data.ticker == "ACME"));
	}
}
