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

//! Liquidity provider: pool repricing and quote maintenance
//!
//! After every fill against the LP its reserves shift, the pool is
//! repriced and the consumed side is requoted at once. The other side is
//! requoted at once only when the fresh quote is better for takers;
//! otherwise a single delayed requote per ticker is scheduled.

use bourse_sdk::{ExecutionType, Instrument, Side};
use rust_decimal::Decimal;
use tracing::{debug, error, info, instrument, warn};

use super::{
	EngineError, MatchingEngine, OrderOutcome, OrderRequest, RemoveScope, order_value,
};
use crate::pricing::{PoolQuote, quote_pool};

/// Reserve change from the LP trading `quantity` units at `price`
#[derive(Debug, Clone, Copy)]
struct LpShift {
	/// Side the LP traded on
	side: Side,
	price: Decimal,
	quantity: u64,
}

impl LpShift {
	fn apply(&self, x: u64, y: Decimal) -> Result<(u64, Decimal), EngineError> {
		let value = order_value(self.price, self.quantity).ok_or_else(|| {
			EngineError::Inconsistent(format!(
				"LP trade of {} @ {} out of range",
				self.quantity, self.price
			))
		})?;
		match self.side {
			Side::Sell => {
				let x = x.checked_sub(self.quantity).ok_or_else(|| {
					EngineError::Inconsistent(format!(
						"LP sold {} units holding {x}",
						self.quantity
					))
				})?;
				Ok((x, y + value))
			}
			Side::Buy => {
				let x = x.checked_add(self.quantity).ok_or_else(|| {
					EngineError::Inconsistent("LP base reserve overflow".to_string())
				})?;
				Ok((x, y - value))
			}
		}
	}
}

fn apply_quote(instrument: &mut Instrument, quote: &PoolQuote) {
	instrument.l = quote.l;
	instrument.price = quote.price;
	instrument.buy_p = quote.bid;
	instrument.sell_p = quote.ask;
}

/// The LP's current quote for one side of the book
fn lp_quote(instrument: &Instrument, side: Side) -> Option<Decimal> {
	match side {
		Side::Buy => instrument.buy_p,
		Side::Sell => instrument.sell_p,
	}
}

/// Whether replacing `resting` by `fresh` on `side` gives takers a better
/// price (a higher bid, a lower ask, or a quote where there was none)
fn improves_for_takers(side: Side, fresh: Option<Decimal>, resting: Option<Decimal>) -> bool {
	match (fresh, resting) {
		(Some(fresh), Some(resting)) => match side {
			Side::Buy => fresh > resting,
			Side::Sell => fresh < resting,
		},
		(Some(_), None) => true,
		(None, _) => false,
	}
}

impl MatchingEngine {
	/// Register a new instrument, priced from its initial reserves
	///
	/// Returns `false` if the ticker already exists. The LP quotes nothing
	/// until [`post_liquidity`](Self::post_liquidity) is called.
	pub async fn add_instrument(&self, mut instrument: Instrument) -> Result<bool, EngineError> {
		let _guard = self.inner.locks.acquire(&instrument.ticker).await;

		let quote = quote_pool(instrument.pa, instrument.pb, instrument.x, instrument.y)?;
		apply_quote(&mut instrument, &quote);

		let instruments = self.inner.catalog.instruments()?;
		let ticker = instrument.ticker.clone();
		let added = self
			.inner
			.store
			.update_or_default(&instruments, |rows: &mut Vec<Instrument>| {
				if rows.iter().any(|row| row.ticker == instrument.ticker) {
					return false;
				}
				rows.push(instrument);
				true
			})
			.await?;

		if added {
			info!(target: "liquidity", %ticker, l = %quote.l, price = %quote.price, "Instrument added");
		}
		Ok(added)
	}

	/// Reprice the pool and place the LP's quotes on both sides
	#[instrument(skip(self))]
	pub async fn post_liquidity(&self, ticker: &str) -> Result<Instrument, EngineError> {
		let _guard = self.inner.locks.acquire(ticker).await;
		self.requote_lp(ticker).await
	}

	pub(crate) async fn require_instrument(&self, ticker: &str) -> Result<Instrument, EngineError> {
		self.instrument(ticker)
			.await?
			.ok_or_else(|| EngineError::UnknownInstrument(ticker.to_string()))
	}

	/// Recompute the pool from its reserves, shifted first if given
	async fn reprice(&self, ticker: &str, shift: Option<LpShift>) -> Result<Instrument, EngineError> {
		let instruments = self.inner.catalog.instruments()?;
		self.inner
			.store
			.update_or_default(
				&instruments,
				|rows: &mut Vec<Instrument>| -> Result<Instrument, EngineError> {
					let row = rows
						.iter_mut()
						.find(|row| row.ticker == ticker)
						.ok_or_else(|| EngineError::UnknownInstrument(ticker.to_string()))?;
					let (x, y) = match shift {
						Some(shift) => shift.apply(row.x, row.y)?,
						None => (row.x, row.y),
					};
					let quote = quote_pool(row.pa, row.pb, x, y)?;
					row.x = x;
					row.y = y;
					apply_quote(row, &quote);
					Ok(row.clone())
				},
			)
			.await?
	}

	/// Add the LP's share of a sale tax to its quote reserve
	pub(crate) async fn credit_lp_reserve(
		&self,
		ticker: &str,
		amount: Decimal,
	) -> Result<(), EngineError> {
		let instruments = self.inner.catalog.instruments()?;
		let credited = self
			.inner
			.store
			.update_or_default(&instruments, |rows: &mut Vec<Instrument>| {
				let row = rows.iter_mut().find(|row| row.ticker == ticker)?;
				row.y += amount;
				Some(row.y)
			})
			.await?;

		match credited {
			Some(y) => {
				debug!(target: "liquidity", %ticker, %amount, %y, "Tax share credited to LP");
				Ok(())
			}
			None => Err(EngineError::UnknownInstrument(ticker.to_string())),
		}
	}

	async fn lp_resting_price(&self, ticker: &str, side: Side) -> Result<Option<Decimal>, EngineError> {
		let book = self.resting_book(ticker, side).await?;
		Ok(book.price_of(&self.lp_id(ticker)))
	}

	/// Rebalance the LP after it traded `quantity` units on `lp_side`
	pub(crate) async fn update_lp_details(
		&self,
		ticker: &str,
		lp_side: Side,
		price: Decimal,
		quantity: u64,
	) -> Result<(), EngineError> {
		let instrument = self
			.reprice(
				ticker,
				Some(LpShift {
					side: lp_side,
					price,
					quantity,
				}),
			)
			.await?;
		info!(
			target: "liquidity",
			%ticker,
			side = %lp_side,
			%price,
			quantity,
			x = instrument.x,
			y = %instrument.y,
			"LP rebalanced"
		);

		self.replace_lp_quote(ticker, lp_side, lp_quote(&instrument, lp_side))
			.await?;

		// The requote above may itself have traded
		let instrument = self.require_instrument(ticker).await?;
		let other = lp_side.opposite();
		let fresh = lp_quote(&instrument, other);
		let resting = self.lp_resting_price(ticker, other).await?;
		if improves_for_takers(other, fresh, resting) {
			self.replace_lp_quote(ticker, other, fresh).await?;
		} else {
			self.schedule_requote(ticker);
		}
		Ok(())
	}

	/// Swap every LP order on `side` for a single unit at `price`
	async fn replace_lp_quote(
		&self,
		ticker: &str,
		side: Side,
		price: Option<Decimal>,
	) -> Result<(), EngineError> {
		let lp = self.lp_id(ticker);
		self.remove_order_locked(ticker, side, &lp, RemoveScope::All)
			.await?;

		let Some(price) = price else {
			debug!(target: "liquidity", %ticker, %side, "LP has no quote on this side");
			return Ok(());
		};
		let outcome = self
			.add_order_locked(OrderRequest {
				ticker: ticker.to_string(),
				side,
				quantity: 1,
				price,
				user_id: lp,
				execution: ExecutionType::Book,
			})
			.await?;
		if let OrderOutcome::Rejected(reason) = outcome {
			warn!(target: "liquidity", %ticker, %side, %price, %reason, "LP quote rejected");
		}
		Ok(())
	}

	/// Requote the LP after the configured delay, at most once per ticker
	fn schedule_requote(&self, ticker: &str) {
		if !self.inner.pending_requotes.insert(ticker.to_string()) {
			debug!(target: "liquidity", %ticker, "Requote already pending");
			return;
		}

		let engine = self.clone();
		let ticker = ticker.to_string();
		let delay = self.inner.config.lp_requote_delay();
		debug!(target: "liquidity", %ticker, ?delay, "Requote scheduled");

		tokio::spawn(async move {
			tokio::time::sleep(delay).await;
			let _guard = engine.inner.locks.acquire(&ticker).await;
			engine.inner.pending_requotes.remove(&ticker);
			if let Err(e) = engine.requote_lp(&ticker).await {
				error!(target: "liquidity", %ticker, error = %e, "Delayed requote failed");
			}
		});
	}

	pub fn requote_pending(&self, ticker: &str) -> bool {
		self.inner.pending_requotes.contains(ticker)
	}

	/// Reprice from current reserves and replace every LP side whose
	/// resting price differs from the fresh quote
	async fn requote_lp(&self, ticker: &str) -> Result<Instrument, EngineError> {
		self.reprice(ticker, None).await?;

		for side in [Side::Sell, Side::Buy] {
			let instrument = self.require_instrument(ticker).await?;
			let fresh = lp_quote(&instrument, side);
			let resting = self.lp_resting_price(ticker, side).await?;
			if fresh != resting {
				self.replace_lp_quote(ticker, side, fresh).await?;
			}
		}

		self.publish_quote(ticker).await?;
		self.require_instrument(ticker).await
	}
}
