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

mod accounts;
mod liquidity;
mod quotes;

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use bourse_sdk::{BookOrder, ExecutionType, Instrument, OrderRecord, OrderStatus, Side};
use bourse_store::{RecordStore, StoreError};
use chrono::Utc;
use dashmap::DashSet;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::{
	broadcast::Broadcaster,
	catalog::Catalog,
	lock::KeyedLocks,
	orderbook::{RestingBook, crosses},
	pricing::{PRICE_DECIMALS, PricingError},
};

/// Boxed future, needed where LP requotes re-enter order placement
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Error types for matching engine operations
///
/// Invalid orders are not errors; they come back as
/// [`OrderOutcome::Rejected`].
#[derive(Debug, Error)]
pub enum EngineError {
	#[error(transparent)]
	Store(#[from] StoreError),
	#[error("Pricing failed: {0}")]
	Pricing(#[from] PricingError),
	#[error("Instrument not found: {0}")]
	UnknownInstrument(String),
	#[error("Inconsistent state: {0}")]
	Inconsistent(String),
}

/// Matching, settlement and liquidity provider parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	/// Share of a sale withheld as tax
	pub tax_rate: Decimal,
	/// Smallest tax charged on any sale
	pub min_tax: Decimal,
	/// Account receiving the part of the tax not paid to the LP
	pub fee_account: String,
	/// LP identities are `{lp_prefix}{ticker}`
	pub lp_prefix: String,
	/// Delay before a deferred LP requote fires
	pub lp_requote_delay_ms: u64,
	/// Balance of a newly registered user
	pub starting_balance: Decimal,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			tax_rate: dec!(0.01),
			min_tax: dec!(0.01),
			fee_account: "1".to_string(),
			lp_prefix: "LP-".to_string(),
			lp_requote_delay_ms: 10_000,
			starting_balance: dec!(5000),
		}
	}
}

impl EngineConfig {
	pub fn lp_requote_delay(&self) -> Duration {
		Duration::from_millis(self.lp_requote_delay_ms)
	}
}

/// An order as submitted
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
	pub ticker: String,
	pub side: Side,
	pub quantity: u64,
	pub price: Decimal,
	pub user_id: String,
	pub execution: ExecutionType,
}

/// Withdrawal of (part of) a resting order
#[derive(Debug, Clone, PartialEq)]
pub struct CancelRequest {
	pub ticker: String,
	pub side: Side,
	pub quantity: u64,
	pub price: Decimal,
	pub user_id: String,
}

/// Which resting orders of a user [`MatchingEngine::remove_order`] removes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoveScope {
	/// Up to `quantity` from the first order at exactly `price`
	Matching { price: Decimal, quantity: u64 },
	/// Every order of the user on that side
	All,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
	#[error("unknown ticker {0}")]
	UnknownTicker(String),
	#[error("unknown user {0}")]
	UnknownUser(String),
	#[error("price {0} must be positive with at most 2 decimals")]
	InvalidPrice(Decimal),
	#[error("quantity must be positive")]
	InvalidQuantity,
	#[error("insufficient balance: needs {needed}, has {available}")]
	InsufficientBalance { needed: Decimal, available: Decimal },
	#[error("insufficient inventory: needs {needed}, holds {held}")]
	InsufficientInventory { needed: u64, held: u64 },
	#[error("no resting liquidity on the opposite side")]
	NoLiquidity,
	#[error("requested price {requested} does not match best price {best}")]
	PriceMismatch { requested: Decimal, best: Decimal },
	#[error("value of {quantity} @ {price} is out of range")]
	AmountOverflow { quantity: u64, price: Decimal },
}

/// `price × quantity`, `None` beyond the range of [`Decimal`]
fn order_value(price: Decimal, quantity: u64) -> Option<Decimal> {
	price.checked_mul(Decimal::from(quantity))
}

/// One match against a resting order
#[derive(Debug, Clone, PartialEq)]
pub struct Fill {
	pub counterparty: String,
	pub quantity: u64,
	pub price: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Execution {
	pub fills: Vec<Fill>,
	/// Quantity left resting in the book
	pub resting: u64,
	/// Own resting orders canceled instead of matched
	pub self_trade_cancels: u32,
}

impl Execution {
	pub fn filled_quantity(&self) -> u64 {
		self.fills.iter().map(|fill| fill.quantity).sum()
	}

	fn is_empty(&self) -> bool {
		self.fills.is_empty() && self.resting == 0 && self.self_trade_cancels == 0
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderOutcome {
	Rejected(RejectReason),
	Executed(Execution),
}

impl OrderOutcome {
	pub fn is_rejected(&self) -> bool {
		matches!(self, OrderOutcome::Rejected(_))
	}

	pub fn execution(&self) -> Option<&Execution> {
		match self {
			OrderOutcome::Executed(execution) => Some(execution),
			OrderOutcome::Rejected(_) => None,
		}
	}
}

/// Price-time priority matching over durable per-ticker books
///
/// Every operation touching a ticker runs under that ticker's fair lock, so
/// orders on one ticker are processed one at a time in arrival order while
/// different tickers proceed independently. Shared datasets (accounts and
/// inventories) are only changed through single check-and-update
/// transforms in the record store.
///
/// The liquidity provider of a ticker trades through the same books under
/// the identity `{lp_prefix}{ticker}`, quoting one unit on each side from
/// its pool. Its funds live in the instrument row rather than in an
/// account, so its orders reserve nothing.
#[derive(Clone)]
pub struct MatchingEngine {
	inner: Arc<EngineInner>,
}

struct EngineInner {
	store: RecordStore,
	catalog: Catalog,
	config: EngineConfig,
	broadcaster: Broadcaster,
	locks: KeyedLocks,
	/// Tickers with a deferred LP requote waiting to fire
	pending_requotes: DashSet<String>,
}

impl MatchingEngine {
	pub fn new(
		store: RecordStore,
		catalog: Catalog,
		config: EngineConfig,
		broadcaster: Broadcaster,
	) -> Self {
		Self {
			inner: Arc::new(EngineInner {
				store,
				catalog,
				config,
				broadcaster,
				locks: KeyedLocks::new(),
				pending_requotes: DashSet::new(),
			}),
		}
	}

	pub fn store(&self) -> &RecordStore {
		&self.inner.store
	}

	pub fn catalog(&self) -> &Catalog {
		&self.inner.catalog
	}

	pub fn config(&self) -> &EngineConfig {
		&self.inner.config
	}

	pub fn broadcaster(&self) -> &Broadcaster {
		&self.inner.broadcaster
	}

	pub fn lp_id(&self, ticker: &str) -> String {
		format!("{}{}", self.inner.config.lp_prefix, ticker)
	}

	fn is_lp(&self, ticker: &str, user_id: &str) -> bool {
		user_id
			.strip_prefix(self.inner.config.lp_prefix.as_str())
			.is_some_and(|rest| rest == ticker)
	}

	/// Submit an order
	#[instrument(skip(self, request), fields(ticker = %request.ticker, user = %request.user_id))]
	pub async fn add_order(&self, request: OrderRequest) -> Result<OrderOutcome, EngineError> {
		let _guard = self.inner.locks.acquire(&request.ticker).await;
		self.add_order_locked(request).await
	}

	/// Order placement with the ticker lock already held
	pub(crate) fn add_order_locked(
		&self,
		request: OrderRequest,
	) -> BoxFuture<'_, Result<OrderOutcome, EngineError>> {
		Box::pin(async move {
			debug!(
				target: "engine",
				"Processing order: {} {} {} {} @ {} ({:?})",
				request.user_id, request.side, request.quantity, request.ticker, request.price, request.execution
			);

			if let Some(reason) = self.check_order(&request).await? {
				warn!(target: "engine", user = %request.user_id, ticker = %request.ticker, %reason, "Order rejected");
				return Ok(OrderOutcome::Rejected(reason));
			}

			let outcome = match request.execution {
				ExecutionType::Market => self.execute_market(&request).await?,
				ExecutionType::Book => self.execute_book(&request).await?,
			};

			match &outcome {
				OrderOutcome::Rejected(reason) => {
					warn!(target: "engine", user = %request.user_id, ticker = %request.ticker, %reason, "Order rejected");
				}
				OrderOutcome::Executed(execution) => {
					info!(
						target: "engine",
						user = %request.user_id,
						ticker = %request.ticker,
						side = %request.side,
						filled = execution.filled_quantity(),
						resting = execution.resting,
						"Order executed"
					);
				}
			}
			Ok(outcome)
		})
	}

	/// Static validation plus the worst-case funds check for book orders
	async fn check_order(&self, request: &OrderRequest) -> Result<Option<RejectReason>, EngineError> {
		if self.instrument(&request.ticker).await?.is_none() {
			return Ok(Some(RejectReason::UnknownTicker(request.ticker.clone())));
		}
		if request.price <= Decimal::ZERO || request.price.normalize().scale() > PRICE_DECIMALS {
			return Ok(Some(RejectReason::InvalidPrice(request.price)));
		}
		if request.quantity == 0 {
			return Ok(Some(RejectReason::InvalidQuantity));
		}
		// Every later amount is at most this value
		if order_value(request.price, request.quantity).is_none() {
			return Ok(Some(RejectReason::AmountOverflow {
				quantity: request.quantity,
				price: request.price,
			}));
		}

		if self.is_lp(&request.ticker, &request.user_id) {
			return Ok(None);
		}
		if self.account(&request.user_id).await?.is_none() {
			return Ok(Some(RejectReason::UnknownUser(request.user_id.clone())));
		}

		match request.execution {
			ExecutionType::Book => {
				self.check_funds(request, request.quantity, request.price)
					.await
			}
			ExecutionType::Market => Ok(None),
		}
	}

	/// Whether `user` can cover `quantity` units at `price` on its side
	async fn check_funds(
		&self,
		request: &OrderRequest,
		quantity: u64,
		price: Decimal,
	) -> Result<Option<RejectReason>, EngineError> {
		match request.side {
			Side::Buy => {
				let Some(needed) = order_value(price, quantity) else {
					return Ok(Some(RejectReason::AmountOverflow { quantity, price }));
				};
				let available = self.balance_of(&request.user_id).await?;
				Ok((available < needed)
					.then_some(RejectReason::InsufficientBalance { needed, available }))
			}
			Side::Sell => {
				let held = self.holding_of(&request.user_id, &request.ticker).await?;
				Ok((held < quantity).then_some(RejectReason::InsufficientInventory {
					needed: quantity,
					held,
				}))
			}
		}
	}

	async fn resting_book(&self, ticker: &str, side: Side) -> Result<RestingBook, EngineError> {
		let book = self.inner.catalog.book(ticker, side)?;
		Ok(self.inner.store.read_or_default(&book).await?)
	}

	/// Resting orders of one side of a ticker, best first
	pub async fn book(&self, ticker: &str, side: Side) -> Result<RestingBook, EngineError> {
		self.resting_book(ticker, side).await
	}

	/// Market orders settle exactly one unit, and only at the best opposite
	/// price
	async fn execute_market(&self, request: &OrderRequest) -> Result<OrderOutcome, EngineError> {
		let ticker = request.ticker.as_str();
		let opposite = request.side.opposite();

		let book = self.resting_book(ticker, opposite).await?;
		let Some(best) = book.best().cloned() else {
			return Ok(OrderOutcome::Rejected(RejectReason::NoLiquidity));
		};
		if best.price != request.price {
			return Ok(OrderOutcome::Rejected(RejectReason::PriceMismatch {
				requested: request.price,
				best: best.price,
			}));
		}

		if best.user == request.user_id {
			self.cancel_self_trade(ticker, opposite, &best).await?;
			self.publish_quote(ticker).await?;
			return Ok(OrderOutcome::Executed(Execution {
				self_trade_cancels: 1,
				..Execution::default()
			}));
		}

		if !self.is_lp(ticker, &request.user_id)
			&& let Some(reason) = self.check_funds(request, 1, best.price).await?
		{
			return Ok(OrderOutcome::Rejected(reason));
		}
		if let Some(reason) = self
			.settle_fill(ticker, request.side, &request.user_id, &best, 1)
			.await?
		{
			return Ok(OrderOutcome::Rejected(reason));
		}

		self.publish_quote(ticker).await?;
		Ok(OrderOutcome::Executed(Execution {
			fills: vec![Fill {
				counterparty: best.user,
				quantity: 1,
				price: best.price,
			}],
			..Execution::default()
		}))
	}

	/// Walk the opposite book while it crosses the limit, then rest the rest
	async fn execute_book(&self, request: &OrderRequest) -> Result<OrderOutcome, EngineError> {
		let ticker = request.ticker.as_str();
		let side = request.side;
		let mut remaining = request.quantity;
		let mut execution = Execution::default();

		while remaining > 0 {
			// Re-read every round: an LP fill may have placed new quotes
			let book = self.resting_book(ticker, side.opposite()).await?;
			let Some(best) = book.best().cloned() else {
				break;
			};
			if !crosses(side, request.price, best.price) {
				break;
			}

			if best.user == request.user_id {
				self.cancel_self_trade(ticker, side.opposite(), &best).await?;
				execution.self_trade_cancels += 1;
				continue;
			}

			let quantity = remaining.min(best.q);
			if let Some(reason) = self
				.settle_fill(ticker, side, &request.user_id, &best, quantity)
				.await?
			{
				if execution.is_empty() {
					return Ok(OrderOutcome::Rejected(reason));
				}
				warn!(target: "engine", user = %request.user_id, %ticker, %reason, "Stopping match walk");
				remaining = 0;
				break;
			}

			remaining -= quantity;
			execution.fills.push(Fill {
				counterparty: best.user,
				quantity,
				price: best.price,
			});
		}

		if remaining > 0 {
			if self
				.reserve(ticker, side, &request.user_id, request.price, remaining)
				.await?
			{
				self.rest_order(ticker, side, &request.user_id, request.price, remaining)
					.await?;
				execution.resting = remaining;
			} else {
				match self.check_funds(request, remaining, request.price).await? {
					Some(reason) if execution.is_empty() => {
						return Ok(OrderOutcome::Rejected(reason));
					}
					_ => {
						warn!(target: "engine", user = %request.user_id, %ticker, remaining, "Remainder could not be reserved");
					}
				}
			}
		}

		self.publish_quote(ticker).await?;
		Ok(OrderOutcome::Executed(execution))
	}

	/// Insert a reserved remainder into its book and the owner's history
	async fn rest_order(
		&self,
		ticker: &str,
		side: Side,
		user_id: &str,
		price: Decimal,
		quantity: u64,
	) -> Result<(), EngineError> {
		let date = Utc::now();
		let book = self.inner.catalog.book(ticker, side)?;
		self.inner
			.store
			.update_or_default(&book, |resting: &mut RestingBook| {
				resting.add_order(
					side,
					BookOrder {
						q: quantity,
						price,
						user: user_id.to_string(),
						date,
					},
				)
			})
			.await?;

		self.record_history(
			ticker,
			user_id,
			OrderRecord {
				stock: ticker.to_string(),
				action: side,
				q: quantity,
				price,
				date,
				status: OrderStatus::Resting,
			},
		)
		.await
	}

	/// Exchange `quantity` units at the maker's price
	///
	/// The taker's side is taken first as an atomic check-and-update; if it
	/// cannot be covered nothing changes and the reason is returned.
	async fn settle_fill(
		&self,
		ticker: &str,
		taker_side: Side,
		taker: &str,
		maker: &BookOrder,
		quantity: u64,
	) -> Result<Option<RejectReason>, EngineError> {
		let price = maker.price;
		// A sell can fill above its limit
		let Some(amount) = order_value(price, quantity) else {
			return Ok(Some(RejectReason::AmountOverflow { quantity, price }));
		};
		let taker_is_lp = self.is_lp(ticker, taker);
		let maker_is_lp = self.is_lp(ticker, &maker.user);

		if !taker_is_lp {
			match taker_side {
				Side::Buy => {
					if !self.debit_if_sufficient(taker, amount).await? {
						let available = self.balance_of(taker).await?;
						return Ok(Some(RejectReason::InsufficientBalance {
							needed: amount,
							available,
						}));
					}
				}
				Side::Sell => {
					if !self.take_holding(taker, ticker, quantity).await? {
						let held = self.holding_of(taker, ticker).await?;
						return Ok(Some(RejectReason::InsufficientInventory {
							needed: quantity,
							held,
						}));
					}
				}
			}
		}

		let consumed = self
			.withdraw(ticker, taker_side.opposite(), &maker.user, price, quantity)
			.await?;
		if consumed != quantity {
			return Err(EngineError::Inconsistent(format!(
				"resting order of {} in {ticker} held {consumed} of {quantity}",
				maker.user
			)));
		}

		match taker_side {
			Side::Buy => {
				if !taker_is_lp {
					self.add_holding(taker, ticker, quantity).await?;
				}
				if !maker_is_lp {
					self.credit_sale(ticker, &maker.user, amount).await?;
				}
			}
			Side::Sell => {
				if !taker_is_lp {
					self.credit_sale(ticker, taker, amount).await?;
				}
				if !maker_is_lp {
					self.add_holding(&maker.user, ticker, quantity).await?;
				}
			}
		}

		let date = Utc::now();
		for (user, side) in [(taker, taker_side), (maker.user.as_str(), taker_side.opposite())] {
			self.record_history(
				ticker,
				user,
				OrderRecord {
					stock: ticker.to_string(),
					action: side,
					q: quantity,
					price,
					date,
					status: OrderStatus::Filled,
				},
			)
			.await?;
		}

		debug!(target: "engine", %ticker, %taker, maker = %maker.user, quantity, %price, "Fill settled");

		if maker_is_lp {
			self.update_lp_details(ticker, taker_side.opposite(), price, quantity)
				.await?;
		}
		if taker_is_lp {
			self.update_lp_details(ticker, taker_side, price, quantity)
				.await?;
		}
		Ok(None)
	}

	/// Reserve the funds a resting order ties up; LP orders reserve nothing
	async fn reserve(
		&self,
		ticker: &str,
		side: Side,
		user_id: &str,
		price: Decimal,
		quantity: u64,
	) -> Result<bool, EngineError> {
		if self.is_lp(ticker, user_id) {
			return Ok(true);
		}
		match side {
			Side::Buy => match order_value(price, quantity) {
				Some(amount) => self.debit_if_sufficient(user_id, amount).await,
				None => Ok(false),
			},
			Side::Sell => self.take_holding(user_id, ticker, quantity).await,
		}
	}

	/// Give back what `quantity` units of a resting order reserved
	async fn refund(
		&self,
		ticker: &str,
		side: Side,
		user_id: &str,
		price: Decimal,
		quantity: u64,
	) -> Result<(), EngineError> {
		if quantity == 0 || self.is_lp(ticker, user_id) {
			return Ok(());
		}
		match side {
			Side::Buy => {
				let amount = order_value(price, quantity).ok_or_else(|| {
					EngineError::Inconsistent(format!(
						"refund of {quantity} @ {price} to {user_id} out of range"
					))
				})?;
				self.adjust_balance(user_id, amount).await?;
			}
			Side::Sell => self.add_holding(user_id, ticker, quantity).await?,
		}
		Ok(())
	}

	/// Take up to `quantity` from the first resting order of `user_id` at
	/// exactly `price`, without refund
	///
	/// The book is only written when there is something to take.
	async fn withdraw(
		&self,
		ticker: &str,
		side: Side,
		user_id: &str,
		price: Decimal,
		quantity: u64,
	) -> Result<u64, EngineError> {
		let book = self.inner.catalog.book(ticker, side)?;
		let resting: RestingBook = self.inner.store.read_or_default(&book).await?;
		if quantity == 0 || !resting.has_order(user_id, price) {
			return Ok(0);
		}
		Ok(self
			.inner
			.store
			.update_or_default(&book, |resting: &mut RestingBook| {
				resting.remove_quantity(user_id, price, quantity)
			})
			.await?)
	}

	async fn cancel_self_trade(
		&self,
		ticker: &str,
		side: Side,
		resting: &BookOrder,
	) -> Result<(), EngineError> {
		info!(target: "engine", %ticker, user = %resting.user, %side, price = %resting.price, "Self-trade, canceling resting order");
		self.cancel_locked(ticker, side, &resting.user, resting.price, resting.q)
			.await
			.map(|_| ())
	}

	async fn cancel_locked(
		&self,
		ticker: &str,
		side: Side,
		user_id: &str,
		price: Decimal,
		quantity: u64,
	) -> Result<u64, EngineError> {
		let removed = self
			.withdraw(ticker, side, user_id, price, quantity)
			.await?;
		if removed == 0 {
			return Ok(0);
		}
		self.refund(ticker, side, user_id, price, removed).await?;
		self.record_history(
			ticker,
			user_id,
			OrderRecord {
				stock: ticker.to_string(),
				action: side,
				q: removed,
				price,
				date: Utc::now(),
				status: OrderStatus::Canceled,
			},
		)
		.await?;
		Ok(removed)
	}

	/// Withdraw (part of) a resting order and refund exactly what the
	/// withdrawn part reserved
	///
	/// Returns the quantity removed; zero when no order of that user rests
	/// at that price.
	///
	/// An unknown ticker removes nothing and touches no dataset.
	#[instrument(skip(self, request), fields(ticker = %request.ticker, user = %request.user_id))]
	pub async fn cancel_order(&self, request: CancelRequest) -> Result<u64, EngineError> {
		if self.instrument(&request.ticker).await?.is_none() {
			warn!(target: "engine", ticker = %request.ticker, user = %request.user_id, "Cancel for unknown ticker ignored");
			return Ok(0);
		}
		let _guard = self.inner.locks.acquire(&request.ticker).await;

		let removed = self
			.cancel_locked(
				&request.ticker,
				request.side,
				&request.user_id,
				request.price,
				request.quantity,
			)
			.await?;
		if removed == 0 {
			debug!(target: "engine", ticker = %request.ticker, user = %request.user_id, price = %request.price, "Nothing to cancel");
			return Ok(0);
		}

		info!(target: "engine", ticker = %request.ticker, user = %request.user_id, removed, "Order canceled");
		self.publish_quote(&request.ticker).await?;
		Ok(removed)
	}

	/// Remove resting orders without refund
	pub async fn remove_order(
		&self,
		ticker: &str,
		side: Side,
		user_id: &str,
		scope: RemoveScope,
	) -> Result<u64, EngineError> {
		if self.instrument(ticker).await?.is_none() {
			debug!(target: "engine", %ticker, %user_id, "Remove for unknown ticker ignored");
			return Ok(0);
		}
		let _guard = self.inner.locks.acquire(ticker).await;
		self.remove_order_locked(ticker, side, user_id, scope).await
	}

	pub(crate) async fn remove_order_locked(
		&self,
		ticker: &str,
		side: Side,
		user_id: &str,
		scope: RemoveScope,
	) -> Result<u64, EngineError> {
		match scope {
			RemoveScope::Matching { price, quantity } => {
				self.withdraw(ticker, side, user_id, price, quantity).await
			}
			RemoveScope::All => {
				let book = self.inner.catalog.book(ticker, side)?;
				let resting: RestingBook = self.inner.store.read_or_default(&book).await?;
				if resting.price_of(user_id).is_none() {
					return Ok(0);
				}
				let removed = self
					.inner
					.store
					.update_or_default(&book, |resting: &mut RestingBook| {
						resting.remove_all(user_id)
					})
					.await?;
				Ok(removed.iter().map(|order| order.q).sum())
			}
		}
	}

	async fn instrument(&self, ticker: &str) -> Result<Option<Instrument>, EngineError> {
		let instruments = self.inner.catalog.instruments()?;
		let rows: Vec<Instrument> = self.inner.store.read_or_default(&instruments).await?;
		Ok(rows.into_iter().find(|row| row.ticker == ticker))
	}
}

#[cfg(test)]
mod tests {
	use bourse_sdk::Account;
	use bourse_store::{MemoryStorage, StoreConfig};

	use super::*;

	async fn create_test_engine() -> MatchingEngine {
		let store = RecordStore::new(Arc::new(MemoryStorage::new()), StoreConfig::default());
		let engine = MatchingEngine::new(
			store,
			Catalog::default(),
			EngineConfig::default(),
			Broadcaster::default(),
		);
		engine
			.add_instrument(Instrument::new("ACME", 100, dec!(10000), dec!(90), dec!(110)))
			.await
			.unwrap();
		let accounts = engine.catalog().accounts().unwrap();
		engine
			.store()
			.update_or_default(&accounts, |rows: &mut Vec<Account>| {
				rows.push(Account {
					user_id: "7".to_string(),
					name: "alice".to_string(),
					balance: dec!(1000),
				})
			})
			.await
			.unwrap();
		engine
	}

	fn create_test_order(side: Side, quantity: u64, price: Decimal) -> OrderRequest {
		OrderRequest {
			ticker: "ACME".to_string(),
			side,
			quantity,
			price,
			user_id: "7".to_string(),
			execution: ExecutionType::Book,
		}
	}

	#[tokio::test]
	async fn test_rejects_invalid_orders() {
		let engine = create_test_engine().await;

		let cases = [
			(
				OrderRequest {
					ticker: "NOPE".to_string(),
					..create_test_order(Side::Buy, 1, dec!(10))
				},
				RejectReason::UnknownTicker("NOPE".to_string()),
			),
			(
				create_test_order(Side::Buy, 1, dec!(10.005)),
				RejectReason::InvalidPrice(dec!(10.005)),
			),
			(
				create_test_order(Side::Buy, 1, dec!(0)),
				RejectReason::InvalidPrice(dec!(0)),
			),
			(
				create_test_order(Side::Buy, 0, dec!(10)),
				RejectReason::InvalidQuantity,
			),
			(
				OrderRequest {
					user_id: "42".to_string(),
					..create_test_order(Side::Buy, 1, dec!(10))
				},
				RejectReason::UnknownUser("42".to_string()),
			),
			(
				create_test_order(Side::Buy, 11, dec!(100)),
				RejectReason::InsufficientBalance {
					needed: dec!(1100),
					available: dec!(1000),
				},
			),
			(
				create_test_order(Side::Sell, 1, dec!(100)),
				RejectReason::InsufficientInventory { needed: 1, held: 0 },
			),
		];

		for (request, reason) in cases {
			let outcome = engine.add_order(request).await.unwrap();
			assert_eq!(outcome, OrderOutcome::Rejected(reason));
		}
		assert_eq!(engine.balance_of("7").await.unwrap(), dec!(1000));
		assert!(engine.book("ACME", Side::Buy).await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_out_of_range_order_value_is_rejected() {
		let engine = create_test_engine().await;
		let price = dec!(100000000000);

		let outcome = engine
			.add_order(create_test_order(Side::Buy, u64::MAX, price))
			.await
			.unwrap();
		assert_eq!(
			outcome,
			OrderOutcome::Rejected(RejectReason::AmountOverflow {
				quantity: u64::MAX,
				price,
			})
		);

		// The ticker lock was released and the engine keeps serving orders
		let outcome = engine
			.add_order(create_test_order(Side::Buy, 1, dec!(95)))
			.await
			.unwrap();
		assert_eq!(outcome.execution().unwrap().resting, 1);
		assert_eq!(engine.balance_of("7").await.unwrap(), dec!(905));
		assert_eq!(engine.book("ACME", Side::Buy).await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_cancel_for_unknown_ticker_is_a_no_op() {
		let storage = Arc::new(MemoryStorage::new());
		let store = RecordStore::new(storage.clone(), StoreConfig::default());
		let engine = MatchingEngine::new(
			store,
			Catalog::default(),
			EngineConfig::default(),
			Broadcaster::default(),
		);

		for ticker in ["NOPE", ".."] {
			let removed = engine
				.cancel_order(CancelRequest {
					ticker: ticker.to_string(),
					side: Side::Buy,
					quantity: 1,
					price: dec!(10),
					user_id: "999".to_string(),
				})
				.await
				.unwrap();
			assert_eq!(removed, 0);
		}
		let removed = engine
			.remove_order("..", Side::Sell, "LP-..", RemoveScope::All)
			.await
			.unwrap();
		assert_eq!(removed, 0);

		engine.store().flush_all().await.unwrap();
		assert_eq!(storage.write_count(), 0);
		assert!(!engine.store().is_resident(&engine.catalog().book("NOPE", Side::Buy).unwrap()));
	}

	#[tokio::test]
	async fn test_cancel_without_matching_order_leaves_book_untouched() {
		let engine = create_test_engine().await;
		let book = engine.catalog().book("ACME", Side::Sell).unwrap();

		let removed = engine
			.cancel_order(CancelRequest {
				ticker: "ACME".to_string(),
				side: Side::Sell,
				quantity: 1,
				price: dec!(101),
				user_id: "7".to_string(),
			})
			.await
			.unwrap();
		assert_eq!(removed, 0);
		assert!(!engine.store().is_dirty(&book).await);
		assert!(engine.user_orders("7").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_trailing_zero_price_is_valid() {
		let engine = create_test_engine().await;
		let outcome = engine
			.add_order(create_test_order(Side::Buy, 1, dec!(10.500)))
			.await
			.unwrap();
		assert_eq!(outcome.execution().unwrap().resting, 1);
	}

	#[tokio::test]
	async fn test_book_order_rests_and_reserves() {
		let engine = create_test_engine().await;
		let outcome = engine
			.add_order(create_test_order(Side::Buy, 3, dec!(95)))
			.await
			.unwrap();

		assert_eq!(outcome.execution().unwrap().resting, 3);
		assert_eq!(engine.balance_of("7").await.unwrap(), dec!(715));

		let book = engine.book("ACME", Side::Buy).await.unwrap();
		assert_eq!(book.best().unwrap().q, 3);
		assert_eq!(engine.user_orders("7").await.unwrap().len(), 1);

		let quote = engine.quote("ACME").await.unwrap().unwrap();
		assert_eq!(quote.sell_p, Some(dec!(95)));
		assert_eq!(quote.buy_p, None);
	}

	#[tokio::test]
	async fn test_market_order_needs_liquidity() {
		let engine = create_test_engine().await;
		let outcome = engine
			.add_order(OrderRequest {
				execution: ExecutionType::Market,
				..create_test_order(Side::Buy, 1, dec!(100))
			})
			.await
			.unwrap();
		assert_eq!(outcome, OrderOutcome::Rejected(RejectReason::NoLiquidity));
	}

	#[tokio::test]
	async fn test_self_trade_cancels_resting_order() {
		let engine = create_test_engine().await;
		engine
			.add_order(create_test_order(Side::Buy, 2, dec!(95)))
			.await
			.unwrap();
		assert_eq!(engine.balance_of("7").await.unwrap(), dec!(810));

		engine.add_holding("7", "ACME", 1).await.unwrap();
		let outcome = engine
			.add_order(create_test_order(Side::Sell, 1, dec!(95)))
			.await
			.unwrap();

		let execution = outcome.execution().unwrap();
		assert_eq!(execution.self_trade_cancels, 1);
		assert!(execution.fills.is_empty());
		assert_eq!(execution.resting, 1);
		// Resting buy refunded in full, sell now rests instead
		assert_eq!(engine.balance_of("7").await.unwrap(), dec!(1000));
		assert!(engine.book("ACME", Side::Buy).await.unwrap().is_empty());
		assert_eq!(engine.book("ACME", Side::Sell).await.unwrap().len(), 1);
		assert_eq!(engine.holding_of("7", "ACME").await.unwrap(), 0);
	}

	#[tokio::test]
	async fn test_remove_order_scopes() {
		let engine = create_test_engine().await;
		engine
			.add_order(create_test_order(Side::Buy, 2, dec!(95)))
			.await
			.unwrap();
		engine
			.add_order(create_test_order(Side::Buy, 1, dec!(94)))
			.await
			.unwrap();

		let removed = engine
			.remove_order(
				"ACME",
				Side::Buy,
				"7",
				RemoveScope::Matching {
					price: dec!(95),
					quantity: 1,
				},
			)
			.await
			.unwrap();
		assert_eq!(removed, 1);
		let removed = engine
			.remove_order("ACME", Side::Buy, "7", RemoveScope::All)
			.await
			.unwrap();
		assert_eq!(removed, 2);
		assert!(engine.book("ACME", Side::Buy).await.unwrap().is_empty());
		// No refunds
		assert_eq!(engine.balance_of("7").await.unwrap(), dec!(716));
	}

	#[test]
	fn test_lp_identity() {
		let store = RecordStore::new(Arc::new(MemoryStorage::new()), StoreConfig::default());
		let engine = MatchingEngine::new(
			store,
			Catalog::default(),
			EngineConfig::default(),
			Broadcaster::default(),
		);
		assert_eq!(engine.lp_id("ACME"), "LP-ACME");
		assert!(engine.is_lp("ACME", "LP-ACME"));
		assert!(!engine.is_lp("ACME", "LP-ACMEX"));
		assert!(!engine.is_lp("BOLT", "LP-ACME"));
	}
}
