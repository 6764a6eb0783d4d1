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

//! Inbound operations as a transport layer would call them
//!
//! Sides and execution types arrive as strings; anything malformed is
//! rejected here without touching the engine.

use bourse_sdk::{
	Account, ExecutionType, Holding, Instrument, MarketSummary, OrderRecord,
	ParseExecutionTypeError, ParseSideError, Quote, Side,
};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::engine::{
	CancelRequest, EngineError, MatchingEngine, OrderOutcome, OrderRequest, RejectReason,
};

/// Why a submission never reached the engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
	#[error("{0}")]
	Side(#[from] ParseSideError),
	#[error("{0}")]
	ExecutionType(#[from] ParseExecutionTypeError),
}

/// Result of a string-typed order submission
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
	Invalid(InputError),
	Processed(OrderOutcome),
}

/// One entry of a batch cancel, as received
#[derive(Debug, Clone, PartialEq)]
pub struct CancelInput {
	pub ticker: String,
	pub side: String,
	pub quantity: u64,
	pub price: Decimal,
	pub user_id: String,
}

#[derive(Clone)]
pub struct ExchangeService {
	engine: MatchingEngine,
}

impl ExchangeService {
	pub fn new(engine: MatchingEngine) -> Self {
		Self { engine }
	}

	pub fn engine(&self) -> &MatchingEngine {
		&self.engine
	}

	pub async fn submit_order(
		&self,
		ticker: &str,
		side: &str,
		quantity: u64,
		price: Decimal,
		user_id: &str,
		execution: &str,
	) -> Result<Submission, EngineError> {
		let side: Side = match side.parse() {
			Ok(side) => side,
			Err(e) => {
				warn!(target: "service", %ticker, %user_id, error = %e, "Order rejected");
				return Ok(Submission::Invalid(InputError::Side(e)));
			}
		};
		let execution: ExecutionType = match execution.parse() {
			Ok(execution) => execution,
			Err(e) => {
				warn!(target: "service", %ticker, %user_id, error = %e, "Order rejected");
				return Ok(Submission::Invalid(InputError::ExecutionType(e)));
			}
		};

		let outcome = self
			.engine
			.add_order(OrderRequest {
				ticker: ticker.to_string(),
				side,
				quantity,
				price,
				user_id: user_id.to_string(),
				execution,
			})
			.await?;
		Ok(Submission::Processed(outcome))
	}

	/// Cancel each entry in turn; returns the quantity removed per entry
	///
	/// An entry with an unknown side or ticker removes nothing.
	pub async fn cancel_orders(&self, orders: Vec<CancelInput>) -> Result<Vec<u64>, EngineError> {
		let mut removed = Vec::with_capacity(orders.len());
		for order in orders {
			let Ok(side) = order.side.parse::<Side>() else {
				warn!(target: "service", ticker = %order.ticker, side = %order.side, "Cancel skipped, unknown side");
				removed.push(0);
				continue;
			};
			let quantity = self
				.engine
				.cancel_order(CancelRequest {
					ticker: order.ticker,
					side,
					quantity: order.quantity,
					price: order.price,
					user_id: order.user_id,
				})
				.await?;
			removed.push(quantity);
		}
		Ok(removed)
	}

	pub async fn user_balance(&self, user_id: &str) -> Result<Option<Decimal>, EngineError> {
		Ok(self
			.engine
			.account(user_id)
			.await?
			.map(|account| account.balance))
	}

	pub async fn user_inventory(&self, user_id: &str) -> Result<Vec<Holding>, EngineError> {
		self.engine.inventory_of(user_id).await
	}

	pub async fn user_orders(&self, user_id: &str) -> Result<Vec<OrderRecord>, EngineError> {
		self.engine.user_orders(user_id).await
	}

	pub async fn register_user(&self, name: &str) -> Result<Account, EngineError> {
		let account = self.engine.open_account(name).await?;
		info!(target: "service", user = %account.user_id, %name, "User registered");
		Ok(account)
	}

	pub async fn add_instrument(
		&self,
		ticker: &str,
		x: u64,
		y: Decimal,
		pa: Decimal,
		pb: Decimal,
	) -> Result<bool, EngineError> {
		self.engine
			.add_instrument(Instrument::new(ticker, x, y, pa, pb))
			.await
	}

	pub async fn post_liquidity(&self, ticker: &str) -> Result<Instrument, EngineError> {
		self.engine.post_liquidity(ticker).await
	}

	pub async fn quote(&self, ticker: &str) -> Result<Option<Quote>, EngineError> {
		self.engine.quote(ticker).await
	}

	pub async fn market_overview(&self) -> Result<Vec<MarketSummary>, EngineError> {
		self.engine.market_overview().await
	}

	pub async fn instruments(&self) -> Result<Vec<Instrument>, EngineError> {
		self.engine.instruments().await
	}
}

impl Submission {
	pub fn reject_reason(&self) -> Option<&RejectReason> {
		match self {
			Submission::Processed(OrderOutcome::Rejected(reason)) => Some(reason),
			_ => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use bourse_store::{MemoryStorage, RecordStore, StoreConfig};
	use rust_decimal_macros::dec;

	use super::*;
	use crate::{broadcast::Broadcaster, catalog::Catalog, engine::EngineConfig};

	async fn create_test_service() -> ExchangeService {
		let store = RecordStore::new(Arc::new(MemoryStorage::new()), StoreConfig::default());
		let service = ExchangeService::new(MatchingEngine::new(
			store,
			Catalog::default(),
			EngineConfig::default(),
			Broadcaster::default(),
		));
		service
			.add_instrument("ACME", 100, dec!(10000), dec!(90), dec!(110))
			.await
			.unwrap();
		service
	}

	#[tokio::test]
	async fn test_malformed_side_is_rejected() {
		let service = create_test_service().await;
		let user = service.register_user("alice").await.unwrap();

		let submission = service
			.submit_order("ACME", "hold", 1, dec!(100), &user.user_id, "book")
			.await
			.unwrap();
		assert!(matches!(submission, Submission::Invalid(InputError::Side(_))));

		let submission = service
			.submit_order("ACME", "buy", 1, dec!(100), &user.user_id, "limit")
			.await
			.unwrap();
		assert_eq!(
			submission,
			Submission::Invalid(InputError::ExecutionType(ParseExecutionTypeError(
				"limit".to_string()
			)))
		);
		assert_eq!(service.user_balance(&user.user_id).await.unwrap(), Some(dec!(5000)));
	}

	#[tokio::test]
	async fn test_cancel_batch() {
		let service = create_test_service().await;
		let user = service.register_user("alice").await.unwrap();
		service
			.submit_order("ACME", "buy", 3, dec!(95), &user.user_id, "book")
			.await
			.unwrap();

		// A malformed ticker removes nothing and the batch carries on
		let removed = service
			.cancel_orders(vec![
				CancelInput {
					ticker: "..".to_string(),
					side: "buy".to_string(),
					quantity: 1,
					price: dec!(95),
					user_id: user.user_id.clone(),
				},
				CancelInput {
					ticker: "ACME".to_string(),
					side: "buy".to_string(),
					quantity: 2,
					price: dec!(95),
					user_id: user.user_id.clone(),
				},
				CancelInput {
					ticker: "ACME".to_string(),
					side: "sideways".to_string(),
					quantity: 1,
					price: dec!(95),
					user_id: user.user_id.clone(),
				},
				CancelInput {
					ticker: "ACME".to_string(),
					side: "buy".to_string(),
					quantity: 1,
					price: dec!(96),
					user_id: user.user_id.clone(),
				},
			])
			.await
			.unwrap();

		assert_eq!(removed, vec![0, 2, 0, 0]);
		assert_eq!(service.user_balance(&user.user_id).await.unwrap(), Some(dec!(4905)));
		let statuses: Vec<_> = service
			.user_orders(&user.user_id)
			.await
			.unwrap()
			.into_iter()
			.map(|record| record.status)
			.collect();
		assert_eq!(
			statuses,
			vec![bourse_sdk::OrderStatus::Resting, bourse_sdk::OrderStatus::Canceled]
		);
	}

	#[tokio::test]
	async fn test_unknown_user_has_no_balance() {
		let service = create_test_service().await;
		assert_eq!(service.user_balance("404").await.unwrap(), None);
		assert!(service.user_inventory("404").await.unwrap().is_empty());
		assert_eq!(service.instruments().await.unwrap().len(), 1);
	}
}
