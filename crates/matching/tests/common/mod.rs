//! Shared setup for the exchange integration tests

#![allow(dead_code)]

use std::sync::Arc;

use bourse_matching::{
	Broadcaster, Catalog, EngineConfig, MatchingEngine, OrderOutcome, OrderRequest,
};
use bourse_sdk::{ExecutionType, Holding, Instrument, Side};
use bourse_store::{DatasetStorage, MemoryStorage, RecordStore, StoreConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub const TICKER: &str = "ACME";

pub fn create_test_engine_over(storage: Arc<dyn DatasetStorage>) -> MatchingEngine {
	let store = RecordStore::new(storage, StoreConfig::default());
	MatchingEngine::new(
		store,
		Catalog::default(),
		EngineConfig::default(),
		Broadcaster::default(),
	)
}

/// Engine with ACME (x=100, y=10000, range 90..110) and the fee account
/// open as user "1"; the LP quotes nothing yet
pub async fn create_test_engine() -> MatchingEngine {
	let engine = create_test_engine_over(Arc::new(MemoryStorage::new()));
	engine
		.add_instrument(Instrument::new(TICKER, 100, dec!(10000), dec!(90), dec!(110)))
		.await
		.unwrap();
	let fees = engine.open_account("fees").await.unwrap();
	assert_eq!(fees.user_id, engine.config().fee_account);
	engine
}

/// Give a user units without going through a trade
pub async fn seed_inventory(engine: &MatchingEngine, user_id: &str, quantity: u64) {
	let inventory = engine.catalog().inventory(user_id).unwrap();
	engine
		.store()
		.update_or_default(&inventory, |holdings: &mut Vec<Holding>| {
			holdings.push(Holding {
				ticker: TICKER.to_string(),
				quantity,
			})
		})
		.await
		.unwrap();
}

pub async fn submit(
	engine: &MatchingEngine,
	user_id: &str,
	side: Side,
	quantity: u64,
	price: Decimal,
	execution: ExecutionType,
) -> OrderOutcome {
	engine
		.add_order(OrderRequest {
			ticker: TICKER.to_string(),
			side,
			quantity,
			price,
			user_id: user_id.to_string(),
			execution,
		})
		.await
		.unwrap()
}

pub async fn instrument(engine: &MatchingEngine) -> Instrument {
	engine
		.instruments()
		.await
		.unwrap()
		.into_iter()
		.find(|row| row.ticker == TICKER)
		.unwrap()
}

/// Every account balance plus the LP's quote reserve
pub async fn total_currency(engine: &MatchingEngine) -> Decimal {
	let accounts = engine.catalog().accounts().unwrap();
	let rows: Vec<bourse_sdk::Account> = engine.store().read(&accounts).await.unwrap();
	rows.iter().map(|row| row.balance).sum::<Decimal>() + instrument(engine).await.y
}
