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

//! Bourse matching engine
//!
//! Price-time priority order books for a small equity exchange, settled
//! against user balances and inventories, with an automated liquidity
//! provider per ticker quoting from a concentrated-liquidity pool.
//!
//! Architecture:
//! - Every dataset lives in a write-back [`RecordStore`](bourse_store::RecordStore)
//! - One fair lock per ticker serializes that ticker's operations
//! - Balance and inventory changes are atomic check-and-update transforms
//! - Quote, balance and inventory changes fan out through a [`Broadcaster`]

pub mod broadcast;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod lock;
pub mod logging;
pub mod orderbook;
pub mod pricing;
pub mod scheduler;
pub mod service;

pub use broadcast::Broadcaster;
pub use catalog::{Catalog, CatalogConfig};
pub use config::ExchangeConfig;
pub use engine::{
	CancelRequest, EngineConfig, EngineError, Execution, Fill, MatchingEngine, OrderOutcome,
	OrderRequest, RejectReason, RemoveScope,
};
pub use lock::{FairLock, KeyedLocks, LockGuard};
pub use orderbook::RestingBook;
pub use pricing::{PoolQuote, PricingError};
pub use scheduler::{QuoteScheduler, SchedulerConfig};
pub use service::{CancelInput, ExchangeService, InputError, Submission};
