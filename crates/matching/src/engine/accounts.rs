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

//! Balances, inventories and order history
//!
//! Accounts and inventories are shared by every ticker, so each change is a
//! single check-and-update inside the record store's per-dataset lock.

use bourse_sdk::{Account, BroadcastEvent, Holding, OrderRecord};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::{EngineError, MatchingEngine};
use crate::pricing::{PRICE_DECIMALS, round_half_up, round_up};

impl MatchingEngine {
	pub async fn account(&self, user_id: &str) -> Result<Option<Account>, EngineError> {
		let accounts = self.inner.catalog.accounts()?;
		let rows: Vec<Account> = self.inner.store.read_or_default(&accounts).await?;
		Ok(rows.into_iter().find(|row| row.user_id == user_id))
	}

	/// Balance of a user; zero for unknown users
	pub async fn balance_of(&self, user_id: &str) -> Result<Decimal, EngineError> {
		Ok(self
			.account(user_id)
			.await?
			.map(|account| account.balance)
			.unwrap_or_default())
	}

	pub async fn inventory_of(&self, user_id: &str) -> Result<Vec<Holding>, EngineError> {
		let inventory = self.inner.catalog.inventory(user_id)?;
		Ok(self.inner.store.read_or_default(&inventory).await?)
	}

	pub async fn holding_of(&self, user_id: &str, ticker: &str) -> Result<u64, EngineError> {
		Ok(self
			.inventory_of(user_id)
			.await?
			.iter()
			.find(|holding| holding.ticker == ticker)
			.map(|holding| holding.quantity)
			.unwrap_or(0))
	}

	/// Order history of a user, oldest first
	pub async fn user_orders(&self, user_id: &str) -> Result<Vec<OrderRecord>, EngineError> {
		let history = self.inner.catalog.history(user_id)?;
		Ok(self.inner.store.read_or_default(&history).await?)
	}

	/// Open an account under the next free numeric id
	///
	/// Ids are not reserved for the fee account. With the default
	/// `fee_account` of `"1"`, the first account opened on an empty exchange
	/// becomes the fee account and collects every fee share from then on;
	/// deployments open it first (as `fees`) or configure another id.
	pub async fn open_account(&self, name: &str) -> Result<Account, EngineError> {
		let accounts = self.inner.catalog.accounts()?;
		let balance = self.inner.config.starting_balance;
		let account = self
			.inner
			.store
			.update_or_default(&accounts, |rows: &mut Vec<Account>| {
				let next_id = rows
					.iter()
					.filter_map(|row| row.user_id.parse::<u64>().ok())
					.max()
					.unwrap_or(0)
					+ 1;
				let account = Account {
					user_id: next_id.to_string(),
					name: name.to_string(),
					balance,
				};
				rows.push(account.clone());
				account
			})
			.await?;

		// Materialize the empty inventory so the user shows up on disk
		let inventory = self.inner.catalog.inventory(&account.user_id)?;
		self.inner
			.store
			.update_or_default(&inventory, |_: &mut Vec<Holding>| ())
			.await?;

		self.broadcast_balance(&account.user_id, account.balance);
		Ok(account)
	}

	/// Add `delta` to a balance; `None` when the account does not exist
	pub(crate) async fn adjust_balance(
		&self,
		user_id: &str,
		delta: Decimal,
	) -> Result<Option<Decimal>, EngineError> {
		let accounts = self.inner.catalog.accounts()?;
		let balance = self
			.inner
			.store
			.update_or_default(&accounts, |rows: &mut Vec<Account>| {
				let row = rows.iter_mut().find(|row| row.user_id == user_id)?;
				row.balance = round_half_up(row.balance + delta, PRICE_DECIMALS);
				Some(row.balance)
			})
			.await?;

		match balance {
			Some(balance) => self.broadcast_balance(user_id, balance),
			None => warn!(target: "accounts", user = %user_id, %delta, "Balance change for unknown account dropped"),
		}
		Ok(balance)
	}

	/// Debit `amount` only if the balance covers it
	pub(crate) async fn debit_if_sufficient(
		&self,
		user_id: &str,
		amount: Decimal,
	) -> Result<bool, EngineError> {
		let accounts = self.inner.catalog.accounts()?;
		let balance = self
			.inner
			.store
			.update_or_default(&accounts, |rows: &mut Vec<Account>| {
				let row = rows.iter_mut().find(|row| row.user_id == user_id)?;
				if row.balance < amount {
					return None;
				}
				row.balance = round_half_up(row.balance - amount, PRICE_DECIMALS);
				Some(row.balance)
			})
			.await?;

		match balance {
			Some(balance) => {
				self.broadcast_balance(user_id, balance);
				Ok(true)
			}
			None => Ok(false),
		}
	}

	/// Credit the fee account, opening it on first use
	async fn credit_fee(&self, amount: Decimal) -> Result<(), EngineError> {
		let fee_account = self.inner.config.fee_account.as_str();
		let accounts = self.inner.catalog.accounts()?;
		let balance = self
			.inner
			.store
			.update_or_default(&accounts, |rows: &mut Vec<Account>| {
				let position = match rows.iter().position(|row| row.user_id == fee_account) {
					Some(position) => position,
					None => {
						rows.push(Account {
							user_id: fee_account.to_string(),
							name: "fees".to_string(),
							balance: Decimal::ZERO,
						});
						rows.len() - 1
					}
				};
				let row = &mut rows[position];
				row.balance = round_half_up(row.balance + amount, PRICE_DECIMALS);
				row.balance
			})
			.await?;

		self.broadcast_balance(fee_account, balance);
		Ok(())
	}

	/// Pay a seller for `amount` worth of units, less tax
	///
	/// `tax = max(round(amount × tax_rate, 2), min_tax)`. The LP of the
	/// ticker gets `ceil(tax / 2, 2)` added to its quote reserve and the fee
	/// account gets the rest.
	pub(crate) async fn credit_sale(
		&self,
		ticker: &str,
		seller: &str,
		amount: Decimal,
	) -> Result<(), EngineError> {
		let config = &self.inner.config;
		let tax = round_half_up(amount * config.tax_rate, PRICE_DECIMALS).max(config.min_tax);
		let lp_share = round_up(tax / Decimal::TWO, PRICE_DECIMALS);
		let fee = tax - lp_share;

		self.adjust_balance(seller, amount - tax).await?;
		self.credit_lp_reserve(ticker, lp_share).await?;
		if fee > Decimal::ZERO {
			self.credit_fee(fee).await?;
		}

		debug!(target: "accounts", %ticker, %seller, %amount, %tax, %lp_share, "Sale credited");
		Ok(())
	}

	pub(crate) async fn add_holding(
		&self,
		user_id: &str,
		ticker: &str,
		quantity: u64,
	) -> Result<(), EngineError> {
		let dataset = self.inner.catalog.inventory(user_id)?;
		let inventory = self
			.inner
			.store
			.update_or_default(&dataset, |holdings: &mut Vec<Holding>| {
				match holdings.iter_mut().find(|holding| holding.ticker == ticker) {
					Some(holding) => holding.quantity += quantity,
					None => holdings.push(Holding {
						ticker: ticker.to_string(),
						quantity,
					}),
				}
				holdings.clone()
			})
			.await?;

		self.broadcast_inventory(user_id, inventory);
		Ok(())
	}

	/// Remove `quantity` units only if the user holds them
	pub(crate) async fn take_holding(
		&self,
		user_id: &str,
		ticker: &str,
		quantity: u64,
	) -> Result<bool, EngineError> {
		let dataset = self.inner.catalog.inventory(user_id)?;
		let inventory = self
			.inner
			.store
			.update_or_default(&dataset, |holdings: &mut Vec<Holding>| {
				let position = holdings
					.iter()
					.position(|holding| holding.ticker == ticker && holding.quantity >= quantity)?;
				holdings[position].quantity -= quantity;
				if holdings[position].quantity == 0 {
					holdings.remove(position);
				}
				Some(holdings.clone())
			})
			.await?;

		match inventory {
			Some(inventory) => {
				self.broadcast_inventory(user_id, inventory);
				Ok(true)
			}
			None => Ok(false),
		}
	}

	/// Append to a user's history; LP trades are not recorded
	pub(crate) async fn record_history(
		&self,
		ticker: &str,
		user_id: &str,
		record: OrderRecord,
	) -> Result<(), EngineError> {
		if self.is_lp(ticker, user_id) {
			return Ok(());
		}
		let history = self.inner.catalog.history(user_id)?;
		self.inner
			.store
			.update_or_default(&history, |records: &mut Vec<OrderRecord>| records.push(record))
			.await?;
		Ok(())
	}

	fn broadcast_balance(&self, user_id: &str, balance: Decimal) {
		self.inner.broadcaster.broadcast(BroadcastEvent::BalanceUpdate {
			user_id: user_id.to_string(),
			balance,
		});
	}

	fn broadcast_inventory(&self, user_id: &str, inventory: Vec<Holding>) {
		self.inner
			.broadcaster
			.broadcast(BroadcastEvent::InventoryUpdate {
				user_id: user_id.to_string(),
				inventory,
			});
	}
}
