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

use bourse_sdk::{BookOrder, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One side of a ticker's resting book, in price-time priority
///
/// The book is exactly the rows of its dataset: buy books hold descending
/// prices and sell books ascending prices, with equal prices kept in
/// arrival order. The head is the best order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestingBook {
	orders: Vec<BookOrder>,
}

/// Whether a resting order at `resting` is at least as good as `limit` for
/// a taker on `taker_side`
pub fn crosses(taker_side: Side, limit: Decimal, resting: Decimal) -> bool {
	match taker_side {
		Side::Buy => resting <= limit,
		Side::Sell => resting >= limit,
	}
}

impl RestingBook {
	pub fn new() -> Self {
		Self::default()
	}

	/// Insert behind every order at an equal or better price
	pub fn add_order(&mut self, side: Side, order: BookOrder) {
		let position = self
			.orders
			.iter()
			.position(|resting| match side {
				Side::Buy => resting.price < order.price,
				Side::Sell => resting.price > order.price,
			})
			.unwrap_or(self.orders.len());
		self.orders.insert(position, order);
	}

	pub fn best(&self) -> Option<&BookOrder> {
		self.orders.first()
	}

	pub fn best_price(&self) -> Option<Decimal> {
		self.best().map(|order| order.price)
	}

	/// Take up to `quantity` from the first order of `user` at exactly
	/// `price`; the order is deleted once empty. Returns the amount taken.
	pub fn remove_quantity(&mut self, user: &str, price: Decimal, quantity: u64) -> u64 {
		let Some(position) = self
			.orders
			.iter()
			.position(|order| order.user == user && order.price == price)
		else {
			return 0;
		};

		let order = &mut self.orders[position];
		let taken = quantity.min(order.q);
		order.q -= taken;
		if order.q == 0 {
			self.orders.remove(position);
		}
		taken
	}

	/// Whether `user` has an order resting at exactly `price`
	pub fn has_order(&self, user: &str, price: Decimal) -> bool {
		self.orders
			.iter()
			.any(|order| order.user == user && order.price == price)
	}

	/// Remove every order of `user`, returning them
	pub fn remove_all(&mut self, user: &str) -> Vec<BookOrder> {
		let (removed, kept) = std::mem::take(&mut self.orders)
			.into_iter()
			.partition(|order| order.user == user);
		self.orders = kept;
		removed
	}

	/// Price of the first order of `user`
	pub fn price_of(&self, user: &str) -> Option<Decimal> {
		self.orders
			.iter()
			.find(|order| order.user == user)
			.map(|order| order.price)
	}

	pub fn iter(&self) -> impl Iterator<Item = &BookOrder> {
		self.orders.iter()
	}

	pub fn len(&self) -> usize {
		self.orders.len()
	}

	pub fn is_empty(&self) -> bool {
		self.orders.is_empty()
	}

	pub fn total_quantity(&self) -> u64 {
		self.orders.iter().map(|order| order.q).sum()
	}

	/// Price priority holds and every order has a positive quantity
	pub fn is_well_formed(&self, side: Side) -> bool {
		self.orders.iter().all(|order| order.q > 0)
			&& self.orders.windows(2).all(|pair| match side {
				Side::Buy => pair[0].price >= pair[1].price,
				Side::Sell => pair[0].price <= pair[1].price,
			})
	}
}
