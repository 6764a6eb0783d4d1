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

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
	lenient::{quote_price, u64_from_any},
	types::{OrderStatus, Side},
};

/// Instrument row with the liquidity provider's pool state
///
/// `x` is the base reserve (units) held by the LP and `y` its quote reserve
/// (currency). `pa`/`pb` bound the price range the pool covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
	pub ticker: String,
	#[serde(deserialize_with = "u64_from_any")]
	pub x: u64,
	pub y: Decimal,
	#[serde(rename = "Pa")]
	pub pa: Decimal,
	#[serde(rename = "Pb")]
	pub pb: Decimal,
	/// Last computed mid price
	pub price: Decimal,
	/// Liquidity invariant, stored rounded to 2 decimals
	#[serde(rename = "L")]
	pub l: Decimal,
	/// Price at which the LP buys one unit
	#[serde(rename = "buyP", with = "quote_price")]
	pub buy_p: Option<Decimal>,
	/// Price at which the LP sells one unit
	#[serde(rename = "sellP", with = "quote_price")]
	pub sell_p: Option<Decimal>,
}

impl Instrument {
	/// A fresh pool; quotes and invariant are filled in on first repricing
	pub fn new(ticker: impl Into<String>, x: u64, y: Decimal, pa: Decimal, pb: Decimal) -> Self {
		Self {
			ticker: ticker.into(),
			x,
			y,
			pa,
			pb,
			price: Decimal::ZERO,
			l: Decimal::ZERO,
			buy_p: None,
			sell_p: None,
		}
	}
}

/// Resting order in a per-(ticker, side) book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookOrder {
	#[serde(deserialize_with = "u64_from_any")]
	pub q: u64,
	pub price: Decimal,
	pub user: String,
	pub date: DateTime<Utc>,
}

/// Entry in a user's append-only order history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
	pub stock: String,
	pub action: Side,
	#[serde(deserialize_with = "u64_from_any")]
	pub q: u64,
	pub price: Decimal,
	pub date: DateTime<Utc>,
	pub status: OrderStatus,
}

/// User account row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
	pub user_id: String,
	pub name: String,
	pub balance: Decimal,
}

/// One inventory line: units of a ticker held by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
	pub ticker: String,
	#[serde(deserialize_with = "u64_from_any")]
	pub quantity: u64,
}

/// Published top of book for a ticker
///
/// `buy_p` is what a buyer pays right now (best resting sell) and `sell_p`
/// what a seller receives (best resting buy).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
	pub ticker: String,
	#[serde(rename = "buyP", with = "quote_price")]
	pub buy_p: Option<Decimal>,
	#[serde(rename = "sellP", with = "quote_price")]
	pub sell_p: Option<Decimal>,
	pub updated: DateTime<Utc>,
}

/// Quote row enriched with a mid price, for the market overview table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
	pub ticker: String,
	#[serde(rename = "buyP", with = "quote_price")]
	pub buy_p: Option<Decimal>,
	#[serde(rename = "sellP", with = "quote_price")]
	pub sell_p: Option<Decimal>,
	#[serde(rename = "midP", with = "quote_price")]
	pub mid_p: Option<Decimal>,
	pub updated: DateTime<Utc>,
}

impl From<&Quote> for MarketSummary {
	fn from(quote: &Quote) -> Self {
		let mid_p = match (quote.buy_p, quote.sell_p) {
			(Some(ask), Some(bid)) => Some(((ask + bid) / Decimal::TWO).round_dp(2)),
			(Some(only), None) | (None, Some(only)) => Some(only),
			(None, None) => None,
		};
		Self {
			ticker: quote.ticker.clone(),
			buy_p: quote.buy_p,
			sell_p: quote.sell_p,
			mid_p,
			updated: quote.updated,
		}
	}
}

#[cfg(test)]
mod tests {
	use rust_decimal_macros::dec;
	use serde_json::json;

	use super::*;

	#[test]
	fn test_instrument_decodes_from_flat_row() {
		let row = json!({
			"ticker": "ACME", "x": "100", "y": "10000", "Pa": "90", "Pb": "110",
			"price": "100", "L": "20436.62", "buyP": "-", "sellP": "100.51"
		});
		let instrument: Instrument = serde_json::from_value(row).unwrap();
		assert_eq!(instrument.x, 100);
		assert_eq!(instrument.pb, dec!(110));
		assert_eq!(instrument.buy_p, None);
		assert_eq!(instrument.sell_p, Some(dec!(100.51)));
	}

	#[test]
	fn test_mid_price() {
		let quote = Quote {
			ticker: "ACME".to_string(),
			buy_p: Some(dec!(101)),
			sell_p: Some(dec!(99.5)),
			updated: Utc::now(),
		};
		assert_eq!(MarketSummary::from(&quote).mid_p, Some(dec!(100.25)));

		let one_sided = Quote {
			sell_p: None,
			..quote
		};
		assert_eq!(MarketSummary::from(&one_sided).mid_p, Some(dec!(101)));
	}
}
