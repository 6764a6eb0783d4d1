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

//! Where each exchange dataset lives and how it is encoded
//!
//! | dataset          | directory         | name          |
//! |------------------|-------------------|---------------|
//! | instruments      | `market`          | `instruments` |
//! | quotes           | `market`          | `quotes`      |
//! | market overview  | `market`          | `overview`    |
//! | accounts         | `users`           | `accounts`    |
//! | inventory        | `users/inventory` | `<user>`      |
//! | resting book     | `orders/<ticker>` | `buy`/`sell`  |
//! | order history    | `orders/users`    | `<user>`      |

use bourse_sdk::Side;
use bourse_store::{Codec, DatasetRef, StoreError};
use serde::{Deserialize, Serialize};

/// Codec of every dataset family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
	pub instruments: Codec,
	pub quotes: Codec,
	pub overview: Codec,
	pub accounts: Codec,
	pub inventory: Codec,
	pub books: Codec,
	pub history: Codec,
}

impl Default for CatalogConfig {
	fn default() -> Self {
		Self {
			instruments: Codec::Csv,
			quotes: Codec::Csv,
			overview: Codec::Csv,
			accounts: Codec::Csv,
			inventory: Codec::Json,
			books: Codec::Csv,
			history: Codec::Csv,
		}
	}
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
	codecs: CatalogConfig,
}

impl Catalog {
	pub fn new(codecs: CatalogConfig) -> Self {
		Self { codecs }
	}

	pub fn instruments(&self) -> Result<DatasetRef, StoreError> {
		DatasetRef::new("market", "instruments", self.codecs.instruments)
	}

	pub fn quotes(&self) -> Result<DatasetRef, StoreError> {
		DatasetRef::new("market", "quotes", self.codecs.quotes)
	}

	pub fn overview(&self) -> Result<DatasetRef, StoreError> {
		DatasetRef::new("market", "overview", self.codecs.overview)
	}

	pub fn accounts(&self) -> Result<DatasetRef, StoreError> {
		DatasetRef::new("users", "accounts", self.codecs.accounts)
	}

	pub fn inventory(&self, user_id: &str) -> Result<DatasetRef, StoreError> {
		DatasetRef::new("users/inventory", user_id, self.codecs.inventory)
	}

	pub fn book(&self, ticker: &str, side: Side) -> Result<DatasetRef, StoreError> {
		DatasetRef::new(format!("orders/{ticker}"), side.as_str(), self.codecs.books)
	}

	pub fn history(&self, user_id: &str) -> Result<DatasetRef, StoreError> {
		DatasetRef::new("orders/users", user_id, self.codecs.history)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_layout() {
		let catalog = Catalog::default();
		assert_eq!(
			catalog.book("ACME", Side::Sell).unwrap().to_string(),
			"orders/ACME/sell.csv"
		);
		assert_eq!(
			catalog.inventory("7").unwrap().to_string(),
			"users/inventory/7.json"
		);
	}

	#[test]
	fn test_codec_comes_from_configuration() {
		let catalog = Catalog::new(CatalogConfig {
			books: Codec::Json,
			..CatalogConfig::default()
		});
		assert_eq!(catalog.book("ACME", Side::Buy).unwrap().codec, Codec::Json);
	}

	#[test]
	fn test_user_ids_cannot_escape() {
		let catalog = Catalog::default();
		assert!(catalog.inventory("../accounts").is_err());
		assert!(catalog.book("..", Side::Buy).is_err());
	}
}
