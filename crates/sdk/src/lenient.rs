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

//! Serde helpers for fields stored in flat encodings
//!
//! Tabular datasets hand every cell back as a string, while structured
//! datasets keep native numbers. These helpers accept both so a record
//! decodes the same way regardless of the codec its dataset uses.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

/// Rendering of an absent quote price in flat encodings
pub const NO_QUOTE: &str = "-";

#[derive(Deserialize)]
#[serde(untagged)]
enum IntCell {
	Int(u64),
	Text(String),
}

/// Deserialize a `u64` from either a number or a numeric string
pub fn u64_from_any<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
	D: Deserializer<'de>,
{
	match IntCell::deserialize(deserializer)? {
		IntCell::Int(value) => Ok(value),
		IntCell::Text(text) => text
			.trim()
			.parse()
			.map_err(|_| D::Error::custom(format!("invalid integer: {text}"))),
	}
}

/// `Option<Decimal>` rendered as `-` when absent
pub mod quote_price {
	use super::*;

	#[derive(Deserialize)]
	#[serde(untagged)]
	enum QuoteCell {
		Price(Decimal),
		Text(String),
	}

	pub fn serialize<S>(value: &Option<Decimal>, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match value {
			Some(price) => serializer.serialize_str(&price.to_string()),
			None => serializer.serialize_str(NO_QUOTE),
		}
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
	where
		D: Deserializer<'de>,
	{
		match Option::<QuoteCell>::deserialize(deserializer)? {
			None => Ok(None),
			Some(QuoteCell::Price(price)) => Ok(Some(price)),
			Some(QuoteCell::Text(text)) if text.is_empty() || text == NO_QUOTE => Ok(None),
			Some(QuoteCell::Text(text)) => {
				Err(D::Error::custom(format!("invalid quote price: {text}")))
			}
		}
	}
}
