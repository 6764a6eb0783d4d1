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

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
	Buy,
	Sell,
}

impl Side {
	/// The side a counter-order rests on
	pub fn opposite(self) -> Self {
		match self {
			Side::Buy => Side::Sell,
			Side::Sell => Side::Buy,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Side::Buy => "buy",
			Side::Sell => "sell",
		}
	}
}

impl fmt::Display for Side {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown side: {0}")]
pub struct ParseSideError(pub String);

impl FromStr for Side {
	type Err = ParseSideError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"buy" => Ok(Side::Buy),
			"sell" => Ok(Side::Sell),
			other => Err(ParseSideError(other.to_string())),
		}
	}
}

/// How an order interacts with the book
///
/// - `Market`: fills exactly one unit against the best opposite order, and
///   only if the requested price equals that order's price.
/// - `Book`: walks the opposite book up to the limit price and rests any
///   remainder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionType {
	Market,
	Book,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown execution type: {0}")]
pub struct ParseExecutionTypeError(pub String);

impl FromStr for ExecutionType {
	type Err = ParseExecutionTypeError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"market" => Ok(ExecutionType::Market),
			"book" => Ok(ExecutionType::Book),
			other => Err(ParseExecutionTypeError(other.to_string())),
		}
	}
}

/// Lifecycle marker recorded in a user's order history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
	Resting,
	Filled,
	Canceled,
}
