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

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::records::{Holding, Quote};

/// Event fanned out to every connected subscriber
///
/// Serialized shapes:
/// - `{"type":"update","data":{"ticker":..,"buyP":..,"sellP":..,"updated":..}}`
/// - `{"type":"balanceUpdate","userId":..,"balance":..}`
/// - `{"type":"inventoryUpdate","userId":..,"inventory":[..]}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BroadcastEvent {
	Update {
		data: Quote,
	},
	BalanceUpdate {
		#[serde(rename = "userId")]
		user_id: String,
		balance: Decimal,
	},
	InventoryUpdate {
		#[serde(rename = "userId")]
		user_id: String,
		inventory: Vec<Holding>,
	},
}

impl BroadcastEvent {
	/// User the event concerns, if any
	pub fn user_id(&self) -> Option<&str> {
		match self {
			BroadcastEvent::Update { .. } => None,
			BroadcastEvent::BalanceUpdate { user_id, .. }
			| BroadcastEvent::InventoryUpdate { user_id, .. } => Some(user_id),
		}
	}
}
