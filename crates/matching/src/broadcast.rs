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

use bourse_sdk::BroadcastEvent;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Default number of events buffered per subscriber
pub const DEFAULT_BROADCAST_CAPACITY: usize = 1024;

/// Fan-out of exchange events to the transport layer
///
/// Best effort: an event sent while nobody listens is dropped, and a
/// subscriber that falls more than `capacity` events behind skips ahead.
#[derive(Debug, Clone)]
pub struct Broadcaster {
	sender: broadcast::Sender<BroadcastEvent>,
}

impl Broadcaster {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity.max(1));
		Self { sender }
	}

	pub fn broadcast(&self, event: BroadcastEvent) {
		trace!(target: "broadcast", ?event, "Broadcasting event");
		if self.sender.send(event).is_err() {
			debug!(target: "broadcast", "No subscribers, event dropped");
		}
	}

	pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
		self.sender.subscribe()
	}

	pub fn subscriber_count(&self) -> usize {
		self.sender.receiver_count()
	}
}

impl Default for Broadcaster {
	fn default() -> Self {
		Self::new(DEFAULT_BROADCAST_CAPACITY)
	}
}

#[cfg(test)]
mod tests {
	use rust_decimal_macros::dec;

	use super::*;

	#[tokio::test]
	async fn test_every_subscriber_receives() {
		let broadcaster = Broadcaster::default();
		let mut first = broadcaster.subscribe();
		let mut second = broadcaster.subscribe();
		assert_eq!(broadcaster.subscriber_count(), 2);

		broadcaster.broadcast(BroadcastEvent::BalanceUpdate {
			user_id: "7".to_string(),
			balance: dec!(10),
		});

		assert_eq!(first.recv().await.unwrap().user_id(), Some("7"));
		assert_eq!(second.recv().await.unwrap().user_id(), Some("7"));
	}

	#[test]
	fn test_sending_without_subscribers_is_fine() {
		let broadcaster = Broadcaster::new(4);
		broadcaster.broadcast(BroadcastEvent::InventoryUpdate {
			user_id: "7".to_string(),
			inventory: Vec::new(),
		});
		assert_eq!(broadcaster.subscriber_count(), 0);
	}
}
