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

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default debounce interval between flushes of one dataset
pub const DEFAULT_FLUSH_INTERVAL_MS: u64 = 5_000;
/// Default time without access before a dataset is evicted
pub const DEFAULT_IDLE_TIMEOUT_MS: u64 = 15_000;
/// Default number of unflushed mutations that forces a flush
pub const DEFAULT_MAX_PENDING_MUTATIONS: usize = 64;

/// Record store write-back and eviction policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
	/// Minimum spacing between flushes of one dataset (milliseconds)
	pub flush_interval_ms: u64,
	/// Idle time after which a dataset is flushed and dropped (milliseconds)
	pub idle_timeout_ms: u64,
	/// Flush immediately once this many mutations are unflushed
	pub max_pending_mutations: usize,
}

impl Default for StoreConfig {
	fn default() -> Self {
		Self {
			flush_interval_ms: DEFAULT_FLUSH_INTERVAL_MS,
			idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
			max_pending_mutations: DEFAULT_MAX_PENDING_MUTATIONS,
		}
	}
}

impl StoreConfig {
	pub fn flush_interval(&self) -> Duration {
		Duration::from_millis(self.flush_interval_ms)
	}

	pub fn idle_timeout(&self) -> Duration {
		Duration::from_millis(self.idle_timeout_ms)
	}
}
