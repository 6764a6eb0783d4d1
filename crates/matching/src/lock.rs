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

//! Fair mutual exclusion for per-ticker critical sections
//!
//! A `FairLock` has a single holder. Waiters queue in arrival order and the
//! lock is handed to the longest-waiting one on release (tokio's mutex is
//! FIFO). Releasing is dropping the guard.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Proof of holding a [`FairLock`]; the lock is released on drop
#[derive(Debug)]
pub struct LockGuard {
	_held: OwnedMutexGuard<()>,
}

impl LockGuard {
	/// Release explicitly; same as dropping the guard
	pub fn release(self) {}
}

/// Single-holder async lock with FIFO hand-off
#[derive(Debug, Clone, Default)]
pub struct FairLock {
	inner: Arc<Mutex<()>>,
}

impl FairLock {
	pub fn new() -> Self {
		Self::default()
	}

	/// Wait until the lock is ours
	pub async fn acquire(&self) -> LockGuard {
		LockGuard {
			_held: Arc::clone(&self.inner).lock_owned().await,
		}
	}

	/// Take the lock only if nobody holds it
	pub fn try_acquire(&self) -> Option<LockGuard> {
		Arc::clone(&self.inner)
			.try_lock_owned()
			.ok()
			.map(|held| LockGuard { _held: held })
	}

	pub fn is_locked(&self) -> bool {
		self.inner.try_lock().is_err()
	}
}

/// One [`FairLock`] per key, created on first use
#[derive(Debug, Default)]
pub struct KeyedLocks {
	locks: DashMap<String, FairLock>,
}

impl KeyedLocks {
	pub fn new() -> Self {
		Self::default()
	}

	fn lock_for(&self, key: &str) -> FairLock {
		if let Some(lock) = self.locks.get(key) {
			return lock.clone();
		}
		self.locks.entry(key.to_string()).or_default().clone()
	}

	pub async fn acquire(&self, key: &str) -> LockGuard {
		self.lock_for(key).acquire().await
	}

	pub fn is_locked(&self, key: &str) -> bool {
		self.locks.get(key).is_some_and(|lock| lock.is_locked())
	}
}
