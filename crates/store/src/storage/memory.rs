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

use std::{
	collections::HashMap,
	sync::{
		Arc, Mutex, MutexGuard,
		atomic::{AtomicUsize, Ordering},
	},
};

use async_trait::async_trait;

use super::{DatasetStorage, StorageError};
use crate::dataset::{DatasetId, DatasetRef};

/// In-memory dataset storage
///
/// Keeps encoded bytes in a map. Suitable for:
/// - Development and testing
/// - Benchmarking without I/O
///
/// Clones share the same contents, so a test can keep a handle and inspect
/// what the store has flushed.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
	datasets: Arc<Mutex<HashMap<DatasetId, Vec<u8>>>>,
	writes: Arc<AtomicUsize>,
}

impl MemoryStorage {
	pub fn new() -> Self {
		Self::default()
	}

	fn datasets(&self) -> Result<MutexGuard<'_, HashMap<DatasetId, Vec<u8>>>, StorageError> {
		self.datasets
			.lock()
			.map_err(|_| StorageError::Unavailable("memory storage poisoned".to_string()))
	}

	/// Seed a dataset without counting it as a write
	pub fn insert(&self, id: DatasetId, bytes: Vec<u8>) -> Result<(), StorageError> {
		self.datasets()?.insert(id, bytes);
		Ok(())
	}

	/// Current bytes of a dataset
	pub fn contents(&self, id: &DatasetId) -> Option<Vec<u8>> {
		self.datasets().ok()?.get(id).cloned()
	}

	/// Number of successful writes since creation
	pub fn write_count(&self) -> usize {
		self.writes.load(Ordering::Acquire)
	}
}

#[async_trait]
impl DatasetStorage for MemoryStorage {
	async fn read(&self, dataset: &DatasetRef) -> Result<Option<Vec<u8>>, StorageError> {
		Ok(self.datasets()?.get(&dataset.id).cloned())
	}

	async fn write(&self, dataset: &DatasetRef, bytes: Vec<u8>) -> Result<(), StorageError> {
		self.datasets()?.insert(dataset.id.clone(), bytes);
		self.writes.fetch_add(1, Ordering::AcqRel);
		Ok(())
	}
}
