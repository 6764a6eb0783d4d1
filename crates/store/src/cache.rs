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

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tokio::{
	sync::{Mutex, Notify, OwnedMutexGuard},
	time::{self, Instant},
};
use tracing::{debug, error, warn};

use crate::{
	config::StoreConfig,
	dataset::{DatasetId, DatasetRef},
	error::StoreError,
	storage::DatasetStorage,
};

/// Cached state of one resident dataset
struct CacheEntry {
	/// `None` until loaded, and again once evicted
	value: Option<Value>,
	dirty: bool,
	last_access: Instant,
	last_flush: Option<Instant>,
	/// When the scheduled flush fires; at most one per dataset
	flush_due: Option<Instant>,
	pending_mutations: usize,
	/// Set when the slot has left the map; holders must look it up again
	evicted: bool,
}

impl CacheEntry {
	fn new() -> Self {
		Self {
			value: None,
			dirty: false,
			last_access: Instant::now(),
			last_flush: None,
			flush_due: None,
			pending_mutations: 0,
			evicted: false,
		}
	}
}

/// One resident dataset: its entry plus the handle used to wake its
/// maintenance task when the flush schedule changes
struct Slot {
	dataset: DatasetRef,
	entry: Arc<Mutex<CacheEntry>>,
	wake: Notify,
}

struct StoreInner {
	storage: Arc<dyn DatasetStorage>,
	config: StoreConfig,
	slots: DashMap<DatasetId, Arc<Slot>>,
}

/// Write-back cache over durable datasets
///
/// `RecordStore` is a cheap handle; clones share the same cache. It must be
/// used from within a tokio runtime, since every resident dataset gets a
/// maintenance task.
///
/// Write-back policy, evaluated on every mutation:
/// - never flushed, or last flush older than the flush interval: flush now
/// - `max_pending_mutations` unflushed mutations: flush now
/// - otherwise schedule one flush at now + interval (unless one is pending);
///   it persists whatever the value is when it fires
///
/// A dataset not accessed for the idle timeout is flushed if dirty and
/// dropped; the next access reloads it from storage.
#[derive(Clone)]
pub struct RecordStore {
	inner: Arc<StoreInner>,
}

impl RecordStore {
	pub fn new(storage: Arc<dyn DatasetStorage>, config: StoreConfig) -> Self {
		Self {
			inner: Arc::new(StoreInner {
				storage,
				config,
				slots: DashMap::new(),
			}),
		}
	}

	pub fn config(&self) -> &StoreConfig {
		&self.inner.config
	}

	/// Current value of a dataset, loading it on first access
	pub async fn get(&self, dataset: &DatasetRef) -> Result<Value, StoreError> {
		self.inner
			.inspect(dataset, None, |value| Ok(value.clone()))
			.await
	}

	/// Like [`get`](Self::get), but a missing dataset starts out as `default`
	///
	/// Initialization alone writes nothing; the dataset is persisted once
	/// it is first mutated.
	pub async fn get_or_init(&self, dataset: &DatasetRef, default: Value) -> Result<Value, StoreError> {
		self.inner
			.inspect(dataset, Some(default), |value| Ok(value.clone()))
			.await
	}

	/// Replace a dataset's value with `transform(current)`
	pub async fn mutate<F>(&self, dataset: &DatasetRef, transform: F) -> Result<(), StoreError>
	where
		F: FnOnce(Value) -> Value,
	{
		self.inner
			.apply(dataset, None, |value| {
				let current = std::mem::take(value);
				*value = transform(current);
				Ok(())
			})
			.await
	}

	/// Like [`mutate`](Self::mutate), starting from `default` when missing
	pub async fn mutate_or_init<F>(
		&self,
		dataset: &DatasetRef,
		default: Value,
		transform: F,
	) -> Result<(), StoreError>
	where
		F: FnOnce(Value) -> Value,
	{
		self.inner
			.apply(dataset, Some(default), |value| {
				let current = std::mem::take(value);
				*value = transform(current);
				Ok(())
			})
			.await
	}

	/// Decode a dataset into `T`
	pub async fn read<T>(&self, dataset: &DatasetRef) -> Result<T, StoreError>
	where
		T: DeserializeOwned,
	{
		let id = dataset.id.clone();
		self.inner
			.inspect(dataset, None, |value| decode(&id, value))
			.await
	}

	/// Decode a dataset into `T`, treating a missing dataset as `T::default()`
	pub async fn read_or_default<T>(&self, dataset: &DatasetRef) -> Result<T, StoreError>
	where
		T: DeserializeOwned + Serialize + Default,
	{
		let id = dataset.id.clone();
		let default = encode(&id, &T::default())?;
		self.inner
			.inspect(dataset, Some(default), |value| decode(&id, value))
			.await
	}

	/// Typed mutation: decode, run `f` on the record, encode back
	///
	/// The closure's return value is handed back to the caller. If the
	/// stored value does not decode as `T`, nothing changes.
	pub async fn update<T, R, F>(&self, dataset: &DatasetRef, f: F) -> Result<R, StoreError>
	where
		T: DeserializeOwned + Serialize,
		F: FnOnce(&mut T) -> R,
	{
		let id = dataset.id.clone();
		self.inner
			.apply(dataset, None, |value| update_typed(&id, value, f))
			.await
	}

	/// Typed mutation that starts from `T::default()` when missing
	pub async fn update_or_default<T, R, F>(&self, dataset: &DatasetRef, f: F) -> Result<R, StoreError>
	where
		T: DeserializeOwned + Serialize + Default,
		F: FnOnce(&mut T) -> R,
	{
		let id = dataset.id.clone();
		let default = encode(&id, &T::default())?;
		self.inner
			.apply(dataset, Some(default), |value| update_typed(&id, value, f))
			.await
	}

	/// Persist a dataset now if it is resident and dirty
	pub async fn flush(&self, dataset: &DatasetRef) -> Result<(), StoreError> {
		let Some(slot) = self.inner.slot(&dataset.id) else {
			return Ok(());
		};
		let mut entry = slot.entry.lock().await;
		if entry.evicted || !entry.dirty {
			return Ok(());
		}
		self.inner.write_back(&slot, &mut entry).await
	}

	/// Persist every dirty resident dataset
	///
	/// Every dataset is attempted; the last failure, if any, is returned.
	pub async fn flush_all(&self) -> Result<(), StoreError> {
		let slots: Vec<Arc<Slot>> = self
			.inner
			.slots
			.iter()
			.map(|slot| Arc::clone(slot.value()))
			.collect();

		let mut outcome = Ok(());
		for slot in slots {
			let mut entry = slot.entry.lock().await;
			if entry.evicted || !entry.dirty {
				continue;
			}
			if let Err(e) = self.inner.write_back(&slot, &mut entry).await {
				error!(target: "store", dataset = %slot.dataset, error = %e, "Flush failed");
				outcome = Err(e);
			}
		}
		outcome
	}

	pub fn is_resident(&self, dataset: &DatasetRef) -> bool {
		self.inner.slots.contains_key(&dataset.id)
	}

	pub fn resident_count(&self) -> usize {
		self.inner.slots.len()
	}

	/// Whether a resident dataset has unflushed changes
	pub async fn is_dirty(&self, dataset: &DatasetRef) -> bool {
		match self.inner.slot(&dataset.id) {
			Some(slot) => {
				let entry = slot.entry.lock().await;
				!entry.evicted && entry.dirty
			}
			None => false,
		}
	}
}

fn decode<T: DeserializeOwned>(id: &DatasetId, value: &Value) -> Result<T, StoreError> {
	T::deserialize(value).map_err(|source| StoreError::Shape {
		dataset: id.clone(),
		source,
	})
}

fn encode<T: Serialize>(id: &DatasetId, record: &T) -> Result<Value, StoreError> {
	serde_json::to_value(record).map_err(|source| StoreError::Shape {
		dataset: id.clone(),
		source,
	})
}

fn update_typed<T, R, F>(id: &DatasetId, value: &mut Value, f: F) -> Result<R, StoreError>
where
	T: DeserializeOwned + Serialize,
	F: FnOnce(&mut T) -> R,
{
	let mut record: T = decode(id, value)?;
	let result = f(&mut record);
	*value = encode(id, &record)?;
	Ok(result)
}

impl StoreInner {
	fn slot(&self, id: &DatasetId) -> Option<Arc<Slot>> {
		self.slots.get(id).map(|slot| Arc::clone(slot.value()))
	}

	/// Lock a dataset's entry with its value loaded
	///
	/// Retries when it races with an eviction. A missing dataset with no
	/// default leaves nothing resident.
	async fn lock_loaded(
		self: &Arc<Self>,
		dataset: &DatasetRef,
		default: Option<Value>,
	) -> Result<(Arc<Slot>, OwnedMutexGuard<CacheEntry>), StoreError> {
		let mut default = default;
		loop {
			let slot = Arc::clone(
				self.slots
					.entry(dataset.id.clone())
					.or_insert_with(|| {
						Arc::new(Slot {
							dataset: dataset.clone(),
							entry: Arc::new(Mutex::new(CacheEntry::new())),
							wake: Notify::new(),
						})
					})
					.value(),
			);
			let mut entry = Arc::clone(&slot.entry).lock_owned().await;
			if entry.evicted {
				continue;
			}

			if entry.value.is_none() {
				let loaded = match self.storage.read(&slot.dataset).await {
					Ok(Some(bytes)) => slot.dataset.codec.decode(&bytes).map_err(|source| {
						StoreError::Codec {
							dataset: slot.dataset.id.clone(),
							source,
						}
					}),
					Ok(None) => default
						.take()
						.ok_or_else(|| StoreError::NotFound(slot.dataset.id.clone())),
					Err(e) => Err(e.into()),
				};

				match loaded {
					Ok(value) => {
						entry.value = Some(value);
						debug!(target: "store", dataset = %slot.dataset, "Dataset loaded");
						tokio::spawn(maintain(Arc::clone(self), Arc::clone(&slot)));
					}
					Err(e) => {
						self.discard(&slot, &mut entry);
						return Err(e);
					}
				}
			}

			entry.last_access = Instant::now();
			return Ok((slot, entry));
		}
	}

	/// Run a read-only view over a dataset's value
	async fn inspect<R>(
		self: &Arc<Self>,
		dataset: &DatasetRef,
		default: Option<Value>,
		view: impl FnOnce(&Value) -> Result<R, StoreError>,
	) -> Result<R, StoreError> {
		let (slot, entry) = self.lock_loaded(dataset, default).await?;
		match entry.value.as_ref() {
			Some(value) => view(value),
			None => Err(StoreError::NotFound(slot.dataset.id.clone())),
		}
	}

	/// Run a transform under the dataset's lock, then apply the write-back
	/// policy. A failed transform leaves the entry untouched.
	async fn apply<R>(
		self: &Arc<Self>,
		dataset: &DatasetRef,
		default: Option<Value>,
		transform: impl FnOnce(&mut Value) -> Result<R, StoreError>,
	) -> Result<R, StoreError> {
		let (slot, mut entry) = self.lock_loaded(dataset, default).await?;
		let Some(value) = entry.value.as_mut() else {
			return Err(StoreError::NotFound(slot.dataset.id.clone()));
		};
		let result = transform(value)?;

		entry.dirty = true;
		entry.pending_mutations += 1;

		let now = Instant::now();
		let interval = self.config.flush_interval();
		let overdue = entry
			.last_flush
			.is_none_or(|flushed| now.duration_since(flushed) > interval);
		let saturated = entry.pending_mutations >= self.config.max_pending_mutations;

		if overdue || saturated {
			// The mutation already happened in memory; a failed write only
			// defers persistence to the scheduled retry.
			if let Err(e) = self.write_back(&slot, &mut entry).await {
				warn!(target: "store", dataset = %slot.dataset, error = %e, "Write-back failed, retry scheduled");
				schedule_flush(&slot, &mut entry, now + interval);
			}
		} else {
			schedule_flush(&slot, &mut entry, now + interval);
		}

		Ok(result)
	}

	async fn write_back(&self, slot: &Slot, entry: &mut CacheEntry) -> Result<(), StoreError> {
		let Some(value) = entry.value.as_ref() else {
			return Ok(());
		};
		let bytes = slot
			.dataset
			.codec
			.encode(value)
			.map_err(|source| StoreError::Codec {
				dataset: slot.dataset.id.clone(),
				source,
			})?;
		self.storage.write(&slot.dataset, bytes).await?;

		entry.dirty = false;
		entry.pending_mutations = 0;
		entry.last_flush = Some(Instant::now());
		debug!(target: "store", dataset = %slot.dataset, "Dataset flushed");
		Ok(())
	}

	/// Take a slot out of service; later accessors get a fresh one
	fn discard(&self, slot: &Arc<Slot>, entry: &mut CacheEntry) {
		entry.evicted = true;
		entry.value = None;
		self.slots
			.remove_if(&slot.dataset.id, |_, resident| Arc::ptr_eq(resident, slot));
	}
}

fn schedule_flush(slot: &Slot, entry: &mut CacheEntry, due: Instant) {
	if entry.flush_due.is_none() {
		entry.flush_due = Some(due);
		slot.wake.notify_one();
	}
}

/// Maintenance task of one resident dataset: fires the scheduled flush and
/// evicts the dataset once it has been idle long enough
async fn maintain(inner: Arc<StoreInner>, slot: Arc<Slot>) {
	let idle_timeout = inner.config.idle_timeout();
	let interval = inner.config.flush_interval();

	loop {
		let wake_at = {
			let entry = slot.entry.lock().await;
			if entry.evicted {
				return;
			}
			let idle_at = entry.last_access + idle_timeout;
			entry.flush_due.map_or(idle_at, |due| due.min(idle_at))
		};

		tokio::select! {
			_ = time::sleep_until(wake_at) => {}
			_ = slot.wake.notified() => continue,
		}

		let mut entry = slot.entry.lock().await;
		if entry.evicted {
			return;
		}
		let now = Instant::now();

		if entry.flush_due.is_some_and(|due| due <= now) {
			entry.flush_due = None;
			if entry.dirty
				&& let Err(e) = inner.write_back(&slot, &mut entry).await
			{
				warn!(target: "store", dataset = %slot.dataset, error = %e, "Scheduled flush failed, retrying");
				entry.flush_due = Some(now + interval);
			}
		}

		if now.duration_since(entry.last_access) >= idle_timeout {
			if entry.dirty
				&& let Err(e) = inner.write_back(&slot, &mut entry).await
			{
				warn!(target: "store", dataset = %slot.dataset, error = %e, "Eviction flush failed, keeping dataset");
				entry.flush_due = Some(now + interval);
				continue;
			}
			inner.discard(&slot, &mut entry);
			debug!(target: "store", dataset = %slot.dataset, "Dataset evicted");
			return;
		}
	}
}

#[cfg(test)]
mod tests {
	use std::{
		sync::atomic::{AtomicBool, Ordering},
		time::Duration,
	};

	use async_trait::async_trait;
	use serde_json::json;

	use super::*;
	use crate::{
		codec::Codec,
		storage::{MemoryStorage, StorageError},
	};

	#[derive(Debug, Default, Serialize, Deserialize)]
	struct Counter {
		hits: u64,
	}

	/// Memory storage whose writes can be made to fail
	#[derive(Clone, Default)]
	struct FlakyStorage {
		inner: MemoryStorage,
		failing: Arc<AtomicBool>,
	}

	#[async_trait]
	impl DatasetStorage for FlakyStorage {
		async fn read(&self, dataset: &DatasetRef) -> Result<Option<Vec<u8>>, StorageError> {
			self.inner.read(dataset).await
		}

		async fn write(&self, dataset: &DatasetRef, bytes: Vec<u8>) -> Result<(), StorageError> {
			if self.failing.load(Ordering::Acquire) {
				return Err(StorageError::Unavailable("disk full".to_string()));
			}
			self.inner.write(dataset, bytes).await
		}
	}

	fn create_test_store(storage: Arc<dyn DatasetStorage>) -> RecordStore {
		RecordStore::new(
			storage,
			StoreConfig {
				flush_interval_ms: 5_000,
				idle_timeout_ms: 15_000,
				max_pending_mutations: 64,
			},
		)
	}

	fn orders() -> DatasetRef {
		DatasetRef::new("orders/ACME", "buy", Codec::Json).unwrap()
	}

	fn stored(storage: &MemoryStorage, dataset: &DatasetRef) -> Value {
		let bytes = storage.contents(&dataset.id).expect("dataset persisted");
		dataset.codec.decode(&bytes).unwrap()
	}

	fn push(row: Value) -> impl FnOnce(Value) -> Value {
		move |mut rows| {
			if let Value::Array(items) = &mut rows {
				items.push(row);
			}
			rows
		}
	}

	#[tokio::test(start_paused = true)]
	async fn test_loads_once_then_serves_from_memory() {
		let storage = MemoryStorage::new();
		storage
			.insert(orders().id, Codec::Json.encode(&json!([1])).unwrap())
			.unwrap();
		let store = create_test_store(Arc::new(storage.clone()));

		assert_eq!(store.get(&orders()).await.unwrap(), json!([1]));

		// Storage changes underneath are invisible while resident
		storage
			.insert(orders().id, Codec::Json.encode(&json!([2])).unwrap())
			.unwrap();
		assert_eq!(store.get(&orders()).await.unwrap(), json!([1]));
		assert!(store.is_resident(&orders()));
	}

	#[tokio::test(start_paused = true)]
	async fn test_missing_dataset() {
		let storage = MemoryStorage::new();
		let store = create_test_store(Arc::new(storage.clone()));

		assert!(matches!(
			store.get(&orders()).await,
			Err(StoreError::NotFound(_))
		));
		assert_eq!(store.resident_count(), 0);
		assert!(matches!(
			store.mutate(&orders(), |v| v).await,
			Err(StoreError::NotFound(_))
		));

		let value = store.get_or_init(&orders(), json!([])).await.unwrap();
		assert_eq!(value, json!([]));
		assert!(!store.is_dirty(&orders()).await);
		assert_eq!(storage.write_count(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_first_mutation_flushes_then_debounces() {
		let storage = MemoryStorage::new();
		let store = create_test_store(Arc::new(storage.clone()));

		store
			.mutate_or_init(&orders(), json!([]), push(json!("a")))
			.await
			.unwrap();
		assert_eq!(storage.write_count(), 1);
		assert!(!store.is_dirty(&orders()).await);

		time::sleep(Duration::from_secs(1)).await;
		store.mutate(&orders(), push(json!("b"))).await.unwrap();
		store.mutate(&orders(), push(json!("c"))).await.unwrap();
		assert_eq!(storage.write_count(), 1);
		assert!(store.is_dirty(&orders()).await);

		// One scheduled flush carries both mutations
		time::sleep(Duration::from_millis(5_100)).await;
		assert_eq!(storage.write_count(), 2);
		assert_eq!(stored(&storage, &orders()), json!(["a", "b", "c"]));
		assert!(!store.is_dirty(&orders()).await);
	}

	#[tokio::test(start_paused = true)]
	async fn test_mutation_after_quiet_interval_flushes_immediately() {
		let storage = MemoryStorage::new();
		let store = create_test_store(Arc::new(storage.clone()));

		store
			.mutate_or_init(&orders(), json!([]), push(json!(1)))
			.await
			.unwrap();
		time::sleep(Duration::from_secs(6)).await;
		store.mutate(&orders(), push(json!(2))).await.unwrap();

		assert_eq!(storage.write_count(), 2);
		assert_eq!(stored(&storage, &orders()), json!([1, 2]));
	}

	#[tokio::test(start_paused = true)]
	async fn test_pending_mutation_limit_forces_flush() {
		let storage = MemoryStorage::new();
		let store = RecordStore::new(
			Arc::new(storage.clone()),
			StoreConfig {
				max_pending_mutations: 3,
				..StoreConfig::default()
			},
		);

		store
			.mutate_or_init(&orders(), json!([]), push(json!(0)))
			.await
			.unwrap();
		for i in 1..=3 {
			store.mutate(&orders(), push(json!(i))).await.unwrap();
		}

		assert_eq!(storage.write_count(), 2);
		assert_eq!(stored(&storage, &orders()), json!([0, 1, 2, 3]));
	}

	#[tokio::test(start_paused = true)]
	async fn test_idle_dataset_is_flushed_and_evicted() {
		let storage = MemoryStorage::new();
		let store = create_test_store(Arc::new(storage.clone()));

		store
			.mutate_or_init(&orders(), json!([]), push(json!("a")))
			.await
			.unwrap();
		store.mutate(&orders(), push(json!("b"))).await.unwrap();

		time::sleep(Duration::from_secs(16)).await;
		assert!(!store.is_resident(&orders()));
		assert_eq!(stored(&storage, &orders()), json!(["a", "b"]));

		// Reloaded from storage on next access
		assert_eq!(store.get(&orders()).await.unwrap(), json!(["a", "b"]));
		assert!(store.is_resident(&orders()));
	}

	#[tokio::test(start_paused = true)]
	async fn test_access_postpones_eviction() {
		let storage = MemoryStorage::new();
		let store = create_test_store(Arc::new(storage.clone()));
		store.get_or_init(&orders(), json!([])).await.unwrap();

		for _ in 0..4 {
			time::sleep(Duration::from_secs(10)).await;
			store.get(&orders()).await.unwrap();
		}
		assert!(store.is_resident(&orders()));

		time::sleep(Duration::from_secs(16)).await;
		assert!(!store.is_resident(&orders()));
		// Never mutated, never written
		assert_eq!(storage.write_count(), 0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_failed_flush_keeps_dirty_and_retries() {
		let storage = FlakyStorage::default();
		storage.failing.store(true, Ordering::Release);
		let store = create_test_store(Arc::new(storage.clone()));

		store
			.mutate_or_init(&orders(), json!([]), push(json!("kept")))
			.await
			.unwrap();
		assert!(store.is_dirty(&orders()).await);
		assert_eq!(store.get(&orders()).await.unwrap(), json!(["kept"]));
		assert!(store.flush(&orders()).await.is_err());

		storage.failing.store(false, Ordering::Release);
		time::sleep(Duration::from_millis(5_100)).await;
		assert!(!store.is_dirty(&orders()).await);
		assert_eq!(stored(&storage.inner, &orders()), json!(["kept"]));
	}

	#[tokio::test(start_paused = true)]
	async fn test_eviction_waits_for_successful_flush() {
		let storage = FlakyStorage::default();
		let store = create_test_store(Arc::new(storage.clone()));

		store
			.mutate_or_init(&orders(), json!([]), push(json!(1)))
			.await
			.unwrap();
		storage.failing.store(true, Ordering::Release);
		store.mutate(&orders(), push(json!(2))).await.unwrap();

		time::sleep(Duration::from_secs(20)).await;
		assert!(store.is_resident(&orders()));

		storage.failing.store(false, Ordering::Release);
		time::sleep(Duration::from_secs(6)).await;
		assert!(!store.is_resident(&orders()));
		assert_eq!(stored(&storage.inner, &orders()), json!([1, 2]));
	}

	#[tokio::test(start_paused = true)]
	async fn test_concurrent_mutations_are_not_lost() {
		let storage = MemoryStorage::new();
		let store = create_test_store(Arc::new(storage.clone()));
		let counter = DatasetRef::new("stats", "counter", Codec::Json).unwrap();

		let mut handles = Vec::new();
		for _ in 0..50 {
			let store = store.clone();
			let counter = counter.clone();
			handles.push(tokio::spawn(async move {
				store
					.update_or_default(&counter, |c: &mut Counter| c.hits += 1)
					.await
					.unwrap();
			}));
		}
		for handle in handles {
			handle.await.unwrap();
		}

		let total: Counter = store.read(&counter).await.unwrap();
		assert_eq!(total.hits, 50);

		store.flush_all().await.unwrap();
		assert_eq!(stored(&storage, &counter), json!({"hits": 50}));
	}

	#[tokio::test(start_paused = true)]
	async fn test_shape_mismatch_leaves_value_untouched() {
		let store = create_test_store(Arc::new(MemoryStorage::new()));
		store.get_or_init(&orders(), json!(["x"])).await.unwrap();

		let result = store.update(&orders(), |c: &mut Counter| c.hits += 1).await;
		assert!(matches!(result, Err(StoreError::Shape { .. })));
		assert_eq!(store.get(&orders()).await.unwrap(), json!(["x"]));
		assert!(!store.is_dirty(&orders()).await);
	}
}
