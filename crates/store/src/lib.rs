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

//! Bourse Record Store
//!
//! A keyed, write-back cache over durable flat datasets. Datasets are
//! loaded on first access, mutated in memory, flushed to durable storage on
//! a debounced schedule, and evicted after a period without access.
//!
//! Architecture:
//! - One slot per resident dataset; its async mutex is held across
//!   load, transform and write-back so same-key mutations never interleave
//! - One maintenance task per resident dataset owns the scheduled flush and
//!   the idle eviction
//! - Encoding is a per-dataset codec chosen by the caller's configuration
//! - Durable storage sits behind the `DatasetStorage` trait (filesystem or
//!   in-memory)

mod cache;
pub mod codec;
pub mod config;
pub mod dataset;
mod error;
pub mod storage;

pub use cache::RecordStore;
pub use codec::{Codec, CodecError};
pub use config::StoreConfig;
pub use dataset::{DatasetId, DatasetRef};
pub use error::StoreError;
pub use storage::{DatasetStorage, FileStorage, MemoryStorage, StorageError};
