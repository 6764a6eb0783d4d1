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

mod file;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::dataset::DatasetRef;
pub use file::FileStorage;
pub use memory::MemoryStorage;

/// Error types for durable storage operations
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("I/O error on {dataset}: {source}")]
	Io {
		dataset: String,
		#[source]
		source: std::io::Error,
	},
	#[error("Storage unavailable: {0}")]
	Unavailable(String),
}

/// Dataset Storage trait - durable layer beneath the record store
///
/// Storage moves opaque encoded bytes; it never interprets them. The codec
/// carried by the `DatasetRef` only decides where the bytes live (e.g. the
/// file extension), never how they are parsed.
///
/// This abstraction allows different backing stores:
/// - Local filesystem (one file per dataset)
/// - In-memory (testing, benchmarking without I/O)
#[async_trait]
pub trait DatasetStorage: Send + Sync {
	/// Read a dataset's bytes, `None` if it does not exist
	async fn read(&self, dataset: &DatasetRef) -> Result<Option<Vec<u8>>, StorageError>;

	/// Replace a dataset's bytes, creating it if needed
	async fn write(&self, dataset: &DatasetRef, bytes: Vec<u8>) -> Result<(), StorageError>;
}
