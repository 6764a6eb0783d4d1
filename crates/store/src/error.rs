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

use thiserror::Error;

use crate::{codec::CodecError, dataset::DatasetId, storage::StorageError};

/// Error types for record store operations
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("Dataset not found: {0}")]
	NotFound(DatasetId),
	#[error("Invalid dataset identifier: {0}")]
	InvalidIdentifier(String),
	#[error("Codec failure for {dataset}: {source}")]
	Codec {
		dataset: DatasetId,
		#[source]
		source: CodecError,
	},
	#[error("Dataset {dataset} has an unexpected shape: {source}")]
	Shape {
		dataset: DatasetId,
		#[source]
		source: serde_json::Error,
	},
	#[error(transparent)]
	Storage(#[from] StorageError),
}
