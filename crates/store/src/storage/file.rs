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

use std::{io, path::PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::{DatasetStorage, StorageError};
use crate::dataset::DatasetRef;

/// Filesystem storage: `<root>/<directory>/<name>.<codec extension>`
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// reader never observes a half-written dataset.
#[derive(Debug, Clone)]
pub struct FileStorage {
	root: PathBuf,
}

impl FileStorage {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	/// Location of a dataset on disk
	pub fn path_of(&self, dataset: &DatasetRef) -> PathBuf {
		let mut path = self.root.clone();
		for segment in dataset.id.directory().split('/') {
			path.push(segment);
		}
		path.push(format!("{}.{}", dataset.id.name(), dataset.codec.extension()));
		path
	}
}

fn io_error(dataset: &DatasetRef, source: io::Error) -> StorageError {
	StorageError::Io {
		dataset: dataset.to_string(),
		source,
	}
}

#[async_trait]
impl DatasetStorage for FileStorage {
	async fn read(&self, dataset: &DatasetRef) -> Result<Option<Vec<u8>>, StorageError> {
		match fs::read(self.path_of(dataset)).await {
			Ok(bytes) => Ok(Some(bytes)),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(io_error(dataset, e)),
		}
	}

	async fn write(&self, dataset: &DatasetRef, bytes: Vec<u8>) -> Result<(), StorageError> {
		let path = self.path_of(dataset);
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| io_error(dataset, e))?;
		}

		let staging = path.with_extension(format!("{}.tmp", dataset.codec.extension()));
		fs::write(&staging, &bytes)
			.await
			.map_err(|e| io_error(dataset, e))?;
		fs::rename(&staging, &path)
			.await
			.map_err(|e| io_error(dataset, e))
	}
}
