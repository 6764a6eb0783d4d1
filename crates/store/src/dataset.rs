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

use std::fmt;

use crate::{codec::Codec, error::StoreError};

/// Identity of a dataset: a named flat resource under a directory
///
/// `directory` may be nested (`orders/ACME`); `name` is a single segment.
/// Both are validated so an identifier can never escape the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetId {
	directory: String,
	name: String,
}

impl DatasetId {
	pub fn new(directory: impl Into<String>, name: impl Into<String>) -> Result<Self, StoreError> {
		let directory = directory.into();
		let name = name.into();

		if directory.split('/').any(|segment| !valid_segment(segment)) {
			return Err(StoreError::InvalidIdentifier(format!("directory {directory:?}")));
		}
		if !valid_segment(&name) {
			return Err(StoreError::InvalidIdentifier(format!("name {name:?}")));
		}

		Ok(Self { directory, name })
	}

	pub fn directory(&self) -> &str {
		&self.directory
	}

	pub fn name(&self) -> &str {
		&self.name
	}
}

fn valid_segment(segment: &str) -> bool {
	!segment.is_empty()
		&& segment != "."
		&& segment != ".."
		&& !segment.contains(['/', '\\', '\0'])
}

impl fmt::Display for DatasetId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.directory, self.name)
	}
}

/// A dataset identity together with the codec it is stored in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRef {
	pub id: DatasetId,
	pub codec: Codec,
}

impl DatasetRef {
	pub fn new(
		directory: impl Into<String>,
		name: impl Into<String>,
		codec: Codec,
	) -> Result<Self, StoreError> {
		Ok(Self {
			id: DatasetId::new(directory, name)?,
			codec,
		})
	}
}

impl fmt::Display for DatasetRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}", self.id, self.codec.extension())
	}
}
