// Copyright 2025 chenjjiaa
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

use std::path::PathBuf;

use bourse_store::StoreConfig;
use serde::{Deserialize, Serialize};

use crate::{
	broadcast::DEFAULT_BROADCAST_CAPACITY, catalog::CatalogConfig, engine::EngineConfig,
	scheduler::SchedulerConfig,
};

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log component name (used for log directory and file naming)
pub const LOG_COMPONENT_NAME: &str = "matching";

/// Default console output setting
pub const DEFAULT_LOG_TO_CONSOLE: bool = false;

/// Environment variable prefix, e.g. `BOURSE_STORE__FLUSH_INTERVAL_MS`
const ENV_PREFIX: &str = "BOURSE";

/// Exchange configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
	/// Root directory of the durable datasets
	pub data_dir: PathBuf,
	/// Record store write-back policy
	pub store: StoreConfig,
	/// Matching, settlement and LP parameters
	pub engine: EngineConfig,
	/// Quote refresh loop
	pub scheduler: SchedulerConfig,
	/// Codec of every dataset family
	pub datasets: CatalogConfig,
	/// Events buffered per broadcast subscriber
	pub broadcast_capacity: usize,
}

impl Default for ExchangeConfig {
	fn default() -> Self {
		Self {
			data_dir: PathBuf::from("data"),
			store: StoreConfig::default(),
			engine: EngineConfig::default(),
			scheduler: SchedulerConfig::default(),
			datasets: CatalogConfig::default(),
			broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
		}
	}
}

fn environment() -> config::Environment {
	config::Environment::with_prefix(ENV_PREFIX)
		.prefix_separator("_")
		.separator("__")
		.try_parsing(true)
}

impl ExchangeConfig {
	/// Load configuration from environment variables
	pub fn from_env() -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(environment())
			.build()?;

		cfg.try_deserialize()
	}

	/// Load configuration from file
	pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
		let cfg = config::Config::builder()
			.add_source(config::File::with_name(path))
			.add_source(environment())
			.build()?;

		cfg.try_deserialize()
	}
}
