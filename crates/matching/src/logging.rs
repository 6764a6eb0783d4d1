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

//! Logging initialization for the exchange service
//!
//! # Configuration
//!
//! - `RUST_LOG`: log level filter (default: `info`)
//!   - Per target: `RUST_LOG=info,store=debug,liquidity=debug`
//!
//! - `LOG_DIR`: root directory for log files (default: `{project_root}/logs`)
//!   - Files are created in `{LOG_DIR}/matching/`
//!
//! - `LOG_TO_CONSOLE`: also write to stderr (default: `false`)
//!   - `true`, `1` or `yes` enable it; console output is colored
//!
//! # Log File Format
//!
//! - Rotation: one file per day (UTC), e.g. `matching.2026-01-03.log`
//! - Format: UTC timestamp, thread ID, level, target, message and fields
//! - ANSI colors disabled in files

use std::{
	env,
	path::{Path, PathBuf},
	sync::OnceLock,
};

use anyhow::{Context, Result};
use tracing::{Subscriber, info};
use tracing_appender::{
	non_blocking,
	rolling::{self, Rotation},
};
use tracing_subscriber::{
	EnvFilter, Layer, fmt,
	fmt::MakeWriter,
	layer::SubscriberExt,
	registry::{LookupSpan, Registry},
	util::SubscriberInitExt,
};

use crate::config::{DEFAULT_LOG_LEVEL, DEFAULT_LOG_TO_CONSOLE, LOG_COMPONENT_NAME};

// Keeps the background writer alive until exit so buffered lines are not lost
static LOG_GUARD: OnceLock<non_blocking::WorkerGuard> = OnceLock::new();

/// Workspace root: the nearest ancestor whose Cargo.toml declares `[workspace]`
///
/// Starts from `CARGO_MANIFEST_DIR` when run through cargo, otherwise from
/// the current directory; falls back to the current directory.
fn find_project_root() -> PathBuf {
	let start = env::var("CARGO_MANIFEST_DIR")
		.map(PathBuf::from)
		.or_else(|_| env::current_dir())
		.unwrap_or_else(|_| PathBuf::from("."));

	let workspace_root = start
		.ancestors()
		.find(|dir| {
			std::fs::read_to_string(dir.join("Cargo.toml"))
				.is_ok_and(|manifest| manifest.contains("[workspace]"))
		})
		.map(Path::to_path_buf);
	workspace_root.unwrap_or(start)
}

fn log_root() -> PathBuf {
	env::var("LOG_DIR")
		.map(PathBuf::from)
		.unwrap_or_else(|_| find_project_root().join("logs"))
}

/// Daily-rolling file writer in `log_dir`, e.g. `matching.2026-01-03.log`
fn setup_file_logging(log_dir: &Path) -> Result<non_blocking::NonBlocking> {
	let file_appender = rolling::RollingFileAppender::builder()
		.rotation(Rotation::DAILY)
		.filename_prefix(LOG_COMPONENT_NAME)
		.filename_suffix("log")
		.build(log_dir)
		.with_context(|| {
			format!(
				"Failed to create rolling file appender in {}",
				log_dir.display()
			)
		})?;

	let (file_writer, guard) = non_blocking(file_appender);
	LOG_GUARD.set(guard).ok();

	Ok(file_writer)
}

/// One line per event: UTC timestamp, thread ID, level, target, fields
fn line_layer<S, W>(writer: W, ansi: bool) -> impl Layer<S>
where
	S: Subscriber + for<'span> LookupSpan<'span>,
	W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
	fmt::layer()
		.with_writer(writer)
		.with_timer(fmt::time::UtcTime::rfc_3339())
		.with_thread_ids(true)
		.with_target(true)
		.with_ansi(ansi)
}

/// Initialize logging with file output and optional console output
///
/// See module-level documentation for environment variable configuration.
pub fn init_logging() -> Result<()> {
	dotenv::dotenv().ok();

	let log_level = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string());

	let log_dir = log_root().join(LOG_COMPONENT_NAME);
	std::fs::create_dir_all(&log_dir)
		.with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

	let file_writer = setup_file_logging(&log_dir)?;

	let log_to_console = env::var("LOG_TO_CONSOLE")
		.map(|v| v == "true" || v == "1" || v == "yes")
		.unwrap_or(DEFAULT_LOG_TO_CONSOLE);

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level));

	Registry::default()
		.with(filter)
		.with(line_layer(file_writer, false))
		.with(log_to_console.then(|| line_layer(std::io::stderr, true)))
		.try_init()
		.context("Failed to install tracing subscriber")?;

	info!(
		target: "server",
		level = %log_level,
		dir = %log_dir.display(),
		console = log_to_console,
		"Logging to {LOG_COMPONENT_NAME}.YYYY-MM-DD.log"
	);

	Ok(())
}
