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

//! Dataset encodings
//!
//! In memory every dataset is a `serde_json::Value`. Tabular datasets are an
//! array of flat objects; `Csv` stores them with a header row and every cell
//! as text. `Json` stores any value verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Error types for encoding and decoding datasets
#[derive(Debug, Error)]
pub enum CodecError {
	#[error("CSV error: {0}")]
	Csv(#[from] csv::Error),
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Value is not tabular: {0}")]
	NotTabular(String),
}

/// On-disk encoding of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
	Csv,
	Json,
}

impl Codec {
	/// File extension used by filesystem storage
	pub fn extension(self) -> &'static str {
		match self {
			Codec::Csv => "csv",
			Codec::Json => "json",
		}
	}

	pub fn encode(self, value: &Value) -> Result<Vec<u8>, CodecError> {
		match self {
			Codec::Csv => encode_table(value),
			Codec::Json => Ok(serde_json::to_vec_pretty(value)?),
		}
	}

	pub fn decode(self, bytes: &[u8]) -> Result<Value, CodecError> {
		match self {
			Codec::Csv => decode_table(bytes),
			Codec::Json => Ok(serde_json::from_slice(bytes)?),
		}
	}
}

fn decode_table(bytes: &[u8]) -> Result<Value, CodecError> {
	if bytes.iter().all(u8::is_ascii_whitespace) {
		return Ok(Value::Array(Vec::new()));
	}

	let mut reader = csv::ReaderBuilder::new()
		.has_headers(true)
		.trim(csv::Trim::Headers)
		.from_reader(bytes);
	let headers = reader.headers()?.clone();

	let mut rows = Vec::new();
	for record in reader.records() {
		let record = record?;
		let row: Map<String, Value> = headers
			.iter()
			.zip(record.iter())
			.map(|(column, cell)| (column.to_string(), Value::String(cell.to_string())))
			.collect();
		rows.push(Value::Object(row));
	}

	Ok(Value::Array(rows))
}

fn encode_table(value: &Value) -> Result<Vec<u8>, CodecError> {
	let rows = value
		.as_array()
		.ok_or_else(|| CodecError::NotTabular("expected an array of rows".to_string()))?;

	// Column order: first appearance across all rows
	let mut columns: Vec<&str> = Vec::new();
	for row in rows {
		let row = row
			.as_object()
			.ok_or_else(|| CodecError::NotTabular("row is not an object".to_string()))?;
		for column in row.keys() {
			if !columns.contains(&column.as_str()) {
				columns.push(column);
			}
		}
	}

	if rows.is_empty() {
		return Ok(Vec::new());
	}

	let mut writer = csv::Writer::from_writer(Vec::new());
	writer.write_record(&columns)?;
	for row in rows {
		let mut record = Vec::with_capacity(columns.len());
		for column in &columns {
			record.push(cell_text(column, row.get(*column))?);
		}
		writer.write_record(&record)?;
	}

	writer.into_inner().map_err(|e| CodecError::Io(e.into_error()))
}

fn cell_text(column: &str, cell: Option<&Value>) -> Result<String, CodecError> {
	match cell {
		None | Some(Value::Null) => Ok(String::new()),
		Some(Value::String(text)) => Ok(text.clone()),
		Some(Value::Number(number)) => Ok(number.to_string()),
		Some(Value::Bool(flag)) => Ok(flag.to_string()),
		Some(Value::Array(_) | Value::Object(_)) => Err(CodecError::NotTabular(format!(
			"column {column} holds a nested value"
		))),
	}
}
