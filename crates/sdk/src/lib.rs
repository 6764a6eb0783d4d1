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

//! Bourse SDK - shared exchange records and event shapes
//!
//! This crate provides the typed records that the exchange keeps in its
//! datasets, the events it fans out to subscribers, and the serde glue that
//! lets those records round-trip through flat (all-string) encodings.
//!
//! The SDK is designed to be lightweight and embeddable:
//! - No background threads
//! - No runtime initialization
//! - No environment or configuration loading

pub mod events;
pub mod lenient;
pub mod records;
pub mod types;

pub use events::BroadcastEvent;
pub use records::*;
pub use types::*;
