// Copyright 2026 gclock Project Authors
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

//! Shared components for the gclock crates: errors, key and value bounds, event listeners, metrics and task
//! spawning.

/// Assertion helpers.
pub mod assert;
/// A fixed-size bit set.
pub mod bitset;
/// Key, value and hasher bounds.
pub mod code;
/// Error type.
pub mod error;
/// Event listener.
pub mod event;
/// Hashers for tests and benchmarks.
pub mod hasher;
/// Metrics model and registries.
pub mod metrics;
/// Scoped functional programming extensions.
pub mod scope;
/// Task spawning on tokio runtimes.
pub mod spawn;
