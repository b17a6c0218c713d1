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

//! A fixed-capacity in-memory cache with generalized CLOCK eviction.
//!
//! The cache keeps its entries in a ring of pre-allocated slots, indexes them by key, and reclaims slots with a
//! single clock hand. Every slot carries a small counter of reprieves. Hits refill it, sweeps of the hand drain it,
//! and a slot found with none left is reused for the incoming entry.
//!
//! Evictions are reported to an optional [`EventListener`] off the path of cache operations, see [`Dispatch`].

mod cache;
mod dispatch;
mod indexer;
mod prelude;
mod raw;
mod ring;

pub use prelude::*;
