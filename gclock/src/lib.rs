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

//! gclock is a fixed-capacity in-memory cache for Rust with generalized CLOCK eviction.
//!
//! ```rust
//! use gclock::CacheBuilder;
//!
//! let cache = CacheBuilder::new(16)
//!     .with_clock_count(2)
//!     .with_on_evict(|key: u64, value: String| println!("evicted {key} => {value}"))
//!     .build()
//!     .unwrap();
//!
//! cache.put(1, "one".to_string());
//! assert_eq!(cache.get(&1).as_deref(), Some("one"));
//! ```

use gclock_common as common;
use gclock_memory as memory;

mod prelude;
pub use prelude::*;
