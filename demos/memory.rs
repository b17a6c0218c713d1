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

//! Basic usage of the in-memory cache.

use gclock::ClockCache;

fn main() {
    let cache = ClockCache::new(16);

    cache.put("hello".to_string(), "world".to_string());
    let value = cache.get("hello").unwrap();
    assert_eq!(value, "world");

    cache.delete("hello");
    assert!(cache.get("hello").is_none());
}
