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

#[cfg(feature = "prometheus")]
pub use crate::common::metrics::registry::prometheus::PrometheusMetricsRegistry;
pub use crate::{
    common::{
        bitset::BitSet,
        code::{DefaultHasher, HashBuilder, Key, Value},
        error::{Error, ErrorKind, Result},
        event::{EventListener, FnEventListener},
        metrics::{registry::noop::NoopMetricsRegistry, RegistryOps},
        scope::Scope,
        spawn::Spawner,
    },
    memory::{CacheBuilder, ClockCache, Dispatch, DEFAULT_CLOCK_COUNT},
};
