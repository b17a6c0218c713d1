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

use std::{
    fmt::Debug,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};

use gclock_common::{
    code::{Key, Value},
    error::Result,
    event::EventListener,
    spawn::Spawner,
};

/// Where eviction notifications are delivered.
///
/// Delivery always happens off the path of the cache operation that caused the eviction.
#[derive(Debug, Clone, Default)]
pub enum Dispatch {
    /// Deliver on a dedicated worker thread owned by the cache.
    ///
    /// Notifications are queued on an unbounded channel, so a slow listener never blocks the cache. The worker exits
    /// after the last cache handle is dropped and the queue is drained.
    #[default]
    Thread,
    /// Deliver each notification as a blocking task on the given tokio runtime.
    Spawner(Spawner),
}

impl From<Spawner> for Dispatch {
    fn from(spawner: Spawner) -> Self {
        Self::Spawner(spawner)
    }
}

pub(crate) type ArcEventListener<K, V> = Arc<dyn EventListener<Key = K, Value = V>>;

/// Running notification delivery for one cache.
pub(crate) enum Dispatcher<K, V> {
    Thread {
        tx: flume::Sender<(K, V)>,
    },
    Spawner {
        spawner: Spawner,
        listener: ArcEventListener<K, V>,
    },
}

impl<K, V> Debug for Dispatcher<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Thread { tx } => f.debug_struct("Dispatcher::Thread").field("queued", &tx.len()).finish(),
            Self::Spawner { spawner, .. } => f.debug_struct("Dispatcher::Spawner").field("spawner", spawner).finish(),
        }
    }
}

impl<K, V> Dispatcher<K, V>
where
    K: Key,
    V: Value,
{
    pub fn open(dispatch: Dispatch, listener: ArcEventListener<K, V>) -> Result<Self> {
        match dispatch {
            Dispatch::Thread => {
                let (tx, rx) = flume::unbounded::<(K, V)>();
                std::thread::Builder::new()
                    .name("gclock-dispatcher".to_string())
                    .spawn(move || {
                        while let Ok((key, value)) = rx.recv() {
                            notify(listener.as_ref(), key, value);
                        }
                        tracing::debug!("[dispatcher]: all cache handles dropped, exit");
                    })?;
                Ok(Self::Thread { tx })
            }
            Dispatch::Spawner(spawner) => Ok(Self::Spawner { spawner, listener }),
        }
    }

    pub fn dispatch(&self, key: K, value: V) {
        match self {
            Self::Thread { tx } => {
                if tx.send((key, value)).is_err() {
                    tracing::warn!("[dispatcher]: worker is gone, drop eviction notification");
                }
            }
            Self::Spawner { spawner, listener } => {
                let listener = listener.clone();
                // Detached, the handle is not awaited.
                let _ = spawner.spawn_blocking(move || notify(listener.as_ref(), key, value));
            }
        }
    }
}

fn notify<K, V>(listener: &dyn EventListener<Key = K, Value = V>, key: K, value: V)
where
    K: Key,
    V: Value,
{
    if let Err(e) = catch_unwind(AssertUnwindSafe(|| listener.on_evict(key, value))) {
        let msg = e
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| e.downcast_ref::<String>().map(String::as_str))
            .unwrap_or("<non-string panic payload>");
        tracing::error!("[dispatcher]: event listener panicked on eviction: {msg}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use gclock_common::event::FnEventListener;

    use super::*;

    fn channel_listener() -> (ArcEventListener<u64, u64>, mpsc::Receiver<(u64, u64)>) {
        let (tx, rx) = mpsc::channel();
        let tx = parking_lot::Mutex::new(tx);
        let listener = Arc::new(FnEventListener::new(move |k: u64, v: u64| {
            let _ = tx.lock().send((k, v));
        }));
        (listener, rx)
    }

    #[test_log::test]
    fn test_thread_dispatcher_drains_on_drop() {
        let (listener, rx) = channel_listener();
        let dispatcher = Dispatcher::open(Dispatch::Thread, listener).unwrap();
        for i in 0..100 {
            dispatcher.dispatch(i, i * 10);
        }
        drop(dispatcher);

        let received = rx.iter().collect::<Vec<_>>();
        assert_eq!(received, (0..100).map(|i| (i, i * 10)).collect::<Vec<_>>());
    }

    #[test_log::test]
    fn test_thread_dispatcher_survives_panicking_listener() {
        let (tx, rx) = mpsc::channel();
        let tx = parking_lot::Mutex::new(tx);
        let listener: ArcEventListener<u64, u64> = Arc::new(FnEventListener::new(move |k: u64, _: u64| {
            if k % 2 == 0 {
                panic!("even key {k}");
            }
            let _ = tx.lock().send(k);
        }));
        let dispatcher = Dispatcher::open(Dispatch::Thread, listener).unwrap();
        for i in 0..10 {
            dispatcher.dispatch(i, i);
        }
        drop(dispatcher);

        assert_eq!(rx.iter().collect::<Vec<_>>(), vec![1, 3, 5, 7, 9]);
    }

    #[test_log::test]
    fn test_spawner_dispatcher() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .build()
            .unwrap();
        let (listener, rx) = channel_listener();
        let dispatcher = Dispatcher::open(Dispatch::Spawner(runtime.handle().clone().into()), listener).unwrap();
        for i in 0..32 {
            dispatcher.dispatch(i, i);
        }
        drop(dispatcher);

        let mut received = rx.iter().collect::<Vec<_>>();
        received.sort();
        assert_eq!(received, (0..32).map(|i| (i, i)).collect::<Vec<_>>());
    }
}
