//! Client-side query cache with optimistic mutations
//!
//! Values are keyed by resource identity (`LikeInfo` of post X, follower info
//! of user Y, the for-you feed, ...). Every write to a key bumps its
//! generation; a fetch that started before a write is discarded instead of
//! overwriting newer local state.
//!
//! [`QueryCache::mutate_optimistic`] applies a local update before the request
//! is sent and restores the exact previous value when the request fails.

mod infinite;

pub use infinite::{InfinitePages, PageData};

use dashmap::DashMap;
use std::future::Future;
use std::hash::Hash;

struct Slot<V> {
    value: Option<V>,
    generation: u64,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            value: None,
            generation: 0,
        }
    }
}

impl<V> Slot<V> {
    fn write(&mut self, value: Option<V>) {
        self.value = value;
        self.generation += 1;
    }
}

pub struct QueryCache<K, V> {
    entries: DashMap<K, Slot<V>>,
}

impl<K, V> Default for QueryCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).and_then(|slot| slot.value.clone())
    }

    pub fn set(&self, key: K, value: V) {
        self.entries.entry(key).or_default().write(Some(value));
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        let mut slot = self.entries.get_mut(key)?;
        let previous = slot.value.take();
        slot.write(None);
        previous
    }

    /// Invalidate in-flight fetches for `key` without touching its value.
    pub fn cancel(&self, key: &K) {
        if let Some(mut slot) = self.entries.get_mut(key) {
            slot.generation += 1;
        }
    }

    pub fn cancel_where<P: Fn(&K) -> bool>(&self, predicate: P) {
        for mut entry in self.entries.iter_mut() {
            if predicate(entry.key()) {
                entry.value_mut().generation += 1;
            }
        }
    }

    fn generation(&self, key: &K) -> u64 {
        self.entries.get(key).map(|slot| slot.generation).unwrap_or(0)
    }

    /// Run `request` and store its value unless `key` was written or
    /// cancelled while it was in flight.
    pub async fn fetch<F, E>(&self, key: K, request: F) -> Result<V, E>
    where
        F: Future<Output = Result<V, E>>,
    {
        let started_at = self.generation(&key);
        let value = request.await?;

        let mut slot = self.entries.entry(key).or_default();
        if slot.generation == started_at {
            slot.write(Some(value.clone()));
        } else {
            tracing::debug!("Discarding stale fetch result");
        }

        Ok(value)
    }

    /// Optimistically replace the value at `key`, then run `request`.
    ///
    /// `update` receives the current value (if any) and returns the value to
    /// show while the request is in flight. On error the pre-mutation value
    /// is restored and the error returned.
    pub async fn mutate_optimistic<U, F, T, E>(&self, key: K, update: U, request: F) -> Result<T, E>
    where
        U: FnOnce(Option<&V>) -> V,
        F: Future<Output = Result<T, E>>,
    {
        let snapshot = {
            let mut slot = self.entries.entry(key.clone()).or_default();
            let snapshot = slot.value.clone();
            let optimistic = update(snapshot.as_ref());
            slot.write(Some(optimistic));
            snapshot
        };

        match request.await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::debug!("Optimistic mutation failed, restoring snapshot");
                self.entries.entry(key).or_default().write(snapshot);
                Err(e)
            }
        }
    }

    /// Apply `f` to every cached value whose key matches.
    pub fn update_where<P, F>(&self, predicate: P, mut f: F) -> usize
    where
        P: Fn(&K) -> bool,
        F: FnMut(&mut V),
    {
        let mut updated = 0;
        for mut entry in self.entries.iter_mut() {
            if !predicate(entry.key()) {
                continue;
            }
            let slot = entry.value_mut();
            if let Some(value) = slot.value.as_mut() {
                f(value);
                slot.generation += 1;
                updated += 1;
            }
        }
        updated
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.value().value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
