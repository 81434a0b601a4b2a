#![forbid(unsafe_code)]

//! Observable hash map.

use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

use crate::dispatcher::{Container, Dispatcher};

/// Map type wrapped by [`ObservableMap`].
pub type FastMap<K, V> = HashMap<K, V, ahash::RandomState>;

/// Mutations accepted by an [`ObservableMap`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapAction<K, V> {
    /// Insert or overwrite; yields the previous value.
    Insert(K, V),
    /// Remove a key; yields the removed value.
    Remove(K),
    /// Remove every entry; yields `None`.
    Clear,
}

impl<K, V, S> Container for HashMap<K, V, S>
where
    K: Eq + Hash + 'static,
    V: 'static,
    S: BuildHasher + 'static,
{
    type Action = MapAction<K, V>;
    type Outcome = Option<V>;

    fn apply(&mut self, action: MapAction<K, V>) -> Option<V> {
        match action {
            MapAction::Insert(key, value) => self.insert(key, value),
            MapAction::Remove(key) => self.remove(&key),
            MapAction::Clear => {
                self.clear();
                None
            }
        }
    }

    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn action_name(action: &MapAction<K, V>) -> &'static str {
        match action {
            MapAction::Insert(..) => "insert",
            MapAction::Remove(_) => "remove",
            MapAction::Clear => "clear",
        }
    }
}

/// Observable key/value map.
pub type ObservableMap<K, V> = Dispatcher<FastMap<K, V>>;

impl<K, V> Dispatcher<FastMap<K, V>>
where
    K: Eq + Hash + 'static,
    V: 'static,
{
    /// Empty map allocated from `store`.
    pub fn empty(store: &reactree_core::Store) -> Self {
        Self::new(store, FastMap::default())
    }

    /// Insert or overwrite `key`; returns the previous value.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.dispatch(MapAction::Insert(key, value))
    }

    /// Remove `key`; returns its value. Dispatches even when absent.
    pub fn remove(&self, key: K) -> Option<V> {
        self.dispatch(MapAction::Remove(key))
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.dispatch(MapAction::Clear);
    }

    /// Clone of the value under `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.with(|map| map.get(key).cloned())
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.with(|map| map.contains_key(key))
    }
}
