#![forbid(unsafe_code)]

//! Observable hash set.

use std::collections::HashSet;
use std::hash::{BuildHasher, Hash};

use crate::dispatcher::{Container, Dispatcher};

/// Set type wrapped by [`ObservableSet`].
pub type FastSet<T> = HashSet<T, ahash::RandomState>;

/// Mutations accepted by an [`ObservableSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetAction<T> {
    /// Insert; yields whether the value was new.
    Insert(T),
    /// Remove; yields whether the value was present.
    Remove(T),
    /// Remove everything; yields whether the set was non-empty.
    Clear,
}

impl<T, S> Container for HashSet<T, S>
where
    T: Eq + Hash + 'static,
    S: BuildHasher + 'static,
{
    type Action = SetAction<T>;
    type Outcome = bool;

    fn apply(&mut self, action: SetAction<T>) -> bool {
        match action {
            SetAction::Insert(value) => self.insert(value),
            SetAction::Remove(value) => self.remove(&value),
            SetAction::Clear => {
                let had_items = !HashSet::is_empty(self);
                self.clear();
                had_items
            }
        }
    }

    fn len(&self) -> usize {
        HashSet::len(self)
    }

    fn action_name(action: &SetAction<T>) -> &'static str {
        match action {
            SetAction::Insert(_) => "insert",
            SetAction::Remove(_) => "remove",
            SetAction::Clear => "clear",
        }
    }
}

/// Observable set.
pub type ObservableSet<T> = Dispatcher<FastSet<T>>;

impl<T: Eq + Hash + 'static> Dispatcher<FastSet<T>> {
    /// Empty set allocated from `store`.
    pub fn empty(store: &reactree_core::Store) -> Self {
        Self::new(store, FastSet::default())
    }

    /// Insert `value`; returns whether it was new.
    pub fn insert(&self, value: T) -> bool {
        self.dispatch(SetAction::Insert(value))
    }

    /// Remove `value`; returns whether it was present.
    pub fn remove(&self, value: T) -> bool {
        self.dispatch(SetAction::Remove(value))
    }

    /// Remove everything; returns whether anything was removed.
    pub fn clear(&self) -> bool {
        self.dispatch(SetAction::Clear)
    }

    /// Whether `value` is present.
    #[must_use]
    pub fn contains(&self, value: &T) -> bool {
        self.with(|set| set.contains(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reactree_core::Store;

    #[test]
    fn insert_reports_novelty() {
        let store = Store::new();
        let set: ObservableSet<u32> = ObservableSet::empty(&store);
        assert!(set.insert(7));
        assert!(!set.insert(7));
        assert!(set.contains(&7));
        assert_eq!(set.len(), 1);
        // A duplicate insert is still a dispatch.
        assert_eq!(set.snapshot().generation(), 2);
    }

    #[test]
    fn remove_and_clear_report_presence() {
        let store = Store::new();
        let set: ObservableSet<&str> = ObservableSet::empty(&store);
        set.insert("x");
        assert!(set.remove("x"));
        assert!(!set.remove("x"));
        assert!(!set.clear());
        set.insert("y");
        assert!(set.clear());
        assert!(set.is_empty());
    }
}
