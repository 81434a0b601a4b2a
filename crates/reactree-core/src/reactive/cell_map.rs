#![forbid(unsafe_code)]

//! A keyed index of cells, created on demand.
//!
//! [`CellMap`] is the building block for "one cell per entity" state: a row
//! per record, a flag per item. Membership changes are reported to
//! listeners registered with [`CellMap::on_change`] rather than through a
//! cell, so watching one entry never wakes watchers of the others.

use std::fmt;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use ahash::AHashMap;

use super::observable::{Observable, ReadCell, Subscription};
use super::store::Store;

/// Membership change reported by a [`CellMap`].
#[derive(Debug, Clone)]
pub enum CellMapEvent<K, T> {
    /// A cell was created for `key`.
    Added { key: K, cell: ReadCell<T> },
    /// The cell for `key` was dropped from the map.
    Removed { key: K },
}

type Listener<K, T> = dyn Fn(&CellMapEvent<K, T>);

/// Keyed cells with lazy creation and membership listeners.
///
/// # Example
///
/// ```
/// use reactree_core::{CellMap, Store};
///
/// let store = Store::new();
/// let mut flags = CellMap::new(&store, |_key: &u32| false);
/// let flag = flags.get_or_create(7);
/// flag.set(true);
/// assert_eq!(flags.get(&7).map(|c| c.get()), Some(true));
/// assert!(flags.remove(&7));
/// assert!(flags.is_empty());
/// ```
pub struct CellMap<K, T> {
    store: Store,
    init: Box<dyn Fn(&K) -> T>,
    cells: AHashMap<K, Observable<T>>,
    listeners: Vec<Weak<Listener<K, T>>>,
}

impl<K, T> fmt::Debug for CellMap<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellMap")
            .field("len", &self.cells.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<K, T> CellMap<K, T>
where
    K: Clone + Eq + Hash + 'static,
    T: Clone + PartialEq + 'static,
{
    /// Create an empty map whose cells start from `init(key)`.
    pub fn new(store: &Store, init: impl Fn(&K) -> T + 'static) -> Self {
        Self {
            store: store.clone(),
            init: Box::new(init),
            cells: AHashMap::new(),
            listeners: Vec::new(),
        }
    }

    /// The cell for `key`, if one exists.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<Observable<T>> {
        self.cells.get(key).cloned()
    }

    /// Create a fresh cell for `key`, replacing any existing one.
    pub fn create(&mut self, key: K) -> Observable<T> {
        let cell = self.store.cell((self.init)(&key));
        if self.cells.insert(key.clone(), cell.clone()).is_some() {
            self.emit(&CellMapEvent::Removed { key: key.clone() });
        }
        self.emit(&CellMapEvent::Added {
            key,
            cell: cell.read_only(),
        });
        cell
    }

    /// The cell for `key`, creating it first when absent.
    pub fn get_or_create(&mut self, key: K) -> Observable<T> {
        match self.cells.get(&key) {
            Some(cell) => cell.clone(),
            None => self.create(key),
        }
    }

    /// Drop the cell for `key`. Returns `false` when there was none.
    pub fn remove(&mut self, key: &K) -> bool {
        let Some((key, _)) = self.cells.remove_entry(key) else {
            return false;
        };
        self.emit(&CellMapEvent::Removed { key });
        true
    }

    /// Drop every cell, reporting each removal.
    pub fn clear(&mut self) {
        let keys: Vec<K> = self.cells.keys().cloned().collect();
        for key in keys {
            self.remove(&key);
        }
    }

    /// Whether a cell exists for `key`.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.cells.contains_key(key)
    }

    /// Keys with a live cell, in unspecified order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.cells.keys()
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the map holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Register a membership listener.
    pub fn on_change(&mut self, f: impl Fn(&CellMapEvent<K, T>) + 'static) -> Subscription {
        let listener: Rc<Listener<K, T>> = Rc::new(f);
        self.listeners.push(Rc::downgrade(&listener));
        Subscription::from_guard(listener)
    }

    fn emit(&mut self, event: &CellMapEvent<K, T>) {
        self.listeners.retain(|weak| weak.strong_count() > 0);
        let live: Vec<Rc<Listener<K, T>>> =
            self.listeners.iter().filter_map(Weak::upgrade).collect();
        for listener in live {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recording(map: &mut CellMap<&'static str, u32>) -> (Rc<RefCell<Vec<String>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_in = Rc::clone(&log);
        let sub = map.on_change(move |event| {
            let line = match event {
                CellMapEvent::Added { key, cell } => format!("+{key}={}", cell.get()),
                CellMapEvent::Removed { key } => format!("-{key}"),
            };
            log_in.borrow_mut().push(line);
        });
        (log, sub)
    }

    #[test]
    fn get_or_create_initialises_once() {
        let store = Store::new();
        let mut map = CellMap::new(&store, |key: &&str| key.len() as u32);
        let first = map.get_or_create("abc");
        first.set(10);
        let second = map.get_or_create("abc");
        assert!(first.ptr_eq(&second));
        assert_eq!(second.get(), 10);
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn listeners_see_add_and_remove() {
        let store = Store::new();
        let mut map = CellMap::new(&store, |_: &&str| 1);
        let (log, _sub) = recording(&mut map);

        map.create("a");
        map.create("b");
        assert!(map.remove(&"a"));
        assert!(!map.remove(&"missing"));

        assert_eq!(*log.borrow(), vec!["+a=1", "+b=1", "-a"]);
    }

    #[test]
    fn create_replaces_existing_cell() {
        let store = Store::new();
        let mut map = CellMap::new(&store, |_: &&str| 0);
        let (log, _sub) = recording(&mut map);

        let old = map.create("k");
        old.set(5);
        let new = map.create("k");
        assert!(!old.ptr_eq(&new));
        assert_eq!(new.get(), 0);
        assert_eq!(*log.borrow(), vec!["+k=0", "-k", "+k=0"]);
    }

    #[test]
    fn clear_reports_every_key() {
        let store = Store::new();
        let mut map = CellMap::new(&store, |_: &&str| 0);
        map.create("x");
        map.create("y");
        let (log, _sub) = recording(&mut map);

        map.clear();
        assert!(map.is_empty());
        let mut lines = log.borrow().clone();
        lines.sort();
        assert_eq!(lines, vec!["-x", "-y"]);
    }

    #[test]
    fn dropped_listener_stops_receiving() {
        let store = Store::new();
        let mut map = CellMap::new(&store, |_: &&str| 0);
        let (log, sub) = recording(&mut map);
        map.create("a");
        drop(sub);
        map.create("b");
        assert_eq!(log.borrow().len(), 1);
        assert!(map.contains_key(&"b"));
        assert_eq!(map.keys().count(), 2);
    }
}
