#![forbid(unsafe_code)]

//! Lazy derived values that follow their source cells.
//!
//! # Design
//!
//! [`Computed<T>`] keeps a compute closure, its cached result and the source
//! versions the cache was computed from. A read compares those versions with
//! the current ones and reruns the closure on mismatch, so reads inside a
//! [`Store::batch`](super::Store::batch) see writes whose notifications are
//! still queued. The closure runs on the next [`get()`](Computed::get) or
//! [`with()`](Computed::with), never eagerly. A separate dirty flag covers
//! [`invalidate`](Computed::invalidate) and [`from_fn`](Computed::from_fn)
//! subscriptions.
//!
//! # Invariants
//!
//! 1. `get()` never returns a stale value.
//! 2. The compute closure runs at most once per change of its sources.
//! 3. `version` increments by exactly 1 per recomputation.
//!
//! # Failure Modes
//!
//! - **Compute closure panics**: the previous cached value and source
//!   versions are kept, so the next read retries.
//! - **Last outside handle to a source dropped**: the closure still holds a
//!   handle, and nothing can write the source any more; the cached value is
//!   served forever.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use super::observable::{Readable, Subscription};

type VersionProbe = Box<dyn Fn() -> u64>;

struct ComputedInner<T> {
    compute: Box<dyn Fn() -> T>,
    cached: Option<T>,
    version: u64,
    sources: Vec<VersionProbe>,
    /// Source versions the cached value was computed from.
    seen: Vec<u64>,
    _subscriptions: Vec<Subscription>,
}

impl<T> ComputedInner<T> {
    fn source_versions(&self) -> Vec<u64> {
        self.sources.iter().map(|probe| probe()).collect()
    }
}

/// A lazily evaluated, memoized value derived from one or more cells.
///
/// Clones share the cache.
///
/// # Example
///
/// ```
/// use reactree_core::{Computed, Store};
///
/// let store = Store::new();
/// let items = store.cell(vec![1, 2, 3]);
/// let total = Computed::from_cell(&items, |v: &Vec<i32>| v.iter().sum::<i32>());
/// assert_eq!(total.get(), 6);
///
/// items.set(vec![10]);
/// assert!(total.is_dirty());
/// assert_eq!(total.get(), 10);
/// ```
pub struct Computed<T> {
    inner: Rc<RefCell<ComputedInner<T>>>,
    dirty: Rc<Cell<bool>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            dirty: Rc::clone(&self.dirty),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Computed")
            .field("cached", &inner.cached)
            .field("dirty", &self.dirty.get())
            .field("version", &inner.version)
            .finish()
    }
}

fn probe<S, D>(source: &D) -> VersionProbe
where
    D: Readable<S> + Clone + 'static,
{
    let source = source.clone();
    Box::new(move || source.version())
}

impl<T: Clone + 'static> Computed<T> {
    fn assemble(
        compute: Box<dyn Fn() -> T>,
        sources: Vec<VersionProbe>,
        subscriptions: Vec<Subscription>,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ComputedInner {
                compute,
                cached: None,
                version: 0,
                sources,
                seen: Vec::new(),
                _subscriptions: subscriptions,
            })),
            dirty: Rc::new(Cell::new(true)),
        }
    }

    /// Derive a value from a single cell.
    pub fn from_cell<S, D>(source: &D, map: impl Fn(&S) -> T + 'static) -> Self
    where
        S: 'static,
        D: Readable<S> + Clone + 'static,
    {
        let sources = vec![probe(source)];
        let source = source.clone();
        Self::assemble(Box::new(move || source.with(&map)), sources, Vec::new())
    }

    /// Derive a value from two cells.
    pub fn from_cells2<S1, S2, D1, D2>(
        first: &D1,
        second: &D2,
        map: impl Fn(&S1, &S2) -> T + 'static,
    ) -> Self
    where
        S1: 'static,
        S2: 'static,
        D1: Readable<S1> + Clone + 'static,
        D2: Readable<S2> + Clone + 'static,
    {
        let sources = vec![probe(first), probe(second)];
        let first = first.clone();
        let second = second.clone();
        Self::assemble(
            Box::new(move || first.with(|a| second.with(|b| map(a, b)))),
            sources,
            Vec::new(),
        )
    }

    /// Low-level constructor: the caller supplies the closure and whatever
    /// subscriptions must stay alive with it. Without a subscription that
    /// calls [`invalidate`](Self::invalidate), the value is computed once.
    pub fn from_fn(compute: impl Fn() -> T + 'static, subscriptions: Vec<Subscription>) -> Self {
        Self::assemble(Box::new(compute), Vec::new(), subscriptions)
    }

    fn refresh(&self) {
        if !self.is_dirty() {
            return;
        }
        let mut inner = self.inner.borrow_mut();
        let seen = inner.source_versions();
        let fresh = (inner.compute)();
        inner.cached = Some(fresh);
        inner.seen = seen;
        inner.version += 1;
        self.dirty.set(false);
    }

    /// Current value, recomputed first if a dependency changed.
    #[must_use]
    pub fn get(&self) -> T {
        self.with(Clone::clone)
    }

    /// Borrow the current value without cloning it.
    ///
    /// # Panics
    ///
    /// Panics if `f` reads this same `Computed` while it is dirty.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.refresh();
        let inner = self.inner.borrow();
        match inner.cached.as_ref() {
            Some(value) => f(value),
            None => unreachable!("refresh always fills the cache"),
        }
    }

    /// Whether a dependency changed since the last computation.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        if self.dirty.get() {
            return true;
        }
        let inner = self.inner.borrow();
        inner.cached.is_none() || inner.source_versions() != inner.seen
    }

    /// Force a recomputation on the next read.
    pub fn invalidate(&self) {
        self.dirty.set(true);
    }

    /// Number of computations performed so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }
}
