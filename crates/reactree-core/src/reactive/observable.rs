#![forbid(unsafe_code)]

//! Shared, version-tracked cells with change notification.
//!
//! # Design
//!
//! [`Observable<T>`] wraps its value, a version counter and a subscriber list
//! in `Rc<RefCell<..>>`. Cloning an observable yields another handle to the
//! same cell. Subscribers are held as `Weak` callbacks; the strong side lives
//! in the [`Subscription`] returned by [`Observable::subscribe`], so dropping
//! the guard is all it takes to unsubscribe.
//!
//! Notification clones the value out of the cell and releases the borrow
//! before any callback runs. Callbacks may therefore read or write the cell
//! they are subscribed to.
//!
//! # Invariants
//!
//! 1. `version` increments by exactly 1 per write that changes the value.
//! 2. Equal writes are no-ops.
//! 3. Callbacks run in registration order; dead entries are pruned lazily.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use super::store::BatchQueue;

static NEXT_CELL_ID: AtomicU64 = AtomicU64::new(1);

fn next_cell_id() -> u64 {
    NEXT_CELL_ID.fetch_add(1, Ordering::Relaxed)
}

type Callback<T> = dyn Fn(&T);

struct ObservableInner<T> {
    id: u64,
    value: T,
    version: u64,
    subscribers: Vec<Weak<Callback<T>>>,
    /// Batch queue of the owning store, if any.
    queue: Option<Weak<BatchQueue>>,
}

/// RAII guard for a subscriber callback. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _callback: Box<dyn Any>,
}

impl Subscription {
    /// Wrap the strong half of a weakly registered callback.
    pub(crate) fn from_guard<G: 'static>(guard: G) -> Self {
        Self {
            _callback: Box::new(guard),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Subscription")
    }
}

/// Read access shared by writable cells and their read-only views.
///
/// [`Computed`](super::Computed) accepts any `Readable` as a dependency.
pub trait Readable<T> {
    /// Clone the current value.
    fn get(&self) -> T;

    /// Borrow the current value for the duration of `f`.
    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R;

    /// Number of changing writes since creation.
    fn version(&self) -> u64;

    /// Register `f` to run after each change.
    fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription;
}

/// A shared, observable cell.
///
/// # Example
///
/// ```
/// use reactree_core::Observable;
///
/// let name = Observable::new(String::from("draft"));
/// let view = name.read_only();
/// name.set(String::from("final"));
/// assert_eq!(view.get(), "final");
/// assert_eq!(view.version(), 1);
/// ```
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("id", &inner.id)
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create a standalone cell. Its notifications are never batched.
    pub fn new(value: T) -> Self {
        Self::build(value, None)
    }

    pub(crate) fn in_queue(value: T, queue: &Rc<BatchQueue>) -> Self {
        Self::build(value, Some(Rc::downgrade(queue)))
    }

    fn build(value: T, queue: Option<Weak<BatchQueue>>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                id: next_cell_id(),
                value,
                version: 0,
                subscribers: Vec::new(),
                queue,
            })),
        }
    }

    /// Clone the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Borrow the current value for the duration of `f`.
    ///
    /// # Panics
    ///
    /// Panics if `f` writes to this same cell.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value. Returns `true` when the value changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.changed();
        true
    }

    /// Replace the value with `f(previous)`. Returns `true` when it changed.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let next = self.with(f);
        self.set(next)
    }

    /// Number of changing writes since creation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Process-unique identifier of this cell.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.borrow().id
    }

    /// Register `f` to run after each change. Keep the returned guard alive
    /// for as long as the callback should fire.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let callback: Rc<Callback<T>> = Rc::new(f);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&callback));
        Subscription::from_guard(callback)
    }

    /// Number of subscribers whose guard is still alive.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Read-only view of this cell.
    #[must_use]
    pub fn read_only(&self) -> ReadCell<T> {
        ReadCell {
            cell: self.clone(),
        }
    }

    /// Whether two handles point at the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn changed(&self) {
        let queue = {
            let inner = self.inner.borrow();
            inner.queue.as_ref().and_then(Weak::upgrade)
        };
        match queue {
            Some(queue) if queue.is_batching() => {
                let this = self.clone();
                queue.defer(self.id(), Box::new(move || this.notify()));
            }
            _ => self.notify(),
        }
    }

    fn notify(&self) {
        let (value, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|weak| weak.strong_count() > 0);
            if inner.subscribers.is_empty() {
                return;
            }
            let callbacks: Vec<Rc<Callback<T>>> =
                inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (inner.value.clone(), callbacks)
        };
        for callback in callbacks {
            callback(&value);
        }
    }
}

impl<T: Clone + PartialEq + 'static> Readable<T> for Observable<T> {
    fn get(&self) -> T {
        Observable::get(self)
    }

    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        Observable::with(self, f)
    }

    fn version(&self) -> u64 {
        Observable::version(self)
    }

    fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        Observable::subscribe(self, f)
    }
}

/// Read-only view of an [`Observable`].
///
/// Handed out wherever the owner must stay the only writer.
pub struct ReadCell<T> {
    cell: Observable<T>,
}

impl<T> Clone for ReadCell<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadCell").field(&self.cell).finish()
    }
}

impl<T: Clone + PartialEq + 'static> ReadCell<T> {
    /// Clone the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.cell.get()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.cell.with(f)
    }

    /// Number of changing writes since creation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.cell.version()
    }

    /// Register `f` to run after each change.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        self.cell.subscribe(f)
    }

    /// Whether both views observe the same cell.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.cell.ptr_eq(&other.cell)
    }
}

impl<T: Clone + PartialEq + 'static> Readable<T> for ReadCell<T> {
    fn get(&self) -> T {
        ReadCell::get(self)
    }

    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        ReadCell::with(self, f)
    }

    fn version(&self) -> u64 {
        ReadCell::version(self)
    }

    fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        ReadCell::subscribe(self, f)
    }
}

impl<T: Clone + PartialEq + 'static> From<Observable<T>> for ReadCell<T> {
    fn from(cell: Observable<T>) -> Self {
        Self { cell }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn set_bumps_version_only_on_change() {
        let cell = Observable::new(1);
        assert_eq!(cell.version(), 0);
        assert!(cell.set(2));
        assert_eq!(cell.version(), 1);
        assert!(!cell.set(2));
        assert_eq!(cell.version(), 1);
    }

    #[test]
    fn update_reads_previous_value() {
        let cell = Observable::new(vec![1, 2]);
        assert!(cell.update(|prev| {
            let mut next = prev.clone();
            next.push(3);
            next
        }));
        assert_eq!(cell.get(), vec![1, 2, 3]);
        assert!(!cell.update(Clone::clone));
    }

    #[test]
    fn subscribers_run_in_registration_order() {
        let cell = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let first_log = Rc::clone(&log);
        let second_log = Rc::clone(&log);
        let _a = cell.subscribe(move |v| first_log.borrow_mut().push(("a", *v)));
        let _b = cell.subscribe(move |v| second_log.borrow_mut().push(("b", *v)));

        cell.set(4);
        assert_eq!(*log.borrow(), vec![("a", 4), ("b", 4)]);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let cell = Observable::new(0);
        let hits = Rc::new(Cell::new(0));
        let hits_cb = Rc::clone(&hits);
        let sub = cell.subscribe(move |_| hits_cb.set(hits_cb.get() + 1));
        assert_eq!(cell.subscriber_count(), 1);

        cell.set(1);
        drop(sub);
        cell.set(2);

        assert_eq!(hits.get(), 1);
        assert_eq!(cell.subscriber_count(), 0);
    }

    #[test]
    fn callback_may_read_and_write_its_cell() {
        let cell = Observable::new(0);
        let reader = cell.clone();
        let _sub = cell.subscribe(move |v| {
            assert_eq!(reader.get(), *v);
            if *v < 3 {
                reader.set(*v + 1);
            }
        });
        cell.set(1);
        assert_eq!(cell.get(), 3);
    }

    #[test]
    fn read_only_view_tracks_writes() {
        let cell = Observable::new("a");
        let view = cell.read_only();
        let other: ReadCell<&str> = cell.clone().into();
        cell.set("b");
        assert_eq!(view.get(), "b");
        assert_eq!(view.version(), 1);
        assert!(view.ptr_eq(&other));
    }

    #[test]
    fn clones_share_state_and_ids_are_unique() {
        let a = Observable::new(1);
        let b = a.clone();
        let c = Observable::new(1);
        b.set(5);
        assert_eq!(a.get(), 5);
        assert!(a.ptr_eq(&b));
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn debug_format() {
        let cell = Observable::new(42);
        let dbg = format!("{cell:?}");
        assert!(dbg.contains("Observable"));
        assert!(dbg.contains("42"));
    }
}
