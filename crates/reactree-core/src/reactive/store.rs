#![forbid(unsafe_code)]

//! The batching store that cells are allocated from.
//!
//! # Design
//!
//! A [`Store`] is a cheap `Rc` handle around a [`BatchQueue`]. Every
//! [`Observable`] created through [`Store::cell`] keeps a weak link to that
//! queue. When a cell changes while a batch is open, its notification is
//! parked in the queue (at most once per cell) instead of running
//! immediately. Closing the outermost batch drains the queue in the order
//! cells first changed.
//!
//! # Failure Modes
//!
//! - **Closure panics inside a batch**: the batch depth is restored by a drop
//!   guard and pending notifications for the aborted batch are discarded.
//!   Cell values written before the panic are kept.
//! - **Subscriber writes during flush**: the queue is already closed, so the
//!   write notifies its own subscribers immediately.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use ahash::AHashSet;

use super::observable::Observable;

type PendingNotify = Box<dyn FnOnce()>;

/// Shared batch state behind a [`Store`].
#[derive(Default)]
pub(crate) struct BatchQueue {
    depth: Cell<usize>,
    pending: RefCell<Vec<PendingNotify>>,
    queued: RefCell<AHashSet<u64>>,
}

impl BatchQueue {
    pub(crate) fn is_batching(&self) -> bool {
        self.depth.get() > 0
    }

    /// Park a notification for `cell_id` unless one is already queued.
    pub(crate) fn defer(&self, cell_id: u64, notify: PendingNotify) {
        if self.queued.borrow_mut().insert(cell_id) {
            self.pending.borrow_mut().push(notify);
        }
    }

    fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    fn take_pending(&self) -> Vec<PendingNotify> {
        self.queued.borrow_mut().clear();
        std::mem::take(&mut *self.pending.borrow_mut())
    }
}

/// Restores batch depth on every exit path, including unwinding.
struct BatchGuard<'a> {
    queue: &'a BatchQueue,
    completed: bool,
}

impl<'a> BatchGuard<'a> {
    fn enter(queue: &'a BatchQueue) -> Self {
        queue.depth.set(queue.depth.get() + 1);
        Self {
            queue,
            completed: false,
        }
    }

    /// Close the batch normally. Returns the parked notifications when this
    /// was the outermost batch.
    fn close(mut self) -> Vec<PendingNotify> {
        self.completed = true;
        let depth = self.queue.depth.get() - 1;
        self.queue.depth.set(depth);
        if depth == 0 {
            self.queue.take_pending()
        } else {
            Vec::new()
        }
    }
}

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        if self.completed {
            return;
        }
        let depth = self.queue.depth.get().saturating_sub(1);
        self.queue.depth.set(depth);
        if depth == 0 {
            drop(self.queue.take_pending());
        }
    }
}

/// Allocator and batching scope for reactive cells.
///
/// Cloning a `Store` yields another handle to the same batch queue.
///
/// # Example
///
/// ```
/// use reactree_core::Store;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let store = Store::new();
/// let count = store.cell(0);
/// let seen = Rc::new(Cell::new(0));
/// let seen_in_cb = Rc::clone(&seen);
/// let _sub = count.subscribe(move |_| seen_in_cb.set(seen_in_cb.get() + 1));
///
/// store.batch(|| {
///     count.set(1);
///     count.set(2);
///     count.set(3);
/// });
/// assert_eq!(seen.get(), 1);
/// assert_eq!(count.get(), 3);
/// ```
#[derive(Clone, Default)]
pub struct Store {
    queue: Rc<BatchQueue>,
}

impl Store {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new cell bound to this store's batching scope.
    pub fn cell<T: Clone + PartialEq + 'static>(&self, initial: T) -> Observable<T> {
        Observable::in_queue(initial, &self.queue)
    }

    /// Run `f` with notifications deferred until the outermost batch returns.
    ///
    /// Batches nest. Reads inside the batch observe every write immediately;
    /// only subscriber callbacks are postponed.
    pub fn batch<R>(&self, f: impl FnOnce() -> R) -> R {
        let guard = BatchGuard::enter(&self.queue);
        let out = f();
        let pending = guard.close();
        if !pending.is_empty() {
            crate::trace!(message = "store.flush", cells = pending.len());
        }
        for notify in pending {
            notify();
        }
        out
    }

    /// Whether a batch is currently open on this store.
    #[must_use]
    pub fn is_batching(&self) -> bool {
        self.queue.is_batching()
    }

    /// Number of cells with a notification parked in the open batch.
    #[must_use]
    pub fn pending_notifications(&self) -> usize {
        self.queue.pending_len()
    }

    /// Whether two handles share one batch queue.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.queue, &other.queue)
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("depth", &self.queue.depth.get())
            .field("pending", &self.queue.pending_len())
            .finish()
    }
}
