#![forbid(unsafe_code)]

//! Generic mutation dispatcher over an in-place container.
//!
//! # Design
//!
//! A [`Dispatcher<C>`] owns one cell holding a [`Snapshot<C>`]: a shared
//! handle to the container plus a generation number. The container itself
//! is mutated in place; what changes on every dispatch is the snapshot
//! wrapper, so the cell changes exactly once per action no matter how large
//! the container is, and no copy of the container is ever made.
//!
//! # Invariants
//!
//! 1. Every [`dispatch`](Dispatcher::dispatch) bumps the snapshot generation
//!    by one and notifies the cell once (once per batch inside
//!    [`Store::batch`]).
//! 2. Reads ([`Dispatcher::with`], [`Snapshot::read`]) never touch the cell.
//! 3. The value returned by `dispatch` is the container's own result for
//!    that action.
//!
//! # Failure Modes
//!
//! - **Snapshot borrow held across dispatch**: holding the `Ref` returned by
//!   [`Snapshot::read`] while dispatching panics with a `BorrowMutError`.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use reactree_core::{Computed, Observable, ReadCell, Store, Subscription, trace};

/// A container that can be driven by tagged actions.
pub trait Container: 'static {
    /// Closed set of mutations for this container kind.
    type Action;
    /// What a mutation hands back to the caller.
    type Outcome;

    /// Apply `action` in place and return its native result.
    fn apply(&mut self, action: Self::Action) -> Self::Outcome;

    /// Number of elements.
    fn len(&self) -> usize;

    /// Whether the container is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Short action name used in trace output.
    fn action_name(action: &Self::Action) -> &'static str;
}

/// Identity-carrying view of a dispatcher's container.
///
/// Two snapshots compare equal only when they wrap the same container at
/// the same generation.
pub struct Snapshot<C> {
    container: Rc<RefCell<C>>,
    generation: u64,
}

impl<C> Clone for Snapshot<C> {
    fn clone(&self) -> Self {
        Self {
            container: Rc::clone(&self.container),
            generation: self.generation,
        }
    }
}

impl<C> PartialEq for Snapshot<C> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.container, &other.container) && self.generation == other.generation
    }
}

impl<C> Eq for Snapshot<C> {}

impl<C: fmt::Debug> fmt::Debug for Snapshot<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("generation", &self.generation)
            .field("container", &self.container.borrow())
            .finish()
    }
}

impl<C> Snapshot<C> {
    /// Shared borrow of the container.
    ///
    /// The container is live: a snapshot taken before a dispatch reads the
    /// mutated contents afterwards. Use [`generation`](Self::generation) or
    /// `==` to detect change.
    pub fn read(&self) -> Ref<'_, C> {
        self.container.borrow()
    }

    /// Number of dispatches applied before this snapshot was written.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether both snapshots wrap the same container, at any generation.
    #[must_use]
    pub fn same_container(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.container, &other.container)
    }
}

/// Observable container mutated only through [`Dispatcher::dispatch`].
pub struct Dispatcher<C: Container> {
    cell: Observable<Snapshot<C>>,
}

impl<C: Container> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<C: Container + fmt::Debug> fmt::Debug for Dispatcher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Dispatcher").field(&self.cell.get()).finish()
    }
}

impl<C: Container> Dispatcher<C> {
    /// Wrap `initial` in a cell allocated from `store`.
    pub fn new(store: &Store, initial: C) -> Self {
        Self {
            cell: store.cell(Snapshot {
                container: Rc::new(RefCell::new(initial)),
                generation: 0,
            }),
        }
    }

    /// Apply `action` and publish a new snapshot.
    ///
    /// # Panics
    ///
    /// Panics if a [`Snapshot::read`] borrow of this container is alive.
    pub fn dispatch(&self, action: C::Action) -> C::Outcome {
        let current = self.cell.get();
        trace!(
            message = "collection.dispatch",
            action = C::action_name(&action),
            generation = current.generation
        );
        let outcome = current.container.borrow_mut().apply(action);
        self.cell.set(Snapshot {
            container: Rc::clone(&current.container),
            generation: current.generation + 1,
        });
        outcome
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<C> {
        self.cell.get()
    }

    /// Read-only view of the snapshot cell.
    #[must_use]
    pub fn cell(&self) -> ReadCell<Snapshot<C>> {
        self.cell.read_only()
    }

    /// Borrow the container for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&C) -> R) -> R {
        self.cell.with(|snapshot| f(&snapshot.read()))
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.with(C::len)
    }

    /// Whether the container is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.with(C::is_empty)
    }

    /// Register `f` to run after every dispatch.
    pub fn subscribe(&self, f: impl Fn(&Snapshot<C>) + 'static) -> Subscription {
        self.cell.subscribe(f)
    }

    /// Derived element count that recomputes only after a dispatch.
    #[must_use]
    pub fn len_cell(&self) -> Computed<usize> {
        Computed::from_cell(&self.cell, |snapshot: &Snapshot<C>| snapshot.read().len())
    }
}
