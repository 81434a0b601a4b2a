#![forbid(unsafe_code)]

//! Reactive state primitives.
//!
//! - [`Observable`]: a shared, version-tracked cell with change notification
//!   via subscriber callbacks. [`ReadCell`] is its read-only view.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`Store`]: owns the batch queue. Cells created through a store defer
//!   their notifications while a [`Store::batch`] call is running.
//! - [`Computed`]: a lazily evaluated, memoized value derived from cells.
//! - [`CellMap`]: a keyed index of cells created on demand, with add and
//!   remove listeners.
//!
//! # Architecture
//!
//! Everything is single-threaded: cells are `Rc<RefCell<..>>` and the store
//! is an `Rc` handle. Subscribers are stored as `Weak` callbacks and pruned
//! lazily during notification.
//!
//! # Invariants
//!
//! 1. A cell's version increments exactly once per write that changes its
//!    value.
//! 2. Writing a value equal to the current one is a no-op (no version bump,
//!    no notification).
//! 3. Subscribers are notified in registration order.
//! 4. Inside a batch, each changed cell notifies once, after the outermost
//!    batch returns, with its final value.
//! 5. Reads never notify and never bump versions.

pub mod cell_map;
pub mod computed;
pub mod observable;
pub mod store;

pub use cell_map::{CellMap, CellMapEvent};
pub use computed::Computed;
pub use observable::{Observable, ReadCell, Readable, Subscription};
pub use store::Store;
