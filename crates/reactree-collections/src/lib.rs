#![forbid(unsafe_code)]

//! Observable collections for Reactree.
//!
//! Each collection is a [`Dispatcher`] over a plain std container. Every
//! mutation goes through [`Dispatcher::dispatch`], which mutates the
//! container in place and publishes a fresh [`Snapshot`] so subscribers see
//! exactly one change per action.
//!
//! # Example
//!
//! ```
//! use reactree_collections::{Dispatcher, ObservableVec};
//! use reactree_core::Store;
//!
//! let store = Store::new();
//! let items: ObservableVec<u32> = Dispatcher::new(&store, vec![3, 1]);
//! let before = items.snapshot();
//!
//! assert_eq!(items.push(2), 3);
//! items.sort();
//!
//! assert_eq!(items.to_vec(), vec![1, 2, 3]);
//! assert_ne!(items.snapshot(), before);
//! assert!(items.snapshot().same_container(&before));
//! ```

pub mod dispatcher;
pub mod map;
pub mod set;
pub mod vec;

pub use dispatcher::{Container, Dispatcher, Snapshot};
pub use map::{FastMap, MapAction, ObservableMap};
pub use set::{FastSet, ObservableSet, SetAction};
pub use vec::{ObservableVec, VecAction, VecOutcome};
