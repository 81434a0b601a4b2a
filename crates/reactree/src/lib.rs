#![forbid(unsafe_code)]

//! Reactree public facade crate.
//!
//! Re-exports the reactive store, the tree engine and (with the default
//! `collections` feature) the observable collections.
//!
//! ```
//! use reactree::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Task {
//!     id: u32,
//! }
//!
//! impl Keyed for Task {
//!     type Key = u32;
//!     fn key(&self) -> &u32 {
//!         &self.id
//!     }
//! }
//!
//! let store = Store::new();
//! let mut tree = Tree::new(&store);
//! let cells = tree.add_root_node(Task { id: 1 })?;
//! assert_eq!(cells.parent.get(), NodeKey::Root);
//! # Ok::<(), TreeError<u32>>(())
//! ```

pub mod prelude {
    #[cfg(feature = "collections")]
    pub use reactree_collections as collections;
    pub use reactree_core as core;
    pub use reactree_tree as tree;

    pub use reactree_core::{Computed, Observable, ReadCell, Readable, Store, Subscription};
    pub use reactree_tree::{
        ChildKeys, CyclePolicy, InsertPosition, InteractiveNode, InteractiveTree, Keyed,
        NodeCells, NodeKey, Tree, TreeConfig, TreeError,
    };

    #[cfg(feature = "collections")]
    pub use reactree_collections::{
        Dispatcher, ObservableMap, ObservableSet, ObservableVec, Snapshot,
    };
}
