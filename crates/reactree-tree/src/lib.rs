#![forbid(unsafe_code)]

//! Keyed, ordered, observable tree engine.
//!
//! A [`Tree`] stores caller payloads under unique keys. Each node's payload,
//! parent and ordered children live in separate cells, so a subscriber to
//! one node's children is not woken by edits elsewhere in the tree.
//! [`InteractiveTree`] layers selection state on top.

pub mod config;
pub mod error;
pub mod interactive;
pub mod key;
pub mod tree;

pub use config::{CyclePolicy, InsertPosition, TreeConfig};
pub use error::{Result, TreeError};
pub use interactive::{InteractiveNode, InteractiveTree};
pub use key::{ChildKeys, Keyed, NodeKey};
pub use tree::{NodeCells, Tree};
