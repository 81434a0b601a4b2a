#![forbid(unsafe_code)]

//! Tree with selection state.
//!
//! [`InteractiveTree`] forwards every structural operation to a [`Tree`] and,
//! inside the same store batch, refreshes two derived key lists: the
//! selected nodes and the disabled nodes, both in pre-order. Subscribers of
//! those lists are notified only when their contents change.

use std::rc::Rc;

use reactree_core::{Observable, ReadCell, Store, warn};

use crate::config::TreeConfig;
use crate::error::Result;
use crate::key::{ChildKeys, Keyed, NodeKey};
use crate::tree::{NodeCells, Tree};

/// Payload with selection flags.
pub trait InteractiveNode: Keyed {
    /// Whether the node is selected.
    fn selected(&self) -> bool;

    /// Set the selection flag.
    fn set_selected(&mut self, selected: bool);

    /// Disabled nodes ignore selection changes.
    fn disabled(&self) -> bool {
        false
    }

    /// Non-deletable nodes refuse a direct [`InteractiveTree::remove_node`].
    /// They are still removed with an ancestor.
    fn deletable(&self) -> bool {
        true
    }
}

/// A [`Tree`] that tracks selected and disabled nodes.
pub struct InteractiveTree<N: InteractiveNode> {
    tree: Tree<N>,
    selected: Observable<ChildKeys<N::Key>>,
    disabled: Observable<ChildKeys<N::Key>>,
}

impl<N> InteractiveTree<N>
where
    N: InteractiveNode + Clone + PartialEq + 'static,
{
    /// Empty tree with the default configuration.
    pub fn new(store: &Store) -> Self {
        Self::with_config(store, TreeConfig::default())
    }

    /// Empty tree with `config`.
    pub fn with_config(store: &Store, config: TreeConfig) -> Self {
        Self {
            tree: Tree::with_config(store, config),
            selected: store.cell(Rc::from(Vec::new())),
            disabled: store.cell(Rc::from(Vec::new())),
        }
    }

    /// The underlying tree, for queries.
    #[must_use]
    pub fn tree(&self) -> &Tree<N> {
        &self.tree
    }

    /// Selected keys in pre-order.
    #[must_use]
    pub fn selected_ids(&self) -> ReadCell<ChildKeys<N::Key>> {
        self.selected.read_only()
    }

    /// Disabled keys in pre-order.
    #[must_use]
    pub fn disabled_ids(&self) -> ReadCell<ChildKeys<N::Key>> {
        self.disabled.read_only()
    }

    /// Run `op` on the tree and refresh the derived lists in one batch.
    fn mutate<R>(&mut self, op: impl FnOnce(&mut Tree<N>) -> R) -> R {
        let store = self.tree.store().clone();
        store.batch(|| {
            let result = op(&mut self.tree);
            self.refresh();
            result
        })
    }

    fn refresh(&self) {
        let mut selected = Vec::new();
        let mut disabled = Vec::new();
        self.tree.for_each(|node| {
            if node.selected() {
                selected.push(node.key().clone());
            }
            if node.disabled() {
                disabled.push(node.key().clone());
            }
        });
        self.selected.set(Rc::from(selected));
        self.disabled.set(Rc::from(disabled));
    }

    /// See [`Tree::add_node`].
    ///
    /// # Errors
    ///
    /// Same as [`Tree::add_node`].
    pub fn add_node(
        &mut self,
        value: N,
        parent: &NodeKey<N::Key>,
        at_index: Option<usize>,
    ) -> Result<NodeCells<N>, N::Key> {
        self.mutate(|tree| tree.add_node(value, parent, at_index))
    }

    /// See [`Tree::add_root_node`].
    ///
    /// # Errors
    ///
    /// Same as [`Tree::add_root_node`].
    pub fn add_root_node(&mut self, value: N) -> Result<NodeCells<N>, N::Key> {
        self.add_node(value, &NodeKey::Root, None)
    }

    /// See [`Tree::move_node`].
    pub fn move_node(
        &mut self,
        key: &N::Key,
        new_parent: &NodeKey<N::Key>,
        at_index: Option<usize>,
    ) -> bool {
        self.mutate(|tree| tree.move_node(key, new_parent, at_index))
    }

    /// Remove `key` and its subtree, unless the node is not deletable.
    pub fn remove_node(&mut self, key: &NodeKey<N::Key>) -> bool {
        if let NodeKey::Node(k) = key {
            if self.tree.node_value(k).is_some_and(|node| !node.deletable()) {
                return false;
            }
        }
        self.mutate(|tree| tree.remove_node(key))
    }

    /// See [`Tree::remove_descendants`]. Deletable flags of the descendants
    /// are not consulted.
    pub fn remove_descendants(&mut self, key: &NodeKey<N::Key>) -> bool {
        self.mutate(|tree| tree.remove_descendants(key))
    }

    /// See [`Tree::reorder_up`].
    pub fn reorder_up(&mut self, key: &N::Key) -> bool {
        self.mutate(|tree| tree.reorder_up(key))
    }

    /// See [`Tree::reorder_down`].
    pub fn reorder_down(&mut self, key: &N::Key) -> bool {
        self.mutate(|tree| tree.reorder_down(key))
    }

    /// See [`Tree::reorder_to`].
    pub fn reorder_to(&mut self, key: &N::Key, to_index: isize) -> bool {
        self.mutate(|tree| tree.reorder_to(key, to_index))
    }

    /// See [`Tree::update_value`]. If the node is disabled after `edit`, its
    /// selection flag keeps the value it had before.
    ///
    /// # Errors
    ///
    /// [`TreeError::KeyChanged`](crate::TreeError::KeyChanged) if `edit`
    /// altered the key.
    pub fn update_value(
        &mut self,
        key: &N::Key,
        edit: impl FnOnce(&mut N),
    ) -> Result<bool, N::Key> {
        self.mutate(|tree| {
            tree.update_value(key, |node| {
                let was_selected = node.selected();
                edit(node);
                if node.disabled() && node.selected() != was_selected {
                    node.set_selected(was_selected);
                }
            })
        })
    }

    /// Select or deselect `key`. Returns `false` for unknown or disabled
    /// nodes and when the flag already had that value.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub fn set_selected(&mut self, key: &N::Key, selected: bool) -> bool {
        match self.tree.node_value(key) {
            Some(node) if !node.disabled() => {}
            _ => return false,
        }
        match self.mutate(|tree| tree.update_value(key, |node| node.set_selected(selected))) {
            Ok(changed) => changed,
            Err(err) => {
                warn!(message = "tree.select", error = %err);
                false
            }
        }
    }

    /// Flip the selection of `key`.
    pub fn toggle_selected(&mut self, key: &N::Key) -> bool {
        let Some(selected) = self.tree.node_value(key).map(|node| node.selected()) else {
            return false;
        };
        self.set_selected(key, !selected)
    }

    /// Deselect every selected node, disabled ones included. Returns how
    /// many were deselected.
    pub fn clear_selection(&mut self) -> usize {
        let keys = self.selected.get();
        self.mutate(|tree| {
            keys.iter()
                .filter(|key| {
                    matches!(
                        tree.update_value(key, |node| node.set_selected(false)),
                        Ok(true)
                    )
                })
                .count()
        })
    }
}
