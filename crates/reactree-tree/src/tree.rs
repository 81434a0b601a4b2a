#![forbid(unsafe_code)]

//! Keyed, ordered tree of observable node cells.
//!
//! # Design
//!
//! Each node owns three cells allocated from the tree's [`Store`]: its
//! payload, its parent key and its ordered child keys. The root is implicit:
//! it has no payload and its child list lives in a separate cell. The
//! key-to-cells index is a plain map owned by the tree; membership is only
//! observable through the affected parent's children cell.
//!
//! Every mutating operation validates first and then performs all of its
//! cell writes inside one [`Store::batch`], so subscribers see one
//! notification per affected cell, after the tree is consistent again.
//!
//! # Invariants
//!
//! 1. Every node's parent is `Root` or a key present in the index.
//! 2. For every node `P` and every `C` in `P`'s children, `C`'s parent is
//!    `P`.
//! 3. Keys are unique and child lists hold no duplicates.
//! 4. No node is its own parent. Under [`CyclePolicy::Reject`] no node is
//!    its own ancestor either.
//! 5. A children cell is only ever written with a freshly allocated slice.
//!
//! # Failure Modes
//!
//! - **Caller errors on insert** (duplicate key, unknown parent, self
//!   parent) return [`TreeError`] before any write.
//! - **Expected no-ops** (unknown keys, boundary reorders, same-parent moves)
//!   return `false` and write nothing.

use std::fmt;
use std::rc::Rc;

use ahash::{AHashMap, AHashSet};
use reactree_core::{Computed, Observable, ReadCell, Store, debug, debug_span, trace};

use crate::config::{CyclePolicy, TreeConfig};
use crate::error::{Result, TreeError};
use crate::key::{ChildKeys, Keyed, NodeKey};

/// Read-only handles to one node's cells.
pub struct NodeCells<N: Keyed> {
    pub value: ReadCell<N>,
    pub parent: ReadCell<NodeKey<N::Key>>,
    pub children: ReadCell<ChildKeys<N::Key>>,
}

impl<N: Keyed> Clone for NodeCells<N> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            parent: self.parent.clone(),
            children: self.children.clone(),
        }
    }
}

impl<N: Keyed + fmt::Debug> fmt::Debug for NodeCells<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeCells")
            .field("value", &self.value)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish()
    }
}

struct NodeEntry<N: Keyed> {
    value: Observable<N>,
    parent: Observable<NodeKey<N::Key>>,
    children: Observable<ChildKeys<N::Key>>,
}

impl<N: Keyed + Clone + PartialEq + 'static> NodeEntry<N> {
    fn cells(&self) -> NodeCells<N> {
        NodeCells {
            value: self.value.read_only(),
            parent: self.parent.read_only(),
            children: self.children.read_only(),
        }
    }
}

fn empty_children<K>() -> ChildKeys<K> {
    Rc::from(Vec::new())
}

/// Rewrite a children cell through a scratch `Vec`.
fn edit_children<K: Clone + PartialEq + 'static>(
    cell: &Observable<ChildKeys<K>>,
    edit: impl FnOnce(&mut Vec<K>),
) {
    cell.update(|prev| {
        let mut keys = prev.to_vec();
        edit(&mut keys);
        Rc::from(keys)
    });
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn rejected(op: &'static str, reason: &'static str) -> bool {
    trace!(message = "tree.rejected", op, reason);
    false
}

/// Observable tree engine.
///
/// # Example
///
/// ```
/// use reactree_core::Store;
/// use reactree_tree::{Keyed, NodeKey, Tree};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Item {
///     id: u32,
///     label: &'static str,
/// }
///
/// impl Keyed for Item {
///     type Key = u32;
///     fn key(&self) -> &u32 {
///         &self.id
///     }
/// }
///
/// let store = Store::new();
/// let mut tree = Tree::new(&store);
/// tree.add_root_node(Item { id: 1, label: "docs" })?;
/// tree.add_node(Item { id: 2, label: "intro" }, &NodeKey::Node(1), None)?;
///
/// assert_eq!(&*tree.children_ids(&NodeKey::Node(1)).unwrap(), &[2]);
/// assert!(tree.move_node(&2, &NodeKey::Root, None));
/// assert_eq!(tree.size(), 2);
/// # Ok::<(), reactree_tree::TreeError<u32>>(())
/// ```
pub struct Tree<N: Keyed> {
    store: Store,
    config: TreeConfig,
    root_children: Observable<ChildKeys<N::Key>>,
    index: AHashMap<N::Key, NodeEntry<N>>,
}

impl<N: Keyed + fmt::Debug> fmt::Debug for Tree<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("config", &self.config)
            .field("size", &self.index.len())
            .field("root_children", &self.root_children)
            .finish()
    }
}

impl<N> Tree<N>
where
    N: Keyed + Clone + PartialEq + 'static,
{
    /// Empty tree with the default configuration.
    pub fn new(store: &Store) -> Self {
        Self::with_config(store, TreeConfig::default())
    }

    /// Empty tree with `config`.
    pub fn with_config(store: &Store, config: TreeConfig) -> Self {
        Self {
            store: store.clone(),
            config,
            root_children: store.cell(empty_children()),
            index: AHashMap::new(),
        }
    }

    /// Store the tree's cells were allocated from.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    fn children_of(&self, key: &NodeKey<N::Key>) -> Option<&Observable<ChildKeys<N::Key>>> {
        match key {
            NodeKey::Root => Some(&self.root_children),
            NodeKey::Node(key) => self.index.get(key).map(|entry| &entry.children),
        }
    }

    // --- structure -------------------------------------------------------

    /// Insert `value` under `parent` at `at_index` (clamped; `None` follows
    /// [`TreeConfig::insert_position`]).
    ///
    /// # Errors
    ///
    /// [`TreeError::DuplicateKey`], [`TreeError::SelfParent`] and
    /// [`TreeError::UnknownParent`], checked in that order. Nothing is
    /// written when an error is returned.
    pub fn add_node(
        &mut self,
        value: N,
        parent: &NodeKey<N::Key>,
        at_index: Option<usize>,
    ) -> Result<NodeCells<N>, N::Key> {
        let key = value.key().clone();
        if self.index.contains_key(&key) {
            return Err(TreeError::DuplicateKey(key));
        }
        if parent.as_node() == Some(&key) {
            return Err(TreeError::SelfParent(key));
        }
        let Some(siblings) = self.children_of(parent).cloned() else {
            return Err(TreeError::UnknownParent(parent.clone()));
        };

        let entry = NodeEntry {
            value: self.store.cell(value),
            parent: self.store.cell(parent.clone()),
            children: self.store.cell(empty_children()),
        };
        let cells = entry.cells();
        self.index.insert(key.clone(), entry);

        let config = self.config;
        self.store.batch(|| {
            edit_children(&siblings, |keys| {
                let at = config.resolve_index(at_index, keys.len());
                keys.insert(at, key.clone());
            });
        });
        debug!(message = "tree.add", key = ?key, parent = ?parent);
        Ok(cells)
    }

    /// Insert `value` directly under the root.
    ///
    /// # Errors
    ///
    /// Same as [`add_node`](Self::add_node); only `DuplicateKey` can occur.
    pub fn add_root_node(&mut self, value: N) -> Result<NodeCells<N>, N::Key> {
        self.add_node(value, &NodeKey::Root, None)
    }

    /// Re-parent `key` under `new_parent` at `at_index` (clamped; `Some(0)`
    /// is the front). The subtree moves with it.
    ///
    /// Returns `false` without writing when the key or parent is unknown,
    /// when `new_parent` already is the parent, or when the move would make
    /// the node its own ancestor under [`CyclePolicy::Reject`].
    pub fn move_node(
        &mut self,
        key: &N::Key,
        new_parent: &NodeKey<N::Key>,
        at_index: Option<usize>,
    ) -> bool {
        let Some(entry) = self.index.get(key) else {
            return rejected("move", "unknown key");
        };
        let Some(new_siblings) = self.children_of(new_parent).cloned() else {
            return rejected("move", "unknown parent");
        };
        let old_parent = entry.parent.get();
        if old_parent == *new_parent {
            return rejected("move", "same parent");
        }
        if new_parent.as_node() == Some(key) {
            return rejected("move", "self parent");
        }
        if self.config.cycle_policy == CyclePolicy::Reject && self.is_descendant_of(new_parent, key)
        {
            return rejected("move", "into own subtree");
        }

        let parent_cell = entry.parent.clone();
        let old_siblings = self.children_of(&old_parent).cloned();
        let config = self.config;
        self.store.batch(|| {
            if let Some(old_siblings) = &old_siblings {
                edit_children(old_siblings, |keys| keys.retain(|k| k != key));
            }
            if !new_siblings.with(|keys| keys.contains(key)) {
                edit_children(&new_siblings, |keys| {
                    let at = config.resolve_index(at_index, keys.len());
                    keys.insert(at, key.clone());
                });
            }
            parent_cell.set(new_parent.clone());
        });
        debug!(
            message = "tree.move",
            key = ?key,
            from = ?old_parent,
            to = ?new_parent
        );
        true
    }

    /// Remove `key` and its whole subtree.
    ///
    /// Returns `false` for [`NodeKey::Root`] and unknown keys. Descendants
    /// are swept with an explicit stack; their removal order is unspecified.
    pub fn remove_node(&mut self, key: &NodeKey<N::Key>) -> bool {
        let NodeKey::Node(key) = key else {
            return rejected("remove", "root");
        };
        let Some(entry) = self.index.get(key) else {
            return rejected("remove", "unknown key");
        };
        let old_parent = entry.parent.get();
        let store = self.store.clone();
        let removed = store.batch(|| {
            if let Some(siblings) = self.children_of(&old_parent) {
                edit_children(siblings, |keys| keys.retain(|k| k != key));
            }
            self.sweep(key)
        });
        debug!(message = "tree.remove", key = ?key, removed);
        removed > 0
    }

    /// Drop `key` and everything below it from the index. Returns the number
    /// of index entries removed.
    fn sweep(&mut self, key: &N::Key) -> usize {
        let mut removed = 0;
        let mut stack = vec![key.clone()];
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.index.remove(&current) {
                removed += 1;
                stack.extend(entry.children.get().iter().cloned());
            }
        }
        removed
    }

    /// Remove every descendant of `key`, keeping `key` itself.
    ///
    /// [`NodeKey::Root`] is accepted and clears the tree. Returns `false`
    /// only for an unknown key.
    pub fn remove_descendants(&mut self, key: &NodeKey<N::Key>) -> bool {
        let Some(children) = self.children_of(key).map(Observable::get) else {
            return rejected("remove_descendants", "unknown key");
        };
        let span = debug_span!("tree.remove_descendants", key = ?key, children = children.len());
        let _guard = span.enter();
        let store = self.store.clone();
        store.batch(|| {
            for child in children.iter() {
                self.remove_node(&NodeKey::Node(child.clone()));
            }
        });
        true
    }

    // --- sibling order ---------------------------------------------------

    /// Sibling list cell of `key` and `key`'s position in it.
    fn locate(&self, key: &N::Key) -> Option<(Observable<ChildKeys<N::Key>>, usize)> {
        let parent = self.index.get(key)?.parent.get();
        let siblings = self.children_of(&parent)?;
        let position = siblings.with(|keys| keys.iter().position(|k| k == key))?;
        Some((siblings.clone(), position))
    }

    /// Swap `key` with its left sibling.
    pub fn reorder_up(&mut self, key: &N::Key) -> bool {
        match self.locate(key) {
            Some((_, 0)) => rejected("reorder_up", "first sibling"),
            Some((siblings, at)) => {
                self.write_order(&siblings, |keys| keys.swap(at, at - 1));
                debug!(message = "tree.reorder", key = ?key, from = at, to = at - 1);
                true
            }
            None => rejected("reorder_up", "unknown key"),
        }
    }

    /// Swap `key` with its right sibling.
    pub fn reorder_down(&mut self, key: &N::Key) -> bool {
        let Some((siblings, at)) = self.locate(key) else {
            return rejected("reorder_down", "unknown key");
        };
        if at + 1 >= siblings.with(|keys| keys.len()) {
            return rejected("reorder_down", "last sibling");
        }
        self.write_order(&siblings, |keys| keys.swap(at, at + 1));
        debug!(message = "tree.reorder", key = ?key, from = at, to = at + 1);
        true
    }

    /// Move `key` to `to_index` within its sibling list.
    ///
    /// Negative indices count from the end and wrap modulo the sibling
    /// count. Indices past the end select the last position. Returns `false`
    /// when the resolved index is the current one.
    pub fn reorder_to(&mut self, key: &N::Key, to_index: isize) -> bool {
        let Some((siblings, at)) = self.locate(key) else {
            return rejected("reorder_to", "unknown key");
        };
        let len = siblings.with(|keys| keys.len());
        let target = if to_index < 0 {
            to_index.rem_euclid(len as isize) as usize
        } else {
            (to_index as usize).min(len - 1)
        };
        if target == at {
            return rejected("reorder_to", "same index");
        }
        self.write_order(&siblings, |keys| {
            let moved = keys.remove(at);
            keys.insert(target, moved);
        });
        debug!(message = "tree.reorder", key = ?key, from = at, to = target);
        true
    }

    fn write_order(
        &self,
        siblings: &Observable<ChildKeys<N::Key>>,
        edit: impl FnOnce(&mut Vec<N::Key>),
    ) {
        self.store.batch(|| edit_children(siblings, edit));
    }

    // --- payloads --------------------------------------------------------

    /// Edit the payload of `key` in place.
    ///
    /// Returns `Ok(false)` for an unknown key or when the edit left the
    /// payload unchanged.
    ///
    /// # Errors
    ///
    /// [`TreeError::KeyChanged`] if `edit` altered the payload's key; the
    /// stored payload is left as it was.
    pub fn update_value(
        &mut self,
        key: &N::Key,
        edit: impl FnOnce(&mut N),
    ) -> Result<bool, N::Key> {
        let Some(entry) = self.index.get(key) else {
            return Ok(false);
        };
        let mut next = entry.value.get();
        edit(&mut next);
        self.write_value(key, next)
    }

    /// Replace the payload of `key`.
    ///
    /// # Errors
    ///
    /// [`TreeError::KeyChanged`] if `value` carries a different key.
    pub fn set_value(&mut self, key: &N::Key, value: N) -> Result<bool, N::Key> {
        if !self.index.contains_key(key) {
            return Ok(false);
        }
        self.write_value(key, value)
    }

    fn write_value(&self, key: &N::Key, value: N) -> Result<bool, N::Key> {
        if value.key() != key {
            return Err(TreeError::KeyChanged {
                from: key.clone(),
                to: value.key().clone(),
            });
        }
        let Some(entry) = self.index.get(key) else {
            return Ok(false);
        };
        let changed = self.store.batch(|| entry.value.set(value));
        if changed {
            trace!(message = "tree.value", key = ?key);
        }
        Ok(changed)
    }

    // --- queries ---------------------------------------------------------

    /// Whether `key` is in the tree.
    #[must_use]
    pub fn has_key(&self, key: &N::Key) -> bool {
        self.index.contains_key(key)
    }

    /// Read-only handles to the cells of `key`.
    #[must_use]
    pub fn node_cells(&self, key: &N::Key) -> Option<NodeCells<N>> {
        self.index.get(key).map(NodeEntry::cells)
    }

    /// Children cell of `key`. Available for the root as well.
    #[must_use]
    pub fn children_cell(&self, key: &NodeKey<N::Key>) -> Option<ReadCell<ChildKeys<N::Key>>> {
        self.children_of(key).map(Observable::read_only)
    }

    /// Derived cell that is `true` while `key` has children.
    #[must_use]
    pub fn has_children_cell(&self, key: &NodeKey<N::Key>) -> Option<Computed<bool>> {
        let children = self.children_cell(key)?;
        Some(Computed::from_cell(&children, |keys: &ChildKeys<N::Key>| {
            !keys.is_empty()
        }))
    }

    /// Clone of the payload of `key`.
    #[must_use]
    pub fn node_value(&self, key: &N::Key) -> Option<N> {
        self.index.get(key).map(|entry| entry.value.get())
    }

    /// Current parent of `key`.
    #[must_use]
    pub fn parent_id(&self, key: &N::Key) -> Option<NodeKey<N::Key>> {
        self.index.get(key).map(|entry| entry.parent.get())
    }

    /// Child keys of `key`'s parent, `key` included.
    #[must_use]
    pub fn sibling_ids(&self, key: &N::Key) -> Option<ChildKeys<N::Key>> {
        let parent = self.parent_id(key)?;
        self.children_ids(&parent)
    }

    /// Ordered child keys of `key`.
    #[must_use]
    pub fn children_ids(&self, key: &NodeKey<N::Key>) -> Option<ChildKeys<N::Key>> {
        self.children_of(key).map(Observable::get)
    }

    /// Number of nodes, root excluded.
    #[must_use]
    pub fn size(&self) -> usize {
        self.index.len()
    }

    /// Whether the tree holds no nodes besides the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Parent chain of `key`, nearest first, root excluded.
    ///
    /// The walk is bounded by the tree size, so a detached cycle created
    /// under [`CyclePolicy::Allow`] yields a finite (truncated) chain.
    #[must_use]
    pub fn ancestors(&self, key: &N::Key) -> Option<Vec<N::Key>> {
        let mut current = self.parent_id(key)?;
        let mut chain = Vec::new();
        while let NodeKey::Node(parent) = current {
            if chain.len() >= self.index.len() {
                break;
            }
            current = self.parent_id(&parent).unwrap_or(NodeKey::Root);
            chain.push(parent);
        }
        Some(chain)
    }

    /// Number of ancestors of `key` below the root. Root-level nodes have
    /// depth 0.
    #[must_use]
    pub fn depth(&self, key: &N::Key) -> Option<usize> {
        self.ancestors(key).map(|chain| chain.len())
    }

    /// Whether `ancestor` lies on the parent chain of `node`. Every node is a
    /// descendant of [`NodeKey::Root`]; nothing is a descendant of itself.
    #[must_use]
    pub fn is_descendant_of(&self, node: &NodeKey<N::Key>, ancestor: &N::Key) -> bool {
        let NodeKey::Node(node) = node else {
            return false;
        };
        let mut current = self.parent_id(node);
        for _ in 0..=self.index.len() {
            match current {
                Some(NodeKey::Node(parent)) => {
                    if &parent == ancestor {
                        return true;
                    }
                    current = self.parent_id(&parent);
                }
                _ => return false,
            }
        }
        false
    }

    /// Keys below `key` in pre-order, `key` excluded.
    #[must_use]
    pub fn descendant_ids(&self, key: &NodeKey<N::Key>) -> Option<Vec<N::Key>> {
        let roots = self.children_ids(key)?;
        let mut seen = AHashSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<N::Key> = roots.iter().rev().cloned().collect();
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(entry) = self.index.get(&current) {
                entry
                    .children
                    .with(|keys| stack.extend(keys.iter().rev().cloned()));
            }
            order.push(current);
        }
        Some(order)
    }

    /// Visit every payload reachable from the root, in pre-order.
    pub fn for_each(&self, mut f: impl FnMut(&N)) {
        for key in self.descendant_ids(&NodeKey::Root).unwrap_or_default() {
            if let Some(entry) = self.index.get(&key) {
                entry.value.with(&mut f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: &'static str,
        label: &'static str,
    }

    impl Keyed for Item {
        type Key = &'static str;
        fn key(&self) -> &&'static str {
            &self.id
        }
    }

    fn item(id: &'static str) -> Item {
        Item { id, label: id }
    }

    fn node(key: &'static str) -> NodeKey<&'static str> {
        NodeKey::Node(key)
    }

    fn ids(keys: Option<ChildKeys<&'static str>>) -> Vec<&'static str> {
        keys.map(|keys| keys.to_vec()).unwrap_or_default()
    }

    /// root -> a -> (a1, a2), root -> b
    fn sample() -> Tree<Item> {
        let store = Store::new();
        let mut tree = Tree::new(&store);
        tree.add_root_node(item("a")).unwrap();
        tree.add_root_node(item("b")).unwrap();
        tree.add_node(item("a1"), &node("a"), None).unwrap();
        tree.add_node(item("a2"), &node("a"), None).unwrap();
        tree
    }

    #[test]
    fn add_node_appends_and_links_parent() {
        let tree = sample();
        assert_eq!(tree.size(), 4);
        assert_eq!(ids(tree.children_ids(&NodeKey::Root)), vec!["a", "b"]);
        assert_eq!(ids(tree.children_ids(&node("a"))), vec!["a1", "a2"]);
        assert_eq!(tree.parent_id(&"a1"), Some(node("a")));
        assert_eq!(tree.parent_id(&"b"), Some(NodeKey::Root));
    }

    #[test]
    fn add_node_at_index_is_clamped() {
        let mut tree = sample();
        tree.add_node(item("a0"), &node("a"), Some(0)).unwrap();
        tree.add_node(item("a9"), &node("a"), Some(99)).unwrap();
        assert_eq!(ids(tree.children_ids(&node("a"))), vec!["a0", "a1", "a2", "a9"]);
    }

    #[test]
    fn add_node_errors_leave_tree_untouched() {
        let mut tree = sample();
        let root_version = tree.children_cell(&NodeKey::Root).unwrap().version();

        assert_eq!(
            tree.add_root_node(item("a")).unwrap_err(),
            TreeError::DuplicateKey("a")
        );
        assert_eq!(
            tree.add_node(item("z"), &node("z"), None).unwrap_err(),
            TreeError::SelfParent("z")
        );
        assert_eq!(
            tree.add_node(item("z"), &node("ghost"), None).unwrap_err(),
            TreeError::UnknownParent(node("ghost"))
        );
        assert_eq!(tree.size(), 4);
        assert!(!tree.has_key(&"z"));
        assert_eq!(
            tree.children_cell(&NodeKey::Root).unwrap().version(),
            root_version
        );
    }

    #[test]
    fn duplicate_is_checked_before_self_parent() {
        let mut tree = sample();
        assert_eq!(
            tree.add_node(item("a"), &node("a"), None).unwrap_err(),
            TreeError::DuplicateKey("a")
        );
    }

    #[test]
    fn start_insert_position() {
        let store = Store::new();
        let config = TreeConfig::default().with_insert_position(crate::InsertPosition::Start);
        let mut tree: Tree<Item> = Tree::with_config(&store, config);
        tree.add_root_node(item("x")).unwrap();
        tree.add_root_node(item("y")).unwrap();
        assert_eq!(ids(tree.children_ids(&NodeKey::Root)), vec!["y", "x"]);
    }

    #[test]
    fn move_node_front_and_default_end() {
        let mut tree = sample();
        assert!(tree.move_node(&"b", &node("a"), Some(0)));
        assert_eq!(ids(tree.children_ids(&node("a"))), vec!["b", "a1", "a2"]);
        assert!(tree.move_node(&"b", &NodeKey::Root, None));
        assert_eq!(ids(tree.children_ids(&NodeKey::Root)), vec!["a", "b"]);
    }

    #[test]
    fn move_node_soft_failures() {
        let mut tree = sample();
        assert!(!tree.move_node(&"ghost", &NodeKey::Root, None));
        assert!(!tree.move_node(&"a1", &node("ghost"), None));
        assert!(!tree.move_node(&"a1", &node("a"), Some(1)));
        assert!(!tree.move_node(&"a", &node("a"), None));
        assert!(!tree.move_node(&"a", &node("a1"), None));
        assert_eq!(ids(tree.children_ids(&node("a"))), vec!["a1", "a2"]);
    }

    #[test]
    fn allow_policy_permits_moving_into_subtree() {
        let store = Store::new();
        let config = TreeConfig::default().with_cycle_policy(CyclePolicy::Allow);
        let mut tree: Tree<Item> = Tree::with_config(&store, config);
        tree.add_root_node(item("a")).unwrap();
        tree.add_node(item("a1"), &node("a"), None).unwrap();

        assert!(tree.move_node(&"a", &node("a1"), None));
        assert!(tree.children_ids(&NodeKey::Root).unwrap().is_empty());
        // The detached cycle stays finite for every walk.
        assert_eq!(tree.ancestors(&"a").map(|chain| chain.len()), Some(2));
        assert_eq!(tree.descendant_ids(&node("a")), Some(vec!["a1", "a"]));
        assert!(tree.descendant_ids(&NodeKey::Root).unwrap().is_empty());
        assert!(tree.remove_node(&node("a")));
        assert!(tree.is_empty());
    }

    #[test]
    fn remove_node_sweeps_subtree() {
        let mut tree = sample();
        tree.add_node(item("a1x"), &node("a1"), None).unwrap();
        assert!(tree.remove_node(&node("a")));
        assert_eq!(tree.size(), 1);
        assert!(!tree.has_key(&"a1x"));
        assert_eq!(ids(tree.children_ids(&NodeKey::Root)), vec!["b"]);
        assert!(!tree.remove_node(&node("a")));
        assert!(!tree.remove_node(&NodeKey::Root));
    }

    #[test]
    fn remove_descendants_keeps_node() {
        let mut tree = sample();
        assert!(tree.remove_descendants(&node("a")));
        assert!(tree.has_key(&"a"));
        assert!(tree.children_ids(&node("a")).unwrap().is_empty());
        assert_eq!(tree.size(), 2);
        assert!(tree.remove_descendants(&NodeKey::Root));
        assert_eq!(tree.size(), 0);
        assert!(!tree.remove_descendants(&node("ghost")));
    }

    #[test]
    fn reorder_boundaries() {
        let mut tree = sample();
        assert!(!tree.reorder_up(&"a1"));
        assert!(!tree.reorder_down(&"a2"));
        assert!(!tree.reorder_up(&"ghost"));
        assert!(tree.reorder_down(&"a1"));
        assert_eq!(ids(tree.children_ids(&node("a"))), vec!["a2", "a1"]);
        assert!(tree.reorder_up(&"a1"));
        assert_eq!(ids(tree.children_ids(&node("a"))), vec!["a1", "a2"]);
    }

    #[test]
    fn reorder_to_wraps_and_clamps() {
        let mut tree = sample();
        tree.add_node(item("a3"), &node("a"), None).unwrap();
        assert!(tree.reorder_to(&"a1", -1));
        assert_eq!(ids(tree.children_ids(&node("a"))), vec!["a2", "a3", "a1"]);
        assert!(!tree.reorder_to(&"a1", 2));
        assert!(!tree.reorder_to(&"a1", 50));
        assert!(!tree.reorder_to(&"a1", -4));
        assert!(tree.reorder_to(&"a1", -8));
        assert_eq!(ids(tree.children_ids(&node("a"))), vec!["a2", "a1", "a3"]);
        assert!(!tree.reorder_to(&"ghost", 0));
    }

    #[test]
    fn children_written_once_per_operation() {
        let mut tree = sample();
        let hits = Rc::new(Cell::new(0));
        let hits_cb = Rc::clone(&hits);
        let cell = tree.children_cell(&node("a")).unwrap();
        let _sub = cell.subscribe(move |_| hits_cb.set(hits_cb.get() + 1));

        tree.remove_descendants(&node("a"));
        assert_eq!(hits.get(), 1);
        tree.add_node(item("a5"), &node("a"), None).unwrap();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn update_value_rejects_key_change() {
        let mut tree = sample();
        assert_eq!(tree.update_value(&"a", |n| n.label = "renamed"), Ok(true));
        assert_eq!(tree.node_value(&"a").unwrap().label, "renamed");
        assert_eq!(tree.update_value(&"a", |_| {}), Ok(false));
        assert_eq!(
            tree.update_value(&"a", |n| n.id = "zz"),
            Err(TreeError::KeyChanged { from: "a", to: "zz" })
        );
        assert_eq!(tree.node_value(&"a").unwrap().id, "a");
        assert_eq!(tree.set_value(&"ghost", item("ghost")), Ok(false));
        assert_eq!(tree.set_value(&"b", Item { id: "b", label: "B" }), Ok(true));
    }

    #[test]
    fn traversal_queries() {
        let mut tree = sample();
        tree.add_node(item("a1x"), &node("a1"), None).unwrap();
        assert_eq!(
            tree.descendant_ids(&NodeKey::Root),
            Some(vec!["a", "a1", "a1x", "a2", "b"])
        );
        assert_eq!(tree.ancestors(&"a1x"), Some(vec!["a1", "a"]));
        assert_eq!(tree.depth(&"a1x"), Some(2));
        assert_eq!(tree.depth(&"b"), Some(0));
        assert!(tree.is_descendant_of(&node("a1x"), &"a"));
        assert!(!tree.is_descendant_of(&node("a"), &"a"));
        assert!(!tree.is_descendant_of(&NodeKey::Root, &"a"));
        assert_eq!(ids(tree.sibling_ids(&"a2")), vec!["a1", "a2"]);

        let mut labels = Vec::new();
        tree.for_each(|n| labels.push(n.label));
        assert_eq!(labels, vec!["a", "a1", "a1x", "a2", "b"]);
    }

    #[test]
    fn has_children_cell_tracks_child_list() {
        let mut tree = sample();
        let has_children = tree.has_children_cell(&node("b")).unwrap();
        assert!(!has_children.get());
        tree.move_node(&"a1", &node("b"), None);
        assert!(has_children.get());
        assert!(tree.has_children_cell(&node("ghost")).is_none());
    }

    #[test]
    fn has_children_cell_is_exact_inside_batch() {
        let mut tree = sample();
        let has_children = tree.has_children_cell(&node("b")).unwrap();
        assert!(!has_children.get());

        let store = tree.store().clone();
        store.batch(|| {
            tree.add_node(item("b1"), &node("b"), None).unwrap();
            assert_eq!(ids(tree.children_ids(&node("b"))), vec!["b1"]);
            assert!(has_children.get());
            assert!(tree.remove_descendants(&node("b")));
            assert!(!has_children.get());
        });
        assert!(!has_children.get());
    }

    #[test]
    fn trees_are_independent() {
        let store = Store::new();
        let mut first: Tree<Item> = Tree::new(&store);
        let mut second: Tree<Item> = Tree::new(&store);
        first.add_root_node(item("a")).unwrap();
        second.add_root_node(item("a")).unwrap();
        assert!(first.remove_node(&node("a")));
        assert!(second.has_key(&"a"));
    }

    #[cfg(feature = "tracing")]
    mod tracing_capture {
        use super::*;
        use std::sync::{Arc, Mutex};
        use tracing::Subscriber;
        use tracing_subscriber::Layer;
        use tracing_subscriber::layer::{Context, SubscriberExt};

        struct MessageCapture {
            messages: Arc<Mutex<Vec<String>>>,
        }

        impl<S: Subscriber> Layer<S> for MessageCapture {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                struct Msg(Option<String>);
                impl tracing::field::Visit for Msg {
                    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                        if field.name() == "message" {
                            self.0 = Some(value.to_string());
                        }
                    }

                    fn record_debug(
                        &mut self,
                        field: &tracing::field::Field,
                        value: &dyn std::fmt::Debug,
                    ) {
                        if field.name() == "message" {
                            self.0 = Some(format!("{value:?}").trim_matches('"').to_string());
                        }
                    }
                }
                let mut msg = Msg(None);
                event.record(&mut msg);
                if let Some(message) = msg.0 {
                    self.messages.lock().expect("capture lock").push(message);
                }
            }
        }

        #[test]
        fn structural_operations_emit_events() {
            let messages = Arc::new(Mutex::new(Vec::new()));
            let subscriber = tracing_subscriber::registry().with(MessageCapture {
                messages: Arc::clone(&messages),
            });
            let _guard = tracing::subscriber::set_default(subscriber);

            let mut tree = sample();
            tree.move_node(&"b", &node("a"), None);
            tree.reorder_up(&"b");
            tree.remove_node(&node("a1"));
            tree.move_node(&"ghost", &NodeKey::Root, None);

            let seen = messages.lock().expect("capture lock");
            for expected in ["tree.add", "tree.move", "tree.reorder", "tree.remove", "tree.rejected"] {
                assert!(
                    seen.iter().any(|m| m == expected),
                    "expected {expected} event, saw {seen:?}"
                );
            }
        }
    }
}
