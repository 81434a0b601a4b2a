#![forbid(unsafe_code)]

//! Node identity.

use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

/// Ordered child keys as stored in a children cell.
///
/// Every structural write allocates a fresh slice, so two different child
/// lists never share storage.
pub type ChildKeys<K> = Rc<[K]>;

/// Identity of a position in the tree: the implicit root or a caller node.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum NodeKey<K> {
    /// The sentinel root. Always present, never removable.
    Root,
    /// A caller-supplied node key.
    Node(K),
}

impl<K> NodeKey<K> {
    /// Whether this is the root sentinel.
    #[must_use]
    pub fn is_root(&self) -> bool {
        matches!(self, Self::Root)
    }

    /// The caller key, or `None` for the root.
    #[must_use]
    pub fn as_node(&self) -> Option<&K> {
        match self {
            Self::Root => None,
            Self::Node(key) => Some(key),
        }
    }
}

impl<K> From<K> for NodeKey<K> {
    fn from(key: K) -> Self {
        Self::Node(key)
    }
}

impl<K: fmt::Debug> fmt::Debug for NodeKey<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("Root"),
            Self::Node(key) => key.fmt(f),
        }
    }
}

/// A payload that carries its own key.
///
/// The tree treats payloads as opaque apart from this key, which must not
/// change while the node is in the tree.
pub trait Keyed {
    /// Key type. Cheap clones are expected; `Rc<str>` or integers fit well.
    type Key: Clone + Eq + Hash + fmt::Debug + 'static;

    /// This payload's key.
    fn key(&self) -> &Self::Key;
}
