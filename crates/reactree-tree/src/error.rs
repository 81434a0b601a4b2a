#![forbid(unsafe_code)]

use std::fmt::Debug;

use thiserror::Error;

use crate::key::NodeKey;

/// Hard failures of tree operations. State is untouched when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError<K: Debug> {
    #[error("node {0:?} already exists")]
    DuplicateKey(K),

    #[error("node {0:?} cannot be its own parent")]
    SelfParent(K),

    #[error("parent {0:?} does not exist")]
    UnknownParent(NodeKey<K>),

    #[error("payload key changed from {from:?} to {to:?}")]
    KeyChanged { from: K, to: K },
}

/// Result alias for fallible tree operations.
pub type Result<T, K> = std::result::Result<T, TreeError<K>>;
