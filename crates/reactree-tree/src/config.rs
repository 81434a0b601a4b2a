#![forbid(unsafe_code)]

//! Tree behaviour knobs.

/// What `move_node` does when the target parent lies inside the moved
/// subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CyclePolicy {
    /// Walk the target's ancestors and refuse the move.
    #[default]
    Reject,
    /// Skip the walk. A move into the own subtree detaches it from the root.
    Allow,
}

/// Where a node lands when no explicit index is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertPosition {
    /// Append after the last sibling.
    #[default]
    End,
    /// Insert before the first sibling.
    Start,
}

/// Configuration for a [`Tree`](crate::Tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeConfig {
    /// Cycle handling for moves.
    pub cycle_policy: CyclePolicy,
    /// Default placement for inserts and moves.
    pub insert_position: InsertPosition,
}

impl TreeConfig {
    /// Set the cycle policy.
    #[must_use]
    pub fn with_cycle_policy(mut self, policy: CyclePolicy) -> Self {
        self.cycle_policy = policy;
        self
    }

    /// Set the default insert position.
    #[must_use]
    pub fn with_insert_position(mut self, position: InsertPosition) -> Self {
        self.insert_position = position;
        self
    }

    pub(crate) fn resolve_index(&self, at_index: Option<usize>, len: usize) -> usize {
        match (at_index, self.insert_position) {
            (Some(index), _) => index.min(len),
            (None, InsertPosition::End) => len,
            (None, InsertPosition::Start) => 0,
        }
    }
}
