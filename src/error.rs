use std::fmt;

use crate::node::NodeId;

/// Errors raised by tree operations.
///
/// A key that is not present is never an error: lookups return `None`
/// and removals return `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Two keys have no defined order under the tree's comparator.
    ///
    /// Raised by the first comparison that hits such a pair, never at construction.
    #[error("keys have no defined order; supply a comparator that orders them")]
    Unordered,
    /// A rotation or rebalancing step needed a child that is absent.
    #[error("node {node} has no {side} child")]
    MissingChild {
        /// Node the operation was applied to.
        node: NodeId,
        /// Side where the child was expected.
        side: Side,
    },
    /// A node handle refers to a slot that has been freed.
    #[error("node {0} is not part of the tree")]
    StaleNode(NodeId),
}

/// Child position below a parent node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Returns the mirrored side.
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("left"),
            Side::Right => f.write_str("right"),
        }
    }
}
