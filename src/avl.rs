use std::cmp::{self, Ordering};

use tracing::trace;

use crate::bst::{Balance, Tree};
use crate::compare::Natural;
use crate::error::{Error, Side};
use crate::node::{Link, NodeId, NodeRef};

/// AVL balancing: keeps the heights of sibling subtrees within one of each other.
#[derive(Debug, Clone, Copy, Default)]
pub struct Avl;

/// An ordered set implemented with an AVL tree.
///
/// ```
/// use bstree::AvlTree;
/// let mut tree = AvlTree::new();
/// for key in 1..=7 {
///     tree.insert(key);
/// }
/// assert_eq!(tree.height(), 3);
/// assert_eq!(*tree.root().unwrap().key(), 4);
/// ```
pub type AvlTree<K, C = Natural> = Tree<K, C, Avl>;

/// Cached height of the subtree below an AVL node, counting the node itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Height(usize);

impl Default for Height {
    // A fresh node is a leaf
    fn default() -> Self {
        Height(1)
    }
}

impl Balance for Avl {
    type Meta = Height;

    fn rotated<K, C>(tree: &mut AvlTree<K, C>, lowered: NodeId, raised: NodeId) {
        // Bottom-up: the lowered node is now a child of the raised one
        tree.reset_height(lowered);
        tree.reset_height(raised);
    }

    fn inserted<K, C>(tree: &mut AvlTree<K, C>, node: NodeId) -> Result<(), Error> {
        tree.rebalance_after_insert(node)
    }

    fn deleted<K, C>(tree: &mut AvlTree<K, C>, start: Option<NodeId>) -> Result<(), Error> {
        tree.rebalance_after_delete(start)
    }

    #[cfg(any(test, feature = "consistency_check"))]
    fn check_node<K, C>(tree: &AvlTree<K, C>, id: NodeId) {
        let node = &tree.arena[id];
        let left_height = tree.height_of(node.left);
        let right_height = tree.height_of(node.right);

        // Check height
        assert_eq!(node.meta.0, cmp::max(left_height, right_height) + 1);

        // Check AVL condition (nearly balance)
        assert!(left_height <= right_height + 1);
        assert!(right_height <= left_height + 1);
    }
}

impl<K, C> AvlTree<K, C> {
    /// Height of the tree: 0 when empty, 1 for a single node.
    pub fn height(&self) -> usize {
        self.height_of(self.root)
    }

    fn height_of(&self, link: Link) -> usize {
        link.map_or(0, |id| self.arena[id].meta.0)
    }

    fn reset_height(&mut self, id: NodeId) {
        let node = &self.arena[id];
        let height = cmp::max(self.height_of(node.left), self.height_of(node.right)) + 1;
        self.arena[id].meta = Height(height);
    }

    fn balance_factor(&self, id: NodeId) -> isize {
        let node = &self.arena[id];
        self.height_of(node.left) as isize - self.height_of(node.right) as isize
    }

    fn child_side(&self, parent: NodeId, child: NodeId) -> Side {
        if self.arena[parent].left == Some(child) {
            Side::Left
        } else {
            debug_assert_eq!(self.arena[parent].right, Some(child));
            Side::Right
        }
    }

    /// Walks up from a new leaf, refreshing heights, and applies at most one
    /// single or double rotation. Rotating restores the subtree's height from
    /// before the insert, so no ancestor above it needs attention.
    fn rebalance_after_insert(&mut self, node: NodeId) -> Result<(), Error> {
        let mut current = Some(node);
        let mut child: Link = None;
        let mut grandchild: Link = None;
        while let Some(id) = current {
            self.reset_height(id);
            let balance = self.balance_factor(id);
            if is_balanced(balance) {
                grandchild = child;
                child = Some(id);
                current = self.arena[id].parent;
            } else {
                // An insert only unbalances nodes at least two levels above the new leaf
                let side = taller_side(balance);
                let child = child.ok_or(Error::MissingChild { node: id, side })?;
                let grandchild = grandchild.ok_or(Error::MissingChild { node: child, side })?;
                self.rebalance_node(id, child, grandchild)?;
                break;
            }
        }
        Ok(())
    }

    /// Walks up from `start` to the root, refreshing heights and rotating at
    /// every node found out of balance. A rotation after a delete may shrink
    /// the subtree, so the walk never stops early.
    fn rebalance_after_delete(&mut self, start: Link) -> Result<(), Error> {
        let mut current = start;
        while let Some(id) = current {
            self.reset_height(id);
            let balance = self.balance_factor(id);
            if !is_balanced(balance) {
                let side = taller_side(balance);
                let child = self.arena[id]
                    .child(side)
                    .ok_or(Error::MissingChild { node: id, side })?;

                // Even grandchildren: stay on the child's side for a single rotation
                let grandchild_side = match self.balance_factor(child).cmp(&0) {
                    Ordering::Greater => Side::Left,
                    Ordering::Less => Side::Right,
                    Ordering::Equal => side,
                };
                let grandchild = self.arena[child]
                    .child(grandchild_side)
                    .ok_or(Error::MissingChild {
                        node: child,
                        side: grandchild_side,
                    })?;
                self.rebalance_node(id, child, grandchild)?;
            }
            current = self.arena[id].parent;
        }
        Ok(())
    }

    /// Restores balance at `id` given the child and grandchild on its taller path.
    fn rebalance_node(&mut self, id: NodeId, child: NodeId, grandchild: NodeId) -> Result<(), Error> {
        let outer = self.child_side(id, child);
        let inner = self.child_side(child, grandchild);
        match (outer, inner) {
            (Side::Left, Side::Left) => {
                trace!(node = %id, case = "LL", "rebalance");
                self.rotate_right(id)?;
            }
            (Side::Left, Side::Right) => {
                trace!(node = %id, case = "LR", "rebalance");
                self.rotate_left(child)?;
                self.rotate_right(id)?;
            }
            (Side::Right, Side::Right) => {
                trace!(node = %id, case = "RR", "rebalance");
                self.rotate_left(id)?;
            }
            (Side::Right, Side::Left) => {
                trace!(node = %id, case = "RL", "rebalance");
                self.rotate_right(child)?;
                self.rotate_left(id)?;
            }
        }
        Ok(())
    }
}

impl<'a, K> NodeRef<'a, K, Height> {
    /// Cached height of the subtree rooted at this node.
    pub fn height(&self) -> usize {
        self.meta().0
    }

    /// Height of the left subtree minus height of the right subtree.
    pub fn balance_factor(&self) -> isize {
        let height = |node: Option<Self>| node.map_or(0, |node| node.height());
        height(self.left()) as isize - height(self.right()) as isize
    }
}

#[inline]
fn is_balanced(balance: isize) -> bool {
    (-1..=1).contains(&balance)
}

#[inline]
fn taller_side(balance: isize) -> Side {
    if balance > 0 {
        Side::Left
    } else {
        Side::Right
    }
}
