use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;
use std::iter::FusedIterator;

use tracing::{debug, trace};

use crate::compare::{Comparator, Natural};
use crate::error::{Error, Side};
use crate::node::{Arena, Link, Node, NodeId, NodeRef};

mod sealed {
    pub trait Sealed {}
}

/// Balancing strategy plugged into a [`Tree`].
///
/// The tree performs the structural part of every mutation and then hands
/// control to the strategy through these hooks. The trait is sealed; the
/// crate provides [`Unbalanced`] and [`Avl`](crate::Avl).
pub trait Balance: sealed::Sealed + Sized {
    /// Per-node balancing metadata.
    type Meta: Default + Clone + fmt::Debug;

    /// Called after a rotation moved `lowered` down below `raised`.
    fn rotated<K, C>(_tree: &mut Tree<K, C, Self>, _lowered: NodeId, _raised: NodeId) {}

    /// Called after `node` has been linked into the tree as a new leaf.
    fn inserted<K, C>(_tree: &mut Tree<K, C, Self>, _node: NodeId) -> Result<(), Error> {
        Ok(())
    }

    /// Called after a node has been unlinked.
    /// `start` is the lowest node whose subtree changed shape.
    fn deleted<K, C>(_tree: &mut Tree<K, C, Self>, _start: Option<NodeId>) -> Result<(), Error> {
        Ok(())
    }

    /// Asserts the strategy's invariants at `node`.
    #[cfg(any(test, feature = "consistency_check"))]
    fn check_node<K, C>(_tree: &Tree<K, C, Self>, _node: NodeId) {}
}

/// No rebalancing at all.
///
/// The height of such a tree depends on the insertion order and degrades to
/// a list for sorted input.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbalanced;

impl sealed::Sealed for Unbalanced {}
impl Balance for Unbalanced {
    type Meta = ();
}

impl sealed::Sealed for crate::avl::Avl {}

/// A plain binary search tree.
pub type BsTree<K, C = Natural> = Tree<K, C, Unbalanced>;

/// An ordered set of keys stored as a binary search tree with parent links.
///
/// The ordering comes from the comparator `C`, the shape policy from the
/// balancing strategy `B`. Use it through [`BsTree`] or [`AvlTree`](crate::AvlTree).
///
/// ```
/// use bstree::BsTree;
/// let mut tree = BsTree::new();
/// for key in [20, 50, 40, 45, -10, -20, 0] {
///     tree.insert(key);
/// }
/// assert!(tree.delete(&50));
/// assert!(!tree.delete(&50));
/// assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [-20, -10, 0, 20, 40, 45]);
/// ```
pub struct Tree<K, C, B: Balance> {
    pub(crate) arena: Arena<K, B::Meta>,
    pub(crate) root: Link,
    cmp: C,
}

#[allow(clippy::enum_variant_names)]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

impl<K, B: Balance> Tree<K, Natural, B> {
    /// Creates an empty tree ordered by the keys' `Ord` implementation.
    /// No memory is allocated until the first key is inserted.
    pub const fn new() -> Self {
        Self::with_comparator(Natural)
    }
}

impl<K, C, B: Balance> Tree<K, C, B> {
    /// Creates an empty tree ordered by `cmp`.
    pub const fn with_comparator(cmp: C) -> Self {
        Self {
            arena: Arena::new(),
            root: None,
            cmp,
        }
    }

    /// Returns the comparator that orders this tree.
    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Returns true if the tree contains no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of keys in the tree.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Removes all keys, deallocating the node storage.
    pub fn clear(&mut self) {
        debug!(len = self.len(), "clearing tree");
        self.arena.clear();
        self.root = None;
    }

    /// Returns a handle to the root node.
    pub fn root(&self) -> Option<NodeRef<'_, K, B::Meta>> {
        self.root.map(|id| NodeRef::new(&self.arena, id))
    }

    /// Returns a handle to the node in slot `id`, if that slot is in use.
    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, K, B::Meta>> {
        self.arena.get(id).map(|_| NodeRef::new(&self.arena, id))
    }

    /// Returns the smallest key.
    pub fn first(&self) -> Option<&K> {
        self.root.map(|id| &self.arena[self.arena.leftmost(id)].key)
    }

    /// Returns the largest key.
    pub fn last(&self) -> Option<&K> {
        self.root.map(|id| &self.arena[self.arena.rightmost(id)].key)
    }

    /// Number of nodes on the longest path from the root down to a leaf.
    ///
    /// Computed by visiting every node.
    pub fn depth(&self) -> usize {
        let depth = Cell::new(0);
        let mut max_depth = 0;
        self.traverse(
            |_| {
                depth.set(depth.get() + 1);
                max_depth = max_depth.max(depth.get());
            },
            |_| {},
            |_| depth.set(depth.get() - 1),
        );
        max_depth
    }

    /// Returns an iterator over the keys in ascending order.
    pub fn iter(&self) -> Iter<'_, K, B::Meta> {
        Iter {
            arena: &self.arena,
            next: self.root.map(|id| self.arena.leftmost(id)),
            remaining: self.len(),
        }
    }

    /// Calls `visitor` on every key in ascending order.
    pub fn traverse_inorder<F: FnMut(&K)>(&self, mut visitor: F) {
        self.traverse(|_| {}, |id| visitor(&self.arena[id].key), |_| {});
    }

    /// Calls `visitor` on every key, each node before its subtrees.
    pub fn traverse_preorder<F: FnMut(&K)>(&self, mut visitor: F) {
        self.traverse(|id| visitor(&self.arena[id].key), |_| {}, |_| {});
    }

    /// Calls `visitor` on every key, each node after its subtrees.
    pub fn traverse_postorder<F: FnMut(&K)>(&self, mut visitor: F) {
        self.traverse(|_| {}, |_| {}, |id| visitor(&self.arena[id].key));
    }

    /// Calls `visitor` on every key, level by level from the root.
    pub fn traverse_level_order<F: FnMut(&K)>(&self, mut visitor: F) {
        let mut queue: VecDeque<NodeId> = self.root.into_iter().collect();
        while let Some(id) = queue.pop_front() {
            let node = &self.arena[id];
            visitor(&node.key);
            queue.extend(node.left);
            queue.extend(node.right);
        }
    }

    /// Walks the tree once through parent links, without recursion or a stack.
    fn traverse<Pre, In, Post>(&self, mut preorder: Pre, mut inorder: In, mut postorder: Post)
    where
        Pre: FnMut(NodeId),
        In: FnMut(NodeId),
        Post: FnMut(NodeId),
    {
        if let Some(mut id) = self.root {
            let mut dir = Direction::FromParent;
            loop {
                match dir {
                    Direction::FromParent => {
                        preorder(id);
                        if let Some(left) = self.arena[id].left {
                            id = left;
                        } else {
                            dir = Direction::FromLeft;
                        }
                    }
                    Direction::FromLeft => {
                        inorder(id);
                        if let Some(right) = self.arena[id].right {
                            id = right;
                            dir = Direction::FromParent;
                        } else {
                            dir = Direction::FromRight;
                        }
                    }
                    Direction::FromRight => {
                        postorder(id);
                        match self.arena[id].parent {
                            Some(parent) => {
                                dir = if self.arena[parent].left == Some(id) {
                                    Direction::FromLeft
                                } else {
                                    Direction::FromRight
                                };
                                id = parent;
                            }
                            None => break,
                        }
                    }
                }
            }
        }
    }

    /// Points the link that held `old` (a child link of `parent`, or the root) at `new`,
    /// and points `new` back at `parent`.
    fn replace_child(&mut self, parent: Link, old: NodeId, new: Link) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let node = &mut self.arena[parent];
                if node.left == Some(old) {
                    node.left = new;
                } else {
                    debug_assert_eq!(node.right, Some(old));
                    node.right = new;
                }
            }
        }
        if let Some(new) = new {
            self.arena[new].parent = parent;
        }
    }

    /// Rotates the subtree at `id` towards `side`: the child on the opposite side
    /// takes the place of `id`, and `id` becomes its `side` child.
    /// Returns the new subtree root.
    fn rotate(&mut self, id: NodeId, side: Side) -> Result<NodeId, Error> {
        let node = self.arena.get(id).ok_or(Error::StaleNode(id))?;
        let pivot = node.child(side.opposite()).ok_or(Error::MissingChild {
            node: id,
            side: side.opposite(),
        })?;
        let parent = node.parent;
        trace!(node = %id, pivot = %pivot, %side, "rotate");

        // Inner subtree of the pivot moves across to the rotated node
        let inner = self.arena[pivot].child(side);
        *self.arena[id].child_mut(side.opposite()) = inner;
        if let Some(inner) = inner {
            self.arena[inner].parent = Some(id);
        }

        self.replace_child(parent, id, Some(pivot));

        *self.arena[pivot].child_mut(side) = Some(id);
        self.arena[id].parent = Some(pivot);

        B::rotated(self, id, pivot);
        Ok(pivot)
    }

    /// Rotates the subtree at `id` to the left; its right child takes its place.
    pub(crate) fn rotate_left(&mut self, id: NodeId) -> Result<NodeId, Error> {
        self.rotate(id, Side::Left)
    }

    /// Rotates the subtree at `id` to the right; its left child takes its place.
    pub(crate) fn rotate_right(&mut self, id: NodeId) -> Result<NodeId, Error> {
        self.rotate(id, Side::Right)
    }

    /// Removes node `id` from the tree structure and frees its slot (or the slot of its
    /// in-order successor, whose key moves into `id`).
    /// Returns the lowest node from which the tree may now be out of balance.
    fn unlink_node(&mut self, id: NodeId) -> Link {
        let node = &self.arena[id];
        let parent = node.parent;
        match (node.left, node.right) {
            (None, None) => {
                self.replace_child(parent, id, None);
                self.arena.free(id);
                parent
            }
            (Some(child), None) | (None, Some(child)) => {
                self.replace_child(parent, id, Some(child));
                self.arena.free(id);
                Some(child)
            }
            (Some(_), Some(right)) => {
                // The successor has no left child, so it is unlinked by one of the cases above
                let successor = self.arena.leftmost(right);
                debug_assert!(self.arena[successor].left.is_none());
                self.arena.swap_keys(id, successor);
                self.unlink_node(successor)
            }
        }
    }
}

impl<K, C: Comparator<K>, B: Balance> Tree<K, C, B> {
    /// Looks up the node holding a key equal to `key`.
    pub fn try_find(&self, key: &K) -> Result<Option<NodeRef<'_, K, B::Meta>>, Error> {
        Ok(self.find_id(key)?.map(|id| NodeRef::new(&self.arena, id)))
    }

    /// Looks up the node holding a key equal to `key`.
    ///
    /// # Panics
    ///
    /// Panics if the comparator cannot order `key` against a stored key.
    pub fn find(&self, key: &K) -> Option<NodeRef<'_, K, B::Meta>> {
        self.try_find(key).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Returns a reference to the stored key equal to `key`.
    pub fn get(&self, key: &K) -> Option<&K> {
        self.find(key).map(|node| node.key())
    }

    /// Returns true if the tree contains a key equal to `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Inserts `key`.
    /// Returns `Ok(false)` and leaves the tree unchanged if an equal key is already present.
    pub fn try_insert(&mut self, key: K) -> Result<bool, Error> {
        match self.insert_node(key)? {
            Some(id) => {
                B::inserted(self, id)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Inserts `key`, returning whether it was newly added.
    ///
    /// # Panics
    ///
    /// Panics if the comparator cannot order `key` against a stored key.
    pub fn insert(&mut self, key: K) -> bool {
        self.try_insert(key).unwrap_or_else(|err| panic!("{err}"))
    }

    /// Removes the key equal to `key`.
    /// Returns `Ok(false)` and leaves the tree unchanged if there is no such key.
    pub fn try_delete(&mut self, key: &K) -> Result<bool, Error> {
        match self.find_id(key)? {
            Some(id) => {
                let start = self.unlink_node(id);
                B::deleted(self, start)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes the key equal to `key`, returning whether it was present.
    ///
    /// # Panics
    ///
    /// Panics if the comparator cannot order `key` against a stored key.
    pub fn delete(&mut self, key: &K) -> bool {
        self.try_delete(key).unwrap_or_else(|err| panic!("{err}"))
    }

    fn find_id(&self, key: &K) -> Result<Link, Error> {
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.arena[id];
            current = match self.cmp.compare(key, &node.key)? {
                Ordering::Equal => break,
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            };
        }
        Ok(current)
    }

    /// Finds the empty link where `key` belongs: the parent and the side below it,
    /// or `None` as parent for an empty tree. Returns `None` if `key` is present.
    fn find_insert_pos(&self, key: &K) -> Result<Option<(Link, Side)>, Error> {
        let mut parent: Link = None;
        let mut side = Side::Left;
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.arena[id];
            side = match self.cmp.compare(key, &node.key)? {
                Ordering::Equal => return Ok(None),
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            parent = Some(id);
            current = node.child(side);
        }
        Ok(Some((parent, side)))
    }

    /// Links a new leaf holding `key` and returns its slot,
    /// or `None` if an equal key is already present.
    fn insert_node(&mut self, key: K) -> Result<Link, Error> {
        let Some((parent, side)) = self.find_insert_pos(&key)? else {
            return Ok(None);
        };
        let id = self.arena.alloc(Node::new(parent, key));
        match parent {
            None => self.root = Some(id),
            Some(parent) => *self.arena[parent].child_mut(side) = Some(id),
        }
        Ok(Some(id))
    }

    /// Asserts the search order, parent links, node count and strategy invariants.
    ///
    /// # Panics
    ///
    /// Panics on the first violation found.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        // Check root link
        if let Some(root) = self.root {
            assert!(self.arena[root].parent.is_none());
        }

        // Check tree nodes
        let mut num_nodes = 0;
        self.traverse(
            |id| {
                let node = &self.arena[id];

                // Check links and order for child nodes
                if let Some(left) = node.left {
                    assert_eq!(self.arena[left].parent, Some(id));
                    assert_eq!(
                        self.cmp.compare(&self.arena[left].key, &node.key),
                        Ok(Ordering::Less)
                    );
                }
                if let Some(right) = node.right {
                    assert_eq!(self.arena[right].parent, Some(id));
                    assert_eq!(
                        self.cmp.compare(&self.arena[right].key, &node.key),
                        Ok(Ordering::Greater)
                    );
                }

                B::check_node(self, id);
                num_nodes += 1;
            },
            |_| {},
            |_| {},
        );

        // Whole subtrees are ordered if every in-order neighbour pair is
        let mut prev: Option<&K> = None;
        for key in self.iter() {
            if let Some(prev) = prev {
                assert_eq!(self.cmp.compare(prev, key), Ok(Ordering::Less));
            }
            prev = Some(key);
        }

        // Check number of nodes
        assert_eq!(num_nodes, self.len());
    }
}

impl<K, B: Balance> Default for Tree<K, Natural, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone, C: Clone, B: Balance> Clone for Tree<K, C, B> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena.clone(),
            root: self.root,
            cmp: self.cmp.clone(),
        }
    }
}

impl<K: fmt::Debug, C, B: Balance> fmt::Debug for Tree<K, C, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, C: Comparator<K>, B: Balance> Extend<K> for Tree<K, C, B> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord, B: Balance> FromIterator<K> for Tree<K, Natural, B> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, K, C, B: Balance> IntoIterator for &'a Tree<K, C, B> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K, B::Meta>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over the keys of a tree in ascending order.
pub struct Iter<'a, K, M> {
    arena: &'a Arena<K, M>,
    next: Link,
    remaining: usize,
}

impl<'a, K, M> Iterator for Iter<'a, K, M> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.arena.successor(id);
        self.remaining -= 1;
        Some(&self.arena[id].key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, M> ExactSizeIterator for Iter<'_, K, M> {}

impl<K, M> FusedIterator for Iter<'_, K, M> {}

impl<K, M> Clone for Iter<'_, K, M> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena,
            next: self.next,
            remaining: self.remaining,
        }
    }
}
