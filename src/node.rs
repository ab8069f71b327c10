//! Tree nodes and the arena that owns them.
//!
//! Child and parent links are plain slot indices. The arena owns every node;
//! a parent link is only a way back up and never keeps a node alive.

use std::fmt;
use std::mem;
use std::ops::{Index, IndexMut};

use crate::error::Side;

/// Handle to a node slot inside a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub(crate) type Link = Option<NodeId>;

#[derive(Debug, Clone)]
pub(crate) struct Node<K, M> {
    pub(crate) key: K,
    pub(crate) left: Link,
    pub(crate) right: Link,
    pub(crate) parent: Link,
    pub(crate) meta: M,
}

impl<K, M: Default> Node<K, M> {
    pub(crate) fn new(parent: Link, key: K) -> Self {
        Self {
            key,
            left: None,
            right: None,
            parent,
            meta: M::default(),
        }
    }
}

impl<K, M> Node<K, M> {
    #[inline]
    pub(crate) fn child(&self, side: Side) -> Link {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline]
    pub(crate) fn child_mut(&mut self, side: Side) -> &mut Link {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

#[derive(Debug, Clone)]
enum Slot<K, M> {
    Occupied(Node<K, M>),
    // Next vacant slot of the free list
    Vacant(Link),
}

/// Slot storage for the nodes of one tree.
///
/// Freed slots are threaded into a free list and reused by the next allocation,
/// so a `NodeId` may name a different node after its original node was removed.
#[derive(Debug, Clone)]
pub(crate) struct Arena<K, M> {
    slots: Vec<Slot<K, M>>,
    free: Link,
    len: usize,
}

impl<K, M> Arena<K, M> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: None,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn alloc(&mut self, node: Node<K, M>) -> NodeId {
        self.len += 1;
        match self.free {
            Some(id) => match mem::replace(&mut self.slots[id.index()], Slot::Occupied(node)) {
                Slot::Vacant(next_free) => {
                    self.free = next_free;
                    id
                }
                Slot::Occupied(_) => unreachable!("free list points at occupied slot {id}"),
            },
            None => {
                self.slots.push(Slot::Occupied(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    pub(crate) fn free(&mut self, id: NodeId) -> Node<K, M> {
        match mem::replace(&mut self.slots[id.index()], Slot::Vacant(self.free)) {
            Slot::Occupied(node) => {
                self.free = Some(id);
                self.len -= 1;
                node
            }
            Slot::Vacant(_) => panic!("double free of node {id}"),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free = None;
        self.len = 0;
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> Option<&Node<K, M>> {
        match self.slots.get(id.index()) {
            Some(Slot::Occupied(node)) => Some(node),
            _ => None,
        }
    }

    /// Exchanges the keys stored in two occupied slots, leaving links untouched.
    pub(crate) fn swap_keys(&mut self, a: NodeId, b: NodeId) {
        if a == b {
            return;
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (head, tail) = self.slots.split_at_mut(hi.index());
        match (&mut head[lo.index()], &mut tail[0]) {
            (Slot::Occupied(x), Slot::Occupied(y)) => mem::swap(&mut x.key, &mut y.key),
            _ => panic!("cannot swap keys of vacant slots {a} and {b}"),
        }
    }

    /// Leftmost node of the subtree rooted at `id`.
    pub(crate) fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self[id].left {
            id = left;
        }
        id
    }

    /// Rightmost node of the subtree rooted at `id`.
    pub(crate) fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let Some(right) = self[id].right {
            id = right;
        }
        id
    }

    /// In-order successor of `id`, found through parent links without a stack.
    pub(crate) fn successor(&self, id: NodeId) -> Link {
        if let Some(right) = self[id].right {
            return Some(self.leftmost(right));
        }
        let mut current = id;
        while let Some(parent) = self[current].parent {
            if self[parent].left == Some(current) {
                return Some(parent);
            }
            current = parent;
        }
        None
    }
}

impl<K, M> Index<NodeId> for Arena<K, M> {
    type Output = Node<K, M>;

    #[inline]
    fn index(&self, id: NodeId) -> &Self::Output {
        match &self.slots[id.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant(_) => panic!("node {id} has been freed"),
        }
    }
}

impl<K, M> IndexMut<NodeId> for Arena<K, M> {
    #[inline]
    fn index_mut(&mut self, id: NodeId) -> &mut Self::Output {
        match &mut self.slots[id.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant(_) => panic!("node {id} has been freed"),
        }
    }
}

/// Read-only handle to a node, valid while the tree is borrowed.
///
/// Returned by [`Tree::find`](crate::Tree::find) and [`Tree::root`](crate::Tree::root).
/// The borrow prevents the tree from being mutated while the handle is alive.
pub struct NodeRef<'a, K, M> {
    arena: &'a Arena<K, M>,
    id: NodeId,
}

impl<'a, K, M> NodeRef<'a, K, M> {
    #[inline]
    pub(crate) fn new(arena: &'a Arena<K, M>, id: NodeId) -> Self {
        Self { arena, id }
    }

    #[inline]
    fn node(&self) -> &'a Node<K, M> {
        &self.arena[self.id]
    }

    #[inline]
    fn link(&self, link: Link) -> Option<Self> {
        link.map(|id| Self::new(self.arena, id))
    }

    /// Slot handle of this node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The key stored in this node.
    pub fn key(&self) -> &'a K {
        &self.node().key
    }

    pub fn parent(&self) -> Option<Self> {
        self.link(self.node().parent)
    }

    pub fn left(&self) -> Option<Self> {
        self.link(self.node().left)
    }

    pub fn right(&self) -> Option<Self> {
        self.link(self.node().right)
    }

    /// Returns true if the node has no parent.
    pub fn is_root(&self) -> bool {
        self.node().parent.is_none()
    }

    /// Returns true if this node is the left child of `other`.
    pub fn is_left_child_of(&self, other: &Self) -> bool {
        other.node().left == Some(self.id)
    }

    /// Returns true if this node is the right child of `other`.
    pub fn is_right_child_of(&self, other: &Self) -> bool {
        other.node().right == Some(self.id)
    }

    pub(crate) fn meta(&self) -> &'a M {
        &self.node().meta
    }
}

impl<K, M> Clone for NodeRef<'_, K, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, M> Copy for NodeRef<'_, K, M> {}

impl<K: fmt::Debug, M> fmt::Debug for NodeRef<'_, K, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("id", &self.id)
            .field("key", self.key())
            .finish()
    }
}
