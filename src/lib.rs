//! Ordered key sets stored as binary search trees with parent links.
//!
//! [`BsTree`] is a plain binary search tree. [`AvlTree`] is the same tree with
//! AVL balancing, which keeps its height within `1.44 * log2(n + 2)`.
//! Nodes live in an arena owned by the tree, so parent and child links are
//! plain indices.
//!
//! ```
//! use bstree::{AvlTree, Reverse, Natural};
//!
//! let mut tree = AvlTree::with_comparator(Reverse(Natural));
//! for key in [20, 50, 40, 45, -10, -20, 0] {
//!     tree.insert(key);
//! }
//! let mut keys = Vec::new();
//! tree.traverse_inorder(|key| keys.push(*key));
//! assert_eq!(keys, [50, 45, 40, 20, 0, -10, -20]);
//! ```
//!
//! A tree is not synchronized. Share it between threads behind a lock.

mod avl;
mod bst;
mod compare;
mod error;
mod node;

pub use avl::{Avl, AvlTree, Height};
pub use bst::{Balance, BsTree, Iter, Tree, Unbalanced};
pub use compare::{Comparator, Natural, PartialOrder, Reverse};
pub use error::{Error, Side};
pub use node::{NodeId, NodeRef};
