use std::collections::BTreeSet;

use bstree::{AvlTree, BsTree, Height, NodeRef};
use proptest::prelude::*;

const N_VALUES: usize = 200;

#[derive(Debug, Clone)]
enum Op {
    Insert(i16),
    Delete(i16),
    Find(i16),
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    // A small key domain makes operations collide on the same keys
    let key = -64_i16..64;
    prop_oneof![
        key.clone().prop_map(Op::Insert),
        key.clone().prop_map(Op::Delete),
        key.prop_map(Op::Find),
    ]
}

/// Checks links, order and AVL heights below `node`; returns the subtree height.
fn validate_avl(node: NodeRef<'_, i16, Height>, lower: Option<i16>, upper: Option<i16>) -> usize {
    let key = *node.key();
    assert!(lower.map_or(true, |lower| lower < key));
    assert!(upper.map_or(true, |upper| key < upper));

    let left_height = node.left().map_or(0, |left| {
        assert!(left.is_left_child_of(&node));
        assert_eq!(left.parent().map(|p| p.id()), Some(node.id()));
        validate_avl(left, lower, Some(key))
    });
    let right_height = node.right().map_or(0, |right| {
        assert!(right.is_right_child_of(&node));
        assert_eq!(right.parent().map(|p| p.id()), Some(node.id()));
        validate_avl(right, Some(key), upper)
    });

    assert!(left_height.abs_diff(right_height) <= 1);
    assert_eq!(node.balance_factor(), left_height as isize - right_height as isize);
    assert_eq!(node.height(), left_height.max(right_height) + 1);
    node.height()
}

fn validate_tree(tree: &AvlTree<i16>) {
    if let Some(root) = tree.root() {
        assert!(root.is_root());
        assert_eq!(validate_avl(root, None, None), tree.height());
    }
    let bound = 1.44 * ((tree.len() + 2) as f64).log2();
    assert!((tree.height() as f64) <= bound);
}

proptest! {
    /// Apply a random operation sequence to a tree and a control set and
    /// assert both agree after every step.
    #[test]
    fn prop_matches_btreeset(ops in prop::collection::vec(arbitrary_op(), 0..N_VALUES)) {
        let mut avl = AvlTree::new();
        let mut bst = BsTree::new();
        let mut control = BTreeSet::new();

        for op in ops {
            match op {
                Op::Insert(key) => {
                    let expected = control.insert(key);
                    prop_assert_eq!(avl.insert(key), expected);
                    prop_assert_eq!(bst.insert(key), expected);
                }
                Op::Delete(key) => {
                    let expected = control.remove(&key);
                    prop_assert_eq!(avl.delete(&key), expected);
                    prop_assert_eq!(bst.delete(&key), expected);
                }
                Op::Find(key) => {
                    let expected = control.get(&key);
                    prop_assert_eq!(avl.find(&key).map(|node| node.key()), expected);
                    prop_assert_eq!(bst.get(&key), expected);
                }
            }
            validate_tree(&avl);
            prop_assert_eq!(avl.len(), control.len());
            prop_assert_eq!(bst.len(), control.len());
        }

        prop_assert!(avl.iter().eq(control.iter()));
        prop_assert!(bst.iter().eq(control.iter()));
        prop_assert_eq!(avl.first(), control.first());
        prop_assert_eq!(avl.last(), control.last());
    }

    /// Inserting and then deleting a new key leaves the sorted content unchanged.
    #[test]
    fn prop_insert_delete_restores(
        keys in prop::collection::btree_set(any::<i16>(), 0..N_VALUES),
        extra in any::<i16>(),
    ) {
        prop_assume!(!keys.contains(&extra));
        let mut tree: AvlTree<i16> = keys.iter().copied().collect();

        prop_assert!(tree.insert(extra));
        validate_tree(&tree);
        prop_assert!(tree.delete(&extra));
        validate_tree(&tree);

        let mut inorder = Vec::new();
        tree.traverse_inorder(|key| inorder.push(*key));
        prop_assert!(inorder.iter().eq(keys.iter()));
    }

    /// Inserting a present key or deleting an absent one changes nothing.
    #[test]
    fn prop_noop_mutations(
        keys in prop::collection::btree_set(-100_i16..100, 1..N_VALUES),
        probe in -100_i16..100,
    ) {
        let mut tree: AvlTree<i16> = keys.iter().copied().collect();
        let mut before = Vec::new();
        tree.traverse_preorder(|key| before.push(*key));

        if keys.contains(&probe) {
            prop_assert!(!tree.insert(probe));
        } else {
            prop_assert!(!tree.delete(&probe));
        }

        let mut after = Vec::new();
        tree.traverse_preorder(|key| after.push(*key));
        prop_assert_eq!(before, after);
    }
}
