use std::collections::BTreeSet;
use std::time::Instant;

use bstree::{AvlTree, BsTree, PartialOrder};
use tracing_subscriber::EnvFilter;

fn print_inorder<C>(title: &str, tree: &BsTree<i32, C>) {
    println!("--- {title} ---");
    tree.traverse_inorder(|key| print!("{key} "));
    println!();
}

fn main() {
    // RUST_LOG=bstree=trace shows every rotation
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let keys = [20, 50, 40, 45, -10, -20, 0];

    let mut tree = BsTree::new();
    for key in keys {
        tree.insert(key);
    }
    print_inorder("created tree", &tree);

    for key in [50, 20, -20] {
        tree.delete(&key);
        print_inorder(&format!("deleted {key}"), &tree);
    }

    if tree.delete(&20) {
        println!("error: 20 should not be in the tree");
    } else {
        println!("did not delete 20, it is not in the tree");
    }

    let mut descending = BsTree::with_comparator(|a: &i32, b: &i32| b.cmp(a));
    for key in keys {
        descending.insert(key);
    }
    print_inorder("descending comparator", &descending);

    // Keys without an order are only detected once two of them are compared
    let mut unordered = BsTree::with_comparator(PartialOrder);
    for key in [1.0, f64::NAN] {
        if let Err(err) = unordered.try_insert(key) {
            println!("{err}");
        }
    }

    let mut avl = AvlTree::new();
    for key in 1..=7 {
        avl.insert(key);
    }
    print!("level order of 1..=7: ");
    avl.traverse_level_order(|key| print!("{key} "));
    println!("(height {})", avl.height());

    compare_with_btreeset();
}

fn compare_with_btreeset() {
    const N: i32 = 1_000_000;

    let start = Instant::now();
    let mut avl = AvlTree::new();
    (0..N).for_each(|key| {
        avl.insert(key);
    });
    let avl_time = start.elapsed();

    let start = Instant::now();
    let mut set = BTreeSet::new();
    (0..N).for_each(|key| {
        set.insert(key);
    });
    let set_time = start.elapsed();

    println!(
        "sequential insert of {N} keys: AvlTree {:?} (height {}), BTreeSet {:?}",
        avl_time,
        avl.height(),
        set_time
    );
}
