extern crate std;

use std::{ops::Range, prelude::v1::*};

use proptest::prelude::*;

use crate::model::{self, height_bound, tree_from, TestNode};

use super::*;

// (key, balance factor) of a node, for structural assertions.
fn shape(node: Option<NodeRef<'_, TestNode>>) -> Option<(u32, i8)> {
    node.map(|n| (*n.key(), n.balance_factor()))
}

fn permutations(n: u32) -> Vec<Vec<u32>> {
    fn permute(prefix: &mut Vec<u32>, rest: &mut Vec<u32>, out: &mut Vec<Vec<u32>>) {
        if rest.is_empty() {
            out.push(prefix.clone());
            return;
        }

        for i in 0..rest.len() {
            let key = rest.remove(i);
            prefix.push(key);
            permute(prefix, rest, out);
            prefix.pop();
            rest.insert(i, key);
        }
    }

    let mut out = Vec::new();
    permute(&mut Vec::new(), &mut (0..n).collect(), &mut out);
    out
}

fn insert_find_all(keys: &[u32]) {
    let tree = tree_from(keys);

    for key in keys {
        let node = tree.get_raw(key).expect("item not found");
        assert_eq!(unsafe { node.as_ref().key() }, key);
    }

    assert_eq!(tree.len(), keys.len());
    assert!(tree.iter().map(|node| node.key).eq(0..keys.len() as u32));
}

fn insert_remove_all(keys: &[u32]) {
    let mut tree = tree_from(keys);

    for key in keys {
        let node = tree.get_raw(key).expect("item not found");
        unsafe { tree.remove_at(node) };
        tree.assert_invariants();
        assert!(!tree.contains_key(key));
    }
    assert!(tree.is_empty());

    for &key in keys {
        tree.insert(TestNode::new(key));
        tree.assert_invariants();
    }

    for key in keys.iter().rev() {
        assert_eq!(tree.remove(key).map(|node| node.key), Some(*key));
        tree.assert_invariants();
    }
    assert!(tree.is_empty());
}

#[test]
fn zero_elems_find() {
    insert_find_all(&[]);
}

#[test]
fn single_elem_find() {
    insert_find_all(&[0]);
}

#[test]
fn all_orders_find() {
    for n in 2..=6 {
        for keys in permutations(n) {
            insert_find_all(&keys);
        }
    }
}

#[test]
fn remove_one() {
    insert_remove_all(&[0]);
}

#[test]
fn all_orders_remove() {
    for n in 2..=6 {
        for keys in permutations(n) {
            insert_remove_all(&keys);
        }
    }
}

#[test]
fn right_heavy_insert_rotates_left() {
    let tree = tree_from(&[10, 20, 30]);

    let root = tree.root().unwrap();
    assert_eq!(shape(Some(root)), Some((20, 0)));
    assert_eq!(shape(root.left()), Some((10, 0)));
    assert_eq!(shape(root.right()), Some((30, 0)));
    assert_eq!(tree.height(), 2);
}

#[test]
fn left_heavy_insert_rotates_right() {
    let tree = tree_from(&[30, 20, 10]);

    let root = tree.root().unwrap();
    assert_eq!(shape(Some(root)), Some((20, 0)));
    assert_eq!(shape(root.left()), Some((10, 0)));
    assert_eq!(shape(root.right()), Some((30, 0)));
}

#[test]
fn left_right_insert_rotates_twice() {
    let tree = tree_from(&[30, 10, 20]);

    let root = tree.root().unwrap();
    assert_eq!(shape(Some(root)), Some((20, 0)));
    assert_eq!(shape(root.left()), Some((10, 0)));
    assert_eq!(shape(root.right()), Some((30, 0)));
    assert!(root.is_root());
    assert_eq!(root.left().unwrap().parent(), Some(root));
    assert_eq!(root.right().unwrap().parent(), Some(root));
}

#[test]
fn right_left_insert_rotates_twice() {
    let tree = tree_from(&[10, 30, 20]);

    let root = tree.root().unwrap();
    assert_eq!(shape(Some(root)), Some((20, 0)));
    assert_eq!(shape(root.left()), Some((10, 0)));
    assert_eq!(shape(root.right()), Some((30, 0)));
}

#[test]
fn insert_stops_at_balanced_ancestor() {
    // 25 evens out the root, so the update stops there.
    let tree = tree_from(&[20, 10, 30, 5, 25]);

    let root = tree.root().unwrap();
    assert_eq!(shape(Some(root)), Some((20, 0)));
    assert_eq!(shape(root.left()), Some((10, -1)));
    assert_eq!(shape(root.right()), Some((30, -1)));
}

#[test]
fn duplicate_insert_is_a_no_op() {
    let mut tree = tree_from(&[20, 10, 30, 5]);
    let before = tree.dump().to_string();

    let rejected = tree.insert(TestNode::new(10)).expect("duplicate must be handed back");
    assert_eq!(rejected.key, 10);

    tree.assert_invariants();
    assert_eq!(tree.len(), 4);
    assert_eq!(tree.dump().to_string(), before);
}

#[test]
fn remove_absent_is_a_no_op() {
    let mut tree = tree_from(&[20, 10, 30]);
    let before = tree.dump().to_string();

    assert!(tree.remove(&15).is_none());
    assert_eq!(tree.len(), 3);
    assert_eq!(tree.dump().to_string(), before);

    let mut empty: AvlTree<TestNode> = AvlTree::new();
    assert!(empty.remove(&15).is_none());
}

#[test]
fn remove_with_adjacent_successor() {
    let mut tree = tree_from(&[50, 30, 70, 20, 40, 60, 80]);

    assert_eq!(tree.remove(&30).map(|node| node.key), Some(30));
    tree.assert_invariants();

    let root = tree.root().unwrap();
    assert_eq!(shape(Some(root)), Some((50, 0)));

    let moved = root.left().unwrap();
    assert_eq!(shape(Some(moved)), Some((40, -1)));
    assert_eq!(moved.parent(), Some(root));
    assert_eq!(shape(moved.left()), Some((20, 0)));
    assert_eq!(moved.left().unwrap().parent(), Some(moved));
    assert!(!moved.has_right());

    assert_eq!(shape(root.right()), Some((70, 0)));
}

#[test]
fn remove_with_relocated_successor() {
    let mut tree = tree_from(&[50, 30, 70, 20, 40, 60, 80, 65]);
    assert_eq!(tree.root().unwrap().inorder_successor().map(|n| *n.key()), Some(60));

    assert_eq!(tree.remove(&50).map(|node| node.key), Some(50));
    tree.assert_invariants();

    let root = tree.root().unwrap();
    assert_eq!(shape(Some(root)), Some((60, 0)));
    assert_eq!(shape(root.left()), Some((30, 0)));

    let right = root.right().unwrap();
    assert_eq!(shape(Some(right)), Some((70, 0)));
    assert_eq!(shape(right.left()), Some((65, 0)));
    assert_eq!(right.left().unwrap().parent(), Some(right));
    assert_eq!(shape(right.right()), Some((80, 0)));
}

#[test]
fn remove_leaf_rotates_left() {
    let mut tree = tree_from(&[20, 10, 30, 40]);

    tree.remove(&10);
    tree.assert_invariants();

    let root = tree.root().unwrap();
    assert_eq!(shape(Some(root)), Some((30, 0)));
    assert_eq!(shape(root.left()), Some((20, 0)));
    assert_eq!(shape(root.right()), Some((40, 0)));
}

#[test]
fn remove_leaf_rotates_around_balanced_child() {
    let mut tree = tree_from(&[20, 10, 30, 25, 35]);

    tree.remove(&10);
    tree.assert_invariants();

    // The rotation leaves the subtree height unchanged, so the balanced child ends up heavy.
    let root = tree.root().unwrap();
    assert_eq!(shape(Some(root)), Some((30, -1)));
    let left = root.left().unwrap();
    assert_eq!(shape(Some(left)), Some((20, 1)));
    assert_eq!(shape(left.right()), Some((25, 0)));
    assert_eq!(shape(root.right()), Some((35, 0)));
}

#[test]
fn remove_rotates_at_several_levels() {
    // The sparsest tree of height 5. Removing 12 rotates at 11 and then again at the root.
    let mut tree = tree_from(&[8, 5, 11, 3, 7, 10, 12, 2, 4, 6, 9, 1]);
    assert_eq!(tree.check_invariants(), Ok(5));

    tree.remove(&12);
    assert_eq!(tree.check_invariants(), Ok(4));
    assert_eq!(shape(tree.root()), Some((5, 0)));
    assert_eq!(shape(tree.find(&8)), Some((8, 0)));
    assert_eq!(shape(tree.find(&10)), Some((10, 0)));
    assert_eq!(tree.len(), 11);
    assert!(tree.iter().map(|n| n.key).eq(1..=11));
}

#[test]
fn remove_one_child_promotes_it() {
    let mut tree = tree_from(&[20, 10, 30, 40]);

    tree.remove(&30);
    tree.assert_invariants();

    let root = tree.root().unwrap();
    assert_eq!(shape(Some(root)), Some((20, 0)));
    assert_eq!(shape(root.right()), Some((40, 0)));
    assert_eq!(root.right().unwrap().parent(), Some(root));

    let mut tree = tree_from(&[10, 20]);
    tree.remove(&10);
    let root = tree.root().unwrap();
    assert_eq!(shape(Some(root)), Some((20, 0)));
    assert!(root.is_root());
}

#[test]
#[should_panic(expected = "requires an inner child")]
fn double_rotation_without_inner_child_panics() {
    let mut tree = tree_from(&[10, 20]);
    let parent = tree.get_raw(&10).unwrap();
    let child = tree.get_raw(&20).unwrap();

    unsafe { tree.rotate_right_left(parent, child) };
}

#[test]
fn check_invariants_reports_corruption() {
    let tree = tree_from(&[10, 20, 30]);
    let root = tree.get_raw(&20).unwrap();
    let left = tree.get_raw(&10).unwrap();

    unsafe { AvlTree::links_mut(root).set_balance(1) };
    assert_eq!(
        tree.check_invariants(),
        Err(InvariantViolation::BalanceMismatch {
            key: "20".into(),
            stored: 1,
            actual: 0
        })
    );
    unsafe { AvlTree::links_mut(root).set_balance(0) };

    unsafe { AvlTree::links_mut(left).set_parent(None) };
    assert_eq!(
        tree.check_invariants(),
        Err(InvariantViolation::ParentMismatch {
            parent: "20".into(),
            child: "10".into()
        })
    );
    unsafe { AvlTree::links_mut(left).set_parent(Some(root)) };

    unsafe { (*left.as_ptr()).key = 25 };
    assert_eq!(
        tree.check_invariants(),
        Err(InvariantViolation::Unordered { key: "25".into() })
    );
    unsafe { (*left.as_ptr()).key = 10 };

    assert_eq!(tree.check_invariants(), Ok(2));
}

#[test]
fn sequential_inserts_stay_within_height_bound() {
    let keys: Vec<u32> = (0..1000).collect();
    let mut tree = tree_from(&keys);

    let height = tree.check_invariants().unwrap();
    assert_eq!(height, tree.height());
    assert!((height as f64) <= height_bound(tree.len()));

    for key in (0..1000).step_by(2) {
        tree.remove(&key);
    }

    let height = tree.check_invariants().unwrap();
    assert!((height as f64) <= height_bound(tree.len()));
    assert!(tree.iter().map(|node| node.key).eq((1..1000).step_by(2)));
}

#[test]
fn iter_both_ends() {
    let tree = tree_from(&[4, 2, 6, 1, 3, 5, 7]);

    let iter = tree.iter();
    assert_eq!(iter.len(), 7);
    assert!(iter.map(|node| node.key).eq(1..=7));
    assert!(tree.iter().rev().map(|node| node.key).eq((1..=7).rev()));

    let mut iter = tree.iter();
    assert_eq!(iter.next().map(|n| n.key), Some(1));
    assert_eq!(iter.next_back().map(|n| n.key), Some(7));
    assert_eq!(iter.len(), 5);
    assert!(iter.map(|node| node.key).eq(2..=6));

    let empty: AvlTree<TestNode> = AvlTree::new();
    assert_eq!(empty.iter().next().map(|n| n.key), None);
}

#[test]
fn first_last_and_pop() {
    let mut tree = tree_from(&[4, 2, 6, 1, 3, 5, 7]);

    assert_eq!(tree.first().map(|n| n.key), Some(1));
    assert_eq!(tree.last().map(|n| n.key), Some(7));

    assert_eq!(tree.pop_first().map(|n| n.key), Some(1));
    tree.assert_invariants();
    assert_eq!(tree.pop_last().map(|n| n.key), Some(7));
    tree.assert_invariants();
    assert_eq!(tree.first().map(|n| n.key), Some(2));
    assert_eq!(tree.last().map(|n| n.key), Some(6));
    assert_eq!(tree.len(), 5);
}

#[test]
fn node_navigation() {
    let tree = tree_from(&[20, 10, 30, 25]);

    let root = tree.root().unwrap();
    assert!(root.is_root());
    assert!(root.has_left() && root.has_right());
    assert_eq!(root.inorder_successor().map(|n| *n.key()), Some(25));

    let ten = tree.find(&10).unwrap();
    assert_eq!(ten.parent(), Some(root));
    assert!(!ten.has_left() && !ten.has_right());
    assert_eq!(ten.inorder_successor(), None);

    let thirty = tree.find(&30).unwrap();
    assert_eq!(thirty.balance_factor(), -1);
    assert_eq!(thirty.left().map(|n| n.key), Some(25));

    assert!(tree.find(&99).is_none());
}

#[test]
fn with_root_and_clear() {
    let mut tree = AvlTree::with_root(TestNode::new(7));
    assert_eq!(tree.len(), 1);
    assert_eq!(shape(tree.root()), Some((7, 0)));
    tree.assert_invariants();

    tree.insert(TestNode::new(3));
    tree.insert(TestNode::new(9));
    tree.clear();
    assert!(tree.is_empty());
    assert!(tree.root().is_none());
    assert_eq!(tree.height(), 0);

    tree.insert(TestNode::new(1));
    assert_eq!(shape(tree.root()), Some((1, 0)));
}

#[test]
fn dump_shows_structure_and_balance() {
    let tree = tree_from(&[20, 10, 30, 5]);

    assert_eq!(
        tree.dump().to_string(),
        "\\-- (20, bf: -1)\n\
         \x20   |-- (10, bf: -1)\n\
         \x20   |   |-- (5, bf: 0)\n\
         \x20   \\-- (30, bf: 0)\n"
    );

    let empty: AvlTree<TestNode> = AvlTree::new();
    assert_eq!(empty.dump().to_string(), "");
}

#[test]
fn dotgraph_labels_balance() {
    let tree = tree_from(&[20, 10]);

    let mut out = String::new();
    tree.dotgraph("t", &mut out).unwrap();
    assert!(out.starts_with("digraph \"graph-t\""));
    assert!(out.contains("[label=\"20:-1\"]"));
    assert!(out.contains("[label=\"10:0\"]"));
    assert!(out.contains("\"grapht-0\" -> \"grapht-1\";"));

    let empty: AvlTree<TestNode> = AvlTree::new();
    let mut out = String::new();
    empty.dotgraph("e", &mut out).unwrap();
    assert_eq!(out, "digraph \"graph-e\" {}");
}

#[test]
fn set_operations() {
    let mut set: AvlSet<u32> = [5, 3, 8, 1].into_iter().collect();

    assert!(!set.insert(3));
    assert!(set.insert(4));
    assert_eq!(set.len(), 5);
    assert!(set.contains(&4));
    assert_eq!(set.get(&8), Some(&8));
    assert_eq!(set.first(), Some(&1));
    assert_eq!(set.last(), Some(&8));
    assert_eq!(format!("{set:?}"), "{1, 3, 4, 5, 8}");

    assert!(set.remove(&3));
    assert!(!set.remove(&3));
    assert_eq!(set.take(&4), Some(4));
    assert_eq!(set.pop_first(), Some(1));
    assert_eq!(set.pop_last(), Some(8));
    assert!(set.iter().copied().eq([5]));
    assert_eq!(set.check_invariants(), Ok(1));

    set.clear();
    assert!(set.is_empty());
}

#[test]
fn set_with_key_and_navigation() {
    let mut set = AvlSet::with_key(String::from("m"));
    set.extend(["c", "x", "a"].map(String::from));

    assert_eq!(set.height(), 3);
    let root = set.root().unwrap();
    assert_eq!(root.key(), "m");
    assert_eq!(root.balance_factor(), -1);
    assert_eq!(set.find("a").unwrap().parent().unwrap().key(), "c");
    assert!(set.contains("x"));
    assert_eq!(
        set.dump().to_string(),
        "\\-- (\"m\", bf: -1)\n\
         \x20   |-- (\"c\", bf: -1)\n\
         \x20   |   |-- (\"a\", bf: 0)\n\
         \x20   \\-- (\"x\", bf: 0)\n"
    );
}

#[test]
fn map_operations() {
    let mut map: AvlMap<u32, &str> = [(2, "two"), (1, "one")].into_iter().collect();

    assert_eq!(map.insert(3, "three"), None);
    assert_eq!(map.insert(2, "deux"), Some("two"));
    assert_eq!(map.len(), 3);
    assert_eq!(map.get(&2), Some(&"deux"));
    assert!(map.contains_key(&1));

    *map.get_mut(&1).unwrap() = "un";
    assert_eq!(map.first_key_value(), Some((&1, &"un")));
    assert_eq!(map.last_key_value(), Some((&3, &"three")));
    assert_eq!(format!("{map:?}"), "{1: \"un\", 2: \"deux\", 3: \"three\"}");
    map.assert_invariants();

    assert_eq!(map.remove(&2), Some("deux"));
    assert_eq!(map.remove(&2), None);
    assert_eq!(map.pop_first(), Some((1, "un")));
    assert_eq!(map.pop_last(), Some((3, "three")));
    assert!(map.is_empty());
}

#[cfg(miri)]
const FUZZ_RANGE: Range<usize> = 0..10;

#[cfg(not(miri))]
const FUZZ_RANGE: Range<usize> = 0..1000;

fn shuffled_keys() -> impl Strategy<Value = (Vec<u32>, Vec<u32>)> {
    proptest::collection::hash_set(0u32..10_000, 0..200).prop_flat_map(|keys| {
        let keys: Vec<u32> = keys.into_iter().collect();
        (Just(keys.clone()), Just(keys).prop_shuffle())
    })
}

proptest::proptest! {
    #![proptest_config(ProptestConfig {
        max_shrink_iters: 65536,
        .. ProptestConfig::default()
    })]

    #[test]
    fn btree_equivalence(ops in proptest::collection::vec(model::op_strategy(), FUZZ_RANGE)) {
        model::run_btree_equivalence(ops);
    }

    #[test]
    fn insert_then_remove_in_any_order((inserted, removed) in shuffled_keys()) {
        let mut tree = tree_from(&inserted);
        prop_assert!((tree.height() as f64) <= height_bound(tree.len()));

        for (i, key) in removed.iter().enumerate() {
            prop_assert_eq!(tree.remove(key).map(|node| node.key), Some(*key));
            tree.assert_invariants();

            prop_assert!(!tree.contains_key(key));
            for remaining in &removed[i + 1..] {
                prop_assert!(tree.contains_key(remaining));
            }
        }

        prop_assert!(tree.is_empty());
    }

    #[test]
    fn duplicate_inserts_change_nothing(keys in proptest::collection::vec(0u32..100, 0..100)) {
        let mut once: AvlTree<TestNode> = AvlTree::new();
        let mut twice: AvlTree<TestNode> = AvlTree::new();

        for &key in &keys {
            once.insert(TestNode::new(key));
            twice.insert(TestNode::new(key));
            twice.insert(TestNode::new(key));
        }

        prop_assert_eq!(once.dump().to_string(), twice.dump().to_string());
        prop_assert_eq!(once.len(), twice.len());
    }
}
