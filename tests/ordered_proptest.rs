//! Property-based tests for the ordered containers.
//!
//! Both containers are driven with random operation sequences against a
//! `BTreeSet` model, then audited for the properties that matter: order,
//! reported replacements/removals, rank consistency, snapshot
//! immutability, and split partitioning.

use std::collections::BTreeSet;

use proptest::prelude::*;

use joist::avl::AvlTree;
use joist::skip::{LevelHint, SkipList};

/// One random mutation against an ordered set.
#[derive(Clone, Debug)]
enum Op {
    Insert(i32),
    Delete(i32),
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..512i32).prop_map(Op::Insert),
        (0..512i32).prop_map(Op::Delete),
    ]
}

// =============================================================================
// Persistent AVL
// =============================================================================

proptest! {
    #[test]
    fn avl_matches_a_btree_model(ops in prop::collection::vec(arbitrary_op(), 1..200)) {
        let mut tree = AvlTree::new();
        let mut model = BTreeSet::new();

        for op in &ops {
            match op {
                Op::Insert(key) => {
                    let (next, replaced) = tree.insert([*key]);
                    prop_assert_eq!(replaced[0].is_some(), !model.insert(*key));
                    tree = next;
                }
                Op::Delete(key) => {
                    let (next, removed) = tree.delete(&[*key]);
                    prop_assert_eq!(removed[0].is_some(), model.remove(key));
                    tree = next;
                }
            }
        }

        prop_assert_eq!(tree.len(), model.len());
        let contents: Vec<i32> = tree.iter().copied().collect();
        let expected: Vec<i32> = model.iter().copied().collect();
        prop_assert_eq!(contents, expected);
    }

    #[test]
    fn avl_snapshots_survive_descendant_mutations(
        keys in prop::collection::vec(0..256i32, 1..100),
        extra in prop::collection::vec(0..256i32, 1..50),
    ) {
        let (base, _) = AvlTree::new().insert(keys.clone());
        let len_before = base.len();
        let contents_before: Vec<i32> = base.iter().copied().collect();

        // Mutate descendants every which way.
        let (grown, _) = base.insert(extra);
        let (shrunk, _) = grown.delete(&keys);
        prop_assert!(shrunk.len() <= grown.len());

        prop_assert_eq!(base.len(), len_before);
        let contents_after: Vec<i32> = base.iter().copied().collect();
        prop_assert_eq!(contents_after, contents_before);
    }

    #[test]
    fn avl_insert_then_delete_round_trips(
        keys in prop::collection::vec(0..256i32, 1..100),
        probe in 300..400i32,
    ) {
        // The probe range is disjoint from the key range, so the insert
        // genuinely adds and the delete genuinely removes.
        let (base, _) = AvlTree::new().insert(keys);
        let (grown, replaced) = base.insert([probe]);
        prop_assert!(replaced[0].is_none());

        let (back, removed) = grown.delete(&[probe]);
        prop_assert_eq!(removed[0], Some(probe));
        prop_assert_eq!(back.len(), base.len());
        let round_tripped: Vec<i32> = back.iter().copied().collect();
        let original: Vec<i32> = base.iter().copied().collect();
        prop_assert_eq!(round_tripped, original);
    }
}

// =============================================================================
// Indexed skip list
// =============================================================================

proptest! {
    #[test]
    fn skip_list_matches_a_btree_model(
        seed in any::<u64>(),
        ops in prop::collection::vec(arbitrary_op(), 1..200),
    ) {
        let mut list = SkipList::with_seed(LevelHint::U32, seed);
        let mut model = BTreeSet::new();

        for op in &ops {
            match op {
                Op::Insert(key) => {
                    let overwritten = list.insert([*key]);
                    prop_assert_eq!(overwritten[0].is_some(), !model.insert(*key));
                }
                Op::Delete(key) => {
                    let removed = list.delete(&[*key]);
                    prop_assert_eq!(removed[0].is_some(), model.remove(key));
                }
            }
        }

        // Rank consistency against the model, both directions.
        prop_assert_eq!(list.len(), model.len());
        for (pos, key) in model.iter().enumerate() {
            prop_assert_eq!(list.by_position(pos), Some(key));
            prop_assert_eq!(list.get_with_position(key), Some((key, pos)));
        }
        prop_assert_eq!(list.by_position(model.len()), None);
    }

    #[test]
    fn skip_list_split_partitions_cleanly(
        seed in any::<u64>(),
        keys in prop::collection::btree_set(0..512i32, 2..128),
        at in 0usize..150,
    ) {
        let keys: Vec<i32> = keys.into_iter().collect();
        let mut list = SkipList::with_seed(LevelHint::U32, seed);
        list.insert(keys.clone());
        let total = list.len();

        let (left, right) = list.split_at(at);
        match right {
            None => {
                prop_assert!(at + 1 >= total);
                prop_assert_eq!(left.len(), total);
            }
            Some(right) => {
                // Sizes partition, and since `keys` is sorted, position
                // agreement doubles as the left <= right check.
                prop_assert_eq!(left.len(), at + 1);
                prop_assert_eq!(left.len() + right.len(), total);
                for (i, key) in keys.iter().enumerate() {
                    if i <= at {
                        prop_assert_eq!(left.by_position(i), Some(key));
                        prop_assert_eq!(right.get(&[*key])[0], None);
                    } else {
                        prop_assert_eq!(right.by_position(i - at - 1), Some(key));
                        prop_assert_eq!(left.get(&[*key])[0], None);
                    }
                }
            }
        }
    }

    #[test]
    fn skip_list_iterators_agree_with_the_model(
        seed in any::<u64>(),
        keys in prop::collection::btree_set(0..512i32, 1..128),
        from in 0..512i32,
    ) {
        let sorted: Vec<i32> = keys.iter().copied().collect();
        let mut list = SkipList::with_seed(LevelHint::U32, seed);
        list.insert(sorted.clone());

        let tail: Vec<i32> = list.iter(&from).copied().collect();
        let expected: Vec<i32> = sorted.iter().copied().filter(|key| *key >= from).collect();
        prop_assert_eq!(tail, expected);

        let skip_two: Vec<i32> = list.iter_at(2).copied().collect();
        let expected: Vec<i32> = sorted.iter().copied().skip(2).collect();
        prop_assert_eq!(skip_two, expected);
    }
}
