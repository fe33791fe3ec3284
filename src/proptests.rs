use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Op {
    Set(u16, u32),
    Delete(u16),
    Get(u16),
}

fn op_strategy(key_range: u16) -> impl Strategy<Value = Op> {
    prop_oneof![
        50 => (0..key_range, any::<u32>()).prop_map(|(k, v)| Op::Set(k, v)),
        30 => (0..key_range).prop_map(Op::Delete),
        20 => (0..key_range).prop_map(Op::Get),
    ]
}

fn inorder_keys<V>(map: &OrderedMap<u16, V>) -> Vec<u16> {
    map.keys().copied().collect()
}

fn recursive_keys<V>(map: &OrderedMap<u16, V>, order: Order) -> Vec<u16> {
    let mut keys = Vec::new();
    map.traverse_recursive(order, |k, _| keys.push(*k));
    keys
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        .. ProptestConfig::default()
    })]

    /// A small key range makes sure plenty of deletes hit nodes with two
    /// children.
    #[test]
    fn prop_ordered_map_matches_btreemap(
        ops in prop::collection::vec(op_strategy(24), 50)
    ) {
        let mut map = OrderedMap::new();
        let mut oracle = BTreeMap::new();

        for op in ops {
            match op {
                Op::Set(k, v) => {
                    prop_assert_eq!(oracle.insert(k, v), map.insert(k, v));
                }
                Op::Delete(k) => {
                    let before = map.len();
                    match oracle.remove(&k) {
                        Some(v) => {
                            prop_assert_eq!(Ok((k, v)), map.delete(&k));
                            prop_assert_eq!(before - 1, map.len());
                            prop_assert!(!map.contains(&k));
                        }
                        None => {
                            let height = map.height();
                            prop_assert_eq!(Err(Error::NotFound), map.delete(&k));
                            prop_assert_eq!(before, map.len());
                            prop_assert_eq!(height, map.height());
                        }
                    }
                }
                Op::Get(k) => {
                    prop_assert_eq!(oracle.get(&k), map.search(&k));
                }
            }

            prop_assert_eq!(oracle.len(), map.len());
            map.check_invariants();
        }

        let expected: Vec<u16> = oracle.keys().copied().collect();
        prop_assert_eq!(expected, inorder_keys(&map));
        prop_assert_eq!(map.height(), map.height_recursive());
    }

    #[test]
    fn prop_in_order_is_sorted(keys in prop::collection::vec(any::<u16>(), 0..200)) {
        let map: OrderedMap<u16, ()> = keys.iter().map(|k| (*k, ())).collect();
        let got = inorder_keys(&map);

        prop_assert!(got.windows(2).all(|w| w[0] <= w[1]));

        let mut unique = keys.clone();
        unique.sort_unstable();
        unique.dedup();
        prop_assert_eq!(unique.len(), map.len());
        prop_assert_eq!(unique, got);
    }

    #[test]
    fn prop_iterative_traversals_match_recursive(
        keys in prop::collection::vec(any::<u16>(), 0..100)
    ) {
        let map: OrderedMap<u16, ()> = keys.iter().map(|k| (*k, ())).collect();

        for order in [Order::InOrder, Order::PreOrder, Order::PostOrder, Order::LevelOrder] {
            let iterative: Vec<u16> = map.traverse(order).into_iter().map(|(k, _)| *k).collect();
            prop_assert_eq!(recursive_keys(&map, order), iterative);
        }
    }

    #[test]
    fn prop_shard_table_matches_btreemap(
        ops in prop::collection::vec(op_strategy(1000), 0..400)
    ) {
        let mut table = ShardTable::new();
        let mut oracle = BTreeMap::new();

        for op in ops {
            match op {
                Op::Set(k, v) => {
                    prop_assert_eq!(oracle.insert(k, v), table.set(k, v));
                    prop_assert!(table.load_factor() <= DEFAULT_MAX_LOAD_FACTOR);
                }
                Op::Delete(k) => {
                    prop_assert_eq!(oracle.remove(&k).ok_or(Error::NotFound), table.delete(&k));
                }
                Op::Get(k) => {
                    prop_assert_eq!(oracle.get(&k).ok_or(Error::NotFound), table.get(&k));
                }
            }

            prop_assert_eq!(oracle.len(), table.len());
        }

        table.check_invariants();
        for (k, v) in oracle.iter() {
            prop_assert_eq!(Ok(v), table.get(k));
        }

        let sorted: Vec<(u16, u32)> = table.iter_sorted().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u16, u32)> = oracle.into_iter().collect();
        prop_assert_eq!(expected, sorted);
    }

    #[test]
    fn prop_resize_preserves_entries(
        keys in prop::collection::hash_set(any::<u64>(), 0..300),
        capacity in 1usize..64,
    ) {
        let mut table = ShardTable::with_capacity_and_hasher(8, BuildIdentityHasher);
        for k in keys.iter() {
            table.set(*k, k.wrapping_mul(3));
        }
        let len = table.len();

        table.resize(capacity);
        prop_assert_eq!(capacity, table.capacity());
        prop_assert_eq!(len, table.len());
        table.check_invariants();

        for k in keys.iter() {
            prop_assert_eq!(Ok(&k.wrapping_mul(3)), table.get(k));
        }
    }
}

#[test]
fn scenario_balanced_insert() {
    let mut map = OrderedMap::new();
    for k in [4, 2, 6, 1, 3, 5, 7] {
        map.insert(k, ());
    }

    let keys: Vec<i32> = map.items_in_order().into_iter().map(|(k, _)| *k).collect();
    assert_eq!(vec![1, 2, 3, 4, 5, 6, 7], keys);
    assert_eq!(2, map.height());
}

#[test]
fn scenario_seventh_insert_doubles() {
    let mut table = ShardTable::with_capacity(8);
    for k in 0..7u32 {
        table.set(k, k * 2);
        if k < 6 {
            assert_eq!(8, table.capacity(), "grew too early at {}", k);
        }
    }

    assert_eq!(16, table.capacity());
    assert_eq!(7.0 / 16.0, table.load_factor());
    for k in 0..7u32 {
        assert_eq!(Ok(&(k * 2)), table.get(&k));
    }
}

#[test]
fn scenario_delete_missing() {
    let mut map: OrderedMap<i32, ()> = [50, 30, 70, 20, 40].iter().map(|k| (*k, ())).collect();

    assert_eq!(Err(Error::NotFound), map.delete(&123));
    assert_eq!(5, map.len());
    assert_eq!(2, map.height());
}
