//! Property-based tests for ImmutableSortedDictionary.
//!
//! These tests check ordering, persistence, representation independence and
//! the LLRB invariants over random operation sequences.

use immutable_sorted::comparator::NaturalOrder;
use immutable_sorted::config::SortedMapConfig;
use immutable_sorted::persistent::{Direction, ImmutableSortedDictionary};
use proptest::prelude::*;
use std::collections::BTreeMap;

type Dictionary = ImmutableSortedDictionary<i32, i32>;

// =============================================================================
// Strategies for Generating Test Data
// =============================================================================

#[derive(Debug, Clone)]
enum Operation {
    Insert(i32, i32),
    Remove(i32),
}

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        3 => (-200..200i32, any::<i32>()).prop_map(|(key, value)| Operation::Insert(key, value)),
        1 => (-200..200i32).prop_map(Operation::Remove),
    ]
}

fn operations(max_len: usize) -> impl Strategy<Value = Vec<Operation>> {
    prop::collection::vec(operation(), 0..max_len)
}

fn apply(dictionary: &Dictionary, operation: &Operation) -> Dictionary {
    match operation {
        Operation::Insert(key, value) => dictionary.insert(*key, *value),
        Operation::Remove(key) => dictionary.remove(key),
    }
}

fn empty_with_threshold(threshold: usize) -> Dictionary {
    ImmutableSortedDictionary::with_config(
        NaturalOrder,
        SortedMapConfig::new().with_array_threshold(threshold),
    )
}

fn entries_of(dictionary: &Dictionary) -> Vec<(i32, i32)> {
    dictionary.iter().map(|(key, value)| (*key, *value)).collect()
}

// =============================================================================
// Order and Model Laws
// =============================================================================

proptest! {
    /// Law: iteration is strictly increasing after any operation sequence.
    #[test]
    fn prop_iteration_is_strictly_increasing(
        operations in operations(200),
        threshold in 0usize..40
    ) {
        let dictionary = operations
            .iter()
            .fold(empty_with_threshold(threshold), |dictionary, operation| apply(&dictionary, operation));
        let keys: Vec<i32> = dictionary.keys().copied().collect();
        prop_assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
    }

    /// Law: the dictionary agrees with BTreeMap on every operation sequence.
    #[test]
    fn prop_agrees_with_btreemap(
        operations in operations(200),
        threshold in 0usize..40
    ) {
        let mut model = BTreeMap::new();
        let mut dictionary = empty_with_threshold(threshold);
        for operation in &operations {
            dictionary = apply(&dictionary, operation);
            match operation {
                Operation::Insert(key, value) => { model.insert(*key, *value); }
                Operation::Remove(key) => { model.remove(key); }
            }
            prop_assert_eq!(dictionary.len(), model.len());
        }
        let expected: Vec<(i32, i32)> = model.into_iter().collect();
        prop_assert_eq!(entries_of(&dictionary), expected);
    }

    /// Law: structural invariants hold after every single operation.
    #[test]
    fn prop_invariants_hold_after_every_operation(
        operations in operations(150),
        threshold in 0usize..10
    ) {
        let mut dictionary = empty_with_threshold(threshold);
        for operation in &operations {
            dictionary = apply(&dictionary, operation);
            prop_assert_eq!(dictionary.check_invariants(), Ok(()));
        }
    }
}

// =============================================================================
// Persistence Laws
// =============================================================================

proptest! {
    /// Law: an update never changes what the previous version returns.
    #[test]
    fn prop_previous_version_is_unaffected(
        setup in operations(100),
        update in operation(),
        threshold in 0usize..30
    ) {
        let before = setup
            .iter()
            .fold(empty_with_threshold(threshold), |dictionary, operation| apply(&dictionary, operation));
        let snapshot = entries_of(&before);

        let after = apply(&before, &update);

        prop_assert_eq!(entries_of(&before), snapshot);
        prop_assert_eq!(before.check_invariants(), Ok(()));
        prop_assert_eq!(after.check_invariants(), Ok(()));
    }

    /// Law: removing a freshly inserted key restores the original content.
    /// remove(insert(c, k, v), k) == c when k is absent from c
    #[test]
    fn prop_insert_then_remove_round_trips(
        setup in operations(100),
        key in -300..300i32,
        value: i32,
        threshold in 0usize..30
    ) {
        let dictionary = setup
            .iter()
            .fold(empty_with_threshold(threshold), |dictionary, operation| apply(&dictionary, operation));
        prop_assume!(!dictionary.contains_key(&key));

        let restored = dictionary.insert(key, value).remove(&key);
        prop_assert_eq!(&restored, &dictionary);
    }
}

// =============================================================================
// Cross-Representation Laws
// =============================================================================

proptest! {
    /// Law: array-backed and tree-backed dictionaries with the same content
    /// are indistinguishable.
    #[test]
    fn prop_representations_are_equivalent(
        operations in operations(60),
        probes in prop::collection::vec(-250..250i32, 0..20)
    ) {
        let array = operations
            .iter()
            .fold(empty_with_threshold(usize::MAX), |dictionary, operation| apply(&dictionary, operation));
        let tree = operations
            .iter()
            .fold(empty_with_threshold(0), |dictionary, operation| apply(&dictionary, operation));

        prop_assert!(!array.is_tree_backed());
        prop_assert!(tree.is_empty() || tree.is_tree_backed());
        prop_assert_eq!(entries_of(&array), entries_of(&tree));
        prop_assert_eq!(&array, &tree);

        for probe in &probes {
            prop_assert_eq!(array.get(probe), tree.get(probe));
            prop_assert_eq!(array.index_of(probe), tree.index_of(probe));
            prop_assert_eq!(array.predecessor_key(probe), tree.predecessor_key(probe));
            prop_assert_eq!(array.lower_key(probe), tree.lower_key(probe));
        }
    }

    /// Law: bulk construction matches sequential insertion.
    #[test]
    fn prop_bulk_build_matches_sequential_inserts(
        entries in prop::collection::vec((-500..500i32, any::<i32>()), 0..300)
    ) {
        let bulk: Dictionary = entries.iter().copied().collect();
        let sequential = entries
            .iter()
            .fold(Dictionary::new(), |dictionary, (key, value)| dictionary.insert(*key, *value));

        prop_assert_eq!(bulk.check_invariants(), Ok(()));
        prop_assert_eq!(entries_of(&bulk), entries_of(&sequential));
    }
}

// =============================================================================
// Enumerator Laws
// =============================================================================

proptest! {
    /// Law: a forward enumerator from `start` to `end` yields exactly the
    /// keys in `[start, end)`.
    #[test]
    fn prop_forward_enumerator_yields_half_open_range(
        keys in prop::collection::btree_set(-100..100i32, 0..80),
        start in -110..110i32,
        end in -110..110i32,
        threshold in prop_oneof![Just(0usize), Just(usize::MAX)]
    ) {
        let dictionary = ImmutableSortedDictionary::from_entries_with_config(
            keys.iter().map(|key| (*key, *key)),
            NaturalOrder,
            SortedMapConfig::new().with_array_threshold(threshold),
        );
        let enumerated: Vec<i32> = dictionary
            .enumerator(Direction::Forward, Some(&start), Some(&end))
            .map(|(key, _)| *key)
            .collect();
        let expected: Vec<i32> = keys.iter().copied().filter(|key| start <= *key && *key < end).collect();
        prop_assert_eq!(enumerated, expected);
    }

    /// Law: a reverse enumerator from `start` to `end` yields exactly the
    /// keys in `(end, start]`, descending.
    #[test]
    fn prop_reverse_enumerator_yields_half_open_range(
        keys in prop::collection::btree_set(-100..100i32, 0..80),
        start in -110..110i32,
        end in -110..110i32,
        threshold in prop_oneof![Just(0usize), Just(usize::MAX)]
    ) {
        let dictionary = ImmutableSortedDictionary::from_entries_with_config(
            keys.iter().map(|key| (*key, *key)),
            NaturalOrder,
            SortedMapConfig::new().with_array_threshold(threshold),
        );
        let enumerated: Vec<i32> = dictionary
            .enumerator(Direction::Reverse, Some(&start), Some(&end))
            .map(|(key, _)| *key)
            .collect();
        let expected: Vec<i32> = keys
            .iter()
            .rev()
            .copied()
            .filter(|key| end < *key && *key <= start)
            .collect();
        prop_assert_eq!(enumerated, expected);
    }

    /// Law: `index_of` agrees with the position in ascending iteration.
    #[test]
    fn prop_index_of_matches_position(
        keys in prop::collection::btree_set(-1000..1000i32, 0..200)
    ) {
        let dictionary: Dictionary = keys.iter().map(|key| (*key, 0)).collect();
        for (position, key) in keys.iter().enumerate() {
            prop_assert_eq!(dictionary.index_of(key), Some(position));
        }
    }
}
