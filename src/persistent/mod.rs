//! Persistent (immutable) sorted collections.
//!
//! - [`ImmutableSortedDictionary`]: ordered key-value dictionary that switches
//!   from a sorted array to an LLRB tree as it grows
//! - [`ImmutableSortedSet`]: ordered set over the dictionary
//! - [`SortedMapEnumerator`]: bounded forward or reverse enumeration
//! - [`TreeNode`] and [`ArrayNode`]: the two node representations
//!
//! # Structural Sharing
//!
//! Updates never modify existing nodes. An array update copies one flat
//! vector; a tree update rebuilds only the path from the root to the changed
//! entry and shares every other subtree with the previous version.
//!
//! # Examples
//!
//! ```rust
//! use immutable_sorted::persistent::ImmutableSortedDictionary;
//!
//! let version_one: ImmutableSortedDictionary<i32, &str> =
//!     [(5, "five"), (3, "three"), (8, "eight")].into_iter().collect();
//! let version_two = version_one.insert(1, "one").remove(&8);
//!
//! assert_eq!(version_one.keys().copied().collect::<Vec<_>>(), vec![3, 5, 8]);
//! assert_eq!(version_two.keys().copied().collect::<Vec<_>>(), vec![1, 3, 5]);
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`, and
/// collection versions may be sent to and shared between threads.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

mod array;
mod dictionary;
mod enumerator;
mod llrb;
mod set;

pub use array::ArrayNode;
pub use dictionary::ImmutableSortedDictionary;
pub use dictionary::ImmutableSortedDictionaryIntoIterator;
pub use enumerator::Direction;
pub use enumerator::SortedMapEnumerator;
pub use llrb::Color;
pub use llrb::Node;
pub use llrb::TreeNode;
pub use set::ImmutableSortedSet;
pub use set::ImmutableSortedSetIntoIterator;
pub use set::ImmutableSortedSetIterator;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod reference_counter_tests {
    use super::{ReferenceCounter, TreeNode};
    use crate::comparator::NaturalOrder;
    use rstest::rstest;

    fn left_subtree(tree: &TreeNode<i32, i32>) -> &ReferenceCounter<super::Node<i32, i32>> {
        match tree.node().map(super::Node::left) {
            Some(TreeNode::Red(node) | TreeNode::Black(node)) => node,
            _ => panic!("tree has no left subtree"),
        }
    }

    #[rstest]
    fn untouched_subtree_is_shared_until_version_dropped() {
        let tree = TreeNode::from_sorted_entries((1..=7).map(|key| (key, key)).collect());
        let shared = left_subtree(&tree);
        assert_eq!(ReferenceCounter::strong_count(shared), 1);

        let extended = tree.insert(8, 8, &NaturalOrder);
        assert_eq!(ReferenceCounter::strong_count(shared), 2);
        assert!(ReferenceCounter::ptr_eq(shared, left_subtree(&extended)));

        drop(extended);
        assert_eq!(ReferenceCounter::strong_count(shared), 1);
    }
}
