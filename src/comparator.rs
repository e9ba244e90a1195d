//! Total-order comparators for sorted collections.
//!
//! Every [`ImmutableSortedDictionary`](crate::persistent::ImmutableSortedDictionary)
//! and [`ImmutableSortedSet`](crate::persistent::ImmutableSortedSet) is bound to
//! one comparator for its whole lifetime. All versions derived from a
//! collection share the same comparator instance.
//!
//! # Contract
//!
//! A comparator must be a total order over the keys it is used with, and it
//! must answer the same way for the same pair of keys on every call. A
//! comparator that violates this (for example one that orders `f64::NAN`
//! inconsistently, or one whose answer depends on mutable state) leaves the
//! collection in an unspecified, but memory-safe, state. This is a
//! precondition on the caller and is not detected at runtime.
//!
//! # Examples
//!
//! ```rust
//! use immutable_sorted::comparator::{Comparator, NaturalOrder, ReverseOrder};
//! use std::cmp::Ordering;
//!
//! assert_eq!(NaturalOrder.compare(&1, &2), Ordering::Less);
//! assert_eq!(ReverseOrder.compare(&1, &2), Ordering::Greater);
//!
//! // Any `Fn(&K, &K) -> Ordering` is a comparator.
//! let by_length = |left: &String, right: &String| left.len().cmp(&right.len());
//! assert_eq!(
//!     by_length.compare(&"aa".to_string(), &"b".to_string()),
//!     Ordering::Greater
//! );
//! ```

use std::cmp::Ordering;

/// A total order over keys of type `K`.
pub trait Comparator<K> {
    /// Compares two keys.
    fn compare(&self, left: &K, right: &K) -> Ordering;

    /// Returns `true` if `other` is known to order every pair of keys the same
    /// way as `self`.
    ///
    /// The default answer is `false`: two separately constructed closures are
    /// never assumed to agree. Collections that share one comparator
    /// allocation are always compatible regardless of this method.
    fn is_equivalent(&self, _other: &Self) -> bool {
        false
    }
}

/// Orders keys by their [`Ord`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NaturalOrder;

impl<K: Ord> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        left.cmp(right)
    }

    #[inline]
    fn is_equivalent(&self, _other: &Self) -> bool {
        true
    }
}

/// Orders keys by the reverse of their [`Ord`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ReverseOrder;

impl<K: Ord> Comparator<K> for ReverseOrder {
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        right.cmp(left)
    }

    #[inline]
    fn is_equivalent(&self, _other: &Self) -> bool {
        true
    }
}

impl<K, F> Comparator<K> for F
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, left: &K, right: &K) -> Ordering {
        self(left, right)
    }
}
