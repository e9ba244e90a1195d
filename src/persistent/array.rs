//! Copy-on-write sorted array of entries.
//!
//! [`ArrayNode`] is the representation used by small dictionaries. Every
//! update allocates a new backing vector of length N ± 1 and leaves the old
//! one untouched, so versions can be shared freely. Lookups use binary search
//! under the collection's comparator.
//!
//! | Operation  | Complexity |
//! |------------|------------|
//! | `get`      | O(log N)   |
//! | `insert`   | O(N)       |
//! | `remove`   | O(N)       |
//! | `index_of` | O(log N)   |
//! | `len`      | O(1)       |
//!
//! The linear copy is cheaper than allocating tree nodes while N is small.

use super::ReferenceCounter;
use crate::comparator::Comparator;
use crate::error::InvariantViolation;
use std::cmp::Ordering;

/// An immutable, strictly increasing sequence of entries.
#[derive(Debug)]
pub struct ArrayNode<K, V> {
    entries: ReferenceCounter<Vec<(K, V)>>,
}

impl<K, V> Clone for ArrayNode<K, V> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<K, V> Default for ArrayNode<K, V> {
    #[inline]
    fn default() -> Self {
        Self::from_sorted(Vec::new())
    }
}

impl<K, V> ArrayNode<K, V> {
    /// Wraps entries that are already strictly increasing.
    #[inline]
    pub(crate) fn from_sorted(entries: Vec<(K, V)>) -> Self {
        Self {
            entries: ReferenceCounter::new(entries),
        }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries in ascending key order.
    #[inline]
    pub fn as_slice(&self) -> &[(K, V)] {
        &self.entries
    }

    /// Returns `true` if both arrays share the same backing allocation.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&self.entries, &other.entries)
    }

    fn search<C>(&self, key: &K, comparator: &C) -> Result<usize, usize>
    where
        C: Comparator<K> + ?Sized,
    {
        self.entries
            .binary_search_by(|(candidate, _)| comparator.compare(candidate, key))
    }

    /// Index of the first entry whose key is not less than `key`.
    pub(crate) fn lower_bound<C>(&self, key: &K, comparator: &C) -> usize
    where
        C: Comparator<K> + ?Sized,
    {
        self.entries
            .partition_point(|(candidate, _)| comparator.compare(candidate, key) == Ordering::Less)
    }

    /// Index of the first entry whose key is greater than `key`.
    pub(crate) fn upper_bound<C>(&self, key: &K, comparator: &C) -> usize
    where
        C: Comparator<K> + ?Sized,
    {
        self.entries.partition_point(|(candidate, _)| {
            comparator.compare(candidate, key) != Ordering::Greater
        })
    }

    /// Returns the stored entry whose key compares equal to `key`.
    pub fn get_entry<C>(&self, key: &K, comparator: &C) -> Option<(&K, &V)>
    where
        C: Comparator<K> + ?Sized,
    {
        self.search(key, comparator)
            .ok()
            .map(|position| {
                let (key, value) = &self.entries[position];
                (key, value)
            })
    }

    /// Returns the value stored under `key`.
    pub fn get<C>(&self, key: &K, comparator: &C) -> Option<&V>
    where
        C: Comparator<K> + ?Sized,
    {
        self.get_entry(key, comparator).map(|(_, value)| value)
    }

    /// Returns the position of `key` in ascending order.
    pub fn index_of<C>(&self, key: &K, comparator: &C) -> Option<usize>
    where
        C: Comparator<K> + ?Sized,
    {
        self.search(key, comparator).ok()
    }

    /// Returns the first entry.
    pub fn min(&self) -> Option<(&K, &V)> {
        self.entries.first().map(|(key, value)| (key, value))
    }

    /// Returns the last entry.
    pub fn max(&self) -> Option<(&K, &V)> {
        self.entries.last().map(|(key, value)| (key, value))
    }

    /// Returns the greatest key strictly less than `probe`.
    pub fn lower_key<C>(&self, probe: &K, comparator: &C) -> Option<&K>
    where
        C: Comparator<K> + ?Sized,
    {
        let position = self.lower_bound(probe, comparator);
        position
            .checked_sub(1)
            .map(|index| &self.entries[index].0)
    }

    /// Returns the key immediately before `key`, which must be present.
    pub fn predecessor_key<C>(&self, key: &K, comparator: &C) -> Option<&K>
    where
        C: Comparator<K> + ?Sized,
    {
        let position = self.search(key, comparator).ok()?;
        position
            .checked_sub(1)
            .map(|index| &self.entries[index].0)
    }

    /// Verifies that keys are strictly increasing.
    ///
    /// # Errors
    ///
    /// Returns [`InvariantViolation::OutOfOrder`] on the first pair of
    /// adjacent entries that are not strictly increasing.
    pub fn check<C>(&self, comparator: &C) -> Result<(), InvariantViolation>
    where
        C: Comparator<K> + ?Sized,
    {
        if self
            .entries
            .windows(2)
            .all(|pair| comparator.compare(&pair[0].0, &pair[1].0) == Ordering::Less)
        {
            Ok(())
        } else {
            Err(InvariantViolation::OutOfOrder)
        }
    }
}

impl<K: Clone, V: Clone> ArrayNode<K, V> {
    /// Inserts or replaces an entry, returning the new array.
    ///
    /// The receiver is never modified.
    #[must_use]
    pub fn insert<C>(&self, key: K, value: V, comparator: &C) -> Self
    where
        C: Comparator<K> + ?Sized,
    {
        match self.search(&key, comparator) {
            Ok(position) => {
                let mut entries = self.entries.as_ref().clone();
                entries[position] = (key, value);
                Self::from_sorted(entries)
            }
            Err(position) => {
                let mut entries = Vec::with_capacity(self.entries.len() + 1);
                entries.extend_from_slice(&self.entries[..position]);
                entries.push((key, value));
                entries.extend_from_slice(&self.entries[position..]);
                Self::from_sorted(entries)
            }
        }
    }

    /// Removes `key`, returning the new array.
    ///
    /// Removing a key that is not present shares the receiver's storage.
    #[must_use]
    pub fn remove<C>(&self, key: &K, comparator: &C) -> Self
    where
        C: Comparator<K> + ?Sized,
    {
        self.search(key, comparator).map_or_else(
            |_| self.clone(),
            |position| {
                let mut entries = Vec::with_capacity(self.entries.len() - 1);
                entries.extend_from_slice(&self.entries[..position]);
                entries.extend_from_slice(&self.entries[position + 1..]);
                Self::from_sorted(entries)
            },
        )
    }

    /// Copies the entries out for bulk tree construction.
    pub(crate) fn to_vec(&self) -> Vec<(K, V)> {
        self.entries.as_ref().clone()
    }
}
