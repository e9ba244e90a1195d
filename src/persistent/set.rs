//! Persistent sorted set.
//!
//! [`ImmutableSortedSet`] stores its elements as the keys of an
//! [`ImmutableSortedDictionary`] with `()` values, so it inherits the
//! dictionary's ordering, representation switching and structural sharing.

use super::dictionary::{ImmutableSortedDictionary, ImmutableSortedDictionaryIntoIterator};
use super::enumerator::{Direction, SortedMapEnumerator};
use crate::comparator::{Comparator, NaturalOrder};
use crate::config::SortedMapConfig;
use crate::error::SortedCollectionError;
use std::fmt;
use std::iter::FusedIterator;

/// A persistent (immutable) set ordered by a caller-supplied comparator.
///
/// # Examples
///
/// ```rust
/// use immutable_sorted::persistent::ImmutableSortedSet;
///
/// let set = ImmutableSortedSet::new().insert(3).insert(1).insert(2);
/// assert!(set.contains(&2));
/// assert_eq!(set.first(), Some(&1));
/// assert_eq!(set.predecessor_key(&3), Some(&2));
///
/// let without_two = set.remove(&2);
/// assert_eq!(without_two.iter().copied().collect::<Vec<_>>(), vec![1, 3]);
/// assert_eq!(set.len(), 3);
/// ```
pub struct ImmutableSortedSet<T, C = NaturalOrder> {
    dictionary: ImmutableSortedDictionary<T, (), C>,
}

impl<T, C> Clone for ImmutableSortedSet<T, C> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            dictionary: self.dictionary.clone(),
        }
    }
}

impl<T> ImmutableSortedSet<T, NaturalOrder> {
    /// Creates an empty set ordered by `T`'s [`Ord`] implementation.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<T, C> ImmutableSortedSet<T, C> {
    /// Creates an empty set bound to `comparator`.
    #[inline]
    #[must_use]
    pub fn with_comparator(comparator: C) -> Self {
        Self {
            dictionary: ImmutableSortedDictionary::with_comparator(comparator),
        }
    }

    /// Creates an empty set bound to `comparator` and `config`.
    #[inline]
    #[must_use]
    pub fn with_config(comparator: C, config: SortedMapConfig) -> Self {
        Self {
            dictionary: ImmutableSortedDictionary::with_config(comparator, config),
        }
    }

    /// Number of elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.dictionary.len()
    }

    /// Returns `true` if the set has no elements.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dictionary.is_empty()
    }

    /// Returns `true` once the underlying dictionary is tree-backed.
    #[inline]
    #[must_use]
    pub const fn is_tree_backed(&self) -> bool {
        self.dictionary.is_tree_backed()
    }

    /// The comparator shared by every version of this set.
    #[inline]
    #[must_use]
    pub fn comparator(&self) -> &C {
        self.dictionary.comparator()
    }

    /// Returns `true` if both sets share the same storage.
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.dictionary.ptr_eq(&other.dictionary)
    }
}

impl<T, C> ImmutableSortedSet<T, C>
where
    C: Comparator<T>,
{
    /// Builds a set from unsorted elements. Duplicates collapse to one.
    #[must_use]
    pub fn from_elements<I>(elements: I, comparator: C) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self::from_elements_with_config(elements, comparator, SortedMapConfig::default())
    }

    /// Builds a set from unsorted elements using `config`.
    #[must_use]
    pub fn from_elements_with_config<I>(elements: I, comparator: C, config: SortedMapConfig) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self {
            dictionary: ImmutableSortedDictionary::from_entries_with_config(
                elements.into_iter().map(|element| (element, ())),
                comparator,
                config,
            ),
        }
    }

    /// Returns `true` if `element` is in the set.
    #[inline]
    #[must_use]
    pub fn contains(&self, element: &T) -> bool {
        self.dictionary.contains_key(element)
    }

    /// The smallest element.
    #[inline]
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.dictionary.min_key()
    }

    /// The largest element.
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.dictionary.max_key()
    }

    /// Returns the element immediately before `element`, which must be in
    /// the set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted::persistent::ImmutableSortedSet;
    ///
    /// let set: ImmutableSortedSet<i32> = [1, 3, 5].into_iter().collect();
    /// assert_eq!(set.predecessor_key(&5), Some(&3));
    /// assert_eq!(set.predecessor_key(&1), None);
    /// assert_eq!(set.predecessor_key(&4), None);
    /// assert_eq!(set.lower_key(&4), Some(&3));
    /// ```
    #[inline]
    #[must_use]
    pub fn predecessor_key(&self, element: &T) -> Option<&T> {
        self.dictionary.predecessor_key(element)
    }

    /// The greatest element strictly less than `probe`.
    #[inline]
    #[must_use]
    pub fn lower_key(&self, probe: &T) -> Option<&T> {
        self.dictionary.lower_key(probe)
    }

    /// Position of `element` in ascending order.
    #[inline]
    #[must_use]
    pub fn index_of(&self, element: &T) -> Option<usize> {
        self.dictionary.index_of(element)
    }

    /// Iterates in ascending order.
    #[inline]
    pub fn iter(&self) -> ImmutableSortedSetIterator<'_, T, C> {
        ImmutableSortedSetIterator {
            inner: self.dictionary.iter(),
        }
    }

    /// Iterates in descending order.
    #[inline]
    pub fn iter_rev(&self) -> ImmutableSortedSetIterator<'_, T, C> {
        ImmutableSortedSetIterator {
            inner: self.dictionary.iter_rev(),
        }
    }

    /// Iterates in ascending order starting at the first element not below
    /// `start`.
    #[inline]
    pub fn iter_from(&self, start: &T) -> ImmutableSortedSetIterator<'_, T, C> {
        ImmutableSortedSetIterator {
            inner: self.dictionary.iter_from(start),
        }
    }

    /// Iterates in descending order starting at the last element not above
    /// `start`.
    #[inline]
    pub fn iter_rev_from(&self, start: &T) -> ImmutableSortedSetIterator<'_, T, C> {
        ImmutableSortedSetIterator {
            inner: self.dictionary.iter_rev_from(start),
        }
    }

    /// Returns `true` if `other` can be combined with this set.
    #[inline]
    #[must_use]
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.dictionary.is_compatible_with(&other.dictionary)
    }

    /// Verifies the structural invariants of the underlying dictionary.
    ///
    /// # Errors
    ///
    /// Returns the first violation found.
    pub fn check_invariants(&self) -> Result<(), SortedCollectionError> {
        self.dictionary.check_invariants()
    }
}

impl<T, C> ImmutableSortedSet<T, C>
where
    T: Clone,
    C: Comparator<T>,
{
    /// Adds `element`, returning the new set.
    #[inline]
    #[must_use]
    pub fn insert(&self, element: T) -> Self {
        Self {
            dictionary: self.dictionary.insert(element, ()),
        }
    }

    /// Removes `element`, returning the new set.
    #[inline]
    #[must_use]
    pub fn remove(&self, element: &T) -> Self {
        Self {
            dictionary: self.dictionary.remove(element),
        }
    }

    /// Iterates in either direction between an inclusive `start` and an
    /// exclusive `end`.
    pub fn enumerator(
        &self,
        direction: Direction,
        start: Option<&T>,
        end: Option<&T>,
    ) -> ImmutableSortedSetIterator<'_, T, C> {
        ImmutableSortedSetIterator {
            inner: self.dictionary.enumerator(direction, start, end),
        }
    }

    /// Iterates over the elements in `[start, end)` in ascending order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted::persistent::ImmutableSortedSet;
    ///
    /// let set: ImmutableSortedSet<i32> = (1..=10).collect();
    /// let range: Vec<i32> = set.range(&3, &7).copied().collect();
    /// assert_eq!(range, vec![3, 4, 5, 6]);
    /// ```
    #[inline]
    pub fn range(&self, start: &T, end: &T) -> ImmutableSortedSetIterator<'_, T, C> {
        self.enumerator(Direction::Forward, Some(start), Some(end))
    }

    /// Elements in either set.
    ///
    /// # Errors
    ///
    /// Returns [`SortedCollectionError::IncompatibleComparator`] if the sets
    /// are ordered by incompatible comparators.
    pub fn union(&self, other: &Self) -> Result<Self, SortedCollectionError> {
        let (larger, smaller) = if self.len() >= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        larger
            .dictionary
            .merge(&smaller.dictionary)
            .map(|dictionary| Self { dictionary })
    }

    /// Elements in both sets.
    ///
    /// # Errors
    ///
    /// Returns [`SortedCollectionError::IncompatibleComparator`] if the sets
    /// are ordered by incompatible comparators.
    pub fn intersection(&self, other: &Self) -> Result<Self, SortedCollectionError> {
        if !self.is_compatible_with(other) {
            return Err(SortedCollectionError::IncompatibleComparator);
        }
        Ok(self
            .iter()
            .filter(|element| !other.contains(element))
            .fold(self.clone(), |kept, element| kept.remove(element)))
    }

    /// Elements of `self` that are not in `other`.
    ///
    /// # Errors
    ///
    /// Returns [`SortedCollectionError::IncompatibleComparator`] if the sets
    /// are ordered by incompatible comparators.
    pub fn difference(&self, other: &Self) -> Result<Self, SortedCollectionError> {
        if !self.is_compatible_with(other) {
            return Err(SortedCollectionError::IncompatibleComparator);
        }
        Ok(other
            .iter()
            .fold(self.clone(), |remaining, element| remaining.remove(element)))
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over the elements of an [`ImmutableSortedSet`].
pub struct ImmutableSortedSetIterator<'a, T, C> {
    inner: SortedMapEnumerator<'a, T, (), C>,
}

impl<'a, T, C> Iterator for ImmutableSortedSetIterator<'a, T, C>
where
    C: Comparator<T>,
{
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(element, ())| element)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T, C> FusedIterator for ImmutableSortedSetIterator<'_, T, C> where C: Comparator<T> {}

/// An owning iterator over the elements of an [`ImmutableSortedSet`].
pub struct ImmutableSortedSetIntoIterator<T> {
    inner: ImmutableSortedDictionaryIntoIterator<T, ()>,
}

impl<T> Iterator for ImmutableSortedSetIntoIterator<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(element, ())| element)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for ImmutableSortedSetIntoIterator<T> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T, C: Default> Default for ImmutableSortedSet<T, C> {
    #[inline]
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<T, C> FromIterator<T> for ImmutableSortedSet<T, C>
where
    C: Comparator<T> + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from_elements(iter, C::default())
    }
}

impl<T, C> IntoIterator for ImmutableSortedSet<T, C>
where
    T: Clone,
    C: Comparator<T>,
{
    type Item = T;
    type IntoIter = ImmutableSortedSetIntoIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        ImmutableSortedSetIntoIterator {
            inner: self.dictionary.into_iter(),
        }
    }
}

impl<'a, T, C> IntoIterator for &'a ImmutableSortedSet<T, C>
where
    C: Comparator<T>,
{
    type Item = &'a T;
    type IntoIter = ImmutableSortedSetIterator<'a, T, C>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, C> PartialEq for ImmutableSortedSet<T, C>
where
    C: Comparator<T>,
{
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.dictionary == other.dictionary
    }
}

impl<T, C> Eq for ImmutableSortedSet<T, C> where C: Comparator<T> {}

impl<T, C> fmt::Debug for ImmutableSortedSet<T, C>
where
    T: fmt::Debug,
    C: Comparator<T>,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<T, C> serde::Serialize for ImmutableSortedSet<T, C>
where
    T: serde::Serialize,
    C: Comparator<T>,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, T, C> serde::Deserialize<'de> for ImmutableSortedSet<T, C>
where
    T: serde::Deserialize<'de>,
    C: Comparator<T> + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let elements: Vec<T> = serde::Deserialize::deserialize(deserializer)?;
        Ok(Self::from_elements(elements, C::default()))
    }
}

// =============================================================================
// Tests
// =============================================================================
