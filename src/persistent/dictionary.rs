//! Persistent sorted dictionary with automatic representation switching.
//!
//! [`ImmutableSortedDictionary`] keeps small contents in a flat sorted array
//! and moves to an LLRB tree once an insert would take it past the configured
//! array threshold. The switch is one-way: a tree-backed dictionary stays
//! tree-backed even after removals shrink it.
//!
//! The representation only affects performance. Lookups, iteration order and
//! equality are identical whichever representation holds the entries.

use super::ReferenceCounter;
use super::array::ArrayNode;
use super::enumerator::{Direction, SortedMapEnumerator};
use super::llrb::TreeNode;
use crate::comparator::{Comparator, NaturalOrder, ReverseOrder};
use crate::config::SortedMapConfig;
use crate::error::{InvariantViolation, SortedCollectionError};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::{debug, trace};

// =============================================================================
// Representation
// =============================================================================

#[derive(Debug)]
enum Representation<K, V> {
    Array(ArrayNode<K, V>),
    Tree(TreeNode<K, V>),
}

impl<K, V> Clone for Representation<K, V> {
    fn clone(&self) -> Self {
        match self {
            Self::Array(array) => Self::Array(array.clone()),
            Self::Tree(tree) => Self::Tree(tree.clone()),
        }
    }
}

// =============================================================================
// ImmutableSortedDictionary Definition
// =============================================================================

/// A persistent (immutable) dictionary ordered by a caller-supplied
/// comparator.
///
/// Every update returns a new dictionary and leaves the receiver untouched.
/// Versions share the comparator and every part of their storage that the
/// update did not touch, so keeping old versions around is cheap.
///
/// # Representation
///
/// While the dictionary holds at most
/// [`array_threshold`](SortedMapConfig::array_threshold) entries it is backed
/// by a sorted array that is copied on every update. An insert that would
/// exceed the threshold bulk-builds a balanced LLRB tree from the array and
/// inserts into the tree instead.
///
/// # Time Complexity
///
/// | Operation        | Array    | Tree         |
/// |------------------|----------|--------------|
/// | `get`            | O(log N) | O(log N)     |
/// | `insert`         | O(N)     | O(log N)     |
/// | `remove`         | O(N)     | O(log N)     |
/// | `index_of`       | O(log N) | O(log N)     |
/// | `min`/`max`      | O(1)     | O(log N)     |
/// | `len`            | O(1)     | O(1)         |
/// | `from_entries`   | O(N log N) sort, then O(N) build |
///
/// # Examples
///
/// ```rust
/// use immutable_sorted::persistent::ImmutableSortedDictionary;
///
/// let dictionary = ImmutableSortedDictionary::new()
///     .insert(3, "three")
///     .insert(1, "one")
///     .insert(2, "two");
///
/// let keys: Vec<&i32> = dictionary.keys().collect();
/// assert_eq!(keys, vec![&1, &2, &3]);
///
/// let smaller = dictionary.remove(&2);
/// assert_eq!(smaller.len(), 2);
/// assert_eq!(dictionary.len(), 3);
/// ```
pub struct ImmutableSortedDictionary<K, V, C = NaturalOrder> {
    representation: Representation<K, V>,
    comparator: ReferenceCounter<C>,
    config: SortedMapConfig,
}

impl<K, V, C> Clone for ImmutableSortedDictionary<K, V, C> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            representation: self.representation.clone(),
            comparator: self.comparator.clone(),
            config: self.config,
        }
    }
}

impl<K, V> ImmutableSortedDictionary<K, V, NaturalOrder> {
    /// Creates an empty dictionary ordered by `K`'s [`Ord`] implementation.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<K, V, C> ImmutableSortedDictionary<K, V, C> {
    /// Creates an empty dictionary bound to `comparator`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted::comparator::ReverseOrder;
    /// use immutable_sorted::persistent::ImmutableSortedDictionary;
    ///
    /// let dictionary = ImmutableSortedDictionary::with_comparator(ReverseOrder)
    ///     .insert(1, 'a')
    ///     .insert(2, 'b');
    /// assert_eq!(dictionary.min_key(), Some(&2));
    /// ```
    #[inline]
    #[must_use]
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_config(comparator, SortedMapConfig::default())
    }

    /// Creates an empty dictionary bound to `comparator` and `config`.
    #[inline]
    #[must_use]
    pub fn with_config(comparator: C, config: SortedMapConfig) -> Self {
        Self {
            representation: Representation::Array(ArrayNode::default()),
            comparator: ReferenceCounter::new(comparator),
            config,
        }
    }

    /// Returns the number of entries.
    ///
    /// # Complexity
    ///
    /// O(1)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.representation {
            Representation::Array(array) => array.len(),
            Representation::Tree(tree) => tree.count(),
        }
    }

    /// Returns `true` if the dictionary holds no entries.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` once the dictionary has switched to the tree
    /// representation.
    #[inline]
    #[must_use]
    pub const fn is_tree_backed(&self) -> bool {
        matches!(self.representation, Representation::Tree(_))
    }

    /// The comparator every version of this dictionary is ordered by.
    #[inline]
    #[must_use]
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// The configuration carried by this dictionary.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> SortedMapConfig {
        self.config
    }

    /// Returns `true` if both dictionaries share the same storage.
    ///
    /// A removal of an absent key returns a dictionary that is `ptr_eq` to
    /// the receiver.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.representation, &other.representation) {
            (Representation::Array(left), Representation::Array(right)) => left.ptr_eq(right),
            (Representation::Tree(left), Representation::Tree(right)) => left.ptr_eq(right),
            _ => false,
        }
    }

    /// Returns a new dictionary with the same comparator and configuration
    /// holding `representation`.
    fn derive(&self, representation: Representation<K, V>) -> Self {
        Self {
            representation,
            comparator: self.comparator.clone(),
            config: self.config,
        }
    }
}

impl<K, V, C> ImmutableSortedDictionary<K, V, C>
where
    C: Comparator<K>,
{
    /// Builds a dictionary from unsorted entries.
    ///
    /// The entries are sorted once and the chosen representation is built
    /// directly from the sorted sequence. When a key occurs more than once
    /// the last occurrence wins.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted::comparator::NaturalOrder;
    /// use immutable_sorted::persistent::ImmutableSortedDictionary;
    ///
    /// let dictionary = ImmutableSortedDictionary::from_entries(
    ///     [(2, "b"), (1, "a"), (2, "B")],
    ///     NaturalOrder,
    /// );
    /// assert_eq!(dictionary.len(), 2);
    /// assert_eq!(dictionary.get(&2), Some(&"B"));
    /// ```
    #[must_use]
    pub fn from_entries<I>(entries: I, comparator: C) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        Self::from_entries_with_config(entries, comparator, SortedMapConfig::default())
    }

    /// Builds a dictionary from unsorted entries using `config`.
    #[must_use]
    pub fn from_entries_with_config<I>(entries: I, comparator: C, config: SortedMapConfig) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut sorted: Vec<(K, V)> = entries.into_iter().collect();
        sorted.sort_by(|(left, _), (right, _)| comparator.compare(left, right));

        let mut unique: Vec<(K, V)> = Vec::with_capacity(sorted.len());
        for entry in sorted {
            match unique.last_mut() {
                Some(last) if comparator.compare(&last.0, &entry.0) == Ordering::Equal => {
                    *last = entry;
                }
                _ => unique.push(entry),
            }
        }

        let len = unique.len();
        let representation = if config.fits_array(len) {
            trace!(len, threshold = config.array_threshold(), "building array representation");
            Representation::Array(ArrayNode::from_sorted(unique))
        } else {
            trace!(len, threshold = config.array_threshold(), "building tree representation");
            Representation::Tree(TreeNode::from_sorted_entries(unique))
        };

        Self {
            representation,
            comparator: ReferenceCounter::new(comparator),
            config,
        }
    }

    /// Returns the value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted::persistent::ImmutableSortedDictionary;
    ///
    /// let dictionary = ImmutableSortedDictionary::new().insert("key", 1);
    /// assert_eq!(dictionary.get(&"key"), Some(&1));
    /// assert_eq!(dictionary.get(&"other"), None);
    /// ```
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&V> {
        match &self.representation {
            Representation::Array(array) => array.get(key, &*self.comparator),
            Representation::Tree(tree) => tree.get(key, &*self.comparator),
        }
    }

    /// Returns the stored key and value for `key`.
    #[must_use]
    pub fn get_entry(&self, key: &K) -> Option<(&K, &V)> {
        match &self.representation {
            Representation::Array(array) => array.get_entry(key, &*self.comparator),
            Representation::Tree(tree) => tree.get_entry(key, &*self.comparator),
        }
    }

    /// Returns `true` if `key` is present.
    #[inline]
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns the position of `key` in ascending order, or `None` if absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted::persistent::ImmutableSortedDictionary;
    ///
    /// let dictionary: ImmutableSortedDictionary<i32, ()> =
    ///     [(10, ()), (20, ()), (30, ())].into_iter().collect();
    /// assert_eq!(dictionary.index_of(&20), Some(1));
    /// assert_eq!(dictionary.index_of(&25), None);
    /// ```
    #[must_use]
    pub fn index_of(&self, key: &K) -> Option<usize> {
        match &self.representation {
            Representation::Array(array) => array.index_of(key, &*self.comparator),
            Representation::Tree(tree) => tree.index_of(key, &*self.comparator),
        }
    }

    /// Returns the entry with the smallest key.
    #[must_use]
    pub fn min(&self) -> Option<(&K, &V)> {
        match &self.representation {
            Representation::Array(array) => array.min(),
            Representation::Tree(tree) => tree.min(),
        }
    }

    /// Returns the entry with the largest key.
    #[must_use]
    pub fn max(&self) -> Option<(&K, &V)> {
        match &self.representation {
            Representation::Array(array) => array.max(),
            Representation::Tree(tree) => tree.max(),
        }
    }

    /// Returns the smallest key.
    #[inline]
    #[must_use]
    pub fn min_key(&self) -> Option<&K> {
        self.min().map(|(key, _)| key)
    }

    /// Returns the largest key.
    #[inline]
    #[must_use]
    pub fn max_key(&self) -> Option<&K> {
        self.max().map(|(key, _)| key)
    }

    /// Returns the key immediately before `key`.
    ///
    /// Returns `None` if `key` is the smallest key or is not present.
    /// Use [`lower_key`](Self::lower_key) to query with a key that may be
    /// absent.
    #[must_use]
    pub fn predecessor_key(&self, key: &K) -> Option<&K> {
        match &self.representation {
            Representation::Array(array) => array.predecessor_key(key, &*self.comparator),
            Representation::Tree(tree) => tree.predecessor_key(key, &*self.comparator),
        }
    }

    /// Returns the greatest key strictly less than `probe`.
    ///
    /// `probe` does not need to be present.
    #[must_use]
    pub fn lower_key(&self, probe: &K) -> Option<&K> {
        match &self.representation {
            Representation::Array(array) => array.lower_key(probe, &*self.comparator),
            Representation::Tree(tree) => tree.lower_key(probe, &*self.comparator),
        }
    }

    // =========================================================================
    // Enumeration
    // =========================================================================

    fn enumerate(
        &self,
        direction: Direction,
        start: Option<&K>,
        end: Option<K>,
    ) -> SortedMapEnumerator<'_, K, V, C> {
        match &self.representation {
            Representation::Array(array) => SortedMapEnumerator::over_array(
                array,
                &*self.comparator,
                direction,
                start,
                end.as_ref(),
            ),
            Representation::Tree(tree) => {
                SortedMapEnumerator::over_tree(tree, &*self.comparator, direction, start, end)
            }
        }
    }

    /// Iterates over all entries in ascending key order.
    #[inline]
    pub fn iter(&self) -> SortedMapEnumerator<'_, K, V, C> {
        self.enumerate(Direction::Forward, None, None)
    }

    /// Iterates over all entries in descending key order.
    #[inline]
    pub fn iter_rev(&self) -> SortedMapEnumerator<'_, K, V, C> {
        self.enumerate(Direction::Reverse, None, None)
    }

    /// Iterates in ascending order over the entries whose key is at least
    /// `start`.
    #[inline]
    pub fn iter_from(&self, start: &K) -> SortedMapEnumerator<'_, K, V, C> {
        self.enumerate(Direction::Forward, Some(start), None)
    }

    /// Iterates in descending order over the entries whose key is at most
    /// `start`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted::persistent::ImmutableSortedDictionary;
    ///
    /// let dictionary: ImmutableSortedDictionary<i32, i32> =
    ///     (1..=5).map(|key| (key * 10, key)).collect();
    /// let keys: Vec<i32> = dictionary.iter_rev_from(&35).map(|(key, _)| *key).collect();
    /// assert_eq!(keys, vec![30, 20, 10]);
    /// ```
    #[inline]
    pub fn iter_rev_from(&self, start: &K) -> SortedMapEnumerator<'_, K, V, C> {
        self.enumerate(Direction::Reverse, Some(start), None)
    }

    /// Iterates over all keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Iterates over all values in ascending key order.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Iterates over the keys that are at least `start`, in ascending order.
    pub fn keys_from(&self, start: &K) -> impl Iterator<Item = &K> {
        self.iter_from(start).map(|(key, _)| key)
    }

    // =========================================================================
    // Consistency
    // =========================================================================

    /// Returns `true` if `other` can be combined with this dictionary.
    ///
    /// Dictionaries derived from the same original share one comparator and
    /// are always compatible. Otherwise the comparators must report
    /// themselves as equivalent.
    #[must_use]
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        ReferenceCounter::ptr_eq(&self.comparator, &other.comparator)
            || C::is_equivalent(&self.comparator, &other.comparator)
    }

    /// Verifies every structural invariant of the current representation.
    ///
    /// Intended for tests. A failure means the comparator is not a total
    /// order or the crate has a bug.
    ///
    /// # Errors
    ///
    /// Returns [`SortedCollectionError::Invariant`] describing the first
    /// violation found.
    pub fn check_invariants(&self) -> Result<(), SortedCollectionError> {
        match &self.representation {
            Representation::Array(array) => {
                if !self.config.fits_array(array.len()) {
                    return Err(InvariantViolation::ArrayOverThreshold {
                        len: array.len(),
                        threshold: self.config.array_threshold(),
                    }
                    .into());
                }
                array.check(&*self.comparator)?;
            }
            Representation::Tree(tree) => {
                if tree.is_red() {
                    return Err(InvariantViolation::RootNotBlack.into());
                }
                tree.check(&*self.comparator)?;
            }
        }
        Ok(())
    }
}

impl<K, V, C> ImmutableSortedDictionary<K, V, C>
where
    K: Clone,
    C: Comparator<K>,
{
    /// Iterates between two bounds in either direction.
    ///
    /// `start` is inclusive and `end` is exclusive. In reverse, enumeration
    /// begins at the greatest key not above `start` and stops once a key is
    /// at or below `end`. A missing bound leaves that side open.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted::persistent::{Direction, ImmutableSortedDictionary};
    ///
    /// let dictionary: ImmutableSortedDictionary<i32, ()> =
    ///     (1..=9).map(|key| (key, ())).collect();
    ///
    /// let forward: Vec<i32> = dictionary
    ///     .enumerator(Direction::Forward, Some(&3), Some(&6))
    ///     .map(|(key, _)| *key)
    ///     .collect();
    /// assert_eq!(forward, vec![3, 4, 5]);
    ///
    /// let reverse: Vec<i32> = dictionary
    ///     .enumerator(Direction::Reverse, Some(&6), Some(&3))
    ///     .map(|(key, _)| *key)
    ///     .collect();
    /// assert_eq!(reverse, vec![6, 5, 4]);
    /// ```
    pub fn enumerator(
        &self,
        direction: Direction,
        start: Option<&K>,
        end: Option<&K>,
    ) -> SortedMapEnumerator<'_, K, V, C> {
        self.enumerate(direction, start, end.cloned())
    }

    /// Iterates over the keys in `[start, end)` in ascending order.
    ///
    /// Empty when `start` is not below `end`.
    pub fn keys_in(&self, start: &K, end: &K) -> impl Iterator<Item = &K> {
        self.enumerator(Direction::Forward, Some(start), Some(end))
            .map(|(key, _)| key)
    }
}

impl<K, V, C> ImmutableSortedDictionary<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K>,
{
    /// Inserts a key-value pair, returning the new dictionary.
    ///
    /// An existing entry with an equal key is replaced, key included. The
    /// receiver is never modified.
    ///
    /// # Complexity
    ///
    /// O(N) while array-backed, O(log N) once tree-backed. The insert that
    /// crosses the threshold is O(N).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted::comparator::NaturalOrder;
    /// use immutable_sorted::config::SortedMapConfig;
    /// use immutable_sorted::persistent::ImmutableSortedDictionary;
    ///
    /// let config = SortedMapConfig::new().with_array_threshold(3);
    /// let small = (1..=3).fold(
    ///     ImmutableSortedDictionary::with_config(NaturalOrder, config),
    ///     |dictionary, key| dictionary.insert(key, key),
    /// );
    /// assert!(!small.is_tree_backed());
    ///
    /// let large = small.insert(4, 4);
    /// assert!(large.is_tree_backed());
    /// assert!(!small.is_tree_backed());
    /// ```
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        let comparator = &*self.comparator;
        let representation = match &self.representation {
            Representation::Array(array) => {
                if self.config.fits_array(array.len() + 1)
                    || array.get_entry(&key, comparator).is_some()
                {
                    Representation::Array(array.insert(key, value, comparator))
                } else {
                    debug!(
                        len = array.len() + 1,
                        threshold = self.config.array_threshold(),
                        "converting array representation to tree"
                    );
                    let tree = TreeNode::from_sorted_entries(array.to_vec());
                    Representation::Tree(tree.insert(key, value, comparator))
                }
            }
            Representation::Tree(tree) => Representation::Tree(tree.insert(key, value, comparator)),
        };
        self.derive(representation)
    }

    /// Removes `key`, returning the new dictionary.
    ///
    /// Removing an absent key returns a dictionary sharing the receiver's
    /// storage. A tree-backed dictionary stays tree-backed.
    #[must_use]
    pub fn remove(&self, key: &K) -> Self {
        let comparator = &*self.comparator;
        let representation = match &self.representation {
            Representation::Array(array) => Representation::Array(array.remove(key, comparator)),
            Representation::Tree(tree) => Representation::Tree(tree.remove(key, comparator)),
        };
        self.derive(representation)
    }

    /// Returns a dictionary holding the entries of both, with `other`
    /// winning on equal keys.
    ///
    /// # Errors
    ///
    /// Returns [`SortedCollectionError::IncompatibleComparator`] if the two
    /// dictionaries are not ordered by compatible comparators.
    pub fn merge(&self, other: &Self) -> Result<Self, SortedCollectionError> {
        if !self.is_compatible_with(other) {
            return Err(SortedCollectionError::IncompatibleComparator);
        }
        Ok(other.iter().fold(self.clone(), |merged, (key, value)| {
            merged.insert(key.clone(), value.clone())
        }))
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An owning iterator over the entries of an [`ImmutableSortedDictionary`].
pub struct ImmutableSortedDictionaryIntoIterator<K, V> {
    entries: std::vec::IntoIter<(K, V)>,
}

impl<K, V> Iterator for ImmutableSortedDictionaryIntoIterator<K, V> {
    type Item = (K, V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.entries.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for ImmutableSortedDictionaryIntoIterator<K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.entries.next_back()
    }
}

impl<K, V> ExactSizeIterator for ImmutableSortedDictionaryIntoIterator<K, V> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V, C: Default> Default for ImmutableSortedDictionary<K, V, C> {
    #[inline]
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K, V, C> FromIterator<(K, V)> for ImmutableSortedDictionary<K, V, C>
where
    C: Comparator<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(iter, C::default())
    }
}

impl<K, V, C> IntoIterator for ImmutableSortedDictionary<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Comparator<K>,
{
    type Item = (K, V);
    type IntoIter = ImmutableSortedDictionaryIntoIterator<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        let entries: Vec<(K, V)> = match &self.representation {
            Representation::Array(array) => array.to_vec(),
            Representation::Tree(_) => self
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        };
        ImmutableSortedDictionaryIntoIterator {
            entries: entries.into_iter(),
        }
    }
}

impl<'a, K, V, C> IntoIterator for &'a ImmutableSortedDictionary<K, V, C>
where
    C: Comparator<K>,
{
    type Item = (&'a K, &'a V);
    type IntoIter = SortedMapEnumerator<'a, K, V, C>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Two dictionaries are equal when they hold the same entries in the same
/// order. Keys are compared with the receiver's comparator.
impl<K, V, C> PartialEq for ImmutableSortedDictionary<K, V, C>
where
    V: PartialEq,
    C: Comparator<K>,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().zip(other.iter()).all(|((key, value), (other_key, other_value))| {
                self.comparator().compare(key, other_key) == Ordering::Equal && value == other_value
            })
    }
}

impl<K, V, C> Eq for ImmutableSortedDictionary<K, V, C>
where
    V: Eq,
    C: Comparator<K>,
{
}

/// Hashing is offered only for the `Ord`-backed comparators, where keys that
/// compare equal are also `==` and therefore hash alike.
impl<K, V> Hash for ImmutableSortedDictionary<K, V, NaturalOrder>
where
    K: Hash + Ord,
    V: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_entries(self, state);
    }
}

impl<K, V> Hash for ImmutableSortedDictionary<K, V, ReverseOrder>
where
    K: Hash + Ord,
    V: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_entries(self, state);
    }
}

fn hash_entries<K, V, C, H>(dictionary: &ImmutableSortedDictionary<K, V, C>, state: &mut H)
where
    K: Hash,
    V: Hash,
    C: Comparator<K>,
    H: Hasher,
{
    dictionary.len().hash(state);
    for (key, value) in dictionary {
        key.hash(state);
        value.hash(state);
    }
}

impl<K, V, C> fmt::Debug for ImmutableSortedDictionary<K, V, C>
where
    K: fmt::Debug,
    V: fmt::Debug,
    C: Comparator<K>,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C> fmt::Display for ImmutableSortedDictionary<K, V, C>
where
    K: fmt::Display,
    V: fmt::Display,
    C: Comparator<K>,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        for (position, (key, value)) in self.iter().enumerate() {
            if position > 0 {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{key}: {value}")?;
        }
        write!(formatter, "}}")
    }
}

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(ImmutableSortedDictionary<i32, String>: Send, Sync);

#[cfg(not(feature = "arc"))]
static_assertions::assert_not_impl_any!(ImmutableSortedDictionary<i32, String>: Send, Sync);

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V, C> serde::Serialize for ImmutableSortedDictionary<K, V, C>
where
    K: serde::Serialize,
    V: serde::Serialize,
    C: Comparator<K>,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct ImmutableSortedDictionaryVisitor<K, V, C> {
    key_marker: std::marker::PhantomData<K>,
    value_marker: std::marker::PhantomData<V>,
    comparator_marker: std::marker::PhantomData<C>,
}

#[cfg(feature = "serde")]
impl<K, V, C> ImmutableSortedDictionaryVisitor<K, V, C> {
    const fn new() -> Self {
        Self {
            key_marker: std::marker::PhantomData,
            value_marker: std::marker::PhantomData,
            comparator_marker: std::marker::PhantomData,
        }
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, C> serde::de::Visitor<'de> for ImmutableSortedDictionaryVisitor<K, V, C>
where
    K: serde::Deserialize<'de>,
    V: serde::Deserialize<'de>,
    C: Comparator<K> + Default,
{
    type Value = ImmutableSortedDictionary<K, V, C>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(entry) = access.next_entry()? {
            entries.push(entry);
        }
        Ok(ImmutableSortedDictionary::from_entries(entries, C::default()))
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, C> serde::Deserialize<'de> for ImmutableSortedDictionary<K, V, C>
where
    K: serde::Deserialize<'de>,
    V: serde::Deserialize<'de>,
    C: Comparator<K> + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(ImmutableSortedDictionaryVisitor::new())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::ReverseOrder;
    use rstest::rstest;

    fn small_config() -> SortedMapConfig {
        SortedMapConfig::new().with_array_threshold(3)
    }

    fn keys_of<C: Comparator<i32>>(dictionary: &ImmutableSortedDictionary<i32, i32, C>) -> Vec<i32> {
        dictionary.keys().copied().collect()
    }

    #[rstest]
    fn new_dictionary_is_empty_and_array_backed() {
        let dictionary: ImmutableSortedDictionary<i32, i32> = ImmutableSortedDictionary::new();
        assert!(dictionary.is_empty());
        assert!(!dictionary.is_tree_backed());
        assert_eq!(dictionary.min(), None);
        assert_eq!(dictionary.predecessor_key(&1), None);
        assert!(dictionary.check_invariants().is_ok());
    }

    #[rstest]
    fn fourth_insert_converts_with_threshold_three() {
        let dictionary = ImmutableSortedDictionary::with_config(NaturalOrder, small_config());
        let three = dictionary.insert(2, 20).insert(1, 10).insert(3, 30);
        assert!(!three.is_tree_backed());

        let four = three.insert(0, 0);
        assert!(four.is_tree_backed());
        assert_eq!(keys_of(&four), vec![0, 1, 2, 3]);
        assert_eq!(four.get(&2), Some(&20));
        assert!(four.check_invariants().is_ok());
    }

    #[rstest]
    fn replacing_at_threshold_stays_array_backed() {
        let three = ImmutableSortedDictionary::from_entries_with_config(
            [(1, 1), (2, 2), (3, 3)],
            NaturalOrder,
            small_config(),
        );
        let replaced = three.insert(2, 200);
        assert!(!replaced.is_tree_backed());
        assert_eq!(replaced.get(&2), Some(&200));
    }

    #[rstest]
    fn removal_never_converts_back() {
        let four = ImmutableSortedDictionary::from_entries_with_config(
            (1..=4).map(|key| (key, key)),
            NaturalOrder,
            small_config(),
        );
        assert!(four.is_tree_backed());
        let one = four.remove(&1).remove(&2).remove(&3);
        assert!(one.is_tree_backed());
        assert_eq!(keys_of(&one), vec![4]);
        assert!(one.check_invariants().is_ok());
    }

    #[rstest]
    fn zero_threshold_is_tree_backed_from_first_insert() {
        let config = SortedMapConfig::new().with_array_threshold(0);
        let dictionary = ImmutableSortedDictionary::with_config(NaturalOrder, config).insert(1, 1);
        assert!(dictionary.is_tree_backed());
        assert_eq!(dictionary.get(&1), Some(&1));
    }

    #[rstest]
    fn from_entries_keeps_last_duplicate() {
        let dictionary = ImmutableSortedDictionary::from_entries(
            [(3, 1), (1, 1), (3, 2), (2, 1), (3, 3)],
            NaturalOrder,
        );
        assert_eq!(keys_of(&dictionary), vec![1, 2, 3]);
        assert_eq!(dictionary.get(&3), Some(&3));
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(3)]
    #[case(4)]
    #[case(100)]
    fn from_entries_picks_representation_by_size(#[case] len: i32) {
        let dictionary = ImmutableSortedDictionary::from_entries_with_config(
            (0..len).rev().map(|key| (key, key)),
            NaturalOrder,
            small_config(),
        );
        assert_eq!(dictionary.is_tree_backed(), len > 3);
        assert_eq!(keys_of(&dictionary), (0..len).collect::<Vec<_>>());
        assert!(dictionary.check_invariants().is_ok());
    }

    #[rstest]
    fn remove_absent_key_shares_storage() {
        let array: ImmutableSortedDictionary<i32, i32> = (1..=3).map(|key| (key, key)).collect();
        assert!(array.remove(&10).ptr_eq(&array));

        let tree: ImmutableSortedDictionary<i32, i32> = (1..=100).map(|key| (key, key)).collect();
        assert!(tree.remove(&1000).ptr_eq(&tree));
    }

    #[rstest]
    fn reverse_comparator_orders_descending() {
        let dictionary = (1..=30).fold(
            ImmutableSortedDictionary::with_comparator(ReverseOrder),
            |dictionary, key| dictionary.insert(key, key),
        );
        assert!(dictionary.is_tree_backed());
        assert_eq!(keys_of(&dictionary), (1..=30).rev().collect::<Vec<_>>());
        assert_eq!(dictionary.min_key(), Some(&30));
        assert_eq!(dictionary.predecessor_key(&10), Some(&11));
    }

    #[rstest]
    fn merge_lets_other_win() {
        let left: ImmutableSortedDictionary<i32, &str> = [(1, "a"), (2, "b")].into_iter().collect();
        let right: ImmutableSortedDictionary<i32, &str> = [(2, "B"), (3, "C")].into_iter().collect();
        let merged = left.merge(&right);
        assert_eq!(
            merged.map(|dictionary| dictionary.into_iter().collect::<Vec<_>>()),
            Ok(vec![(1, "a"), (2, "B"), (3, "C")])
        );
    }

    #[rstest]
    fn merge_rejects_unrelated_closures() {
        let by_value = |left: &i32, right: &i32| left.cmp(right);
        let left = ImmutableSortedDictionary::with_comparator(by_value).insert(1, 1);
        let right = ImmutableSortedDictionary::with_comparator(by_value).insert(2, 2);
        assert_eq!(
            left.merge(&right).map(|merged| merged.len()),
            Err(SortedCollectionError::IncompatibleComparator)
        );
        assert_eq!(left.merge(&left.insert(3, 3)).map(|merged| merged.len()), Ok(2));
    }

    #[rstest]
    fn equality_ignores_representation() {
        let array = ImmutableSortedDictionary::from_entries((1..=5).map(|key| (key, key)), NaturalOrder);
        let tree = ImmutableSortedDictionary::from_entries_with_config(
            (1..=5).map(|key| (key, key)),
            NaturalOrder,
            SortedMapConfig::new().with_array_threshold(0),
        );
        assert!(!array.is_tree_backed());
        assert!(tree.is_tree_backed());
        assert_eq!(array, tree);
        assert_ne!(array, tree.insert(5, 50));
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[rstest]
    fn equal_dictionaries_hash_alike_across_representations() {
        let array = ImmutableSortedDictionary::from_entries((1..=5).map(|key| (key, key)), NaturalOrder);
        let tree = ImmutableSortedDictionary::from_entries_with_config(
            (1..=5).rev().map(|key| (key, key)),
            NaturalOrder,
            SortedMapConfig::new().with_array_threshold(0),
        );
        assert_eq!(hash_of(&array), hash_of(&tree));

        let descending =
            ImmutableSortedDictionary::from_entries((1..=5).map(|key| (key, key)), ReverseOrder);
        assert_eq!(hash_of(&descending), hash_of(&descending.clone()));
    }

    #[derive(Debug, Clone, Copy, Default)]
    struct CaseInsensitive;

    impl Comparator<String> for CaseInsensitive {
        fn compare(&self, left: &String, right: &String) -> Ordering {
            left.to_lowercase().cmp(&right.to_lowercase())
        }
    }

    static_assertions::assert_impl_all!(ImmutableSortedDictionary<String, i32>: Hash);
    static_assertions::assert_impl_all!(ImmutableSortedDictionary<String, i32, ReverseOrder>: Hash);
    static_assertions::assert_not_impl_any!(ImmutableSortedDictionary<String, i32, CaseInsensitive>: Hash);

    #[rstest]
    fn case_insensitive_dictionaries_compare_equal_without_hash() {
        let upper = ImmutableSortedDictionary::with_comparator(CaseInsensitive).insert("Key".to_string(), 1);
        let lower = ImmutableSortedDictionary::with_comparator(CaseInsensitive).insert("key".to_string(), 1);
        assert_eq!(upper, lower);
    }

    /// A value type without `Clone`.
    #[derive(Debug, PartialEq)]
    struct Handle(i32);

    #[rstest]
    #[case(25)]
    #[case(0)]
    fn bounded_enumeration_does_not_need_clone_values(#[case] threshold: usize) {
        let dictionary = ImmutableSortedDictionary::from_entries_with_config(
            (1..=9).map(|key| (key, Handle(key * 10))),
            NaturalOrder,
            SortedMapConfig::new().with_array_threshold(threshold),
        );

        let forward: Vec<(i32, &Handle)> = dictionary
            .enumerator(Direction::Forward, Some(&3), Some(&6))
            .map(|(key, value)| (*key, value))
            .collect();
        assert_eq!(forward, vec![(3, &Handle(30)), (4, &Handle(40)), (5, &Handle(50))]);

        let within: Vec<i32> = dictionary.keys_in(&7, &100).copied().collect();
        assert_eq!(within, vec![7, 8, 9]);
    }

    #[rstest]
    fn display_lists_entries_in_order() {
        let dictionary: ImmutableSortedDictionary<i32, &str> =
            [(2, "two"), (1, "one")].into_iter().collect();
        assert_eq!(format!("{dictionary}"), "{1: one, 2: two}");
        assert_eq!(format!("{dictionary:?}"), "{1: \"one\", 2: \"two\"}");
    }

    #[rstest]
    fn check_invariants_reports_oversized_array() {
        let dictionary = ImmutableSortedDictionary::<i32, i32> {
            representation: Representation::Array(ArrayNode::from_sorted(vec![(1, 1), (2, 2)])),
            comparator: ReferenceCounter::new(NaturalOrder),
            config: SortedMapConfig::new().with_array_threshold(1),
        };
        assert_eq!(
            dictionary.check_invariants(),
            Err(SortedCollectionError::Invariant(
                InvariantViolation::ArrayOverThreshold { len: 2, threshold: 1 }
            ))
        );
    }
}

// =============================================================================
// Serde Tests
// =============================================================================

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn deserialize_bulk_builds_tree_for_large_maps() {
        let json = format!(
            "{{{}}}",
            (0..40)
                .map(|key| format!("\"{key:02}\": {key}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let dictionary: ImmutableSortedDictionary<String, i32> =
            serde_json::from_str(&json).expect("valid json");
        assert!(dictionary.is_tree_backed());
        assert_eq!(dictionary.len(), 40);
        assert!(dictionary.check_invariants().is_ok());
    }
}
