//! Configuration for sorted collections.
//!
//! The only tunable is the size at which a dictionary stops using a flat
//! sorted array and switches to an LLRB tree. The value only affects
//! performance: every observable result is identical for any threshold.

/// Default number of entries an array-backed dictionary may hold.
///
/// Large enough for most small documents or child lists to stay in one
/// contiguous allocation, small enough that the linear copy on every update
/// stays cheaper than allocating tree nodes.
pub const DEFAULT_ARRAY_THRESHOLD: usize = 25;

/// Per-collection configuration.
///
/// The configuration is fixed when a collection is created and is carried by
/// every version derived from it.
///
/// # Examples
///
/// ```rust
/// use immutable_sorted::config::{SortedMapConfig, DEFAULT_ARRAY_THRESHOLD};
///
/// let config = SortedMapConfig::new();
/// assert_eq!(config.array_threshold(), DEFAULT_ARRAY_THRESHOLD);
///
/// let small = config.with_array_threshold(3);
/// assert_eq!(small.array_threshold(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SortedMapConfig {
    array_threshold: usize,
}

impl SortedMapConfig {
    /// Creates the default configuration.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            array_threshold: DEFAULT_ARRAY_THRESHOLD,
        }
    }

    /// Returns a copy with the given array threshold.
    ///
    /// A dictionary stays array-backed while it holds at most `threshold`
    /// entries. A threshold of `0` makes every non-empty dictionary
    /// tree-backed.
    #[inline]
    #[must_use]
    pub const fn with_array_threshold(self, threshold: usize) -> Self {
        Self {
            array_threshold: threshold,
        }
    }

    /// Maximum number of entries held by the array representation.
    #[inline]
    #[must_use]
    pub const fn array_threshold(&self) -> usize {
        self.array_threshold
    }

    /// Whether `len` entries fit in the array representation.
    #[inline]
    pub(crate) const fn fits_array(&self, len: usize) -> bool {
        len <= self.array_threshold
    }
}

impl Default for SortedMapConfig {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
