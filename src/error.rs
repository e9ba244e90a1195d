//! Error types for sorted collections.
//!
//! Lookups never fail: a missing key, or a boundary query on an empty
//! collection, is an ordinary `None`. Errors only arise from:
//!
//! - combining two collections whose comparators are not compatible, and
//! - the debug consistency checks, which report a broken internal invariant.
//!
//! An [`InvariantViolation`] is only reachable through a bug in this crate (or
//! a comparator that is not a total order) and should be treated as an
//! unrecoverable internal-consistency fault outside of tests.

use thiserror::Error;

/// A broken structural invariant found by a consistency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// A node has a red right child.
    #[error("red link leans right")]
    RedRightChild,
    /// A red node has a red left child.
    #[error("two consecutive red links")]
    ConsecutiveRedLinks,
    /// Two sibling subtrees have different black heights.
    #[error("black height mismatch: left {left}, right {right}")]
    BlackHeightMismatch {
        /// Black height of the left subtree.
        left: usize,
        /// Black height of the right subtree.
        right: usize,
    },
    /// In-order traversal is not strictly increasing under the comparator.
    #[error("keys are not strictly increasing")]
    OutOfOrder,
    /// A cached subtree or collection size disagrees with the actual size.
    #[error("count mismatch: expected {expected}, actual {actual}")]
    CountMismatch {
        /// The recorded size.
        expected: usize,
        /// The size found by walking the structure.
        actual: usize,
    },
    /// The root of a tree is red.
    #[error("root is red")]
    RootNotBlack,
    /// An array-backed collection holds more entries than its threshold.
    #[error("array holds {len} entries, threshold is {threshold}")]
    ArrayOverThreshold {
        /// Number of entries in the array.
        len: usize,
        /// The configured array threshold.
        threshold: usize,
    },
}

/// Errors returned by sorted collection operations.
///
/// # Examples
///
/// ```rust
/// use immutable_sorted::error::SortedCollectionError;
///
/// let error = SortedCollectionError::IncompatibleComparator;
/// assert_eq!(
///     format!("{error}"),
///     "collections use incompatible comparators"
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SortedCollectionError {
    /// Two collections with different comparators were combined.
    #[error("collections use incompatible comparators")]
    IncompatibleComparator,
    /// A consistency check failed.
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn invariant_converts_into_collection_error() {
        let error: SortedCollectionError = InvariantViolation::RootNotBlack.into();
        assert_eq!(
            error,
            SortedCollectionError::Invariant(InvariantViolation::RootNotBlack)
        );
        assert_eq!(format!("{error}"), "invariant violated: root is red");
    }

    #[rstest]
    fn black_height_mismatch_display() {
        let violation = InvariantViolation::BlackHeightMismatch { left: 2, right: 3 };
        assert_eq!(
            format!("{violation}"),
            "black height mismatch: left 2, right 3"
        );
    }
}
