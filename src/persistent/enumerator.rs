//! Lazy, bounded, bidirectional enumeration over one collection version.
//!
//! A [`SortedMapEnumerator`] borrows the version it was created from and
//! yields entries in strict key order, forward or in reverse, optionally
//! restricted to a key range:
//!
//! - the start key is inclusive: enumeration begins at the first key at or
//!   after it (at or before it in reverse);
//! - the end key is exclusive: enumeration stops before reaching it. In
//!   reverse the end key is a lower bound, and keys at or below it are not
//!   returned.
//!
//! The sequence is lazy and finite and is consumed by iterating. To traverse
//! again, create a new enumerator. Any number of enumerators may read the same
//! version at once; each keeps its own cursor.
//!
//! For the tree representation the cursor is a stack of the ancestors still
//! to be visited, seeded by descending toward the start key. For the array
//! representation the bounds are resolved to an index range up front.

use super::array::ArrayNode;
use super::llrb::{Node, TreeNode};
use crate::comparator::Comparator;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::fmt;
use std::iter::FusedIterator;

/// Inline capacity of the ancestor stack. LLRB trees of up to about 65 000
/// entries never spill to the heap.
const INLINE_DEPTH: usize = 32;

/// Traversal direction.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub enum Direction {
    /// Ascending key order.
    #[default]
    Forward,
    /// Descending key order.
    Reverse,
}

enum Cursor<'a, K, V> {
    /// Entries `[front, back)` of the slice remain.
    Array {
        entries: &'a [(K, V)],
        front: usize,
        back: usize,
    },
    /// Nodes still to be visited; the next entry is on top.
    Tree {
        stack: SmallVec<[&'a Node<K, V>; INLINE_DEPTH]>,
    },
}

/// An iterator over `(&K, &V)` pairs of one sorted collection version.
///
/// Created by
/// [`ImmutableSortedDictionary::enumerator`](super::ImmutableSortedDictionary::enumerator)
/// and the other `iter*` methods.
pub struct SortedMapEnumerator<'a, K, V, C: ?Sized> {
    cursor: Cursor<'a, K, V>,
    direction: Direction,
    end: Option<K>,
    comparator: &'a C,
}

impl<'a, K, V, C> SortedMapEnumerator<'a, K, V, C>
where
    C: Comparator<K> + ?Sized,
{
    pub(crate) fn over_array(
        array: &'a ArrayNode<K, V>,
        comparator: &'a C,
        direction: Direction,
        start: Option<&K>,
        end: Option<&K>,
    ) -> Self {
        let entries = array.as_slice();
        let (front, back) = match direction {
            Direction::Forward => (
                start.map_or(0, |start| array.lower_bound(start, comparator)),
                end.map_or(entries.len(), |end| array.lower_bound(end, comparator)),
            ),
            Direction::Reverse => (
                end.map_or(0, |end| array.upper_bound(end, comparator)),
                start.map_or(entries.len(), |start| array.upper_bound(start, comparator)),
            ),
        };
        Self {
            cursor: Cursor::Array {
                entries,
                front,
                back: back.max(front),
            },
            direction,
            end: None,
            comparator,
        }
    }

    pub(crate) fn over_tree(
        root: &'a TreeNode<K, V>,
        comparator: &'a C,
        direction: Direction,
        start: Option<&K>,
        end: Option<K>,
    ) -> Self {
        let mut stack = SmallVec::new();
        let mut current = root;
        while let Some(node) = current.node() {
            let ordering = start.map(|start| comparator.compare(start, node.key()));
            match (direction, ordering) {
                (_, Some(Ordering::Equal)) => {
                    stack.push(node);
                    break;
                }
                (Direction::Forward, None | Some(Ordering::Less)) => {
                    stack.push(node);
                    current = node.left();
                }
                (Direction::Forward, Some(Ordering::Greater)) => current = node.right(),
                (Direction::Reverse, None | Some(Ordering::Greater)) => {
                    stack.push(node);
                    current = node.right();
                }
                (Direction::Reverse, Some(Ordering::Less)) => current = node.left(),
            }
        }
        Self {
            cursor: Cursor::Tree { stack },
            direction,
            end,
            comparator,
        }
    }

    /// The direction this enumerator walks in.
    #[inline]
    pub const fn direction(&self) -> Direction {
        self.direction
    }
}

/// Whether `key` lies past the exclusive `end` bound when walking in
/// `direction`.
fn is_past_end<K, C>(direction: Direction, end: Option<&K>, comparator: &C, key: &K) -> bool
where
    C: Comparator<K> + ?Sized,
{
    end.is_some_and(|end| {
        let ordering = comparator.compare(key, end);
        match direction {
            Direction::Forward => ordering != Ordering::Less,
            Direction::Reverse => ordering != Ordering::Greater,
        }
    })
}

impl<'a, K, V, C> Iterator for SortedMapEnumerator<'a, K, V, C>
where
    C: Comparator<K> + ?Sized,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let Self {
            cursor,
            direction,
            end,
            comparator,
        } = self;
        match cursor {
            Cursor::Array {
                entries,
                front,
                back,
            } => {
                if *front >= *back {
                    return None;
                }
                let entries: &'a [(K, V)] = *entries;
                let (key, value) = match direction {
                    Direction::Forward => {
                        *front += 1;
                        &entries[*front - 1]
                    }
                    Direction::Reverse => {
                        *back -= 1;
                        &entries[*back]
                    }
                };
                Some((key, value))
            }
            Cursor::Tree { stack } => {
                let node = stack.pop()?;
                if is_past_end(*direction, end.as_ref(), *comparator, node.key()) {
                    stack.clear();
                    return None;
                }
                let mut current = match direction {
                    Direction::Forward => node.right(),
                    Direction::Reverse => node.left(),
                };
                while let Some(child) = current.node() {
                    stack.push(child);
                    current = match direction {
                        Direction::Forward => child.left(),
                        Direction::Reverse => child.right(),
                    };
                }
                Some((node.key(), node.value()))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.cursor {
            Cursor::Array { front, back, .. } => {
                let remaining = back - front;
                (remaining, Some(remaining))
            }
            Cursor::Tree { stack } => (usize::from(!stack.is_empty()), None),
        }
    }
}

impl<K, V, C> FusedIterator for SortedMapEnumerator<'_, K, V, C> where C: Comparator<K> + ?Sized {}

impl<K, V, C: ?Sized> fmt::Debug for SortedMapEnumerator<'_, K, V, C> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let representation = match &self.cursor {
            Cursor::Array { .. } => "array",
            Cursor::Tree { .. } => "tree",
        };
        formatter
            .debug_struct("SortedMapEnumerator")
            .field("representation", &representation)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}
