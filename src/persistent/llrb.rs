//! Persistent left-leaning red-black tree nodes.
//!
//! This module provides [`TreeNode`], the tree representation behind
//! [`ImmutableSortedDictionary`](super::ImmutableSortedDictionary) once it
//! outgrows its array representation.
//!
//! # Overview
//!
//! A [`TreeNode`] is a *link*: either [`TreeNode::Empty`], or a reference
//! counted [`Node`] tagged with the color of the link pointing at it. Keeping
//! the color on the link means a color flip re-tags the children without
//! copying them.
//!
//! - O(log N) get
//! - O(log N) insert
//! - O(log N) remove
//! - O(log N) `index_of` and predecessor lookups (nodes cache subtree sizes)
//! - O(N) bulk construction from sorted entries
//! - O(1) count
//!
//! Every operation returns a new link. Nodes are never modified after
//! construction: only the nodes on the path from the root to the changed
//! position are rebuilt, every other subtree is shared with the previous
//! version.
//!
//! # Invariants
//!
//! After every public operation the tree satisfies:
//!
//! 1. No node has a red right child (red links lean left).
//! 2. No red node has a red left child, so no node has two red children.
//! 3. Every path from a node to an empty link crosses the same number of
//!    black nodes.
//! 4. In-order traversal yields strictly increasing keys.
//!
//! [`TreeNode::check`] verifies all of them and returns the black height.
//!
//! # Examples
//!
//! ```rust
//! use immutable_sorted::comparator::NaturalOrder;
//! use immutable_sorted::persistent::TreeNode;
//!
//! let tree = [5, 3, 8, 1, 4]
//!     .into_iter()
//!     .fold(TreeNode::empty(), |tree, key| tree.insert(key, key * 10, &NaturalOrder));
//!
//! assert_eq!(tree.count(), 5);
//! assert_eq!(tree.get(&4, &NaturalOrder), Some(&40));
//! assert!(tree.check(&NaturalOrder).is_ok());
//! ```

use super::ReferenceCounter;
use crate::comparator::Comparator;
use crate::error::InvariantViolation;
use std::cmp::Ordering;
use std::ops::ControlFlow;

// =============================================================================
// Color Definition
// =============================================================================

/// The color of a link in the tree.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Color {
    /// A red link glues a node to its parent as part of a 3-node.
    Red,
    /// A black link is an ordinary 2-3 tree edge.
    Black,
}

impl Color {
    const fn flipped(self) -> Self {
        match self {
            Self::Red => Self::Black,
            Self::Black => Self::Red,
        }
    }
}

// =============================================================================
// Node Definition
// =============================================================================

/// A tree node: one entry plus its two child links.
#[derive(Debug)]
pub struct Node<K, V> {
    key: K,
    value: V,
    left: TreeNode<K, V>,
    right: TreeNode<K, V>,
    /// Number of entries in the subtree rooted here.
    count: usize,
}

impl<K, V> Node<K, V> {
    /// The entry's key.
    #[inline]
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// The entry's value.
    #[inline]
    pub const fn value(&self) -> &V {
        &self.value
    }

    /// The left child link.
    #[inline]
    pub const fn left(&self) -> &TreeNode<K, V> {
        &self.left
    }

    /// The right child link.
    #[inline]
    pub const fn right(&self) -> &TreeNode<K, V> {
        &self.right
    }

    /// Number of entries in this subtree.
    #[inline]
    pub const fn count(&self) -> usize {
        self.count
    }
}

// =============================================================================
// TreeNode Definition
// =============================================================================

/// A link to a (possibly empty) persistent LLRB subtree.
///
/// Cloning a `TreeNode` only bumps a reference count.
///
/// The rotation primitives and [`check`](Self::check) are public so that
/// tests can exercise them directly; collections never require callers to
/// touch them.
#[derive(Debug)]
pub enum TreeNode<K, V> {
    /// The empty subtree.
    Empty,
    /// A red link to a node.
    Red(ReferenceCounter<Node<K, V>>),
    /// A black link to a node.
    Black(ReferenceCounter<Node<K, V>>),
}

impl<K, V> Clone for TreeNode<K, V> {
    #[inline]
    fn clone(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Red(node) => Self::Red(node.clone()),
            Self::Black(node) => Self::Black(node.clone()),
        }
    }
}

impl<K, V> Default for TreeNode<K, V> {
    #[inline]
    fn default() -> Self {
        Self::Empty
    }
}

impl<K, V> TreeNode<K, V> {
    /// Returns the empty subtree.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self::Empty
    }

    /// Returns `true` if this is the empty subtree.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns `true` if this is a red link. The empty subtree is black.
    #[inline]
    #[must_use]
    pub const fn is_red(&self) -> bool {
        matches!(self, Self::Red(_))
    }

    /// The color of this link, or `None` for the empty subtree.
    #[inline]
    #[must_use]
    pub const fn color(&self) -> Option<Color> {
        match self {
            Self::Empty => None,
            Self::Red(_) => Some(Color::Red),
            Self::Black(_) => Some(Color::Black),
        }
    }

    /// The node this link points to.
    #[inline]
    #[must_use]
    pub fn node(&self) -> Option<&Node<K, V>> {
        match self {
            Self::Empty => None,
            Self::Red(node) | Self::Black(node) => Some(node),
        }
    }

    fn parts(&self) -> Option<(Color, &Node<K, V>)> {
        match self {
            Self::Empty => None,
            Self::Red(node) => Some((Color::Red, node)),
            Self::Black(node) => Some((Color::Black, node)),
        }
    }

    /// Number of entries in this subtree.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        self.node().map_or(0, Node::count)
    }

    /// Returns `true` if both links point at the same node allocation.
    ///
    /// Two empty subtrees are considered the same.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (Self::Red(left) | Self::Black(left), Self::Red(right) | Self::Black(right)) => {
                ReferenceCounter::ptr_eq(left, right)
            }
            _ => false,
        }
    }

    fn left(&self) -> Option<&Self> {
        self.node().map(|node| &node.left)
    }

    fn right(&self) -> Option<&Self> {
        self.node().map(|node| &node.right)
    }

    fn left_is_red(&self) -> bool {
        self.left().is_some_and(Self::is_red)
    }

    fn right_is_red(&self) -> bool {
        self.right().is_some_and(Self::is_red)
    }

    fn left_left_is_red(&self) -> bool {
        self.left().and_then(Self::left).is_some_and(Self::is_red)
    }

    fn right_left_is_red(&self) -> bool {
        self.right().and_then(Self::left).is_some_and(Self::is_red)
    }

    /// Builds a link to a fresh node, computing its subtree size.
    fn linked(color: Color, key: K, value: V, left: Self, right: Self) -> Self {
        let count = 1 + left.count() + right.count();
        let node = ReferenceCounter::new(Node {
            key,
            value,
            left,
            right,
            count,
        });
        match color {
            Color::Red => Self::Red(node),
            Color::Black => Self::Black(node),
        }
    }

    /// Re-tags this link with `color`, sharing the node.
    #[must_use]
    pub fn with_color(&self, color: Color) -> Self {
        match (self, color) {
            (Self::Empty, _) => Self::Empty,
            (Self::Red(node) | Self::Black(node), Color::Red) => Self::Red(node.clone()),
            (Self::Red(node) | Self::Black(node), Color::Black) => Self::Black(node.clone()),
        }
    }

    fn flipped(&self) -> Self {
        self.color()
            .map_or(Self::Empty, |color| self.with_color(color.flipped()))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Returns the value stored under `key`.
    ///
    /// # Complexity
    ///
    /// O(log N)
    pub fn get<C>(&self, key: &K, comparator: &C) -> Option<&V>
    where
        C: Comparator<K> + ?Sized,
    {
        self.get_entry(key, comparator).map(|(_, value)| value)
    }

    /// Returns the stored entry whose key compares equal to `key`.
    pub fn get_entry<C>(&self, key: &K, comparator: &C) -> Option<(&K, &V)>
    where
        C: Comparator<K> + ?Sized,
    {
        let mut current = self;
        while let Some(node) = current.node() {
            match comparator.compare(key, &node.key) {
                Ordering::Less => current = &node.left,
                Ordering::Greater => current = &node.right,
                Ordering::Equal => return Some((&node.key, &node.value)),
            }
        }
        None
    }

    /// Returns the entry with the smallest key.
    #[must_use]
    pub fn min(&self) -> Option<(&K, &V)> {
        let mut node = self.node()?;
        while let Some(left) = node.left.node() {
            node = left;
        }
        Some((&node.key, &node.value))
    }

    /// Returns the entry with the largest key.
    #[must_use]
    pub fn max(&self) -> Option<(&K, &V)> {
        let mut node = self.node()?;
        while let Some(right) = node.right.node() {
            node = right;
        }
        Some((&node.key, &node.value))
    }

    /// Returns the smallest key.
    #[must_use]
    pub fn min_key(&self) -> Option<&K> {
        self.min().map(|(key, _)| key)
    }

    /// Returns the largest key.
    #[must_use]
    pub fn max_key(&self) -> Option<&K> {
        self.max().map(|(key, _)| key)
    }

    /// Returns the position of `key` in ascending order.
    ///
    /// # Complexity
    ///
    /// O(log N), using the subtree sizes cached in each node.
    pub fn index_of<C>(&self, key: &K, comparator: &C) -> Option<usize>
    where
        C: Comparator<K> + ?Sized,
    {
        let mut current = self;
        let mut preceding = 0;
        while let Some(node) = current.node() {
            match comparator.compare(key, &node.key) {
                Ordering::Less => current = &node.left,
                Ordering::Greater => {
                    preceding += node.left.count() + 1;
                    current = &node.right;
                }
                Ordering::Equal => return Some(preceding + node.left.count()),
            }
        }
        None
    }

    /// Returns the greatest key strictly less than `probe`.
    ///
    /// `probe` does not need to be present.
    pub fn lower_key<C>(&self, probe: &K, comparator: &C) -> Option<&K>
    where
        C: Comparator<K> + ?Sized,
    {
        let mut current = self;
        let mut candidate = None;
        while let Some(node) = current.node() {
            if comparator.compare(probe, &node.key) == Ordering::Greater {
                candidate = Some(&node.key);
                current = &node.right;
            } else {
                current = &node.left;
            }
        }
        candidate
    }

    /// Returns the key immediately before `key`.
    ///
    /// Returns `None` if `key` is the smallest key or is not present.
    pub fn predecessor_key<C>(&self, key: &K, comparator: &C) -> Option<&K>
    where
        C: Comparator<K> + ?Sized,
    {
        self.get_entry(key, comparator)?;
        self.lower_key(key, comparator)
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Visits every entry in ascending key order.
    ///
    /// The visitor stops the walk early by returning [`ControlFlow::Break`];
    /// the result tells whether the walk was stopped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use immutable_sorted::comparator::NaturalOrder;
    /// use immutable_sorted::persistent::TreeNode;
    /// use std::ops::ControlFlow;
    ///
    /// let tree = (1..=10).fold(TreeNode::empty(), |tree, key| tree.insert(key, (), &NaturalOrder));
    ///
    /// let mut seen = Vec::new();
    /// let flow = tree.inorder_traversal(|key, _| {
    ///     seen.push(*key);
    ///     if *key == 3 { ControlFlow::Break(()) } else { ControlFlow::Continue(()) }
    /// });
    /// assert!(flow.is_break());
    /// assert_eq!(seen, vec![1, 2, 3]);
    /// ```
    pub fn inorder_traversal<F>(&self, mut visitor: F) -> ControlFlow<()>
    where
        F: FnMut(&K, &V) -> ControlFlow<()>,
    {
        self.walk_inorder(&mut visitor)
    }

    /// Visits every entry in descending key order.
    pub fn reverse_traversal<F>(&self, mut visitor: F) -> ControlFlow<()>
    where
        F: FnMut(&K, &V) -> ControlFlow<()>,
    {
        self.walk_reverse(&mut visitor)
    }

    fn walk_inorder<F>(&self, visitor: &mut F) -> ControlFlow<()>
    where
        F: FnMut(&K, &V) -> ControlFlow<()>,
    {
        if let Some(node) = self.node() {
            node.left.walk_inorder(visitor)?;
            visitor(&node.key, &node.value)?;
            node.right.walk_inorder(visitor)?;
        }
        ControlFlow::Continue(())
    }

    fn walk_reverse<F>(&self, visitor: &mut F) -> ControlFlow<()>
    where
        F: FnMut(&K, &V) -> ControlFlow<()>,
    {
        if let Some(node) = self.node() {
            node.right.walk_reverse(visitor)?;
            visitor(&node.key, &node.value)?;
            node.left.walk_reverse(visitor)?;
        }
        ControlFlow::Continue(())
    }

    // =========================================================================
    // Consistency Check
    // =========================================================================

    /// Verifies the LLRB invariants and returns the black height.
    ///
    /// The empty subtree has black height 0. The cached subtree sizes are
    /// verified as well.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn check<C>(&self, comparator: &C) -> Result<usize, InvariantViolation>
    where
        C: Comparator<K> + ?Sized,
    {
        let Some((color, node)) = self.parts() else {
            return Ok(0);
        };

        if node.right.is_red() {
            return Err(InvariantViolation::RedRightChild);
        }
        if color == Color::Red && node.left.is_red() {
            return Err(InvariantViolation::ConsecutiveRedLinks);
        }
        if node
            .left
            .max_key()
            .is_some_and(|key| comparator.compare(key, &node.key) != Ordering::Less)
            || node
                .right
                .min_key()
                .is_some_and(|key| comparator.compare(key, &node.key) != Ordering::Greater)
        {
            return Err(InvariantViolation::OutOfOrder);
        }

        let left = node.left.check(comparator)?;
        let right = node.right.check(comparator)?;
        if left != right {
            return Err(InvariantViolation::BlackHeightMismatch { left, right });
        }

        let actual = 1 + node.left.count() + node.right.count();
        if node.count != actual {
            return Err(InvariantViolation::CountMismatch {
                expected: node.count,
                actual,
            });
        }

        Ok(left + usize::from(color == Color::Black))
    }
}

// =============================================================================
// Bulk Construction
// =============================================================================

impl<K, V> TreeNode<K, V> {
    /// Builds a balanced tree from entries already sorted by the comparator.
    ///
    /// The tree is assembled bottom-up in a single pass, so the result is a
    /// valid LLRB tree without any rebalancing.
    ///
    /// The entries must be strictly increasing; this is checked in debug
    /// builds by callers that own a comparator.
    ///
    /// # Complexity
    ///
    /// O(N)
    #[must_use]
    pub fn from_sorted_entries(entries: Vec<(K, V)>) -> Self {
        let len = entries.len();
        let height = black_height_for(len);
        let mut entries = entries.into_iter();
        Self::build(&mut entries, len, height).with_color(Color::Black)
    }

    /// Builds a subtree of `len` entries with black height `height`.
    ///
    /// Each level is made of 2-nodes while the entries fit, and of 3-nodes
    /// (a black node with a red left child) otherwise.
    fn build<I>(entries: &mut I, len: usize, height: u32) -> Self
    where
        I: Iterator<Item = (K, V)>,
    {
        if len == 0 || height == 0 {
            return Self::Empty;
        }

        let child_height = height - 1;
        let child_capacity = three_node_capacity(child_height);

        if len - 1 <= child_capacity.saturating_mul(2) {
            let rest = len - 1;
            let left = Self::build(entries, rest.div_ceil(2), child_height);
            let Some((key, value)) = entries.next() else {
                return left;
            };
            let right = Self::build(entries, rest / 2, child_height);
            Self::linked(Color::Black, key, value, left, right)
        } else {
            let rest = len - 2;
            let share = rest / 3;
            let remainder = rest % 3;
            let outer_left = Self::build(entries, share + usize::from(remainder > 0), child_height);
            let Some((red_key, red_value)) = entries.next() else {
                return outer_left;
            };
            let middle = Self::build(entries, share + usize::from(remainder > 1), child_height);
            let red = Self::linked(Color::Red, red_key, red_value, outer_left, middle);
            let Some((key, value)) = entries.next() else {
                return red;
            };
            let right = Self::build(entries, share, child_height);
            Self::linked(Color::Black, key, value, red, right)
        }
    }
}

/// Largest black height a tree of `len` entries can have while every level is
/// at least a 2-node.
fn black_height_for(len: usize) -> u32 {
    len.checked_add(1).map_or(usize::BITS - 1, usize::ilog2)
}

/// Number of entries in a tree of black height `height` made only of 3-nodes.
fn three_node_capacity(height: u32) -> usize {
    3usize.saturating_pow(height) - 1
}

// =============================================================================
// Persistent Updates
// =============================================================================

impl<K: Clone, V: Clone> TreeNode<K, V> {
    fn with_children(&self, left: Self, right: Self) -> Self {
        match self.parts() {
            None => Self::Empty,
            Some((color, node)) => {
                Self::linked(color, node.key.clone(), node.value.clone(), left, right)
            }
        }
    }

    fn with_left(&self, left: Self) -> Self {
        let right = self.right().cloned().unwrap_or_default();
        self.with_children(left, right)
    }

    fn with_right(&self, right: Self) -> Self {
        let left = self.left().cloned().unwrap_or_default();
        self.with_children(left, right)
    }

    /// Rotates a right-leaning red link to lean left.
    ///
    /// The new subtree root takes this link's color; the old root becomes its
    /// red left child. Returns a copy of `self` if there is no right child.
    #[must_use]
    pub fn rotate_left(&self) -> Self {
        let Some((color, node)) = self.parts() else {
            return Self::Empty;
        };
        let Some(right) = node.right.node() else {
            return self.clone();
        };
        let lowered = Self::linked(
            Color::Red,
            node.key.clone(),
            node.value.clone(),
            node.left.clone(),
            right.left.clone(),
        );
        Self::linked(
            color,
            right.key.clone(),
            right.value.clone(),
            lowered,
            right.right.clone(),
        )
    }

    /// Rotates a left-leaning link to lean right.
    ///
    /// Mirror image of [`rotate_left`](Self::rotate_left).
    #[must_use]
    pub fn rotate_right(&self) -> Self {
        let Some((color, node)) = self.parts() else {
            return Self::Empty;
        };
        let Some(left) = node.left.node() else {
            return self.clone();
        };
        let lowered = Self::linked(
            Color::Red,
            node.key.clone(),
            node.value.clone(),
            left.right.clone(),
            node.right.clone(),
        );
        Self::linked(
            color,
            left.key.clone(),
            left.value.clone(),
            left.left.clone(),
            lowered,
        )
    }

    /// Flips the color of this link and of both child links.
    fn color_flip(&self) -> Self {
        let Some((color, node)) = self.parts() else {
            return Self::Empty;
        };
        Self::linked(
            color.flipped(),
            node.key.clone(),
            node.value.clone(),
            node.left.flipped(),
            node.right.flipped(),
        )
    }

    /// Restores the LLRB shape on the way back up from an update.
    fn fix_up(self) -> Self {
        let mut link = self;
        if link.right_is_red() && !link.left_is_red() {
            link = link.rotate_left();
        }
        if link.left_is_red() && link.left_left_is_red() {
            link = link.rotate_right();
        }
        if link.left_is_red() && link.right_is_red() {
            link = link.color_flip();
        }
        link
    }

    /// Makes the left child or one of its children red before descending left.
    fn move_red_left(&self) -> Self {
        let mut link = self.color_flip();
        if link.right_left_is_red() {
            let rotated = link.right().map(Self::rotate_right).unwrap_or_default();
            link = link.with_right(rotated).rotate_left().color_flip();
        }
        link
    }

    /// Makes the right child or one of its children red before descending right.
    fn move_red_right(&self) -> Self {
        let mut link = self.color_flip();
        if link.left_left_is_red() {
            link = link.rotate_right().color_flip();
        }
        link
    }

    /// Inserts or replaces an entry, returning the new root.
    ///
    /// Replacing the value of an existing key rebuilds only the path to that
    /// key and never changes the tree's shape. The returned root is black.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn insert<C>(&self, key: K, value: V, comparator: &C) -> Self
    where
        C: Comparator<K> + ?Sized,
    {
        self.insert_into(key, value, comparator)
            .with_color(Color::Black)
    }

    fn insert_into<C>(&self, key: K, value: V, comparator: &C) -> Self
    where
        C: Comparator<K> + ?Sized,
    {
        let Some((color, node)) = self.parts() else {
            return Self::linked(Color::Red, key, value, Self::Empty, Self::Empty);
        };
        match comparator.compare(&key, &node.key) {
            Ordering::Less => {
                let left = node.left.insert_into(key, value, comparator);
                self.with_left(left).fix_up()
            }
            Ordering::Greater => {
                let right = node.right.insert_into(key, value, comparator);
                self.with_right(right).fix_up()
            }
            Ordering::Equal => {
                Self::linked(color, key, value, node.left.clone(), node.right.clone())
            }
        }
    }

    /// Removes `key`, returning the new root.
    ///
    /// Removing a key that is not present returns a link to the same root.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn remove<C>(&self, key: &K, comparator: &C) -> Self
    where
        C: Comparator<K> + ?Sized,
    {
        if self.get_entry(key, comparator).is_none() {
            return self.clone();
        }
        self.remove_from(key, comparator).with_color(Color::Black)
    }

    /// Removes a key known to be present in this subtree.
    fn remove_from<C>(&self, key: &K, comparator: &C) -> Self
    where
        C: Comparator<K> + ?Sized,
    {
        let Some(node) = self.node() else {
            return Self::Empty;
        };

        let link = if comparator.compare(key, &node.key) == Ordering::Less {
            let link = if !node.left.is_empty() && !node.left.is_red() && !self.left_left_is_red() {
                self.move_red_left()
            } else {
                self.clone()
            };
            let left = link
                .left()
                .map(|left| left.remove_from(key, comparator))
                .unwrap_or_default();
            link.with_left(left)
        } else {
            let mut link = if self.left_is_red() {
                self.rotate_right()
            } else {
                self.clone()
            };
            if link.right().is_some_and(|right| !right.is_empty() && !right.is_red())
                && !link.right_left_is_red()
            {
                link = link.move_red_right();
            }
            let Some((color, current)) = link.parts() else {
                return Self::Empty;
            };
            if comparator.compare(key, &current.key) == Ordering::Equal {
                let Some((successor_key, successor_value)) = current.right.min() else {
                    return Self::Empty;
                };
                Self::linked(
                    color,
                    successor_key.clone(),
                    successor_value.clone(),
                    current.left.clone(),
                    current.right.remove_min(),
                )
            } else {
                let right = current.right.remove_from(key, comparator);
                link.with_right(right)
            }
        };

        link.fix_up()
    }

    /// Removes the smallest entry of this subtree.
    fn remove_min(&self) -> Self {
        let Some(node) = self.node() else {
            return Self::Empty;
        };
        if node.left.is_empty() {
            return Self::Empty;
        }
        let link = if !self.left_is_red() && !self.left_left_is_red() {
            self.move_red_left()
        } else {
            self.clone()
        };
        let left = link.left().map(Self::remove_min).unwrap_or_default();
        link.with_left(left).fix_up()
    }
}

// =============================================================================
// Tests
// =============================================================================
