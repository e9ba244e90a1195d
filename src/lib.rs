//! # immutable-sorted
//!
//! Persistent, immutable sorted collections ordered by a caller-supplied
//! comparator.
//!
//! ## Overview
//!
//! Every update returns a new version of the collection and leaves the old
//! one valid and unchanged. Versions share as much storage as possible:
//!
//! - **Small collections** are a flat sorted array, copied on update.
//! - **Large collections** are a persistent left-leaning red-black tree; an
//!   update rebuilds only one root-to-leaf path.
//!
//! A collection switches from the array to the tree the first time an insert
//! takes it past its [`array_threshold`](config::SortedMapConfig::array_threshold)
//! and never switches back. The switch is invisible to callers.
//!
//! ## Feature Flags
//!
//! - `arc`: share nodes with `Arc` instead of `Rc`, making collections
//!   `Send + Sync`
//! - `serde`: `Serialize`/`Deserialize` for collections and configuration
//! - `full`: enable all features
//!
//! ## Example
//!
//! ```rust
//! use immutable_sorted::prelude::*;
//!
//! let dictionary = [5, 3, 8, 1, 4, 7, 9]
//!     .into_iter()
//!     .fold(ImmutableSortedDictionary::new(), |dictionary, key| {
//!         dictionary.insert(key, key)
//!     });
//!
//! assert_eq!(
//!     dictionary.keys().copied().collect::<Vec<_>>(),
//!     vec![1, 3, 4, 5, 7, 8, 9]
//! );
//! assert_eq!(dictionary.predecessor_key(&7), Some(&5));
//!
//! let removed = dictionary.remove(&5);
//! assert_eq!(removed.len(), 6);
//! assert_eq!(dictionary.len(), 7);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use immutable_sorted::prelude::*;
/// ```
pub mod prelude {
    pub use crate::comparator::{Comparator, NaturalOrder, ReverseOrder};
    pub use crate::config::SortedMapConfig;
    pub use crate::error::SortedCollectionError;
    pub use crate::persistent::{Direction, ImmutableSortedDictionary, ImmutableSortedSet};
}

pub mod comparator;
pub mod config;
pub mod error;
pub mod persistent;
