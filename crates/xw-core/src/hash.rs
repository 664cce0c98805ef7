//! Fast hash map and hash set type aliases.
//!
//! This module provides type aliases for [`FxHashMap`] and [`FxHashSet`] from the
//! `rustc-hash` crate. These use the Fx hash algorithm which is approximately 2x
//! faster than the standard library's `HashMap` and `HashSet` for string keys.
//!
//! The keys in this workspace are entry names and file paths, so denial-of-service
//! resistance is not required (internal use only).
//!
//! # Examples
//!
//! ```
//! use xw_core::{FxHashMap, FxHashSet, fx_hash_map, fx_hash_set};
//!
//! // Using the type aliases directly
//! let mut map: FxHashMap<String, i32> = FxHashMap::default();
//! map.insert("key".to_owned(), 42);
//!
//! // Using the convenience constructors
//! let map: FxHashMap<&str, i32> = fx_hash_map();
//! let set: FxHashSet<&str> = fx_hash_set();
//! ```

/// A [`HashMap`](std::collections::HashMap) using the Fx hash algorithm.
///
/// This is faster than the standard library's `HashMap` for string keys
/// but does not provide denial-of-service resistance.
pub type FxHashMap<K, V> = rustc_hash::FxHashMap<K, V>;

/// A [`HashSet`](std::collections::HashSet) using the Fx hash algorithm.
///
/// This is faster than the standard library's `HashSet` for string keys
/// but does not provide denial-of-service resistance.
pub type FxHashSet<V> = rustc_hash::FxHashSet<V>;

/// The hasher used by [`FxHashMap`] and [`FxHashSet`].
pub type FxBuildHasher = rustc_hash::FxBuildHasher;

/// Creates a new empty [`FxHashMap`].
///
/// This is equivalent to `FxHashMap::default()` but can be more ergonomic
/// in some contexts due to type inference.
#[inline]
#[must_use]
pub fn fx_hash_map<K, V>() -> FxHashMap<K, V> {
    FxHashMap::default()
}

/// Creates a new empty [`FxHashSet`].
///
/// This is equivalent to `FxHashSet::default()` but can be more ergonomic
/// in some contexts due to type inference.
#[inline]
#[must_use]
pub fn fx_hash_set<V>() -> FxHashSet<V> {
    FxHashSet::default()
}
