//! Copy-on-write merge primitives for query-parameter bags.
//!
//! A "bag" is a plain key-value mapping of query parameters
//! ([`serde_json::Map`] with insertion order preserved). The merge entry
//! points never mutate their target: an unchanged merge hands back the
//! borrowed input, and the first structural change performs a one-time
//! shallow copy.

pub mod merge;
pub mod strategy;

pub use merge::{merge, merge_deep, merge_objects, merge_objects_deep, Bag, MergeError, Resolver};
pub use strategy::{add_strategy, remove_strategy};

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
