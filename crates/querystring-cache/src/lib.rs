//! Hierarchical overlay cache for query-string state.
//!
//! Query-parameter overlays are cached in a trie keyed by URL path segment,
//! so that navigating between paths can selectively retain ("persist"),
//! temporarily hold ("shadow"), or discard parameters without re-deriving
//! them on every navigation. URL parsing and serialization stay pluggable:
//! the caller supplies both functions and the cache only manages parameter
//! bags.
//!
//! # Examples
//!
//! ```
//! use querystring_cache::{Mutation, NavigationUpdate, QueryStore, StoreOptions};
//! use serde_json::{json, Value};
//! use std::rc::Rc;
//!
//! let mut store = QueryStore::new(StoreOptions::new(
//!     |raw| serde_json::from_str(raw).unwrap_or_default(),
//!     |params| serde_json::to_string(params).unwrap_or_default(),
//! ));
//!
//! let state = QueryStore::create_state_object(vec![Mutation {
//!     scope: Some("/products".to_string()),
//!     persist: true,
//!     add: Some(Rc::new(
//!         json!({"sort": "asc"}).as_object().cloned().unwrap_or_default(),
//!     )),
//!     remove: None,
//! }]);
//!
//! store
//!     .add(NavigationUpdate {
//!         pathname: "/products",
//!         state: Some(&state),
//!     })
//!     .unwrap();
//!
//! let query = store.resolve_query_string("/products", &[]).unwrap();
//! assert_eq!(query, r#"{"sort":"asc"}"#);
//! ```

pub mod cache;
pub mod path;
pub mod query;
pub mod resolve;
pub mod store;

pub use cache::{flush_nested, merge_mutation_into_cache, CacheNode, CacheRoot, Mutation};
pub use path::{parse_pathname, PathError, PATH_DELIMITER};
pub use query::{add_query_params, remove_query_params};
pub use querystring_cache_merge::Bag;
pub use resolve::{pick_branch_from_cache, resolve_query_params};
pub use store::{
    NavigationUpdate, ParseQueryString, QueryStore, StoreError, StoreOptions, StringifyQueryParams,
};

/// Well-known key under which navigation-state objects carry their mutation
/// list.
pub const QUERYSTRING_CACHE_STATE_KEY: &str = "__querystringCacheStateObject__";

/// Reserved path segment matching any literal segment at the same depth
/// during resolution.
pub const WILDCARD_SCOPE: &str = "*";

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
