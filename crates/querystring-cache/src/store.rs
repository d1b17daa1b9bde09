//! The store façade tying the trie, the parser, and the resolver together.

use std::fmt;

use querystring_cache_merge::Bag;
use serde_json::{json, Value};
use thiserror::Error;

use crate::cache::{flush_nested, merge_mutation_into_cache, CacheRoot, Mutation};
use crate::path::{parse_pathname, PathError};
use crate::resolve::resolve_query_params;
use crate::{QUERYSTRING_CACHE_STATE_KEY, WILDCARD_SCOPE};

/// Parses a raw query string into a parameter bag.
pub type ParseQueryString = Box<dyn Fn(&str) -> Bag>;

/// Serializes a parameter bag back into a query string.
pub type StringifyQueryParams = Box<dyn Fn(&Bag) -> String>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("navigation state carries a malformed mutation list: {0}")]
    InvalidStateObject(#[source] serde_json::Error),
}

/// Options for [`QueryStore::new`]. The query-string codec is supplied by
/// the caller; the store itself never parses or serializes URLs.
pub struct StoreOptions {
    pub initial_cache: CacheRoot,
    pub parse_query_string: ParseQueryString,
    pub stringify_query_params: StringifyQueryParams,
}

impl StoreOptions {
    pub fn new(
        parse_query_string: impl Fn(&str) -> Bag + 'static,
        stringify_query_params: impl Fn(&Bag) -> String + 'static,
    ) -> Self {
        Self {
            initial_cache: CacheRoot::new(),
            parse_query_string: Box::new(parse_query_string),
            stringify_query_params: Box::new(stringify_query_params),
        }
    }

    /// Seeds the store with a previously serialized trie.
    pub fn with_initial_cache(mut self, initial_cache: CacheRoot) -> Self {
        self.initial_cache = initial_cache;
        self
    }
}

/// One navigation event as reported by the external router: the target
/// pathname and the opaque state object carried across the navigation.
#[derive(Debug, Clone, Copy)]
pub struct NavigationUpdate<'a> {
    pub pathname: &'a str,
    pub state: Option<&'a Value>,
}

/// A caller-owned query-string cache context.
///
/// Created by [`QueryStore::new`] and passed by reference to the router
/// integration points; there is no process-global instance.
pub struct QueryStore {
    cache: CacheRoot,
    parse_query_string: ParseQueryString,
    stringify_query_params: StringifyQueryParams,
}

impl QueryStore {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            cache: options.initial_cache,
            parse_query_string: options.parse_query_string,
            stringify_query_params: options.stringify_query_params,
        }
    }

    /// Read-only view of the trie root.
    pub fn cache(&self) -> &CacheRoot {
        &self.cache
    }

    /// Feeds one navigation event into the cache.
    ///
    /// When the state object carries no mutation list under
    /// [`QUERYSTRING_CACHE_STATE_KEY`](crate::QUERYSTRING_CACHE_STATE_KEY)
    /// this is a no-op. Otherwise every mutation scope is validated up
    /// front, each mutation is merged into the trie, and the shadow
    /// overlays of every unrelated top-level branch are flushed. A
    /// malformed pathname or scope aborts the call before anything is
    /// applied.
    pub fn add(&mut self, update: NavigationUpdate<'_>) -> Result<&mut Self, StoreError> {
        let Some(mutations) = state_mutations(update.state)? else {
            return Ok(self);
        };

        let current = parse_pathname(update.pathname)?;
        let mut scoped = Vec::with_capacity(mutations.len());
        for mutation in &mutations {
            let scope = mutation.scope.as_deref().unwrap_or(update.pathname);
            scoped.push((parse_pathname(scope)?, mutation));
        }

        for (segments, mutation) in &scoped {
            merge_mutation_into_cache(&mut self.cache, segments, mutation);
        }

        let current_top = current[0].as_str();
        for (segment, node) in self.cache.iter_mut() {
            let segment = segment.as_str();
            if segment != WILDCARD_SCOPE && segment != current_top {
                flush_nested(node);
            }
        }

        Ok(self)
    }

    /// Discards the entire trie.
    pub fn clear(&mut self) -> &mut Self {
        self.cache.clear();
        self
    }

    /// Recomputes the query string for `scope`, optionally applying one-off
    /// `mutations` that are never written back into the trie.
    pub fn resolve_query_string(
        &self,
        scope: &str,
        mutations: &[Mutation],
    ) -> Result<String, StoreError> {
        let segments = parse_pathname(scope)?;
        let query_params = resolve_query_params(&self.cache, &segments, mutations);
        Ok((self.stringify_query_params)(&query_params))
    }

    /// Parses a raw query string with the externally supplied parser.
    pub fn parse_query_string(&self, raw: &str) -> Bag {
        (self.parse_query_string)(raw)
    }

    /// Packages a mutation list into the navigation-state shape consumed by
    /// [`QueryStore::add`], for an external router or history system to
    /// carry across a navigation.
    pub fn create_state_object(mutations: Vec<Mutation>) -> Value {
        json!({
            (QUERYSTRING_CACHE_STATE_KEY): {
                "mutations": mutations,
            }
        })
    }
}

impl fmt::Debug for QueryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryStore")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Structural dump of the trie, as a debugging aid. Shadow overlays are
/// ephemeral and excluded. Not guaranteed stable across versions.
impl fmt::Display for QueryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dump = serde_json::to_string(&self.cache).map_err(|_| fmt::Error)?;
        f.write_str(&dump)
    }
}

fn state_mutations(state: Option<&Value>) -> Result<Option<Vec<Mutation>>, StoreError> {
    let Some(list) = state
        .and_then(|state| state.get(QUERYSTRING_CACHE_STATE_KEY))
        .and_then(|entry| entry.get("mutations"))
        .filter(|list| !list.is_null())
    else {
        return Ok(None);
    };
    serde_json::from_value(list.clone())
        .map(Some)
        .map_err(StoreError::InvalidStateObject)
}
