//! The cache trie: one node per distinct path segment at a given depth.

use std::collections::BTreeMap;
use std::rc::Rc;

use querystring_cache_merge::Bag;
use serde::{Deserialize, Serialize};

use crate::query::{add_query_params, remove_query_params};

/// Root mapping of the trie: top-level segment to node.
pub type CacheRoot = BTreeMap<String, CacheNode>;

/// One add/remove change targeted at a scope path, tagged persisted or
/// ephemeral. `scope` defaults to the pathname of the navigation event that
/// carries the mutation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mutation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    pub persist: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add: Option<Rc<Bag>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove: Option<Rc<Bag>>,
}

/// A trie node holding the two overlay bags for its path segment.
///
/// Nodes are created lazily while walking a mutation's scope down the trie;
/// intermediate nodes are pure scaffolding until a mutation lands on them
/// and sets `mutated`. Unmutated nodes never contribute to resolution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheNode {
    pub path: String,
    pub nested: CacheRoot,
    pub persisted: Rc<Bag>,
    /// Ephemeral overlays, excluded from serialization.
    #[serde(skip)]
    pub shadow: Rc<Bag>,
    pub mutated: bool,
}

impl CacheNode {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Applies `remove` then `add` to the overlay bag selected by
    /// `mutation.persist`, marks the node mutated, and flushes the shadow
    /// overlays of its children and grandchildren.
    fn apply(&mut self, mutation: &Mutation) {
        self.mutated = true;

        let overlay = if mutation.persist {
            &mut self.persisted
        } else {
            &mut self.shadow
        };
        if let Some(remove) = &mutation.remove {
            *overlay = remove_query_params(overlay, remove);
        }
        if let Some(add) = &mutation.add {
            *overlay = add_query_params(overlay, add);
        }

        for child in self.nested.values_mut() {
            flush_nested(child);
        }
    }
}

/// Recursively merges one mutation into the trie along `segments`, creating
/// scaffolding nodes for intermediate segments as needed. The mutation's
/// payload lands on the node for the last segment only.
pub fn merge_mutation_into_cache(cache: &mut CacheRoot, segments: &[String], mutation: &Mutation) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };
    if segment.is_empty() {
        return;
    }

    let node = cache
        .entry(segment.clone())
        .or_insert_with(|| CacheNode::new(segment));
    if rest.is_empty() {
        node.apply(mutation);
    }
    merge_mutation_into_cache(&mut node.nested, rest, mutation);
}

fn flush(node: &mut CacheNode) {
    node.shadow = Rc::default();
}

/// Resets `node`'s shadow overlay and those of its immediate children.
/// Grandchildren of `node` are left untouched; the flush is two levels deep
/// by contract and observable resolution results depend on it staying so.
pub fn flush_nested(node: &mut CacheNode) {
    node.shadow = Rc::default();
    for child in node.nested.values_mut() {
        flush(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_pathname;
    use serde_json::{json, Value};

    fn bag(value: Value) -> Rc<Bag> {
        Rc::new(value.as_object().cloned().unwrap_or_default())
    }

    fn persist_add(scope: &str, value: Value) -> Mutation {
        Mutation {
            scope: Some(scope.to_string()),
            persist: true,
            add: Some(bag(value)),
            remove: None,
        }
    }

    fn apply(cache: &mut CacheRoot, mutation: &Mutation) {
        let scope = mutation.scope.clone().unwrap_or_default();
        let segments = parse_pathname(&scope).unwrap();
        merge_mutation_into_cache(cache, &segments, mutation);
    }

    #[test]
    fn test_scaffolding_nodes_stay_unmutated() {
        let mut cache = CacheRoot::new();
        apply(&mut cache, &persist_add("/a/b/c", json!({"x": 1})));

        let a = &cache["a"];
        let b = &a.nested["b"];
        let c = &b.nested["c"];
        assert!(!a.mutated);
        assert!(!b.mutated);
        assert!(c.mutated);
        assert_eq!(Value::Object((*c.persisted).clone()), json!({"x": 1}));
    }

    #[test]
    fn test_shadow_mutation_targets_shadow_bag() {
        let mut cache = CacheRoot::new();
        let mutation = Mutation {
            scope: Some("/a".to_string()),
            persist: false,
            add: Some(bag(json!({"page": 1}))),
            remove: None,
        };
        apply(&mut cache, &mutation);

        let a = &cache["a"];
        assert!(a.persisted.is_empty());
        assert_eq!(Value::Object((*a.shadow).clone()), json!({"page": 1}));
    }

    #[test]
    fn test_remove_applies_before_add() {
        let mut cache = CacheRoot::new();
        apply(&mut cache, &persist_add("/a", json!({"sort": ["asc", "desc"]})));

        let mutation = Mutation {
            scope: Some("/a".to_string()),
            persist: true,
            add: Some(bag(json!({"sort": ["rank"]}))),
            remove: Some(bag(json!({"sort": ["asc"]}))),
        };
        apply(&mut cache, &mutation);

        assert_eq!(
            Value::Object((*cache["a"].persisted).clone()),
            json!({"sort": ["desc", "rank"]})
        );
    }

    #[test]
    fn test_mutation_flushes_children_and_grandchildren_only() {
        let mut cache = CacheRoot::new();
        let shadow = |scope: &str| Mutation {
            scope: Some(scope.to_string()),
            persist: false,
            add: Some(bag(json!({"page": 1}))),
            remove: None,
        };
        apply(&mut cache, &shadow("/a/b"));
        apply(&mut cache, &shadow("/a/b/c"));
        apply(&mut cache, &shadow("/a/b/c/d"));

        // A mutation landing on /a flushes b (child) and c (grandchild),
        // but d keeps its shadow overlay.
        apply(&mut cache, &persist_add("/a", json!({"x": 1})));

        let b = &cache["a"].nested["b"];
        let c = &b.nested["c"];
        let d = &c.nested["d"];
        assert!(b.shadow.is_empty());
        assert!(c.shadow.is_empty());
        assert!(!d.shadow.is_empty());
    }

    #[test]
    fn test_persisted_bags_survive_flush() {
        let mut cache = CacheRoot::new();
        apply(&mut cache, &persist_add("/a/b", json!({"keep": 1})));
        apply(&mut cache, &persist_add("/a", json!({"x": 1})));

        let b = &cache["a"].nested["b"];
        assert_eq!(Value::Object((*b.persisted).clone()), json!({"keep": 1}));
    }

    #[test]
    fn test_empty_segment_stops_the_walk() {
        let mut cache = CacheRoot::new();
        apply(&mut cache, &persist_add("/a/", json!({"x": 1})));

        // The payload would land on the empty trailing segment, which the
        // walk never reaches; only scaffolding for "a" is created.
        let a = &cache["a"];
        assert!(!a.mutated);
        assert!(a.persisted.is_empty());
        assert!(a.nested.is_empty());
    }

    #[test]
    fn test_node_dump_excludes_shadow() {
        let mut cache = CacheRoot::new();
        apply(&mut cache, &persist_add("/a", json!({"x": 1})));
        let mutation = Mutation {
            scope: Some("/a".to_string()),
            persist: false,
            add: Some(bag(json!({"page": 1}))),
            remove: None,
        };
        apply(&mut cache, &mutation);

        let dump = serde_json::to_value(&cache).unwrap();
        assert_eq!(dump["a"]["persisted"], json!({"x": 1}));
        assert!(dump["a"].get("shadow").is_none());
    }
}
