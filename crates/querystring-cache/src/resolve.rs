//! Read-side resolution: collect the applicable overlay chain for a path
//! and fold it into a single parameter bag.

use std::rc::Rc;

use querystring_cache_merge::Bag;

use crate::cache::{CacheNode, CacheRoot, Mutation};
use crate::query::{add_query_params, remove_query_params};
use crate::WILDCARD_SCOPE;

/// Walks `segments` from the root and appends every applicable node to
/// `destination`, outermost first. At each depth the wildcard node comes
/// before the exact node, and only mutated nodes are collected. The walk
/// stops at the first depth with no exact node; shorter chains are valid.
pub fn pick_branch_from_cache<'c>(
    cache: &'c CacheRoot,
    segments: &[String],
    destination: &mut Vec<&'c CacheNode>,
) {
    let Some((segment, rest)) = segments.split_first() else {
        return;
    };
    if segment.is_empty() {
        return;
    }

    if let Some(wildcard) = cache.get(WILDCARD_SCOPE) {
        if wildcard.mutated {
            destination.push(wildcard);
        }
    }
    if let Some(node) = cache.get(segment) {
        if node.mutated {
            destination.push(node);
        }
        pick_branch_from_cache(&node.nested, rest, destination);
    }
}

thread_local! {
    // Stable identity for the fold seed, so that resolving an unchanged
    // branch repeatedly hits the memoized merges instead of recomputing.
    static EMPTY_PARAMS: Rc<Bag> = Rc::default();
}

/// Combined overlay view of one node: shadow keys first, persisted keys
/// override. When one of the bags is empty the other is returned as-is,
/// keeping a stable identity for unchanged nodes across resolutions.
fn node_overlay(node: &CacheNode) -> Rc<Bag> {
    if node.shadow.is_empty() {
        return Rc::clone(&node.persisted);
    }
    if node.persisted.is_empty() {
        return Rc::clone(&node.shadow);
    }
    let mut combined = (*node.shadow).clone();
    for (key, value) in node.persisted.iter() {
        combined.insert(key.clone(), value.clone());
    }
    Rc::new(combined)
}

/// Folds the overlay chain for `segments` into one bag, then applies each
/// one-off mutation's `remove` and `add` (in that order) to the running
/// result. Nothing is written back into the trie.
///
/// Within a node, persisted keys override shadow keys; across nodes, deeper
/// nodes override outer ones (sequences append instead).
pub fn resolve_query_params(
    cache: &CacheRoot,
    segments: &[String],
    mutations: &[Mutation],
) -> Rc<Bag> {
    let mut branch = Vec::new();
    pick_branch_from_cache(cache, segments, &mut branch);

    let mut query_params = EMPTY_PARAMS.with(Rc::clone);
    for node in branch {
        query_params = add_query_params(&query_params, &node_overlay(node));
    }

    for mutation in mutations {
        if let Some(remove) = &mutation.remove {
            query_params = remove_query_params(&query_params, remove);
        }
        if let Some(add) = &mutation.add {
            query_params = add_query_params(&query_params, add);
        }
    }

    query_params
}
