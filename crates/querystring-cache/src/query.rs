//! Memoized add/remove mutators over shared query-parameter bags.
//!
//! The resolver re-merges the same `(bag, patch)` pairs on every resolution
//! call, so both mutators are referentially memoized: pointer-identical
//! inputs return the pointer-identical cached output. Copy-on-write keeps
//! the caches coherent without eviction, since a changed bag always lives at
//! a new address and the cached inputs are retained so an address can never
//! be recycled into a colliding key.

use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::thread::LocalKey;

use querystring_cache_merge::{add_strategy, merge_objects_deep, remove_strategy, Bag};
use serde_json::Value;

type StrategyFn = fn(Option<&Value>, &Value, &str) -> Value;

struct MemoEntry {
    // Inputs are kept alive so their heap addresses stay unique for the
    // lifetime of the entry.
    _params: Rc<Bag>,
    _patch: Rc<Bag>,
    merged: Rc<Bag>,
}

type MemoCache = HashMap<(usize, usize), MemoEntry>;

thread_local! {
    static ADD_MEMO: RefCell<MemoCache> = RefCell::new(HashMap::new());
    static REMOVE_MEMO: RefCell<MemoCache> = RefCell::new(HashMap::new());
}

fn mutate_query_params(
    memo: &'static LocalKey<RefCell<MemoCache>>,
    strategy: StrategyFn,
    params: &Rc<Bag>,
    patch: &Rc<Bag>,
) -> Rc<Bag> {
    let key = (Rc::as_ptr(params) as usize, Rc::as_ptr(patch) as usize);
    let hit = memo.with(|cache| cache.borrow().get(&key).map(|entry| Rc::clone(&entry.merged)));
    if let Some(merged) = hit {
        return merged;
    }

    let merged = match merge_objects_deep(params, patch, Some(&strategy)) {
        Cow::Borrowed(_) => Rc::clone(params),
        Cow::Owned(bag) => Rc::new(bag),
    };
    memo.with(|cache| {
        cache.borrow_mut().insert(
            key,
            MemoEntry {
                _params: Rc::clone(params),
                _patch: Rc::clone(patch),
                merged: Rc::clone(&merged),
            },
        );
    });

    merged
}

/// Deep add-merge of `patch` into `params`: sequences append, everything
/// else is overwritten. Returns `params` itself when nothing changed.
pub fn add_query_params(params: &Rc<Bag>, patch: &Rc<Bag>) -> Rc<Bag> {
    mutate_query_params(&ADD_MEMO, add_strategy, params, patch)
}

/// Deep remove-merge of `patch` from `params`: sequence elements named by
/// the patch are excluded, non-sequence fields are overwritten. Returns
/// `params` itself when nothing changed.
pub fn remove_query_params(params: &Rc<Bag>, patch: &Rc<Bag>) -> Rc<Bag> {
    mutate_query_params(&REMOVE_MEMO, remove_strategy, params, patch)
}
