//! Shallow and deep merge with a pluggable per-key conflict resolver.

use std::borrow::Cow;

use serde_json::{Map, Value};
use thiserror::Error;

/// A plain key-value mapping of query parameters. Key iteration order is
/// insertion order.
pub type Bag = Map<String, Value>;

/// Per-key conflict resolver: receives the current value (if any), the
/// incoming value, and the key, and produces the value to store.
pub type Resolver<'a> = &'a dyn Fn(Option<&Value>, &Value, &str) -> Value;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("merge target is not a plain object bag")]
    TargetNotObject,
}

/// Merges one or more patches into `target`, shallowly.
///
/// `target` must be an object value. Non-object entries in `patches` are
/// skipped. For each key of each patch the resolver output (or the raw patch
/// value when no resolver is given) replaces the current value whenever the
/// key is absent or the output differs from it.
///
/// Returns [`Cow::Borrowed`] when no key changed, so callers can detect
/// no-op merges by identity.
///
/// # Examples
///
/// ```
/// use std::borrow::Cow;
/// use querystring_cache_merge::merge;
/// use serde_json::json;
///
/// let target = json!({"sort": "asc"});
/// let merged = merge(&target, &[json!({"page": 1})], None).unwrap();
/// assert_eq!(*merged, json!({"sort": "asc", "page": 1}));
///
/// let unchanged = merge(&target, &[json!({"sort": "asc"})], None).unwrap();
/// assert!(matches!(unchanged, Cow::Borrowed(_)));
/// ```
pub fn merge<'a>(
    target: &'a Value,
    patches: &[Value],
    resolver: Option<Resolver<'_>>,
) -> Result<Cow<'a, Value>, MergeError> {
    let Value::Object(target_map) = target else {
        return Err(MergeError::TargetNotObject);
    };
    let patch_maps: Vec<&Bag> = patches.iter().filter_map(Value::as_object).collect();
    Ok(match merge_objects(target_map, &patch_maps, resolver) {
        Cow::Borrowed(_) => Cow::Borrowed(target),
        Cow::Owned(map) => Cow::Owned(Value::Object(map)),
    })
}

/// Like [`merge`], except that when both the current and incoming values for
/// a key are objects the merge recurses into them with the same resolver.
pub fn merge_deep<'a>(
    target: &'a Value,
    patch: &Value,
    resolver: Option<Resolver<'_>>,
) -> Result<Cow<'a, Value>, MergeError> {
    let Value::Object(target_map) = target else {
        return Err(MergeError::TargetNotObject);
    };
    let Some(patch_map) = patch.as_object() else {
        return Ok(Cow::Borrowed(target));
    };
    Ok(match merge_objects_deep(target_map, patch_map, resolver) {
        Cow::Borrowed(_) => Cow::Borrowed(target),
        Cow::Owned(map) => Cow::Owned(Value::Object(map)),
    })
}

/// Object-level worker behind [`merge`]. Infallible: the bag types already
/// guarantee a plain mapping on both sides.
pub fn merge_objects<'a>(
    target: &'a Bag,
    patches: &[&Bag],
    resolver: Option<Resolver<'_>>,
) -> Cow<'a, Bag> {
    let mut merged: Cow<'a, Bag> = Cow::Borrowed(target);

    for patch in patches {
        for (key, incoming) in patch.iter() {
            let existing = merged.get(key);
            let resolved = match resolver {
                Some(resolve) => resolve(existing, incoming, key),
                None => incoming.clone(),
            };
            let changed = match existing {
                Some(current) => *current != resolved,
                None => true,
            };
            if changed {
                merged.to_mut().insert(key.clone(), resolved);
            }
        }
    }

    merged
}

/// Object-level worker behind [`merge_deep`].
pub fn merge_objects_deep<'a>(
    target: &'a Bag,
    patch: &Bag,
    resolver: Option<Resolver<'_>>,
) -> Cow<'a, Bag> {
    let deep = |old: Option<&Value>, new: &Value, key: &str| -> Value {
        if let (Some(Value::Object(old_map)), Value::Object(new_map)) = (old, new) {
            return Value::Object(merge_objects_deep(old_map, new_map, resolver).into_owned());
        }
        match resolver {
            Some(resolve) => resolve(old, new, key),
            None => new.clone(),
        }
    };
    merge_objects(target, &[patch], Some(&deep))
}
