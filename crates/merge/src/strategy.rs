//! Array-aware conflict resolvers for the deep merge.

use serde_json::Value;

/// Union-append resolver: two sequences concatenate (old first, duplicates
/// preserved), anything else is overwritten by the incoming value.
pub fn add_strategy(old: Option<&Value>, new: &Value, _key: &str) -> Value {
    if let (Some(Value::Array(existing)), Value::Array(incoming)) = (old, new) {
        let mut joined = Vec::with_capacity(existing.len() + incoming.len());
        joined.extend(existing.iter().cloned());
        joined.extend(incoming.iter().cloned());
        return Value::Array(joined);
    }
    new.clone()
}

/// Filtered-exclusion resolver: two sequences keep the elements of the old
/// one that do not appear in the new one, order preserved.
///
/// When either side is not a sequence the incoming value is returned as-is,
/// so a "remove" on a non-sequence field overwrites it rather than deleting
/// it. Callers rely on this exact behavior.
pub fn remove_strategy(old: Option<&Value>, new: &Value, _key: &str) -> Value {
    if let (Some(Value::Array(existing)), Value::Array(excluded)) = (old, new) {
        return Value::Array(
            existing
                .iter()
                .filter(|item| !excluded.contains(item))
                .cloned()
                .collect(),
        );
    }
    new.clone()
}
