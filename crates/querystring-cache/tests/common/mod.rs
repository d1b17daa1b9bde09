use querystring_cache::{Bag, Mutation, StoreOptions};
use serde_json::Value;
use std::rc::Rc;

/// Minimal deterministic query-string codec for tests: scalars render as
/// `key=value`, sequences as repeated keys, in bag order.
pub fn test_options() -> StoreOptions {
    StoreOptions::new(parse_query_string, stringify_query_params)
}

pub fn parse_query_string(raw: &str) -> Bag {
    let mut bag = Bag::new();
    for pair in raw.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        bag.insert(key.to_string(), Value::String(value.to_string()));
    }
    bag
}

pub fn stringify_query_params(params: &Bag) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        match value {
            Value::Array(items) => {
                for item in items {
                    pairs.push(format!("{key}={}", scalar(item)));
                }
            }
            other => pairs.push(format!("{key}={}", scalar(other))),
        }
    }
    pairs.join("&")
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn bag(value: Value) -> Rc<Bag> {
    Rc::new(value.as_object().cloned().unwrap_or_default())
}

pub fn persisted_add(scope: &str, add: Value) -> Mutation {
    Mutation {
        scope: Some(scope.to_string()),
        persist: true,
        add: Some(bag(add)),
        remove: None,
    }
}

pub fn shadow_add(scope: &str, add: Value) -> Mutation {
    Mutation {
        scope: Some(scope.to_string()),
        persist: false,
        add: Some(bag(add)),
        remove: None,
    }
}
