/*
 * iterable.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Keyed iteration for `{{#each}}` and `{{#each-in}}`.
//!
//! The renderer diffs list items between renders by key. The `key=` argument
//! picks how keys are derived:
//!
//! - `@index`: the item's position
//! - `@identity` or no `key=`: the item's value
//! - anything else: a dotted property path into each item
//!
//! Keys are made unique within one pass by suffixing repeats.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::reference::ReferenceRef;
use crate::value::Value;

/// How iteration keys are derived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyStrategy {
    Index,
    Identity,
    Path(Vec<String>),
}

impl KeyStrategy {
    /// Strategy for the value of a `key=` argument.
    pub fn from_key(key: Option<&str>) -> Self {
        match key {
            Some("@index") => KeyStrategy::Index,
            None | Some("") | Some("@identity") => KeyStrategy::Identity,
            Some(path) => KeyStrategy::Path(path.split('.').map(str::to_string).collect()),
        }
    }

    fn key_for(&self, position: usize, value: &Value) -> String {
        match self {
            KeyStrategy::Index => position.to_string(),
            KeyStrategy::Identity => value.identity_key(),
            KeyStrategy::Path(path) => value
                .get_path(path)
                .map(Value::to_display_string)
                .unwrap_or_default(),
        }
    }
}

/// One item of an iteration pass.
#[derive(Debug, Clone, PartialEq)]
pub struct IterationItem {
    pub key: String,
    /// The position for lists, the entry key for maps.
    pub memo: Value,
    pub value: Value,
}

/// A keyed view over a reference to a list or map.
pub struct Iterable {
    reference: ReferenceRef,
    strategy: KeyStrategy,
}

impl Iterable {
    pub fn new(reference: ReferenceRef, strategy: KeyStrategy) -> Self {
        Self {
            reference,
            strategy,
        }
    }

    pub fn strategy(&self) -> &KeyStrategy {
        &self.strategy
    }

    /// Read the reference and key every item.
    ///
    /// Values that are neither lists nor maps iterate as empty.
    pub fn items(&self) -> Vec<IterationItem> {
        let entries: Vec<(Value, Value)> = match self.reference.value() {
            Value::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(position, item)| (Value::Number(position as f64), item))
                .collect(),
            Value::Map(entries) => entries
                .into_iter()
                .map(|(key, value)| (Value::String(key), value))
                .collect(),
            _ => Vec::new(),
        };

        let mut keys = UniqueKeys::default();
        entries
            .into_iter()
            .enumerate()
            .map(|(position, (memo, value))| {
                let key = keys.issue(self.strategy.key_for(position, &value));
                IterationItem { key, memo, value }
            })
            .collect()
    }
}

/// Hands out keys that are unique within one pass over the items.
///
/// A repeated key gets a `-{n}` suffix, bumped past any key already issued,
/// so a natural key such as `x-2` can never collide with a generated one.
#[derive(Default)]
struct UniqueKeys {
    issued: FxHashSet<String>,
    repeats: FxHashMap<String, usize>,
}

impl UniqueKeys {
    fn issue(&mut self, base: String) -> String {
        if self.issued.insert(base.clone()) {
            return base;
        }
        let count = self.repeats.entry(base.clone()).or_insert(1);
        loop {
            *count += 1;
            let candidate = format!("{base}-{count}");
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

impl fmt::Debug for Iterable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iterable")
            .field("strategy", &self.strategy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ConstReference;
    use pretty_assertions::assert_eq;

    fn keys(value: &str, key: Option<&str>) -> Vec<String> {
        let value: Value = serde_json::from_str(value).unwrap();
        Iterable::new(ConstReference::create(value), KeyStrategy::from_key(key))
            .items()
            .into_iter()
            .map(|item| item.key)
            .collect()
    }

    #[test]
    fn test_strategy_from_key() {
        assert_eq!(KeyStrategy::from_key(None), KeyStrategy::Identity);
        assert_eq!(KeyStrategy::from_key(Some("@identity")), KeyStrategy::Identity);
        assert_eq!(KeyStrategy::from_key(Some("@index")), KeyStrategy::Index);
        assert_eq!(
            KeyStrategy::from_key(Some("author.id")),
            KeyStrategy::Path(vec!["author".to_string(), "id".to_string()])
        );
    }

    #[test]
    fn test_index_keys() {
        assert_eq!(keys(r#"["a", "a", "b"]"#, Some("@index")), vec!["0", "1", "2"]);
    }

    #[test]
    fn test_identity_keys_deduplicated() {
        assert_eq!(
            keys(r#"["a", "a", 1]"#, None),
            vec!["s:a".to_string(), "s:a-2".to_string(), "n:1".to_string()]
        );
    }

    #[test]
    fn test_suffixed_keys_skip_natural_keys() {
        assert_eq!(
            keys(r#"[{"id": "x"}, {"id": "x"}, {"id": "x-2"}]"#, Some("id")),
            vec!["x", "x-2", "x-2-2"]
        );
        assert_eq!(
            keys(r#"[{"id": "x-2"}, {"id": "x"}, {"id": "x"}, {"id": "x"}]"#, Some("id")),
            vec!["x-2", "x", "x-3", "x-4"]
        );
    }

    #[test]
    fn test_path_keys() {
        assert_eq!(
            keys(r#"[{"id": 7, "title": "x"}, {"id": 9}, {"title": "no id"}]"#, Some("id")),
            vec!["7", "9", ""]
        );
    }

    #[test]
    fn test_map_entries() {
        let value: Value = serde_json::from_str(r#"{"b": 2, "a": 1}"#).unwrap();
        let items = Iterable::new(ConstReference::create(value), KeyStrategy::Index).items();
        assert_eq!(items[0].memo, Value::from("a"));
        assert_eq!(items[0].value, Value::from(1));
        assert_eq!(items[1].memo, Value::from("b"));
    }

    #[test]
    fn test_scalars_are_empty() {
        assert!(keys("null", None).is_empty());
        assert!(keys("\"text\"", None).is_empty());
    }
}
