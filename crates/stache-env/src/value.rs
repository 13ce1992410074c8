/*
 * value.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Runtime values produced by references and helpers.

use std::collections::BTreeMap;

use serde::Deserialize;

/// A string that has been marked as safe to insert without escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeString(String);

impl SafeString {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An action created by the `action` helper: the action name plus any
/// arguments curried into it.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionValue {
    pub name: String,
    pub curried: Vec<Value>,
}

/// A value flowing through the template at render time.
///
/// Deserializes from plain JSON-like data; safe strings and actions only
/// arise at runtime.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// A null/missing value.
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    #[serde(skip)]
    Safe(SafeString),
    #[serde(skip)]
    Action(ActionValue),
}

impl Value {
    /// Truthiness for conditionals.
    ///
    /// Falsy: `null`, `false`, `0`, `NaN`, the empty string, the empty list.
    /// Everything else, including every map, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Safe(s) => !s.as_str().is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(_) | Value::Action(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value was explicitly marked safe.
    pub fn is_safe(&self) -> bool {
        matches!(self, Value::Safe(_))
    }

    /// The text of a string or safe string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::Safe(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get a nested field by path.
    ///
    /// An empty path returns the value itself.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<&Value> {
        let Some((first, rest)) = path.split_first() else {
            return Some(self);
        };
        match self {
            Value::Map(m) => m.get(first.as_ref()).and_then(|v| v.get_path(rest)),
            _ => None,
        }
    }

    /// Render this value as text.
    ///
    /// - Null: ""
    /// - Numbers with no fractional part print without a decimal point
    /// - Lists: elements joined with ","
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Safe(s) => s.as_str().to_string(),
            Value::List(items) => items
                .iter()
                .map(Value::to_display_string)
                .collect::<Vec<_>>()
                .join(","),
            Value::Map(_) => "[object]".to_string(),
            Value::Action(action) => format!("[action {}]", action.name),
        }
    }

    /// A string that is equal for equal values and tagged by type, so that
    /// `1` and `"1"` differ.
    pub fn identity_key(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => format!("b:{b}"),
            Value::Number(n) => format!("n:{}", format_number(*n)),
            Value::String(s) => format!("s:{s}"),
            Value::Safe(s) => format!("s:{}", s.as_str()),
            other => format!("o:{other:?}"),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<SafeString> for Value {
    fn from(s: SafeString) -> Self {
        Value::Safe(s)
    }
}

impl<V: Into<Value>> From<Vec<V>> for Value {
    fn from(items: Vec<V>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Bool(true).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(Value::Number(-1.0).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::from("false").is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::from(vec![false]).is_truthy());
        assert!(Value::Map(BTreeMap::new()).is_truthy());
    }

    #[test]
    fn test_get_path() {
        let value: Value = serde_json::from_str(r#"{"user": {"name": "Tom"}}"#).unwrap();
        assert_eq!(value.get_path(&["user", "name"]), Some(&Value::from("Tom")));
        assert_eq!(value.get_path(&["user", "age"]), None);
        assert_eq!(value.get_path::<&str>(&[]), Some(&value));
    }

    #[test]
    fn test_display_string() {
        assert_eq!(Value::Number(3.0).to_display_string(), "3");
        assert_eq!(Value::Number(2.5).to_display_string(), "2.5");
        assert_eq!(Value::Null.to_display_string(), "");
        assert_eq!(Value::from(vec!["a", "b"]).to_display_string(), "a,b");
        assert_eq!(
            Value::Safe(SafeString::new("<b>")).to_display_string(),
            "<b>"
        );
    }

    #[test]
    fn test_identity_key_distinguishes_types() {
        assert_ne!(Value::from(1).identity_key(), Value::from("1").identity_key());
        assert_eq!(Value::from("a").identity_key(), Value::from("a").identity_key());
    }

    #[test]
    fn test_deserialize_untagged() {
        let value: Value = serde_json::from_str(r#"[null, true, 4, "x"]"#).unwrap();
        assert_eq!(
            value,
            Value::List(vec![
                Value::Null,
                Value::Bool(true),
                Value::Number(4.0),
                Value::from("x"),
            ])
        );
    }
}
