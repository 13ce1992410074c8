/*
 * statement.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Parsed template invocations, before resolution.
//!
//! A [`Statement`] is what the parser emits for `{{key ...}}`,
//! `{{#key ...}}...{{/key}}`, and `<div {{key ...}}>`. It records the form it
//! was written in, the key and its dotted path, and its unevaluated arguments.

use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::template::TemplateId;
use crate::value::Value;

/// A dotted property path, e.g. `model.isActive`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PathReference {
    pub parts: Vec<String>,
}

impl PathReference {
    pub fn new(path: &str) -> Self {
        Self {
            parts: path.split('.').map(str::to_string).collect(),
        }
    }

    /// The final segment, i.e. the bound property name.
    pub fn property_name(&self) -> Option<&str> {
        self.parts.last().map(String::as_str)
    }
}

/// A sub-expression invoking a helper, e.g. `(concat a b)`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HelperCall {
    pub path: Vec<String>,
    #[serde(default)]
    pub args: Args,
}

/// An unevaluated argument.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Arg {
    /// A literal known at compile time.
    Value { value: Value },
    /// A property lookup.
    Get(PathReference),
    /// A helper sub-expression.
    Helper(HelperCall),
}

impl Arg {
    pub fn value(value: impl Into<Value>) -> Self {
        Arg::Value {
            value: value.into(),
        }
    }

    pub fn get(path: &str) -> Self {
        Arg::Get(PathReference::new(path))
    }

    pub fn helper(name: &str, args: Args) -> Self {
        Arg::Helper(HelperCall {
            path: name.split('.').map(str::to_string).collect(),
            args,
        })
    }

    /// The literal, if this argument is one.
    pub fn as_literal(&self) -> Option<&Value> {
        match self {
            Arg::Value { value } => Some(value),
            _ => None,
        }
    }
}

/// Named arguments. Keys are unique; order is not significant.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(transparent)]
pub struct NamedArgs {
    entries: FxHashMap<String, Arg>,
}

impl NamedArgs {
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn at(&self, name: &str) -> Option<&Arg> {
        self.entries.get(name)
    }

    /// Add an argument, replacing any existing one with the same name.
    pub fn add(&mut self, name: impl Into<String>, arg: Arg) {
        self.entries.insert(name.into(), arg);
    }

    pub fn remove(&mut self, name: &str) -> Option<Arg> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Argument names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Positional and named arguments of a statement.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct Args {
    pub positional: Vec<Arg>,
    pub named: NamedArgs,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_positional(mut self, arg: Arg) -> Self {
        self.positional.push(arg);
        self
    }

    pub fn with_named(mut self, name: impl Into<String>, arg: Arg) -> Self {
        self.named.add(name, arg);
        self
    }
}

/// Blocks passed to a block statement: the main block and the `{{else}}` block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ChildTemplates {
    pub default: Option<TemplateId>,
    pub inverse: Option<TemplateId>,
}

/// The template module that contains a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct ParentMeta {
    pub module_name: String,
}

impl ParentMeta {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
        }
    }

    /// The registry source identifier, `template:{module_name}`.
    pub fn source(&self) -> String {
        format!("template:{}", self.module_name)
    }
}

/// How a statement was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementForm {
    /// `{{key ...}}`
    Inline,
    /// `{{#key ...}}...{{/key}}`
    Block,
    /// `<div {{key ...}}>`
    Modifier,
}

/// A parsed invocation awaiting resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// The key is a single path segment (no dots).
    pub is_simple: bool,
    pub is_inline: bool,
    pub is_block: bool,
    pub is_modifier: bool,
    pub key: String,
    pub path: Vec<String>,
    pub args: Args,
    pub templates: Option<ChildTemplates>,
}

impl Statement {
    /// Create a statement for `key` written in `form`.
    pub fn new(key: impl Into<String>, form: StatementForm) -> Self {
        let key = key.into();
        let path: Vec<String> = key.split('.').map(str::to_string).collect();
        Self {
            is_simple: path.len() == 1,
            is_inline: form == StatementForm::Inline,
            is_block: form == StatementForm::Block,
            is_modifier: form == StatementForm::Modifier,
            key,
            path,
            args: Args::default(),
            templates: None,
        }
    }

    pub fn inline(key: impl Into<String>) -> Self {
        Self::new(key, StatementForm::Inline)
    }

    /// A block statement with an empty main block.
    pub fn block(key: impl Into<String>) -> Self {
        let mut statement = Self::new(key, StatementForm::Block);
        statement.templates = Some(ChildTemplates::default());
        statement
    }

    pub fn modifier(key: impl Into<String>) -> Self {
        Self::new(key, StatementForm::Modifier)
    }

    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    pub fn with_positional(mut self, arg: Arg) -> Self {
        self.args.positional.push(arg);
        self
    }

    pub fn with_named(mut self, name: impl Into<String>, arg: Arg) -> Self {
        self.args.named.add(name, arg);
        self
    }

    pub fn with_templates(mut self, templates: ChildTemplates) -> Self {
        self.templates = Some(templates);
        self
    }

    /// The form this statement was written in.
    pub fn form(&self) -> StatementForm {
        if self.is_block {
            StatementForm::Block
        } else if self.is_modifier {
            StatementForm::Modifier
        } else {
            StatementForm::Inline
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_statement_forms() {
        let inline = Statement::inline("user-card");
        assert!(inline.is_simple && inline.is_inline && !inline.is_block);
        assert_eq!(inline.path, vec!["user-card".to_string()]);

        let block = Statement::block("each");
        assert!(block.is_block);
        assert_eq!(block.form(), StatementForm::Block);
        assert!(block.templates.is_some());

        let dotted = Statement::inline("model.title");
        assert!(!dotted.is_simple);
        assert_eq!(dotted.path, vec!["model".to_string(), "title".to_string()]);
    }

    #[test]
    fn test_named_args_replace() {
        let mut named = NamedArgs::default();
        named.add("class", Arg::get("isActive"));
        named.add("class", Arg::value("big"));
        assert_eq!(named.len(), 1);
        assert_eq!(named.at("class").and_then(Arg::as_literal), Some(&Value::from("big")));
    }

    #[test]
    fn test_path_reference_property_name() {
        let reference = PathReference::new("model.post.isPublished");
        assert_eq!(reference.property_name(), Some("isPublished"));
    }

    #[test]
    fn test_parent_meta_source() {
        assert_eq!(ParentMeta::new("app/templates/index").source(), "template:app/templates/index");
    }

    #[test]
    fn test_deserialize_args() {
        let args: Args = serde_json::from_str(
            r#"{
                "positional": [{"kind": "get", "parts": ["model", "name"]}],
                "named": {
                    "type": {"kind": "value", "value": "checkbox"},
                    "label": {"kind": "helper", "path": ["concat"], "args": {"positional": [{"kind": "value", "value": 1}]}}
                }
            }"#,
        )
        .unwrap();

        assert_eq!(args.positional, vec![Arg::get("model.name")]);
        assert_eq!(args.named.at("type"), Some(&Arg::value("checkbox")));
        assert_eq!(
            args.named.at("label"),
            Some(&Arg::helper("concat", Args::new().with_positional(Arg::value(1))))
        );
    }
}
