/*
 * builtins.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Helpers provided by the environment itself.
//!
//! User registrations may not reuse any of these names.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::{Helper, InternalHelper};
use crate::reference::{
    ConstReference, EvaluatedArgs, NamedValues, ReferenceRef, SimpleHelperReference,
};
use crate::value::{ActionValue, Value};

/// Name of the helper `class=` bindings are rewritten to.
pub const CLASS_HELPER: &str = "-class";

type ComputeFn = fn(&[Value], &NamedValues) -> Value;

/// A built-in backed by a plain function of the argument values.
struct Computed(ComputeFn);

impl InternalHelper for Computed {
    fn to_reference(&self, args: EvaluatedArgs) -> ReferenceRef {
        SimpleHelperReference::create(Rc::new(self.0), args)
    }
}

/// Hands the first positional reference straight back, so writes and later
/// reads go to the caller's reference.
struct PassThrough;

impl InternalHelper for PassThrough {
    fn to_reference(&self, args: EvaluatedArgs) -> ReferenceRef {
        match args.positional.first() {
            Some(reference) => Rc::clone(reference),
            None => ConstReference::create(Value::Null),
        }
    }
}

/// Freezes the first positional argument at its current value.
struct Unbound;

impl InternalHelper for Unbound {
    fn to_reference(&self, args: EvaluatedArgs) -> ReferenceRef {
        let value = args
            .positional
            .first()
            .map(|reference| reference.value())
            .unwrap_or_default();
        ConstReference::create(value)
    }
}

/// The built-in helper table.
pub fn table() -> FxHashMap<&'static str, Helper> {
    let mut table = FxHashMap::default();
    table.insert("if", computed(inline_if));
    table.insert("unless", computed(inline_unless));
    table.insert("action", computed(action));
    table.insert("concat", computed(concat));
    table.insert("get", computed(get));
    table.insert("hash", computed(hash));
    table.insert("loc", computed(loc));
    table.insert("log", computed(log));
    table.insert("mut", Helper::Internal(Rc::new(PassThrough)));
    table.insert("query-params", computed(query_params));
    table.insert("readonly", Helper::Internal(Rc::new(PassThrough)));
    table.insert("unbound", Helper::Internal(Rc::new(Unbound)));
    table.insert(CLASS_HELPER, computed(class));
    table.insert("-each-in", Helper::Internal(Rc::new(PassThrough)));
    table.insert("-input-type", computed(input_type));
    table.insert("-normalize-class", computed(normalize_class));
    table
}

fn computed(compute: ComputeFn) -> Helper {
    Helper::Internal(Rc::new(Computed(compute)))
}

fn arg(positional: &[Value], index: usize) -> Value {
    positional.get(index).cloned().unwrap_or_default()
}

fn inline_if(positional: &[Value], _named: &NamedValues) -> Value {
    if arg(positional, 0).is_truthy() {
        arg(positional, 1)
    } else {
        arg(positional, 2)
    }
}

fn inline_unless(positional: &[Value], _named: &NamedValues) -> Value {
    if arg(positional, 0).is_truthy() {
        arg(positional, 2)
    } else {
        arg(positional, 1)
    }
}

fn action(positional: &[Value], _named: &NamedValues) -> Value {
    match positional.split_first() {
        Some((Value::Action(existing), rest)) => {
            let mut curried = existing.curried.clone();
            curried.extend_from_slice(rest);
            Value::Action(ActionValue {
                name: existing.name.clone(),
                curried,
            })
        }
        Some((name, rest)) => Value::Action(ActionValue {
            name: name.to_display_string(),
            curried: rest.to_vec(),
        }),
        None => Value::Null,
    }
}

fn concat(positional: &[Value], _named: &NamedValues) -> Value {
    Value::String(positional.iter().map(Value::to_display_string).collect())
}

fn get(positional: &[Value], _named: &NamedValues) -> Value {
    let path = arg(positional, 1).to_display_string();
    if path.is_empty() {
        return Value::Null;
    }
    let parts: Vec<&str> = path.split('.').collect();
    arg(positional, 0)
        .get_path(&parts)
        .cloned()
        .unwrap_or_default()
}

fn hash(_positional: &[Value], named: &NamedValues) -> Value {
    Value::Map(named.clone())
}

fn loc(positional: &[Value], _named: &NamedValues) -> Value {
    let template = arg(positional, 0).to_display_string();
    let mut substitutions = positional.iter().skip(1);
    let mut output = String::with_capacity(template.len());
    let mut remaining = template.as_str();
    while let Some(index) = remaining.find("%@") {
        output.push_str(&remaining[..index]);
        if let Some(value) = substitutions.next() {
            output.push_str(&value.to_display_string());
        }
        remaining = &remaining[index + 2..];
    }
    output.push_str(remaining);
    Value::String(output)
}

fn log(positional: &[Value], _named: &NamedValues) -> Value {
    let line = positional
        .iter()
        .map(Value::to_display_string)
        .collect::<Vec<_>>()
        .join(" ");
    tracing::info!(target: "stache::log", "{}", line);
    Value::Null
}

fn query_params(_positional: &[Value], named: &NamedValues) -> Value {
    let mut wrapper = NamedValues::new();
    wrapper.insert("values".to_string(), Value::Map(named.clone()));
    Value::Map(wrapper)
}

/// `(-class value prop falsy)`: `true` yields the dasherized `prop`, `false`
/// the dasherized `falsy`, anything else passes through.
fn class(positional: &[Value], _named: &NamedValues) -> Value {
    match arg(positional, 0) {
        Value::Bool(true) if positional.len() > 1 => {
            Value::String(dasherize(&arg(positional, 1).to_display_string()))
        }
        Value::Bool(false) if positional.len() > 2 => {
            Value::String(dasherize(&arg(positional, 2).to_display_string()))
        }
        Value::Bool(_) => Value::Null,
        other => other,
    }
}

fn normalize_class(positional: &[Value], _named: &NamedValues) -> Value {
    let path = arg(positional, 0).to_display_string();
    let class_name = path.rsplit('.').next().unwrap_or_default();
    match arg(positional, 1) {
        Value::Bool(true) => Value::String(dasherize(class_name)),
        Value::Number(n) if n == 0.0 => Value::from("0"),
        value if !value.is_truthy() => Value::String(String::new()),
        value => Value::String(value.to_display_string()),
    }
}

fn input_type(positional: &[Value], _named: &NamedValues) -> Value {
    if arg(positional, 0).as_str() == Some("checkbox") {
        Value::from("-checkbox")
    } else {
        Value::from("-text-field")
    }
}

/// `isActive` → `is-active`, `inner_html` → `inner-html`.
pub fn dasherize(input: &str) -> String {
    let mut output = String::with_capacity(input.len() + 4);
    let mut previous: Option<char> = None;
    for c in input.chars() {
        if c.is_ascii_uppercase() {
            if previous.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit()) {
                output.push('-');
            }
            output.push(c.to_ascii_lowercase());
        } else if c == '_' || c == ' ' {
            output.push('-');
        } else {
            output.push(c);
        }
        previous = Some(c);
    }
    output
}
