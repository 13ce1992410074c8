/*
 * reference.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! References: handles to values that may change between renders.
//!
//! The renderer evaluates statement arguments into references and hands them
//! to helpers as [`EvaluatedArgs`]. Helper adapters wrap those arguments in
//! references of their own that recompute only when an argument's value
//! changes.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::helpers::ClassHelper;
use crate::value::Value;

/// Named argument values, ordered by name.
pub type NamedValues = BTreeMap<String, Value>;

/// A plain compute function: positional and named argument values in, value out.
pub type HelperCompute = Rc<dyn Fn(&[Value], &NamedValues) -> Value>;

/// A handle to a value that can be re-read.
pub trait Reference {
    /// The current value.
    fn value(&self) -> Value;
}

/// Shared reference handle.
pub type ReferenceRef = Rc<dyn Reference>;

/// A reference whose value never changes.
#[derive(Debug, Clone)]
pub struct ConstReference {
    value: Value,
}

impl ConstReference {
    pub fn create(value: impl Into<Value>) -> ReferenceRef {
        Rc::new(Self {
            value: value.into(),
        })
    }
}

impl Reference for ConstReference {
    fn value(&self) -> Value {
        self.value.clone()
    }
}

/// A reference the owner can point at a new value.
#[derive(Debug, Default)]
pub struct UpdatableReference {
    value: RefCell<Value>,
}

impl UpdatableReference {
    pub fn new(value: impl Into<Value>) -> Rc<Self> {
        Rc::new(Self {
            value: RefCell::new(value.into()),
        })
    }

    /// Replace the current value.
    pub fn update(&self, value: impl Into<Value>) {
        *self.value.borrow_mut() = value.into();
    }
}

impl Reference for UpdatableReference {
    fn value(&self) -> Value {
        self.value.borrow().clone()
    }
}

/// Converts another reference's value to a boolean using template truthiness.
pub struct ConditionalReference {
    inner: ReferenceRef,
}

impl ConditionalReference {
    pub fn create(inner: ReferenceRef) -> ReferenceRef {
        Rc::new(Self { inner })
    }
}

impl Reference for ConditionalReference {
    fn value(&self) -> Value {
        Value::Bool(self.inner.value().is_truthy())
    }
}

/// Evaluated arguments of a helper or modifier invocation.
#[derive(Clone, Default)]
pub struct EvaluatedArgs {
    pub positional: Vec<ReferenceRef>,
    pub named: FxHashMap<String, ReferenceRef>,
}

/// The argument values at one point in time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArgsSnapshot {
    pub positional: Vec<Value>,
    pub named: NamedValues,
}

impl EvaluatedArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn with_positional(mut self, reference: ReferenceRef) -> Self {
        self.positional.push(reference);
        self
    }

    /// Add or replace a named argument.
    pub fn with_named(mut self, name: impl Into<String>, reference: ReferenceRef) -> Self {
        self.named.insert(name.into(), reference);
        self
    }

    /// A named argument's reference.
    pub fn named(&self, name: &str) -> Option<&ReferenceRef> {
        self.named.get(name)
    }

    pub fn positional_values(&self) -> Vec<Value> {
        self.positional.iter().map(|r| r.value()).collect()
    }

    pub fn named_values(&self) -> NamedValues {
        self.named
            .iter()
            .map(|(name, r)| (name.clone(), r.value()))
            .collect()
    }

    /// Read every argument once.
    pub fn snapshot(&self) -> ArgsSnapshot {
        ArgsSnapshot {
            positional: self.positional_values(),
            named: self.named_values(),
        }
    }
}

impl fmt::Debug for EvaluatedArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.snapshot();
        f.debug_struct("EvaluatedArgs")
            .field("positional", &snapshot.positional)
            .field("named", &snapshot.named)
            .finish()
    }
}

/// Last computed value and the arguments it was computed from.
type Memo = RefCell<Option<(ArgsSnapshot, Value)>>;

fn memoized(memo: &Memo, args: &EvaluatedArgs, compute: impl FnOnce(&ArgsSnapshot) -> Value) -> Value {
    let snapshot = args.snapshot();
    if let Some((previous, value)) = memo.borrow().as_ref() {
        if *previous == snapshot {
            return value.clone();
        }
    }
    let value = compute(&snapshot);
    *memo.borrow_mut() = Some((snapshot, value.clone()));
    value
}

/// Wraps a plain compute function; recomputes when argument values change.
pub struct SimpleHelperReference {
    compute: HelperCompute,
    args: EvaluatedArgs,
    last: Memo,
}

impl SimpleHelperReference {
    pub fn create(compute: HelperCompute, args: EvaluatedArgs) -> ReferenceRef {
        Rc::new(Self {
            compute,
            args,
            last: RefCell::new(None),
        })
    }
}

impl Reference for SimpleHelperReference {
    fn value(&self) -> Value {
        memoized(&self.last, &self.args, |snapshot| {
            (self.compute)(&snapshot.positional, &snapshot.named)
        })
    }
}

/// Owns one helper instance created for a single use site; recomputes when
/// argument values change.
pub struct ClassBasedHelperReference {
    instance: RefCell<Box<dyn ClassHelper>>,
    args: EvaluatedArgs,
    last: Memo,
}

impl ClassBasedHelperReference {
    pub fn create(instance: Box<dyn ClassHelper>, args: EvaluatedArgs) -> ReferenceRef {
        Rc::new(Self {
            instance: RefCell::new(instance),
            args,
            last: RefCell::new(None),
        })
    }
}

impl Reference for ClassBasedHelperReference {
    fn value(&self) -> Value {
        memoized(&self.last, &self.args, |snapshot| {
            self.instance
                .borrow_mut()
                .compute(&snapshot.positional, &snapshot.named)
        })
    }
}

impl Drop for ClassBasedHelperReference {
    fn drop(&mut self) {
        self.instance.get_mut().destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_conditional_reference() {
        let source = UpdatableReference::new(vec!["a"]);
        let conditional = ConditionalReference::create(source.clone());
        assert_eq!(conditional.value(), Value::Bool(true));

        source.update(Value::List(vec![]));
        assert_eq!(conditional.value(), Value::Bool(false));
    }

    #[test]
    fn test_simple_helper_recomputes_on_change_only() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let compute: HelperCompute = Rc::new(move |positional, _named| {
            counter.set(counter.get() + 1);
            Value::from(positional[0].to_display_string().to_uppercase())
        });

        let name = UpdatableReference::new("tom");
        let args = EvaluatedArgs::new().with_positional(name.clone());
        let reference = SimpleHelperReference::create(compute, args);

        assert_eq!(reference.value(), Value::from("TOM"));
        assert_eq!(reference.value(), Value::from("TOM"));
        assert_eq!(calls.get(), 1);

        name.update("yehuda");
        assert_eq!(reference.value(), Value::from("YEHUDA"));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_args_snapshot() {
        let args = EvaluatedArgs::new()
            .with_positional(ConstReference::create(1))
            .with_named("b", ConstReference::create("x"))
            .with_named("a", ConstReference::create(true));
        let snapshot = args.snapshot();

        assert_eq!(snapshot.positional, vec![Value::Number(1.0)]);
        assert_eq!(
            snapshot.named.keys().collect::<Vec<_>>(),
            vec!["a", "b"]
        );
    }
}
