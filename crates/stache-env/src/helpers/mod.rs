/*
 * mod.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Helper resolution.
//!
//! A helper is resolved from the built-in table first, then from the registry
//! scoped to the template module that references it, then from the registry
//! without a scope. Resolved helpers come in three shapes, each of which needs
//! its own adapter to turn evaluated arguments into a reference:
//!
//! - [`Helper::Internal`]: builds its reference itself
//! - [`Helper::Instance`]: a plain compute function
//! - [`Helper::Factory`]: creates one helper instance per use site

pub mod builtins;

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{EnvError, EnvResult};
use crate::reference::{
    ClassBasedHelperReference, EvaluatedArgs, HelperCompute, NamedValues, ReferenceRef,
    SimpleHelperReference,
};
use crate::registry::{LookupOptions, Registration, Registry, Specifier};
use crate::statement::ParentMeta;
use crate::value::Value;

/// A helper that constructs its own reference from evaluated arguments.
pub trait InternalHelper {
    fn to_reference(&self, args: EvaluatedArgs) -> ReferenceRef;
}

/// A stateful helper instance. One is created per use site.
pub trait ClassHelper {
    fn compute(&mut self, positional: &[Value], named: &NamedValues) -> Value;

    /// Called when the use site goes away.
    fn destroy(&mut self) {}
}

/// Creates [`ClassHelper`] instances.
pub trait HelperFactory {
    fn create(&self) -> Box<dyn ClassHelper>;
}

/// Adapter produced by [`HelperRegistry::lookup_helper`].
pub type HelperFn = Rc<dyn Fn(EvaluatedArgs) -> ReferenceRef>;

/// The shape of a resolved helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperShape {
    Internal,
    Instance,
    Factory,
}

/// A resolved helper.
#[derive(Clone)]
pub enum Helper {
    Internal(Rc<dyn InternalHelper>),
    Instance(HelperCompute),
    Factory(Rc<dyn HelperFactory>),
}

impl Helper {
    /// Wrap a plain compute function.
    pub fn simple(compute: impl Fn(&[Value], &NamedValues) -> Value + 'static) -> Self {
        Helper::Instance(Rc::new(compute))
    }

    /// Wrap a factory of per-use-site instances.
    pub fn factory(factory: impl HelperFactory + 'static) -> Self {
        Helper::Factory(Rc::new(factory))
    }

    pub fn shape(&self) -> HelperShape {
        match self {
            Helper::Internal(_) => HelperShape::Internal,
            Helper::Instance(_) => HelperShape::Instance,
            Helper::Factory(_) => HelperShape::Factory,
        }
    }

    /// Build the invocation adapter for this helper's shape.
    pub fn into_adapter(self) -> HelperFn {
        match self {
            Helper::Internal(helper) => Rc::new(move |args: EvaluatedArgs| helper.to_reference(args)),
            Helper::Instance(compute) => {
                Rc::new(move |args: EvaluatedArgs| {
                    SimpleHelperReference::create(Rc::clone(&compute), args)
                })
            }
            Helper::Factory(factory) => {
                Rc::new(move |args: EvaluatedArgs| {
                    ClassBasedHelperReference::create(factory.create(), args)
                })
            }
        }
    }
}

impl fmt::Debug for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Helper::{:?}", self.shape())
    }
}

/// Built-in helpers plus registry fallback.
pub struct HelperRegistry {
    registry: Rc<dyn Registry>,
    builtins: FxHashMap<&'static str, Helper>,
}

impl HelperRegistry {
    pub fn new(registry: Rc<dyn Registry>) -> Self {
        Self {
            registry,
            builtins: builtins::table(),
        }
    }

    /// Whether `name` is a built-in helper.
    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    /// Names of every built-in helper, sorted.
    pub fn builtin_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.builtins.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn has_helper(&self, name: &str, parent_meta: Option<&ParentMeta>) -> bool {
        if self.is_builtin(name) {
            return true;
        }
        let specifier = Specifier::helper(name);
        self.registry
            .has_registration(&specifier, &LookupOptions::from_parent_meta(parent_meta))
            || self
                .registry
                .has_registration(&specifier, &LookupOptions::global())
    }

    /// Resolve `name` and build its invocation adapter.
    pub fn lookup_helper(&self, name: &str, parent_meta: Option<&ParentMeta>) -> EnvResult<HelperFn> {
        if let Some(helper) = self.builtins.get(name) {
            return Ok(helper.clone().into_adapter());
        }

        let specifier = Specifier::helper(name);
        let found = self
            .registry
            .lookup(&specifier, &LookupOptions::from_parent_meta(parent_meta))
            .or_else(|| self.registry.lookup(&specifier, &LookupOptions::global()));

        match found {
            Some(Registration::Helper(helper)) => Ok(helper.into_adapter()),
            Some(_) => Err(EnvError::NotAHelper {
                name: name.to_string(),
            }),
            None => Err(EnvError::HelperNotFound {
                name: name.to_string(),
            }),
        }
    }
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperRegistry")
            .field("builtins", &self.builtin_names())
            .finish()
    }
}
