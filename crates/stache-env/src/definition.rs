/*
 * definition.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Component definitions and the definition cache.
//!
//! A component is defined by a class, a layout template, or both. The
//! [`DefinitionCache`] resolves `(name, source)` to a shared
//! [`ComponentDefinition`], collapsing every call site that names the same
//! logical component onto one cache slot.

use std::fmt;
use std::rc::Rc;

use stache_cache::{BoundedCache, CacheStats};

use crate::registry::{LookupOptions, Registration, Registry, Specifier};
use crate::template::TemplateFactory;

/// A user-authored component class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentClass {
    pub name: String,
}

impl ComponentClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// The resolved identity of a component.
#[derive(Debug)]
pub struct ComponentDefinition {
    pub name: String,
    pub component_class: Option<Rc<ComponentClass>>,
    pub layout: Option<Rc<TemplateFactory>>,
}

/// What the registry holds for a component name.
#[derive(Debug, Default)]
pub struct ComponentLookup {
    pub component: Option<Rc<ComponentClass>>,
    pub layout: Option<Rc<TemplateFactory>>,
}

impl ComponentLookup {
    fn is_empty(&self) -> bool {
        self.component.is_none() && self.layout.is_none()
    }
}

fn lookup_pair(registry: &dyn Registry, name: &str, options: &LookupOptions) -> ComponentLookup {
    let component = match registry.lookup(&Specifier::component(name), options) {
        Some(Registration::Component(class)) => Some(class),
        _ => None,
    };
    let layout = match registry.lookup(&Specifier::component_layout(name), options) {
        Some(Registration::Template(factory)) => Some(factory),
        _ => None,
    };
    ComponentLookup { component, layout }
}

/// Look up the class and layout for `name`.
///
/// With a `source`, entries scoped to that source are tried first; if neither
/// a class nor a layout is found there, global entries are used.
pub fn lookup_component(registry: &dyn Registry, name: &str, source: Option<&str>) -> ComponentLookup {
    if let Some(source) = source {
        let local = lookup_pair(registry, name, &LookupOptions::scoped(source));
        if !local.is_empty() {
            return local;
        }
    }
    lookup_pair(registry, name, &LookupOptions::global())
}

/// Raw key of the definition cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DefinitionKey {
    pub name: String,
    /// `template:{module_name}` of the referencing template.
    pub source: Option<String>,
}

/// Memoized component definitions keyed by canonical component name.
///
/// Misses are memoized too: a name that resolves to nothing keeps resolving
/// to nothing without asking the registry again.
pub struct DefinitionCache {
    cache: BoundedCache<DefinitionKey, String, Option<Rc<ComponentDefinition>>>,
}

impl DefinitionCache {
    pub fn new(registry: Rc<dyn Registry>, capacity: usize) -> Self {
        let normalize_registry = Rc::clone(&registry);
        let cache = BoundedCache::new(
            capacity,
            move |key: &DefinitionKey| {
                key.source
                    .as_deref()
                    .and_then(|source| normalize_registry.resolve_local_lookup_name(&key.name, source))
                    .unwrap_or_else(|| key.name.clone())
            },
            move |key: &DefinitionKey| {
                let found = lookup_component(registry.as_ref(), &key.name, key.source.as_deref());
                if found.is_empty() {
                    tracing::debug!(name = %key.name, "no component definition");
                    return None;
                }
                tracing::debug!(
                    name = %key.name,
                    has_class = found.component.is_some(),
                    has_layout = found.layout.is_some(),
                    "component definition created"
                );
                Some(Rc::new(ComponentDefinition {
                    name: key.name.clone(),
                    component_class: found.component,
                    layout: found.layout,
                }))
            },
        )
        .labeled("definitions");
        Self { cache }
    }

    /// The definition of `name` as referenced from `source`.
    pub fn get(&self, name: &str, source: Option<&str>) -> Option<Rc<ComponentDefinition>> {
        self.cache.get(&DefinitionKey {
            name: name.to_string(),
            source: source.map(str::to_string),
        })
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl fmt::Debug for DefinitionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionCache")
            .field("stats", &self.stats())
            .finish()
    }
}
