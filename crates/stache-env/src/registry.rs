/*
 * registry.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The registry capability.
//!
//! The registry stores user-authored components, layout templates, and helpers
//! by string name. The environment never reaches for a global registry: one is
//! handed to it at construction and shared with every cache that needs it.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::definition::ComponentClass;
use crate::helpers::Helper;
use crate::statement::ParentMeta;
use crate::template::TemplateFactory;

/// What kind of thing a registry entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecifierKind {
    Component,
    Helper,
    Template,
}

impl SpecifierKind {
    fn prefix(self) -> &'static str {
        match self {
            SpecifierKind::Component => "component",
            SpecifierKind::Helper => "helper",
            SpecifierKind::Template => "template",
        }
    }
}

/// A `type:name` registry key, e.g. `helper:format-date`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Specifier {
    pub kind: SpecifierKind,
    pub name: String,
}

impl Specifier {
    pub fn new(kind: SpecifierKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }

    pub fn component(name: impl Into<String>) -> Self {
        Self::new(SpecifierKind::Component, name)
    }

    pub fn helper(name: impl Into<String>) -> Self {
        Self::new(SpecifierKind::Helper, name)
    }

    pub fn template(name: impl Into<String>) -> Self {
        Self::new(SpecifierKind::Template, name)
    }

    /// The layout template of a component: `template:components/{name}`.
    pub fn component_layout(name: &str) -> Self {
        Self::template(format!("components/{name}"))
    }

    /// Parse `type:name`. Returns `None` for an unknown type or missing colon.
    pub fn parse(text: &str) -> Option<Self> {
        let (kind, name) = text.split_once(':')?;
        let kind = match kind {
            "component" => SpecifierKind::Component,
            "helper" => SpecifierKind::Helper,
            "template" => SpecifierKind::Template,
            _ => return None,
        };
        Some(Self::new(kind, name))
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.prefix(), self.name)
    }
}

/// Options for a registry query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LookupOptions {
    /// The module the query originates from. `None` queries global entries.
    pub source: Option<String>,
}

impl LookupOptions {
    /// Query entries registered without a source.
    pub fn global() -> Self {
        Self::default()
    }

    /// Query entries registered for `source`.
    pub fn scoped(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
        }
    }

    /// Scope by the module containing a statement, if there is one.
    pub fn from_parent_meta(parent_meta: Option<&ParentMeta>) -> Self {
        Self {
            source: parent_meta.map(ParentMeta::source),
        }
    }
}

/// An object stored in the registry.
#[derive(Debug, Clone)]
pub enum Registration {
    Component(Rc<ComponentClass>),
    Template(Rc<TemplateFactory>),
    Helper(Helper),
}

/// Storage of user-authored components, templates, and helpers.
pub trait Registry {
    /// Whether an entry exists for `specifier` under `options`.
    fn has_registration(&self, specifier: &Specifier, options: &LookupOptions) -> bool;

    /// The entry for `specifier` under `options`.
    fn lookup(&self, specifier: &Specifier, options: &LookupOptions) -> Option<Registration>;

    /// Map a component name used inside `source` to its canonical name, if the
    /// component is local to that source.
    fn resolve_local_lookup_name(&self, name: &str, source: &str) -> Option<String>;
}

/// An in-memory [`Registry`].
///
/// Entries are registered either globally or for a single source module.
/// Every query is counted, which lets callers observe whether resolution
/// consulted the registry at all.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    entries: FxHashMap<(Specifier, Option<String>), Registration>,
    queries: Cell<usize>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a global entry, replacing any existing one.
    pub fn register(&mut self, specifier: Specifier, registration: Registration) -> &mut Self {
        self.entries.insert((specifier, None), registration);
        self
    }

    /// Register an entry visible only to lookups from `source`.
    pub fn register_scoped(
        &mut self,
        source: impl Into<String>,
        specifier: Specifier,
        registration: Registration,
    ) -> &mut Self {
        self.entries
            .insert((specifier, Some(source.into())), registration);
        self
    }

    /// Number of registry queries answered so far.
    pub fn lookup_count(&self) -> usize {
        self.queries.get()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, specifier: &Specifier, source: Option<&str>) -> Option<&Registration> {
        self.queries.set(self.queries.get() + 1);
        self.entries
            .get(&(specifier.clone(), source.map(str::to_string)))
    }
}

impl Registry for MemoryRegistry {
    fn has_registration(&self, specifier: &Specifier, options: &LookupOptions) -> bool {
        self.entry(specifier, options.source.as_deref()).is_some()
    }

    fn lookup(&self, specifier: &Specifier, options: &LookupOptions) -> Option<Registration> {
        self.entry(specifier, options.source.as_deref()).cloned()
    }

    fn resolve_local_lookup_name(&self, name: &str, source: &str) -> Option<String> {
        let local = self
            .entry(&Specifier::component(name), Some(source))
            .is_some()
            || self
                .entry(&Specifier::component_layout(name), Some(source))
                .is_some();
        local.then(|| format!("{source}:{name}"))
    }
}
