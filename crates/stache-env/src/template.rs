/*
 * template.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Templates and the template cache.

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;
use stache_cache::{BoundedCache, CacheStats};
use uuid::Uuid;

/// Identity of a template. Equal ids denote the same template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one environment instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvironmentId(Uuid);

impl EnvironmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EnvironmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EnvironmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A precompiled template that has not yet been bound to an environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFactory {
    pub id: TemplateId,
    /// Module the template was loaded from, if known.
    pub module_name: Option<String>,
    pub source: String,
}

impl TemplateFactory {
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: TemplateId::new(id),
            module_name: None,
            source: source.into(),
        }
    }

    pub fn with_module_name(mut self, module_name: impl Into<String>) -> Self {
        self.module_name = Some(module_name.into());
        self
    }
}

/// A template bound to one environment.
#[derive(Debug)]
pub struct Template {
    pub id: TemplateId,
    pub factory: Rc<TemplateFactory>,
    pub environment: EnvironmentId,
}

/// Binds template factories to an environment, once per template id.
pub struct TemplateCache {
    cache: BoundedCache<Rc<TemplateFactory>, TemplateId, Rc<Template>>,
}

impl TemplateCache {
    pub fn new(environment: EnvironmentId, capacity: usize) -> Self {
        let cache = BoundedCache::new(
            capacity,
            |factory: &Rc<TemplateFactory>| factory.id.clone(),
            move |factory: &Rc<TemplateFactory>| {
                tracing::debug!(template = %factory.id, %environment, "binding template");
                Rc::new(Template {
                    id: factory.id.clone(),
                    factory: Rc::clone(factory),
                    environment,
                })
            },
        )
        .labeled("templates");
        Self { cache }
    }

    /// The bound template for `factory`.
    pub fn get(&self, factory: &Rc<TemplateFactory>) -> Rc<Template> {
        self.cache.get(factory)
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl fmt::Debug for TemplateCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateCache")
            .field("stats", &self.stats())
            .finish()
    }
}
