/*
 * environment.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! The template environment.
//!
//! An [`Environment`] owns every cache and built-in table and is the single
//! entry point the renderer talks to. It is single-threaded; all of its
//! caches tolerate re-entrant use.

use std::fmt;
use std::rc::Rc;

use stache_cache::CacheStats;

use crate::attributes::{AttributeChangeList, AttributeDispatcher, DefaultAttributeChangeList, Element};
use crate::compiler::{CompiledBlock, CompiledBlockCache, LayoutCompiler};
use crate::config::EnvironmentConfig;
use crate::definition::{ComponentDefinition, DefinitionCache};
use crate::diagnostics::DiagnosticCollector;
use crate::error::EnvResult;
use crate::helpers::{HelperFn, HelperRegistry};
use crate::iterable::{Iterable, KeyStrategy};
use crate::lifecycle::{ComponentInstance, ComponentManager, Destroyable, Transaction};
use crate::modifiers::{ModifierManager, ModifierRegistry};
use crate::native::{NativeResolver, StandardNativeResolver};
use crate::partials::{self, Partial};
use crate::reference::{ConditionalReference, EvaluatedArgs, ReferenceRef};
use crate::registry::Registry;
use crate::resolver::SyntaxResolver;
use crate::statement::{ParentMeta, Statement};
use crate::syntax::Syntax;
use crate::template::{EnvironmentId, Template, TemplateCache, TemplateFactory};

/// Statistics for each cache an environment owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentCacheStats {
    pub definitions: CacheStats,
    pub templates: CacheStats,
    /// The outer, per-compiler level of the compiled block cache.
    pub compilers: CacheStats,
}

/// Builder for [`Environment`].
pub struct EnvironmentBuilder {
    registry: Rc<dyn Registry>,
    config: EnvironmentConfig,
    native: Option<Box<dyn NativeResolver>>,
    attributes: Option<Rc<dyn AttributeChangeList>>,
}

impl EnvironmentBuilder {
    pub fn config(mut self, config: EnvironmentConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the native syntax resolver. Defaults to [`StandardNativeResolver`].
    pub fn native_resolver(mut self, native: impl NativeResolver + 'static) -> Self {
        self.native = Some(Box::new(native));
        self
    }

    /// Replace the base attribute change list. Defaults to
    /// [`DefaultAttributeChangeList`].
    pub fn attribute_change_list(mut self, attributes: Rc<dyn AttributeChangeList>) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Validate the configuration and create the environment.
    pub fn build(self) -> EnvResult<Environment> {
        self.config.validate()?;

        let id = EnvironmentId::new();
        let caches = &self.config.caches;
        let diagnostics = Rc::new(DiagnosticCollector::new());
        let attributes = self
            .attributes
            .unwrap_or_else(|| Rc::new(DefaultAttributeChangeList));

        tracing::debug!(
            environment = %id,
            definitions = caches.definitions,
            templates = caches.templates,
            compilers = caches.compilers,
            compiled_blocks = caches.compiled_blocks,
            "creating environment"
        );

        Ok(Environment {
            id,
            definitions: DefinitionCache::new(Rc::clone(&self.registry), caches.definitions),
            templates: TemplateCache::new(id, caches.templates),
            compiled_blocks: CompiledBlockCache::new(caches.compilers, caches.compiled_blocks),
            helpers: HelperRegistry::new(Rc::clone(&self.registry)),
            modifiers: ModifierRegistry::new(),
            attributes: AttributeDispatcher::new(attributes, Rc::clone(&diagnostics)),
            native: self
                .native
                .unwrap_or_else(|| Box::new(StandardNativeResolver)),
            transaction: Transaction::new(),
            diagnostics,
            registry: self.registry,
            config: self.config,
        })
    }
}

/// Syntax resolution, caches, and runtime hooks for one application.
pub struct Environment {
    id: EnvironmentId,
    config: EnvironmentConfig,
    registry: Rc<dyn Registry>,
    native: Box<dyn NativeResolver>,
    definitions: DefinitionCache,
    templates: TemplateCache,
    compiled_blocks: CompiledBlockCache,
    helpers: HelperRegistry,
    modifiers: ModifierRegistry,
    attributes: AttributeDispatcher,
    diagnostics: Rc<DiagnosticCollector>,
    transaction: Transaction,
}

impl Environment {
    pub fn builder(registry: Rc<dyn Registry>) -> EnvironmentBuilder {
        EnvironmentBuilder {
            registry,
            config: EnvironmentConfig::default(),
            native: None,
            attributes: None,
        }
    }

    /// An environment with the default configuration.
    pub fn new(registry: Rc<dyn Registry>) -> EnvResult<Self> {
        Self::builder(registry).build()
    }

    pub fn id(&self) -> EnvironmentId {
        self.id
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Warnings emitted so far.
    pub fn diagnostics(&self) -> &DiagnosticCollector {
        &self.diagnostics
    }

    /// Turn a parsed statement into the syntax node the renderer executes.
    ///
    /// See [`SyntaxResolver::refine`] for the precedence rules.
    pub fn refine_statement(&self, statement: Statement, parent_meta: Option<&ParentMeta>) -> EnvResult<Option<Syntax>> {
        SyntaxResolver::new(
            self.native.as_ref(),
            self.registry.as_ref(),
            &self.helpers,
            &self.modifiers,
            &self.definitions,
        )
        .refine(statement, parent_meta)
    }

    /// The component definition for `name` as referenced from `parent_meta`.
    pub fn get_component_definition(
        &self,
        name: &str,
        parent_meta: Option<&ParentMeta>,
    ) -> Option<Rc<ComponentDefinition>> {
        let source = parent_meta.map(ParentMeta::source);
        self.definitions.get(name, source.as_deref())
    }

    /// `factory` bound to this environment.
    pub fn get_template(&self, factory: &Rc<TemplateFactory>) -> Rc<Template> {
        self.templates.get(factory)
    }

    pub fn get_compiled_block(
        &self,
        compiler: &Rc<dyn LayoutCompiler>,
        template: &Rc<Template>,
    ) -> EnvResult<Rc<CompiledBlock>> {
        self.compiled_blocks.get(compiler, template)
    }

    pub fn has_helper(&self, name: &str, parent_meta: Option<&ParentMeta>) -> bool {
        self.helpers.has_helper(name, parent_meta)
    }

    pub fn lookup_helper(&self, name: &str, parent_meta: Option<&ParentMeta>) -> EnvResult<HelperFn> {
        self.helpers.lookup_helper(name, parent_meta)
    }

    pub fn has_modifier(&self, name: &str) -> bool {
        self.modifiers.has_modifier(name)
    }

    pub fn lookup_modifier(&self, name: &str) -> EnvResult<Rc<dyn ModifierManager>> {
        self.modifiers.lookup_modifier(name)
    }

    pub fn modifiers(&self) -> &ModifierRegistry {
        &self.modifiers
    }

    pub fn has_partial(&self, name: &str) -> bool {
        partials::has_partial(self.registry.as_ref(), name)
    }

    pub fn lookup_partial(&self, name: &str) -> EnvResult<Partial> {
        partials::lookup_partial(self.registry.as_ref(), name)
    }

    pub fn to_conditional_reference(&self, reference: ReferenceRef) -> ReferenceRef {
        ConditionalReference::create(reference)
    }

    /// Keyed iteration over `reference`, keyed by the named `key` argument.
    pub fn iterable_for(&self, reference: ReferenceRef, args: &EvaluatedArgs) -> Iterable {
        let key = args.named("key").map(|key| key.value());
        let strategy = KeyStrategy::from_key(key.as_ref().and_then(|key| key.as_str()));
        Iterable::new(reference, strategy)
    }

    pub fn attribute_for(
        &self,
        element: &Element,
        attr: &str,
        reference: &ReferenceRef,
        is_trusting: bool,
    ) -> Rc<dyn AttributeChangeList> {
        self.attributes
            .attribute_for(element, attr, reference, is_trusting)
    }

    /// Start a render transaction.
    pub fn begin(&self) {
        self.transaction.begin();
    }

    /// Record a component created during the current render.
    pub fn did_create(&self, component: Rc<ComponentInstance>, manager: Rc<dyn ComponentManager>) {
        self.transaction.did_create(component, manager);
    }

    /// Names of the components created in the current render, most recent
    /// first.
    pub fn created_components(&self) -> Vec<String> {
        self.transaction.created_components()
    }

    /// Finish the render: notify managers, most recently created first.
    pub fn commit(&self) {
        self.transaction.commit();
    }

    pub fn did_destroy(&self, destroyable: &dyn Destroyable) {
        destroyable.destroy();
    }

    pub fn cache_stats(&self) -> EnvironmentCacheStats {
        EnvironmentCacheStats {
            definitions: self.definitions.stats(),
            templates: self.templates.stats(),
            compilers: self.compiled_blocks.stats(),
        }
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("caches", &self.cache_stats())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::error::EnvError;
    use crate::reference::{ConstReference, UpdatableReference};
    use crate::registry::MemoryRegistry;
    use crate::value::Value;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    fn environment() -> Environment {
        Environment::new(Rc::new(MemoryRegistry::new())).unwrap()
    }

    #[test]
    fn test_build_rejects_zero_capacity() {
        let config = EnvironmentConfig {
            caches: CacheConfig {
                compilers: 0,
                ..CacheConfig::default()
            },
        };
        let result = Environment::builder(Rc::new(MemoryRegistry::new()))
            .config(config)
            .build();
        assert!(matches!(result, Err(EnvError::InvalidConfig { .. })));
    }

    #[test]
    fn test_cache_stats_reflect_config() {
        let env = environment();
        let stats = env.cache_stats();
        assert_eq!(stats.definitions.capacity, 2000);
        assert_eq!(stats.templates.capacity, 1000);
        assert_eq!(stats.compilers.capacity, 10);
        assert_eq!(stats.definitions.len, 0);
    }

    #[test]
    fn test_template_bound_to_this_environment() {
        let env = environment();
        let template = env.get_template(&Rc::new(TemplateFactory::new("t", "")));
        assert_eq!(template.environment, env.id());
    }

    #[test]
    fn test_conditional_reference() {
        let env = environment();
        let source = UpdatableReference::new(0);
        let conditional = env.to_conditional_reference(source.clone());
        assert_eq!(conditional.value(), Value::Bool(false));
        source.update("yes");
        assert_eq!(conditional.value(), Value::Bool(true));
    }

    #[test]
    fn test_iterable_for_reads_key_argument() {
        let env = environment();
        let list = ConstReference::create(vec!["a", "b"]);

        let by_index = env.iterable_for(
            list.clone(),
            &EvaluatedArgs::new().with_named("key", ConstReference::create("@index")),
        );
        assert_eq!(by_index.strategy(), &KeyStrategy::Index);

        let by_identity = env.iterable_for(list, &EvaluatedArgs::new());
        assert_eq!(by_identity.strategy(), &KeyStrategy::Identity);
    }

    struct Counted {
        destroyed: Cell<usize>,
    }

    impl Destroyable for Counted {
        fn destroy(&self) {
            self.destroyed.set(self.destroyed.get() + 1);
        }
    }

    #[test]
    fn test_did_destroy_runs_teardown() {
        let env = environment();
        let target = Counted {
            destroyed: Cell::new(0),
        };
        env.did_destroy(&target);
        assert_eq!(target.destroyed.get(), 1);
    }

    #[test]
    fn test_modifier_lookup() {
        let env = environment();
        assert!(env.has_modifier("action"));
        assert!(env.lookup_modifier("action").is_ok());
        assert!(matches!(
            env.lookup_modifier("tooltip"),
            Err(EnvError::ModifierNotFound { .. })
        ));
    }
}
