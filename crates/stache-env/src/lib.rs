/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Syntax resolution and compilation caches for the stache template
//! environment.
//!
//! The parser hands every `{{key ...}}` invocation to
//! [`Environment::refine_statement`], which decides what it means:
//!
//! - native control flow (`{{#if}}`, `{{#each}}`, `{{partial}}`, ...)
//! - a component, resolved through a memoized definition cache
//! - a built-in expansion (`{{component}}`, `{{input}}`, `{{textarea}}`, ...)
//! - a helper, which may only be used inline
//! - nothing, leaving the renderer's property-lookup fallback in charge
//!
//! The environment also owns the template and compiled block caches, the
//! built-in helper and modifier tables, and the renderer-facing hooks for
//! partials, iteration, attribute mutation, and component lifecycle.
//!
//! # Architecture
//!
//! User-authored components, templates, and helpers live in a [`Registry`]
//! that is passed in at construction; nothing is looked up globally. Native
//! syntax is recognized by a composed [`NativeResolver`] that runs before the
//! environment's own rules.
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use stache_env::{Arg, Environment, MemoryRegistry, Statement};
//!
//! let env = Environment::new(Rc::new(MemoryRegistry::new()))?;
//! let statement = Statement::block("each").with_positional(Arg::get("model.posts"));
//! let syntax = env.refine_statement(statement, None)?;
//! assert!(syntax.is_some());
//! ```

pub mod attributes;
pub mod compiler;
pub mod config;
pub mod definition;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod helpers;
pub mod iterable;
pub mod lifecycle;
pub mod modifiers;
pub mod native;
pub mod partials;
pub mod reference;
pub mod registry;
pub mod resolver;
pub mod statement;
pub mod syntax;
pub mod template;
pub mod value;

// Re-export main types at crate root
pub use attributes::{AttributeChangeList, AttributeDispatcher, DefaultAttributeChangeList, Element};
pub use compiler::{CompiledBlock, CompiledBlockCache, CompilerId, LayoutCompiler};
pub use config::{CacheConfig, EnvironmentConfig};
pub use definition::{ComponentClass, ComponentDefinition, DefinitionCache};
pub use diagnostics::{Diagnostic, DiagnosticCollector};
pub use environment::{Environment, EnvironmentBuilder, EnvironmentCacheStats};
pub use error::{EnvError, EnvResult};
pub use helpers::{ClassHelper, Helper, HelperFactory, HelperFn, HelperRegistry, HelperShape, InternalHelper};
pub use iterable::{IterationItem, Iterable, KeyStrategy};
pub use lifecycle::{ComponentInstance, ComponentManager, Destroyable};
pub use modifiers::{ActionModifierManager, ModifierManager, ModifierRegistry};
pub use native::{NativeResolver, NoNativeSyntax, StandardNativeResolver};
pub use partials::Partial;
pub use reference::{ConstReference, EvaluatedArgs, Reference, ReferenceRef, UpdatableReference};
pub use registry::{LookupOptions, MemoryRegistry, Registration, Registry, Specifier};
pub use resolver::SyntaxResolver;
pub use statement::{Arg, Args, ChildTemplates, ParentMeta, PathReference, Statement, StatementForm};
pub use syntax::{NativeKeyword, Syntax, SyntaxKind};
pub use template::{EnvironmentId, Template, TemplateFactory, TemplateId};
pub use value::{SafeString, Value};
