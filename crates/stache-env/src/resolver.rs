/*
 * resolver.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Statement refinement.
//!
//! The same `{{key ...}}` token can be a keyword, a component, a helper, or
//! nothing at all. [`SyntaxResolver::refine`] decides which, in this order:
//!
//! 1. Native syntax (`if`, `each`, `partial`, ...), via the composed
//!    [`NativeResolver`]. Nothing else is consulted for these.
//! 2. A user helper that shadows a built-in helper is an error.
//! 3. Simple inline and block statements:
//!    - `component`, `render` and `outlet` map to their own nodes
//!    - `textarea` maps to the internal `-text-area` component
//!    - a dashed key is looked up as a component
//!    - `input` expands to `-checkbox`, `-text-field`, or a dynamic component
//!      depending on its `type=` argument
//!    - an unresolved block must at least name a helper
//! 4. A helper may not be used in block form.
//! 5. A helper may not be used as an element modifier, unless the name is
//!    also a built-in modifier (`action`).
//!
//! Anything left over resolves to `None`, and the renderer treats it as a
//! plain property lookup. This is how `{{foo-bar}}` reads a dashed property
//! when there is no `foo-bar` component or helper.

use std::rc::Rc;

use crate::definition::{ComponentDefinition, DefinitionCache};
use crate::error::{EnvError, EnvResult};
use crate::helpers::HelperRegistry;
use crate::helpers::builtins::CLASS_HELPER;
use crate::modifiers::ModifierRegistry;
use crate::native::NativeResolver;
use crate::registry::{LookupOptions, Registry, Specifier};
use crate::statement::{Arg, Args, ChildTemplates, HelperCall, ParentMeta, Statement};
use crate::syntax::{ComponentSyntax, Syntax};

/// Keys that map directly to an internal component.
const BUILTIN_COMPONENTS: &[(&str, &str)] = &[("textarea", "-text-area")];

const CHECKBOX_COMPONENT: &str = "-checkbox";
const TEXT_FIELD_COMPONENT: &str = "-text-field";
const INPUT_TYPE_HELPER: &str = "-input-type";

/// Builds the syntax for a key whose component is picked from its arguments.
type DynamicComponentBuilder =
    fn(&SyntaxResolver<'_>, Args, Option<ChildTemplates>, Option<&ParentMeta>) -> EnvResult<Syntax>;

/// Keys that expand to one of several internal components.
const BUILTIN_DYNAMIC_COMPONENTS: &[(&str, DynamicComponentBuilder)] = &[("input", input)];

fn builtin_component(key: &str) -> Option<&'static str> {
    BUILTIN_COMPONENTS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, internal)| *internal)
}

/// Rewrite `class=someProp` into `class=(-class someProp "someProp")`, so a
/// boolean property toggles a class named after it. Helper calls and literals
/// are left alone.
pub fn wrap_class_attribute(args: &mut Args) {
    let Some(Arg::Get(reference)) = args.named.at("class") else {
        return;
    };
    let Some(property) = reference.property_name() else {
        return;
    };
    let rewritten = Arg::Helper(HelperCall {
        path: vec![CLASS_HELPER.to_string()],
        args: Args::new()
            .with_positional(Arg::Get(reference.clone()))
            .with_positional(Arg::value(property)),
    });
    args.named.add("class", rewritten);
}

fn builtin_dynamic_component(key: &str) -> Option<DynamicComponentBuilder> {
    BUILTIN_DYNAMIC_COMPONENTS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, builder)| *builder)
}

fn curly(mut args: Args, templates: Option<ChildTemplates>, definition: Rc<ComponentDefinition>) -> Syntax {
    wrap_class_attribute(&mut args);
    Syntax::Component(ComponentSyntax {
        args,
        definition,
        templates,
    })
}

/// Refines statements against one environment's caches and registries.
pub struct SyntaxResolver<'a> {
    native: &'a dyn NativeResolver,
    registry: &'a dyn Registry,
    helpers: &'a HelperRegistry,
    modifiers: &'a ModifierRegistry,
    definitions: &'a DefinitionCache,
}

impl<'a> SyntaxResolver<'a> {
    pub fn new(
        native: &'a dyn NativeResolver,
        registry: &'a dyn Registry,
        helpers: &'a HelperRegistry,
        modifiers: &'a ModifierRegistry,
        definitions: &'a DefinitionCache,
    ) -> Self {
        Self {
            native,
            registry,
            helpers,
            modifiers,
            definitions,
        }
    }

    /// Refine `statement`, found in the template described by `parent_meta`.
    ///
    /// Returns `Ok(None)` when the statement is left to the renderer's
    /// default handling.
    pub fn refine(&self, statement: Statement, parent_meta: Option<&ParentMeta>) -> EnvResult<Option<Syntax>> {
        if let Some(native) = self.native.refine(&statement) {
            tracing::trace!(key = %statement.key, kind = %native.kind(), "native syntax");
            return Ok(Some(native));
        }

        let Statement {
            is_simple,
            is_inline,
            is_block,
            is_modifier,
            key,
            args,
            templates,
            ..
        } = statement;

        if self.helpers.is_builtin(&key)
            && self
                .registry
                .has_registration(&Specifier::helper(key.as_str()), &LookupOptions::global())
        {
            return Err(EnvError::BuiltInHelperOverride { name: key });
        }

        if is_simple && (is_inline || is_block) {
            match key.as_str() {
                "component" => {
                    return Ok(Some(Syntax::DynamicComponent {
                        args,
                        templates,
                        parent_meta: parent_meta.cloned(),
                    }));
                }
                "render" => return Ok(Some(Syntax::Render { args })),
                "outlet" => return Ok(Some(Syntax::Outlet { args })),
                _ => {}
            }

            let definition = if let Some(internal) = builtin_component(&key) {
                self.definition(internal, parent_meta)
            } else if key.contains('-') {
                self.definition(&key, parent_meta)
            } else {
                None
            };

            if let Some(definition) = definition {
                tracing::debug!(key = %key, definition = %definition.name, "component syntax");
                return Ok(Some(curly(args, templates, definition)));
            }

            if let Some(builder) = builtin_dynamic_component(&key) {
                return builder(self, args, templates, parent_meta).map(Some);
            }

            if is_block && !self.helpers.has_helper(&key, parent_meta) {
                return Err(EnvError::HelperNotFound { name: key });
            }
        }

        if is_block && self.helpers.has_helper(&key, parent_meta) {
            return Err(EnvError::HelperInBlockForm { name: key });
        }

        if is_modifier && !self.modifiers.has_modifier(&key) && self.helpers.has_helper(&key, parent_meta) {
            return Err(EnvError::HelperInElementForm { name: key });
        }

        tracing::trace!(key = %key, "no syntax");
        Ok(None)
    }

    fn definition(&self, name: &str, parent_meta: Option<&ParentMeta>) -> Option<Rc<ComponentDefinition>> {
        let source = parent_meta.map(ParentMeta::source);
        self.definitions.get(name, source.as_deref())
    }

    fn builtin_definition(&self, name: &str, parent_meta: Option<&ParentMeta>) -> EnvResult<Rc<ComponentDefinition>> {
        self.definition(name, parent_meta)
            .ok_or_else(|| EnvError::MissingBuiltInComponent {
                name: name.to_string(),
            })
    }
}

/// `{{input}}`: a literal `type` picks the component now, anything else
/// defers the choice to render time through `-input-type`.
fn input(
    resolver: &SyntaxResolver<'_>,
    mut args: Args,
    templates: Option<ChildTemplates>,
    parent_meta: Option<&ParentMeta>,
) -> EnvResult<Syntax> {
    let type_arg = args.named.at("type").cloned();
    match type_arg {
        None => {
            let definition = resolver.builtin_definition(TEXT_FIELD_COMPONENT, parent_meta)?;
            Ok(curly(args, templates, definition))
        }
        Some(Arg::Value { value }) => {
            if value.as_str() == Some("checkbox") {
                if args.named.has("value") {
                    return Err(EnvError::CheckboxValueBinding);
                }
                let definition = resolver.builtin_definition(CHECKBOX_COMPONENT, parent_meta)?;
                Ok(curly(args, templates, definition))
            } else {
                let definition = resolver.builtin_definition(TEXT_FIELD_COMPONENT, parent_meta)?;
                Ok(curly(args, templates, definition))
            }
        }
        Some(dynamic) => {
            tracing::debug!("input type resolved at render time");
            let component = Arg::Helper(HelperCall {
                path: vec![INPUT_TYPE_HELPER.to_string()],
                args: Args::new().with_positional(dynamic),
            });
            args.positional.insert(0, component);
            Ok(Syntax::DynamicComponent {
                args,
                templates,
                parent_meta: parent_meta.cloned(),
            })
        }
    }
}
