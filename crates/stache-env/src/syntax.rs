/*
 * syntax.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Resolved syntax nodes handed to the renderer.

use std::fmt;
use std::rc::Rc;

use crate::definition::ComponentDefinition;
use crate::statement::{Args, ChildTemplates, ParentMeta};

/// Control-flow keywords understood by the native resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKeyword {
    If,
    Unless,
    With,
    Each,
    Partial,
    Yield,
}

impl NativeKeyword {
    pub fn as_str(self) -> &'static str {
        match self {
            NativeKeyword::If => "if",
            NativeKeyword::Unless => "unless",
            NativeKeyword::With => "with",
            NativeKeyword::Each => "each",
            NativeKeyword::Partial => "partial",
            NativeKeyword::Yield => "yield",
        }
    }
}

/// A native control-flow construct.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeSyntax {
    pub keyword: NativeKeyword,
    pub args: Args,
    pub templates: Option<ChildTemplates>,
}

/// An invocation of a statically known component.
#[derive(Debug, Clone)]
pub struct ComponentSyntax {
    pub args: Args,
    pub definition: Rc<ComponentDefinition>,
    pub templates: Option<ChildTemplates>,
}

/// The refined meaning of a statement.
#[derive(Debug, Clone)]
pub enum Syntax {
    Native(NativeSyntax),
    Component(ComponentSyntax),
    /// A component chosen at render time from the first argument or from a
    /// non-literal `type`.
    DynamicComponent {
        args: Args,
        templates: Option<ChildTemplates>,
        parent_meta: Option<ParentMeta>,
    },
    Render {
        args: Args,
    },
    Outlet {
        args: Args,
    },
}

/// Discriminant of [`Syntax`], for matching and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Native(NativeKeyword),
    Component,
    DynamicComponent,
    Render,
    Outlet,
}

impl Syntax {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            Syntax::Native(native) => SyntaxKind::Native(native.keyword),
            Syntax::Component(_) => SyntaxKind::Component,
            Syntax::DynamicComponent { .. } => SyntaxKind::DynamicComponent,
            Syntax::Render { .. } => SyntaxKind::Render,
            Syntax::Outlet { .. } => SyntaxKind::Outlet,
        }
    }

    /// The component definition, for [`Syntax::Component`].
    pub fn definition(&self) -> Option<&Rc<ComponentDefinition>> {
        match self {
            Syntax::Component(component) => Some(&component.definition),
            _ => None,
        }
    }

    pub fn args(&self) -> &Args {
        match self {
            Syntax::Native(NativeSyntax { args, .. })
            | Syntax::Component(ComponentSyntax { args, .. })
            | Syntax::DynamicComponent { args, .. }
            | Syntax::Render { args }
            | Syntax::Outlet { args } => args,
        }
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxKind::Native(keyword) => write!(f, "native:{}", keyword.as_str()),
            SyntaxKind::Component => f.write_str("component"),
            SyntaxKind::DynamicComponent => f.write_str("dynamic-component"),
            SyntaxKind::Render => f.write_str("render"),
            SyntaxKind::Outlet => f.write_str("outlet"),
        }
    }
}
