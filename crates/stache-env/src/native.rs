/*
 * native.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Native syntax resolution.
//!
//! Native constructs are resolved before anything else and never consult the
//! registry. The environment composes a [`NativeResolver`] ahead of its own
//! rules; the default is [`StandardNativeResolver`].

use crate::statement::Statement;
use crate::syntax::{NativeKeyword, NativeSyntax, Syntax};

/// Recognizes reserved control-flow constructs.
pub trait NativeResolver {
    /// The native node for `statement`, or `None` if it is not native syntax.
    fn refine(&self, statement: &Statement) -> Option<Syntax>;
}

/// Block `if`, `unless`, `with`, `each`; inline `partial` and `yield`.
///
/// Inline `{{if ...}}` and `{{unless ...}}` are helpers, not native syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardNativeResolver;

impl NativeResolver for StandardNativeResolver {
    fn refine(&self, statement: &Statement) -> Option<Syntax> {
        if !statement.is_simple {
            return None;
        }

        let keyword = if statement.is_block {
            match statement.key.as_str() {
                "if" => NativeKeyword::If,
                "unless" => NativeKeyword::Unless,
                "with" => NativeKeyword::With,
                "each" => NativeKeyword::Each,
                _ => return None,
            }
        } else if statement.is_inline {
            match statement.key.as_str() {
                "partial" => NativeKeyword::Partial,
                "yield" => NativeKeyword::Yield,
                _ => return None,
            }
        } else {
            return None;
        };

        Some(Syntax::Native(NativeSyntax {
            keyword,
            args: statement.args.clone(),
            templates: statement.templates.clone(),
        }))
    }
}

/// Resolves nothing. Useful when every statement should reach the
/// environment's own rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoNativeSyntax;

impl NativeResolver for NoNativeSyntax {
    fn refine(&self, _statement: &Statement) -> Option<Syntax> {
        None
    }
}
