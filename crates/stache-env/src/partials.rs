/*
 * partials.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Partial lookup.
//!
//! `{{partial "posts/row"}}` looks for `template:posts/_row` first and falls
//! back to `template:posts/row`.

use std::rc::Rc;

use crate::error::{EnvError, EnvResult};
use crate::registry::{LookupOptions, Registration, Registry, Specifier};
use crate::template::TemplateFactory;

/// A resolved partial.
#[derive(Debug, Clone)]
pub struct Partial {
    pub name: String,
    pub template: Rc<TemplateFactory>,
}

/// `posts/row` → `posts/_row`.
pub fn underscored(name: &str) -> String {
    match name.rsplit_once('/') {
        Some((dir, last)) => format!("{dir}/_{last}"),
        None => format!("_{name}"),
    }
}

pub fn has_partial(registry: &dyn Registry, name: &str) -> bool {
    let global = LookupOptions::global();
    registry.has_registration(&Specifier::template(underscored(name)), &global)
        || registry.has_registration(&Specifier::template(name), &global)
}

pub fn lookup_partial(registry: &dyn Registry, name: &str) -> EnvResult<Partial> {
    if name.contains('.') {
        return Err(EnvError::InvalidPartialName {
            name: name.to_string(),
        });
    }

    let global = LookupOptions::global();
    let found = [Specifier::template(underscored(name)), Specifier::template(name)]
        .iter()
        .find_map(|specifier| match registry.lookup(specifier, &global) {
            Some(Registration::Template(template)) => Some(template),
            _ => None,
        });

    match found {
        Some(template) => Ok(Partial {
            name: name.to_string(),
            template,
        }),
        None => Err(EnvError::PartialNotFound {
            name: name.to_string(),
        }),
    }
}
