/*
 * lifecycle.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Component creation and destruction hooks.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::definition::ComponentDefinition;

/// A component created during a render.
#[derive(Debug)]
pub struct ComponentInstance {
    pub definition: Rc<ComponentDefinition>,
}

impl ComponentInstance {
    pub fn new(definition: Rc<ComponentDefinition>) -> Rc<Self> {
        Rc::new(Self { definition })
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

/// Manages the lifecycle of one kind of component.
pub trait ComponentManager {
    /// Called once the render that created `component` commits.
    fn did_create(&self, component: &ComponentInstance);
}

/// Something with teardown.
pub trait Destroyable {
    fn destroy(&self);
}

/// Components created during the current render, most recent first.
#[derive(Default)]
pub struct Transaction {
    created: RefCell<VecDeque<(Rc<ComponentInstance>, Rc<dyn ComponentManager>)>>,
}

impl Transaction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a render, forgetting anything left from an earlier one.
    pub fn begin(&self) {
        self.created.borrow_mut().clear();
    }

    pub fn did_create(&self, component: Rc<ComponentInstance>, manager: Rc<dyn ComponentManager>) {
        self.created.borrow_mut().push_front((component, manager));
    }

    /// Names of the created components, most recent first.
    pub fn created_components(&self) -> Vec<String> {
        self.created
            .borrow()
            .iter()
            .map(|(component, _)| component.name().to_string())
            .collect()
    }

    /// Notify every manager, most recently created first, and clear.
    pub fn commit(&self) {
        let created = std::mem::take(&mut *self.created.borrow_mut());
        tracing::debug!(count = created.len(), "committing created components");
        for (component, manager) in created {
            manager.did_create(&component);
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("created", &self.created_components())
            .finish()
    }
}
