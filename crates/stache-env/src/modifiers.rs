/*
 * modifiers.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Element modifiers.
//!
//! Only built-in modifiers exist; there is no registry fallback.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::attributes::Element;
use crate::error::{EnvError, EnvResult};
use crate::reference::EvaluatedArgs;
use crate::value::{ActionValue, Value};

/// Attribute the action modifier tags its element with.
pub const ACTION_ATTRIBUTE: &str = "data-stache-action";

/// Manages one kind of element modifier.
pub trait ModifierManager {
    /// Attach to `element` on first render.
    fn install(&self, element: &mut Element, args: &EvaluatedArgs);

    /// Re-apply after the arguments may have changed.
    fn update(&self, element: &mut Element, args: &EvaluatedArgs);

    /// Detach from `element`.
    fn destroy(&self, element: &Element);
}

/// An action attached to an element.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredAction {
    pub action: ActionValue,
    /// DOM event that triggers the action; `click` unless `on=` says otherwise.
    pub event: String,
}

/// The `{{action ...}}` element modifier.
///
/// Each installed element gets a fresh id in [`ACTION_ATTRIBUTE`]; the
/// action it triggers can then be looked up by that id.
#[derive(Debug, Default)]
pub struct ActionModifierManager {
    next_id: Cell<u64>,
    actions: RefCell<FxHashMap<String, RegisteredAction>>,
}

impl ActionModifierManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The action registered under `id`.
    pub fn action_for(&self, id: &str) -> Option<RegisteredAction> {
        self.actions.borrow().get(id).cloned()
    }

    /// Number of elements with a live action.
    pub fn len(&self) -> usize {
        self.actions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.borrow().is_empty()
    }

    fn registered(args: &EvaluatedArgs) -> RegisteredAction {
        let values = args.positional_values();
        let action = match values.split_first() {
            Some((Value::Action(action), rest)) => {
                let mut action = action.clone();
                action.curried.extend_from_slice(rest);
                action
            }
            Some((name, rest)) => ActionValue {
                name: name.to_display_string(),
                curried: rest.to_vec(),
            },
            None => ActionValue {
                name: String::new(),
                curried: Vec::new(),
            },
        };
        let event = args
            .named("on")
            .map(|on| on.value().to_display_string())
            .filter(|on| !on.is_empty())
            .unwrap_or_else(|| "click".to_string());
        RegisteredAction { action, event }
    }
}

impl ModifierManager for ActionModifierManager {
    fn install(&self, element: &mut Element, args: &EvaluatedArgs) {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let id = id.to_string();

        let registered = Self::registered(args);
        tracing::debug!(id = %id, action = %registered.action.name, "action installed");
        element.set_attribute(ACTION_ATTRIBUTE, id.clone());
        self.actions.borrow_mut().insert(id, registered);
    }

    fn update(&self, element: &mut Element, args: &EvaluatedArgs) {
        match element.attribute(ACTION_ATTRIBUTE).map(str::to_string) {
            Some(id) => {
                self.actions.borrow_mut().insert(id, Self::registered(args));
            }
            None => self.install(element, args),
        }
    }

    fn destroy(&self, element: &Element) {
        if let Some(id) = element.attribute(ACTION_ATTRIBUTE) {
            self.actions.borrow_mut().remove(id);
        }
    }
}

/// The built-in modifier table.
pub struct ModifierRegistry {
    action: Rc<ActionModifierManager>,
    builtins: FxHashMap<&'static str, Rc<dyn ModifierManager>>,
}

impl ModifierRegistry {
    pub fn new() -> Self {
        let action = Rc::new(ActionModifierManager::new());
        let mut builtins: FxHashMap<&'static str, Rc<dyn ModifierManager>> = FxHashMap::default();
        builtins.insert("action", action.clone());
        Self { action, builtins }
    }

    pub fn has_modifier(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    pub fn lookup_modifier(&self, name: &str) -> EnvResult<Rc<dyn ModifierManager>> {
        self.builtins
            .get(name)
            .cloned()
            .ok_or_else(|| EnvError::ModifierNotFound {
                name: name.to_string(),
            })
    }

    /// The manager behind the `action` modifier.
    pub fn action_manager(&self) -> &Rc<ActionModifierManager> {
        &self.action
    }
}

impl Default for ModifierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ModifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.builtins.keys().copied().collect();
        names.sort_unstable();
        f.debug_struct("ModifierRegistry")
            .field("builtins", &names)
            .finish()
    }
}
