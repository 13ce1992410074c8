/*
 * attributes.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Attribute mutation and the `style` attribute check.
//!
//! The renderer asks [`AttributeDispatcher::attribute_for`] which change list
//! to use for an attribute binding. Untrusted `style` bindings get a change
//! list that warns about cross-site scripting before delegating to the
//! regular one.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::diagnostics::{DiagnosticCollector, STYLE_WARNING_MESSAGE, STYLE_XSS_WARNING};
use crate::reference::ReferenceRef;
use crate::value::Value;

/// A DOM element as seen by attribute mutation and modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub tag_name: String,
    pub attributes: BTreeMap<String, String>,
}

impl Element {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }
}

/// Applies attribute values to elements.
pub trait AttributeChangeList {
    /// Set `attr` on first render.
    fn set_attribute(&self, element: &mut Element, attr: &str, value: &Value);

    /// Set `attr` on re-render.
    fn update_attribute(&self, element: &mut Element, attr: &str, value: &Value) {
        self.set_attribute(element, attr, value);
    }
}

/// Null and `false` remove the attribute, `true` sets it empty, anything
/// else sets its display string.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultAttributeChangeList;

impl AttributeChangeList for DefaultAttributeChangeList {
    fn set_attribute(&self, element: &mut Element, attr: &str, value: &Value) {
        match value {
            Value::Null | Value::Bool(false) => {
                element.remove_attribute(attr);
            }
            Value::Bool(true) => element.set_attribute(attr, ""),
            other => element.set_attribute(attr, other.to_display_string()),
        }
    }
}

/// Warns on untrusted `style` values, then delegates.
pub struct StyleAttributeChangeList {
    base: Rc<dyn AttributeChangeList>,
    diagnostics: Rc<DiagnosticCollector>,
}

impl StyleAttributeChangeList {
    pub fn new(base: Rc<dyn AttributeChangeList>, diagnostics: Rc<DiagnosticCollector>) -> Self {
        Self { base, diagnostics }
    }
}

impl AttributeChangeList for StyleAttributeChangeList {
    fn set_attribute(&self, element: &mut Element, attr: &str, value: &Value) {
        if !(value.is_null() || value.is_safe()) {
            self.diagnostics.warn(STYLE_XSS_WARNING, STYLE_WARNING_MESSAGE);
        }
        self.base.set_attribute(element, attr, value);
    }
}

/// Picks the change list for an attribute binding.
pub struct AttributeDispatcher {
    base: Rc<dyn AttributeChangeList>,
    style: Rc<StyleAttributeChangeList>,
}

impl AttributeDispatcher {
    pub fn new(base: Rc<dyn AttributeChangeList>, diagnostics: Rc<DiagnosticCollector>) -> Self {
        let style = Rc::new(StyleAttributeChangeList::new(Rc::clone(&base), diagnostics));
        Self { base, style }
    }

    /// The change list for binding `reference` to `attr` on `element`.
    pub fn attribute_for(
        &self,
        _element: &Element,
        attr: &str,
        _reference: &ReferenceRef,
        is_trusting: bool,
    ) -> Rc<dyn AttributeChangeList> {
        if attr == "style" && !is_trusting {
            return self.style.clone();
        }
        Rc::clone(&self.base)
    }
}

impl fmt::Debug for AttributeDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ConstReference;
    use crate::value::SafeString;
    use pretty_assertions::assert_eq;

    fn dispatcher() -> (AttributeDispatcher, Rc<DiagnosticCollector>) {
        let diagnostics = Rc::new(DiagnosticCollector::new());
        let dispatcher = AttributeDispatcher::new(Rc::new(DefaultAttributeChangeList), Rc::clone(&diagnostics));
        (dispatcher, diagnostics)
    }

    fn bind(dispatcher: &AttributeDispatcher, element: &mut Element, attr: &str, value: Value, is_trusting: bool) {
        let reference = ConstReference::create(value.clone());
        let change_list = dispatcher.attribute_for(element, attr, &reference, is_trusting);
        change_list.set_attribute(element, attr, &value);
    }

    #[test]
    fn test_default_change_list() {
        let mut element = Element::new("input");
        let list = DefaultAttributeChangeList;

        list.set_attribute(&mut element, "disabled", &Value::Bool(true));
        assert_eq!(element.attribute("disabled"), Some(""));
        list.update_attribute(&mut element, "disabled", &Value::Bool(false));
        assert_eq!(element.attribute("disabled"), None);
        list.set_attribute(&mut element, "size", &Value::Number(10.0));
        assert_eq!(element.attribute("size"), Some("10"));
        list.set_attribute(&mut element, "size", &Value::Null);
        assert_eq!(element.attribute("size"), None);
    }

    #[test]
    fn test_untrusted_style_warns_once_and_applies() {
        let (dispatcher, diagnostics) = dispatcher();
        let mut element = Element::new("div");

        bind(&dispatcher, &mut element, "style", Value::from("color: red"), false);

        assert_eq!(diagnostics.count(STYLE_XSS_WARNING), 1);
        assert_eq!(element.attribute("style"), Some("color: red"));
    }

    #[test]
    fn test_safe_or_null_style_does_not_warn() {
        let (dispatcher, diagnostics) = dispatcher();
        let mut element = Element::new("div");

        bind(&dispatcher, &mut element, "style", Value::Safe(SafeString::new("width: 1px")), false);
        bind(&dispatcher, &mut element, "style", Value::Null, false);

        assert!(diagnostics.is_empty());
        assert_eq!(element.attribute("style"), None);
    }

    #[test]
    fn test_trusting_style_and_other_attributes_skip_check() {
        let (dispatcher, diagnostics) = dispatcher();
        let mut element = Element::new("div");

        bind(&dispatcher, &mut element, "style", Value::from("color: red"), true);
        bind(&dispatcher, &mut element, "title", Value::from("<b>"), false);

        assert!(diagnostics.is_empty());
        assert_eq!(element.attribute("title"), Some("<b>"));
    }

    #[test]
    fn test_style_update_warns_again() {
        let (dispatcher, diagnostics) = dispatcher();
        let mut element = Element::new("div");
        let reference = ConstReference::create("a");
        let list = dispatcher.attribute_for(&element, "style", &reference, false);

        list.set_attribute(&mut element, "style", &Value::from("a"));
        list.update_attribute(&mut element, "style", &Value::from("b"));

        assert_eq!(diagnostics.count(STYLE_XSS_WARNING), 2);
        assert_eq!(element.attribute("style"), Some("b"));
    }
}
