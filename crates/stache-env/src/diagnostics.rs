/*
 * diagnostics.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Warnings raised while rendering.
//!
//! Warnings are logged through `tracing` and also kept in a
//! [`DiagnosticCollector`] owned by the environment, so callers can surface
//! them after a render pass.

use std::cell::RefCell;

/// Stable id of the warning raised for untrusted `style` bindings.
pub const STYLE_XSS_WARNING: &str = "stache.style-xss-warning";

/// Message for [`STYLE_XSS_WARNING`].
pub const STYLE_WARNING_MESSAGE: &str = "Binding style attributes may introduce cross-site scripting vulnerabilities; \
     please ensure that values being bound are properly escaped, or mark them as safe strings.";

/// A single collected warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Stable identifier, e.g. [`STYLE_XSS_WARNING`].
    pub id: &'static str,
    pub message: String,
}

/// Collector for diagnostics raised during rendering.
///
/// Shared by reference between the environment and the attribute mutators it
/// hands out, so it uses interior mutability.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and log a warning.
    pub fn warn(&self, id: &'static str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(id, "{}", message);
        self.diagnostics
            .borrow_mut()
            .push(Diagnostic { id, message });
    }

    /// Number of warnings with the given id.
    pub fn count(&self, id: &str) -> usize {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.id == id)
            .count()
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.diagnostics.borrow().is_empty()
    }

    /// Copy of everything collected so far, in order.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Remove and return everything collected so far.
    pub fn drain(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.borrow_mut())
    }

    /// Check if the collector is empty.
    pub fn is_empty(&self) -> bool {
        !self.has_warnings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_new() {
        let collector = DiagnosticCollector::new();
        assert!(collector.is_empty());
        assert!(!collector.has_warnings());
    }

    #[test]
    fn test_warn_and_count() {
        let collector = DiagnosticCollector::new();
        collector.warn(STYLE_XSS_WARNING, STYLE_WARNING_MESSAGE);
        collector.warn("stache.other", "hello");

        assert!(collector.has_warnings());
        assert_eq!(collector.count(STYLE_XSS_WARNING), 1);
        assert_eq!(collector.snapshot().len(), 2);
    }

    #[test]
    fn test_drain_empties() {
        let collector = DiagnosticCollector::new();
        collector.warn(STYLE_XSS_WARNING, "x");
        let drained = collector.drain();
        assert_eq!(drained.len(), 1);
        assert!(collector.is_empty());
    }
}
