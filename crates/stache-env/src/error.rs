/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for syntax resolution, lookups, and configuration.

use thiserror::Error;

/// Errors raised by the environment.
///
/// Configuration errors (see [`EnvError::is_configuration_error`]) are raised
/// while a template is being resolved and abort the compile of that template.
/// Lookup failures are raised when the renderer asks for a helper, modifier,
/// or partial that does not exist.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    /// A user registered a helper whose name is taken by a built-in helper.
    #[error(
        "You attempted to overwrite the built-in helper \"{name}\" which is not allowed. Please rename the helper."
    )]
    BuiltInHelperOverride { name: String },

    /// A block statement named neither a component nor a helper.
    #[error("A helper named \"{name}\" could not be found")]
    HelperNotFound { name: String },

    /// A helper was invoked with block syntax.
    #[error(
        "Helpers may not be used in the block form, for example {{{{#{name}}}}}{{{{/{name}}}}}. Please use a component, or use the helper inside a built-in construct, for example {{{{#if ({name})}}}}{{{{/if}}}}."
    )]
    HelperInBlockForm { name: String },

    /// A helper was invoked as an element modifier.
    #[error("Helpers may not be used in the element form: \"{name}\"")]
    HelperInElementForm { name: String },

    /// `{{input type='checkbox' value=...}}`.
    #[error(
        "{{{{input type='checkbox'}}}} does not support setting `value=someBooleanValue`; you must use `checked=someBooleanValue` instead."
    )]
    CheckboxValueBinding,

    /// The registry returned something other than a helper for `helper:{name}`.
    #[error("{name} is not a helper")]
    NotAHelper { name: String },

    /// No built-in modifier has this name.
    #[error("{name} is not a modifier")]
    ModifierNotFound { name: String },

    /// Neither `template:{underscored}` nor `template:{name}` is registered.
    #[error("Unable to find partial with name \"{name}\"")]
    PartialNotFound { name: String },

    /// Partial names may not contain periods.
    #[error("templateNames are not allowed to contain periods: {name}")]
    InvalidPartialName { name: String },

    /// A component the environment expands to internally is not registered.
    #[error("The built-in component \"{name}\" is not registered")]
    MissingBuiltInComponent { name: String },

    /// A layout compiler rejected a template.
    #[error("Failed to compile template {template}: {message}")]
    Compile { template: String, message: String },

    /// A configuration value is out of range.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The configuration file could not be parsed.
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },
}

impl From<toml::de::Error> for EnvError {
    fn from(err: toml::de::Error) -> Self {
        EnvError::ConfigParse {
            message: err.to_string(),
        }
    }
}

impl EnvError {
    /// Whether this error reports a mistake in template source or registry
    /// contents, as opposed to a failed runtime lookup or bad configuration.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            EnvError::BuiltInHelperOverride { .. }
                | EnvError::HelperNotFound { .. }
                | EnvError::HelperInBlockForm { .. }
                | EnvError::HelperInElementForm { .. }
                | EnvError::CheckboxValueBinding
                | EnvError::MissingBuiltInComponent { .. }
        )
    }
}

/// Result type for environment operations.
pub type EnvResult<T> = Result<T, EnvError>;
