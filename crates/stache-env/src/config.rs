/*
 * config.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Environment configuration.
//!
//! Every field has a default, so an empty TOML document is a valid
//! configuration:
//!
//! ```toml
//! [caches]
//! definitions = 2000
//! templates = 1000
//! compilers = 10
//! compiled-blocks = 2000
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{EnvError, EnvResult};

/// Top-level environment configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Capacity bounds for the environment's caches.
    pub caches: CacheConfig,
}

/// Capacity bounds for each cache the environment owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CacheConfig {
    /// Component definitions, keyed by canonical component name.
    pub definitions: usize,
    /// Bound templates, keyed by template id.
    pub templates: usize,
    /// Per-compiler block caches, keyed by compiler id.
    pub compilers: usize,
    /// Compiled blocks inside each per-compiler cache, keyed by template id.
    pub compiled_blocks: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            definitions: 2000,
            templates: 1000,
            compilers: 10,
            compiled_blocks: 2000,
        }
    }
}

impl EnvironmentConfig {
    /// Parse a configuration from TOML and validate it.
    pub fn from_toml_str(source: &str) -> EnvResult<Self> {
        let config: EnvironmentConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every capacity is at least one.
    pub fn validate(&self) -> EnvResult<()> {
        let caches = &self.caches;
        for (name, capacity) in [
            ("definitions", caches.definitions),
            ("templates", caches.templates),
            ("compilers", caches.compilers),
            ("compiled-blocks", caches.compiled_blocks),
        ] {
            if capacity == 0 {
                return Err(EnvError::InvalidConfig {
                    message: format!("caches.{name} must be at least 1"),
                });
            }
        }
        Ok(())
    }
}
