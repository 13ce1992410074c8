/*
 * resolve.rs
 * Copyright (c) 2025 Posit, PBC
 *
 * Resolve command implementation
 */

//! Resolve command implementation.
//!
//! `stache resolve` loads a JSON fixture describing a registry and a list of
//! statements, refines each statement against a fresh environment, and prints
//! one line per statement:
//!
//! ```text
//! each -> native:each
//! user-card -> component(user-card)
//! format-date -> error: Helpers may not be used in the block form, ...
//! title -> none
//! ```
//!
//! Registry entries carry no behavior. Helpers registered from a fixture
//! always compute `null`; they exist so that resolution sees the name.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use tracing::{debug, info};

use stache_env::{
    Args, ComponentClass, Environment, EnvironmentConfig, Helper, MemoryRegistry, ParentMeta,
    Registration, Specifier, Statement, StatementForm, Syntax, TemplateFactory, Value,
    registry::SpecifierKind,
};

/// Arguments for the resolve command
#[derive(Debug)]
pub struct ResolveArgs {
    /// Fixture file
    pub fixture: PathBuf,
    /// Optional TOML configuration
    pub config: Option<PathBuf>,
    /// Print cache statistics
    pub stats: bool,
}

/// A registry plus the statements to refine against it.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Fixture {
    pub registry: Vec<RegistryEntry>,
    pub statements: Vec<FixtureStatement>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryEntry {
    /// `component:name`, `helper:name`, or `template:name`.
    pub specifier: String,
    /// Restrict the entry to lookups from this source, e.g. `template:app/templates/posts`.
    #[serde(default)]
    pub source: Option<String>,
    /// Template body, for `template:` entries.
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FixtureStatement {
    pub form: StatementForm,
    pub key: String,
    #[serde(default)]
    pub args: Args,
    /// Module name of the template containing the statement.
    #[serde(default)]
    pub parent: Option<String>,
}

/// Execute the resolve command
pub fn execute(args: ResolveArgs) -> Result<()> {
    let fixture = load_fixture(&args.fixture)?;
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EnvironmentConfig::default(),
    };

    let env = build_environment(&fixture, config)?;
    info!(
        statements = fixture.statements.len(),
        environment = %env.id(),
        "resolving fixture"
    );

    for line in resolve_statements(&env, fixture.statements) {
        println!("{}", line);
    }

    if args.stats {
        let stats = env.cache_stats();
        println!(
            "definitions: {} hits, {} misses, {}/{} retained",
            stats.definitions.hits, stats.definitions.misses, stats.definitions.len, stats.definitions.capacity
        );
    }

    Ok(())
}

fn load_fixture(path: &Path) -> Result<Fixture> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid fixture: {}", path.display()))
}

fn load_config(path: &Path) -> Result<EnvironmentConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    EnvironmentConfig::from_toml_str(&text)
        .with_context(|| format!("Invalid config: {}", path.display()))
}

/// Build the registry described by `fixture.registry`.
pub fn build_registry(entries: &[RegistryEntry]) -> Result<MemoryRegistry> {
    let mut registry = MemoryRegistry::new();
    for entry in entries {
        let specifier = Specifier::parse(&entry.specifier)
            .ok_or_else(|| anyhow!("Invalid specifier: {}", entry.specifier))?;
        let registration = match specifier.kind {
            SpecifierKind::Component => {
                Registration::Component(Rc::new(ComponentClass::new(specifier.name.as_str())))
            }
            SpecifierKind::Template => Registration::Template(Rc::new(TemplateFactory::new(
                specifier.name.as_str(),
                entry.body.clone().unwrap_or_default(),
            ))),
            SpecifierKind::Helper => Registration::Helper(Helper::simple(|_, _| Value::Null)),
        };
        debug!(specifier = %specifier, source = ?entry.source, "register");
        match &entry.source {
            Some(source) => registry.register_scoped(source.as_str(), specifier, registration),
            None => registry.register(specifier, registration),
        };
    }
    Ok(registry)
}

pub fn build_environment(fixture: &Fixture, config: EnvironmentConfig) -> Result<Environment> {
    let registry = build_registry(&fixture.registry)?;
    let env = Environment::builder(Rc::new(registry))
        .config(config)
        .build()
        .context("Failed to create environment")?;
    Ok(env)
}

/// Refine each statement in order, returning one output line per statement.
pub fn resolve_statements(env: &Environment, statements: Vec<FixtureStatement>) -> Vec<String> {
    statements
        .into_iter()
        .map(|entry| {
            let key = entry.key.clone();
            let parent = entry.parent.map(ParentMeta::new);
            let statement = Statement::new(entry.key, entry.form).with_args(entry.args);
            match env.refine_statement(statement, parent.as_ref()) {
                Ok(Some(syntax)) => format!("{} -> {}", key, describe(&syntax)),
                Ok(None) => format!("{} -> none", key),
                Err(err) => format!("{} -> error: {}", key, err),
            }
        })
        .collect()
}

fn describe(syntax: &Syntax) -> String {
    match syntax.definition() {
        Some(definition) => format!("{}({})", syntax.kind(), definition.name),
        None => syntax.kind().to_string(),
    }
}
