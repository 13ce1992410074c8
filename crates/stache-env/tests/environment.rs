/*
 * environment.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Caches and renderer hooks exposed by the environment.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pretty_assertions::assert_eq;
use stache_env::diagnostics::STYLE_XSS_WARNING;
use stache_env::{
    CacheConfig, CompiledBlock, CompilerId, ComponentClass, ComponentInstance, ComponentManager,
    ConstReference, Element, EnvError, EnvResult, Environment, EnvironmentConfig, EvaluatedArgs,
    Helper, LayoutCompiler, MemoryRegistry, ParentMeta, Registration, SafeString, Specifier,
    Statement, Template, TemplateFactory, UpdatableReference, Value,
};

struct PrefixCompiler {
    prefix: &'static str,
    compiles: Cell<usize>,
}

impl PrefixCompiler {
    fn shared(prefix: &'static str) -> (Rc<Self>, Rc<dyn LayoutCompiler>) {
        let compiler = Rc::new(Self {
            prefix,
            compiles: Cell::new(0),
        });
        let erased: Rc<dyn LayoutCompiler> = compiler.clone();
        (compiler, erased)
    }
}

impl LayoutCompiler for PrefixCompiler {
    fn id(&self) -> CompilerId {
        CompilerId::new(self.prefix)
    }

    fn compile(&self, template: &Template) -> EnvResult<CompiledBlock> {
        self.compiles.set(self.compiles.get() + 1);
        Ok(CompiledBlock {
            template: template.id.clone(),
            compiler: self.id(),
            program: format!("{}:{}", self.prefix, template.factory.source),
        })
    }
}

fn env_with(registry: MemoryRegistry) -> Environment {
    Environment::new(Rc::new(registry)).unwrap()
}

#[test]
fn test_compiled_blocks_are_per_compiler_and_per_template() {
    let env = env_with(MemoryRegistry::new());
    let (eager, eager_dyn) = PrefixCompiler::shared("eager");
    let (wrapped, wrapped_dyn) = PrefixCompiler::shared("wrapped");

    let card = env.get_template(&Rc::new(TemplateFactory::new("components/card", "<div/>")));
    let row = env.get_template(&Rc::new(TemplateFactory::new("components/row", "<tr/>")));

    let a = env.get_compiled_block(&eager_dyn, &card).unwrap();
    let b = env.get_compiled_block(&eager_dyn, &card).unwrap();
    let c = env.get_compiled_block(&wrapped_dyn, &card).unwrap();
    let d = env.get_compiled_block(&eager_dyn, &row).unwrap();

    assert!(Rc::ptr_eq(&a, &b));
    assert!(!Rc::ptr_eq(&a, &c));
    assert_eq!(a.program, "eager:<div/>");
    assert_eq!(c.program, "wrapped:<div/>");
    assert_eq!(d.program, "eager:<tr/>");
    assert_eq!(eager.compiles.get(), 2);
    assert_eq!(wrapped.compiles.get(), 1);
    assert_eq!(env.cache_stats().compilers.len, 2);
}

#[test]
fn test_definition_capacity_is_enforced() {
    let mut registry = MemoryRegistry::new();
    for name in ["card-a", "card-b", "card-c"] {
        registry.register(
            Specifier::component(name),
            Registration::Component(Rc::new(ComponentClass::new(name))),
        );
    }
    let config = EnvironmentConfig {
        caches: CacheConfig {
            definitions: 2,
            ..CacheConfig::default()
        },
    };
    let env = Environment::builder(Rc::new(registry))
        .config(config)
        .build()
        .unwrap();

    let a = env.get_component_definition("card-a", None).unwrap();
    let b = env.get_component_definition("card-b", None).unwrap();
    let b_again = env.get_component_definition("card-b", None).unwrap();
    assert!(Rc::ptr_eq(&b, &b_again));

    env.get_component_definition("card-c", None).unwrap();
    assert_eq!(env.cache_stats().definitions.len, 2);

    // card-a was least recently used, so it was evicted and is rebuilt.
    let a_again = env.get_component_definition("card-a", None).unwrap();
    assert!(!Rc::ptr_eq(&a, &a_again));
}

#[test]
fn test_style_warning_fires_once_per_untrusted_binding() {
    let env = env_with(MemoryRegistry::new());
    let mut element = Element::new("div");
    let reference = UpdatableReference::new("color: red");
    let reference: stache_env::ReferenceRef = reference;

    let list = env.attribute_for(&element, "style", &reference, false);
    list.set_attribute(&mut element, "style", &reference.value());

    assert_eq!(env.diagnostics().count(STYLE_XSS_WARNING), 1);
    assert_eq!(element.attribute("style"), Some("color: red"));

    let safe = Value::Safe(SafeString::new("color: blue"));
    list.update_attribute(&mut element, "style", &safe);
    assert_eq!(env.diagnostics().count(STYLE_XSS_WARNING), 1);
    assert_eq!(element.attribute("style"), Some("color: blue"));

    let trusted = env.attribute_for(&element, "style", &reference, true);
    trusted.set_attribute(&mut element, "style", &Value::from("color: green"));
    assert_eq!(env.diagnostics().count(STYLE_XSS_WARNING), 1);
}

#[test]
fn test_helper_lookup_through_environment() {
    let mut registry = MemoryRegistry::new();
    registry.register_scoped(
        "template:app/templates/posts",
        Specifier::helper("excerpt"),
        Registration::Helper(Helper::simple(|positional, named| {
            let text = positional[0].to_display_string();
            let length = match named.get("length") {
                Some(Value::Number(n)) => *n as usize,
                _ => 3,
            };
            Value::from(text.chars().take(length).collect::<String>())
        })),
    );
    let env = env_with(registry);
    let posts = ParentMeta::new("app/templates/posts");

    assert!(env.has_helper("excerpt", Some(&posts)));
    assert!(!env.has_helper("excerpt", None));
    assert!(matches!(
        env.lookup_helper("excerpt", None),
        Err(EnvError::HelperNotFound { .. })
    ));

    let excerpt = env.lookup_helper("excerpt", Some(&posts)).unwrap();
    let body = UpdatableReference::new("Hello world");
    let reference = excerpt(
        EvaluatedArgs::new()
            .with_positional(body.clone())
            .with_named("length", ConstReference::create(5)),
    );
    assert_eq!(reference.value(), Value::from("Hello"));
    body.update("Goodbye");
    assert_eq!(reference.value(), Value::from("Goodb"));

    let concat = env.lookup_helper("concat", None).unwrap();
    let joined = concat(
        EvaluatedArgs::new()
            .with_positional(ConstReference::create("a"))
            .with_positional(ConstReference::create("b")),
    );
    assert_eq!(joined.value(), Value::from("ab"));
}

#[test]
fn test_partials_through_environment() {
    let mut registry = MemoryRegistry::new();
    registry.register(
        Specifier::template("shared/_nav"),
        Registration::Template(Rc::new(TemplateFactory::new("shared/_nav", "<nav/>"))),
    );
    let env = env_with(registry);

    assert!(env.has_partial("shared/nav"));
    assert_eq!(env.lookup_partial("shared/nav").unwrap().template.source, "<nav/>");
    assert_eq!(
        env.lookup_partial("shared/footer").err(),
        Some(EnvError::PartialNotFound {
            name: "shared/footer".to_string()
        })
    );
}

#[test]
fn test_iteration_keys_by_path() {
    let env = env_with(MemoryRegistry::new());
    let posts: Value = serde_json::from_str(r#"[{"id": 1}, {"id": 2}, {"id": 1}]"#).unwrap();
    let iterable = env.iterable_for(
        ConstReference::create(posts),
        &EvaluatedArgs::new().with_named("key", ConstReference::create("id")),
    );
    let keys: Vec<_> = iterable.items().into_iter().map(|item| item.key).collect();
    assert_eq!(keys, vec!["1", "2", "1-2"]);
}

struct Recorder {
    order: RefCell<Vec<String>>,
}

impl ComponentManager for Recorder {
    fn did_create(&self, component: &ComponentInstance) {
        self.order.borrow_mut().push(component.name().to_string());
    }
}

#[test]
fn test_lifecycle_most_recent_first() {
    let mut registry = MemoryRegistry::new();
    for name in ["outer-card", "inner-row"] {
        registry.register(
            Specifier::component(name),
            Registration::Component(Rc::new(ComponentClass::new(name))),
        );
    }
    let env = env_with(registry);
    let recorder = Rc::new(Recorder {
        order: RefCell::new(Vec::new()),
    });

    env.begin();
    for key in ["outer-card", "inner-row"] {
        let syntax = env
            .refine_statement(Statement::inline(key), None)
            .unwrap()
            .unwrap();
        let definition = syntax.definition().unwrap().clone();
        env.did_create(ComponentInstance::new(definition), recorder.clone());
    }
    assert_eq!(env.created_components(), vec!["inner-row", "outer-card"]);

    env.commit();
    assert_eq!(*recorder.order.borrow(), vec!["inner-row", "outer-card"]);
    assert!(env.created_components().is_empty());
}

#[test]
fn test_config_from_toml() {
    let config = EnvironmentConfig::from_toml_str(
        r#"
        [caches]
        definitions = 50
        compiled-blocks = 25
        "#,
    )
    .unwrap();
    let env = Environment::builder(Rc::new(MemoryRegistry::new()))
        .config(config)
        .build()
        .unwrap();

    assert_eq!(env.cache_stats().definitions.capacity, 50);
    assert_eq!(env.cache_stats().templates.capacity, 1000);
    assert_eq!(env.config().caches.compiled_blocks, 25);
}
