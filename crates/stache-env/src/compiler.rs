/*
 * compiler.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Layout compilation and the compiled block cache.
//!
//! Different compilers may turn the same template into structurally different
//! blocks, so compiled blocks are cached per compiler: the outer cache maps a
//! compiler id to an inner cache, and the inner cache maps a template id to
//! the block that compiler produced for it. Each level evicts on its own.

use std::fmt;
use std::rc::Rc;

use stache_cache::{BoundedCache, CacheStats};

use crate::error::{EnvError, EnvResult};
use crate::template::{Template, TemplateId};

/// Identity of a compiler strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompilerId(String);

impl CompilerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompilerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The executable form of a template, as produced by one compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledBlock {
    pub template: TemplateId,
    pub compiler: CompilerId,
    pub program: String,
}

/// A strategy for compiling component layouts.
pub trait LayoutCompiler {
    /// Stable identity; compilers with the same id share cache slots.
    fn id(&self) -> CompilerId;

    /// Compile `template` into a block.
    fn compile(&self, template: &Template) -> EnvResult<CompiledBlock>;
}

type BlockCache = BoundedCache<Rc<Template>, TemplateId, Rc<CompiledBlock>, EnvError>;

/// Two-level cache of compiled blocks: compiler, then template.
pub struct CompiledBlockCache {
    compilers: BoundedCache<Rc<dyn LayoutCompiler>, CompilerId, Rc<BlockCache>>,
}

impl CompiledBlockCache {
    /// `compilers` bounds the number of per-compiler caches; `blocks` bounds
    /// each of them.
    pub fn new(compilers: usize, blocks: usize) -> Self {
        let compilers = BoundedCache::new(
            compilers,
            |compiler: &Rc<dyn LayoutCompiler>| compiler.id(),
            move |compiler: &Rc<dyn LayoutCompiler>| {
                tracing::debug!(compiler = %compiler.id(), "creating block cache");
                let compiler = Rc::clone(compiler);
                let blocks = BoundedCache::fallible(
                    blocks,
                    |template: &Rc<Template>| template.id.clone(),
                    move |template: &Rc<Template>| {
                        tracing::debug!(
                            compiler = %compiler.id(),
                            template = %template.id,
                            "compiling layout"
                        );
                        compiler.compile(template).map(Rc::new)
                    },
                )
                .labeled("compiled-blocks");
                Rc::new(blocks)
            },
        )
        .labeled("compilers");
        Self { compilers }
    }

    /// The block `compiler` produces for `template`, compiling on first use.
    ///
    /// A failed compile is not cached.
    pub fn get(&self, compiler: &Rc<dyn LayoutCompiler>, template: &Rc<Template>) -> EnvResult<Rc<CompiledBlock>> {
        let blocks = self.compilers.get(compiler);
        blocks.try_get(template)
    }

    /// Statistics of the outer, per-compiler level.
    pub fn stats(&self) -> CacheStats {
        self.compilers.stats()
    }

    /// Statistics of the inner cache belonging to `compiler`.
    pub fn block_stats(&self, compiler: &Rc<dyn LayoutCompiler>) -> CacheStats {
        self.compilers.get(compiler).stats()
    }
}

impl fmt::Debug for CompiledBlockCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledBlockCache")
            .field("stats", &self.stats())
            .finish()
    }
}
