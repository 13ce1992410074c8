/*
 * lib.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Bounded memoizing caches for the stache template environment.
//!
//! The environment keeps several lookup tables that map an identity (a
//! component name plus the module it was referenced from, a template id, a
//! compiler id) to an expensive-to-build value. All of them are instances of
//! [`BoundedCache`]:
//!
//! - lookups are memoized, and the same stored value is handed back for every
//!   lookup of an equal normalized key
//! - the number of retained entries never exceeds the configured capacity
//! - a factory may itself perform lookups against this or another cache
//!
//! # Example
//!
//! ```ignore
//! use stache_cache::BoundedCache;
//!
//! let cache = BoundedCache::new(100, |name: &String| name.to_lowercase(), |name: &String| {
//!     std::rc::Rc::new(expensive_lookup(name))
//! });
//! let a = cache.get(&"Header".to_string());
//! let b = cache.get(&"header".to_string());
//! assert!(std::rc::Rc::ptr_eq(&a, &b));
//! ```

pub mod bounded;

pub use bounded::{BoundedCache, CacheStats};
