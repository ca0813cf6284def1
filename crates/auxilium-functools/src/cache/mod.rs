//! Caching and memoization of functions and methods.
//!
//! - [`store`] - Per-owner cache storage and the [`Cacheable`] trait
//! - [`strategy`] - Single-value and memoizing strategies, key canonicalization
//! - [`recompute`] - The lookup, compute and store cycle
//! - [`descriptor`] - Instance-level caching of methods
//! - [`decorator`] - `cache`, `memoize` and their shortcuts

pub mod decorator;
pub mod descriptor;
pub mod recompute;
pub mod store;
pub mod strategy;

pub use decorator::{
    cache, cache_method, cache_property, memoize, BaseCacheDecorator, CacheDecorator,
    CacheOptions, Cached, CachedFunction, MemoizeDecorator,
};
pub use descriptor::{BoundMethod, CacheDescriptor};
pub use recompute::RecomputePolicy;
pub use store::{CacheSlots, Cacheable};
pub use strategy::{cache_key, BaseCache, CacheKind, Caching, Memoizing};
