//! # auxilium
//!
//! Configurable decorators, hybrid function/method wrappers, and caching
//! descriptors for Rust.
//!
//! This is the meta-crate that re-exports all sub-crates for convenient access.
//! You can depend on `auxilium` to get everything, or depend on individual
//! crates for finer-grained control.
//!
//! ```
//! use auxilium::prelude::*;
//! use serde_json::json;
//!
//! let square = Callable::function("square", |args: &CallArgs| {
//!     let x = args.positional().first().and_then(|v| v.as_i64()).unwrap_or_default();
//!     Ok(json!(x * x))
//! });
//! let square = memoize().decorate(square)?.into_function().expect("free function");
//! assert_eq!(square.call(&call_args!(4))?, json!(16));
//! assert_eq!(square.evict(&call_args!(4))?, json!(16));
//! # Ok::<(), AuxiliumError>(())
//! ```

/// Errors, settings, settings loading and logging.
pub use auxilium_core as core;

/// Decorator builder, hybrid wrappers, caching and lazy evaluation.
#[cfg(feature = "functools")]
pub use auxilium_functools as functools;

#[cfg(feature = "functools")]
pub use auxilium_functools::call_args;

/// Third-party re-exports for user convenience.
pub use serde_json;
pub use tracing;

/// The most commonly used types and functions.
pub mod prelude {
    pub use auxilium_core::logging::setup_logging;
    pub use auxilium_core::{AuxiliumError, AuxiliumResult, Settings, SETTINGS};

    #[cfg(feature = "functools")]
    pub use auxilium_functools::cache::{
        cache, cache_method, cache_property, memoize, CacheSlots, Cacheable, Cached,
    };
    #[cfg(feature = "functools")]
    pub use auxilium_functools::call_args;
    #[cfg(feature = "functools")]
    pub use auxilium_functools::lazy::flazy;
    #[cfg(feature = "functools")]
    pub use auxilium_functools::{
        CallArgs, Callable, ClassDef, Decorator, ParameterSpec, Target, Wrap,
    };
}
