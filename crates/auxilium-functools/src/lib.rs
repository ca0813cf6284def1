//! # auxilium-functools
//!
//! Building blocks for configurable decorators over dynamically-typed
//! callables: declarative parameter specifications, a decorator protocol that
//! preserves metadata, function/method aware wrapping, caching and
//! memoization with per-instance storage, and lazy evaluation.
//!
//! ## Modules
//!
//! - [`args`] - Call-time arguments and the `call_args!` macro
//! - [`callable`] - Callables, classes and decoration targets
//! - [`params`] - Parameter specifications and argument binding
//! - [`decorator`] - The `Decorator` / `Wrap` protocol and `DecoratorFactory`
//! - [`hybrid`] - Free function versus method detection
//! - [`cache`] - Caching and memoizing decorators
//! - [`lazy`] - Lazy evaluation decorator

pub mod args;
pub mod cache;
pub mod callable;
pub mod decorator;
pub mod hybrid;
pub mod lazy;
pub mod params;

// Re-export the most commonly used types at the crate root.
pub use args::{is_truthy, CallArgs};
pub use auxilium_core::{AuxiliumError, AuxiliumResult};
pub use callable::{Callable, ClassDef, Metadata, Target};
pub use decorator::{Decorator, DecoratorFactory, Wrap, Wraps};
pub use hybrid::HybridDecorator;
pub use params::{BoundParameters, Parameter, ParameterKind, ParameterSpec};

#[doc(hidden)]
pub mod __private {
    pub use serde_json::json;
}
