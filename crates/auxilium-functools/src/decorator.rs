//! Class-based decorators.
//!
//! A decorator is a type that declares the configuration it accepts
//! ([`Decorator::parameter_spec`]), builds itself from bound configuration
//! ([`Decorator::from_parameters`]), and turns a [`Target`] into its wrapped
//! form ([`Wrap::get_wrapped_object`]). [`DecoratorFactory`] normalizes how a
//! decorator is applied:
//!
//! - [`DecoratorFactory::decorate`] applies it with default configuration;
//! - [`DecoratorFactory::configure`] builds a configured instance which is
//!   then applied with [`Wrap::wrap`].
//!
//! Keeping the two entry points separate means a configuration argument that
//! is itself callable is never mistaken for the decoration target.
//!
//! # Examples
//!
//! ```
//! use auxilium_functools::{
//!     call_args, AuxiliumResult, BoundParameters, CallArgs, Callable, Decorator,
//!     ParameterSpec, Target, Wrap,
//! };
//! use serde_json::{json, Value};
//!
//! struct Scale {
//!     factor: i64,
//! }
//!
//! impl Decorator for Scale {
//!     fn parameter_spec() -> ParameterSpec {
//!         ParameterSpec::new(["factor"]).with_default("factor", json!(2))
//!     }
//!
//!     fn from_parameters(params: &BoundParameters) -> AuxiliumResult<Self> {
//!         let factor = params.get("factor").and_then(Value::as_i64).unwrap_or(2);
//!         Ok(Self { factor })
//!     }
//! }
//!
//! impl Wrap<()> for Scale {
//!     type Output = Target<()>;
//!
//!     fn get_wrapped_object(self, target: Target<()>) -> AuxiliumResult<Target<()>> {
//!         let Target::Callable(inner) = target else { return Ok(target) };
//!         let factor = self.factor;
//!         Ok(Callable::function("scaled", move |args: &CallArgs| {
//!             let value = inner.call(args)?;
//!             Ok(json!(value.as_i64().unwrap_or_default() * factor))
//!         })
//!         .into())
//!     }
//! }
//!
//! let three = Callable::function("three", |_args: &CallArgs| Ok(json!(3)));
//!
//! let doubled = Scale::as_decorator().decorate(three.clone()).unwrap();
//! let tripled = Scale::as_decorator()
//!     .configure(call_args!(; factor = 3))
//!     .unwrap()
//!     .wrap(three)
//!     .unwrap();
//!
//! let Target::Callable(doubled) = doubled else { unreachable!() };
//! let Target::Callable(tripled) = tripled else { unreachable!() };
//! assert_eq!(doubled.call(&CallArgs::new()).unwrap(), json!(6));
//! assert_eq!(tripled.call(&CallArgs::new()).unwrap(), json!(9));
//! assert_eq!(doubled.name(), "three");
//! ```

use std::fmt;
use std::marker::PhantomData;

use auxilium_core::logging::decoration_span;
use auxilium_core::AuxiliumResult;

use crate::args::CallArgs;
use crate::callable::{Metadata, Target};
use crate::params::{BoundParameters, ParameterSpec};

/// Wrapped objects that can take over the descriptive metadata of what they wrap.
pub trait Wraps {
    /// Copies name, doc, module, params and attributes from `wrapped`.
    fn update_wrapper(&mut self, wrapped: &Metadata);
}

impl<R> Wraps for Target<R> {
    fn update_wrapper(&mut self, wrapped: &Metadata) {
        match self {
            Self::Callable(callable) => callable.metadata_mut().update_from(wrapped),
            Self::Class(class) => class.meta.update_from(wrapped),
        }
    }
}

/// The configuration half of a decorator.
pub trait Decorator: Sized {
    /// The configuration parameters this decorator accepts.
    fn parameter_spec() -> ParameterSpec {
        ParameterSpec::default()
    }

    /// Builds the decorator from resolved configuration.
    fn from_parameters(params: &BoundParameters) -> AuxiliumResult<Self>;

    /// Returns the factory used to apply this decorator.
    fn as_decorator() -> DecoratorFactory<Self> {
        DecoratorFactory::new()
    }
}

/// The wrapping half of a decorator, for targets with receiver type `R`.
pub trait Wrap<R>: Decorator {
    /// What the decorator turns a target into.
    type Output: Wraps;

    /// Hook executed before the target is wrapped.
    fn pre_wrap(&mut self, _target: &Target<R>) -> AuxiliumResult<()> {
        Ok(())
    }

    /// Returns the wrapped version of `target`.
    fn get_wrapped_object(self, target: Target<R>) -> AuxiliumResult<Self::Output>;

    /// Applies the decorator to `target`.
    ///
    /// Classes are handed to [`get_wrapped_object`](Self::get_wrapped_object)
    /// and returned as-is. For callables, the output takes over the target's
    /// metadata through [`Wraps::update_wrapper`].
    fn wrap(mut self, target: impl Into<Target<R>>) -> AuxiliumResult<Self::Output> {
        let target = target.into();
        let span = decoration_span(target.name());
        let _guard = span.enter();

        self.pre_wrap(&target)?;
        if target.is_class() {
            tracing::debug!("wrapping class");
            return self.get_wrapped_object(target);
        }

        let wrapped_meta = target.metadata().clone();
        let mut wrapped = self.get_wrapped_object(target)?;
        wrapped.update_wrapper(&wrapped_meta);
        tracing::debug!("wrapped callable");
        Ok(wrapped)
    }
}

/// Entry points for applying a decorator `D`.
///
/// Default arguments given to [`with_defaults`](Self::with_defaults) are
/// pre-bound in front of every configuration, like partial application.
pub struct DecoratorFactory<D> {
    defaults: CallArgs,
    _decorator: PhantomData<fn() -> D>,
}

impl<D> Clone for DecoratorFactory<D> {
    fn clone(&self) -> Self {
        Self {
            defaults: self.defaults.clone(),
            _decorator: PhantomData,
        }
    }
}

impl<D> fmt::Debug for DecoratorFactory<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorFactory")
            .field("decorator", &std::any::type_name::<D>())
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl<D: Decorator> Default for DecoratorFactory<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Decorator> DecoratorFactory<D> {
    /// Creates a factory without pre-bound arguments.
    pub fn new() -> Self {
        Self::with_defaults(CallArgs::new())
    }

    /// Creates a factory whose configurations start from `defaults`.
    pub const fn with_defaults(defaults: CallArgs) -> Self {
        Self {
            defaults,
            _decorator: PhantomData,
        }
    }

    /// Returns the pre-bound arguments.
    pub const fn defaults(&self) -> &CallArgs {
        &self.defaults
    }

    /// Returns the decorator's parameter specification.
    pub fn parameter_spec(&self) -> ParameterSpec {
        D::parameter_spec()
    }

    /// Builds a configured decorator instance (`@deco(args)`).
    ///
    /// The parameter specification is validated before any argument is bound,
    /// so a malformed declaration fails with a configuration error regardless
    /// of the arguments.
    pub fn configure(&self, args: CallArgs) -> AuxiliumResult<D> {
        let spec = D::parameter_spec();
        spec.validate()?;
        let bound = spec.resolve(&self.defaults.merged(&args))?;
        D::from_parameters(&bound)
    }

    /// Applies the decorator with default configuration (`@deco`).
    pub fn decorate<R>(&self, target: impl Into<Target<R>>) -> AuxiliumResult<D::Output>
    where
        D: Wrap<R>,
    {
        self.configure(CallArgs::new())?.wrap(target)
    }
}
