//! Decorators which behave differently on free functions and on methods.
//!
//! [`HybridDecorator`] accepts an `is_method` parameter and settles, once per
//! wrap, whether the target lives in a class. Decorators needing that answer
//! embed it and call [`HybridDecorator::detect`] from their `pre_wrap`.

use std::any::TypeId;

use auxilium_core::settings::{self, Settings};
use auxilium_core::AuxiliumResult;
use serde_json::Value;

use crate::callable::Target;
use crate::decorator::{Decorator, Wrap};
use crate::params::{BoundParameters, ParameterSpec};

/// Name of the parameter overriding method detection.
pub const IS_METHOD: &str = "is_method";

/// Decides whether `target` is defined inside a class.
///
/// An explicit `is_method` wins. Otherwise, when
/// [`Settings::detect_methods_by_name`] is on, a callable whose first declared
/// parameter is a receiver name counts as a method. Failing both, the receiver
/// type decides: `()` is a free function, anything else a method. Classes are
/// never in a class.
pub fn detect_in_class<R: 'static>(
    is_method: Option<bool>,
    target: &Target<R>,
    settings: &Settings,
) -> bool {
    let Target::Callable(callable) = target else {
        return false;
    };
    if let Some(explicit) = is_method {
        return explicit;
    }
    if settings.detect_methods_by_name {
        if let Some(first) = callable.metadata().params.first() {
            if settings.is_receiver_name(first) {
                tracing::warn!(
                    target_name = callable.name(),
                    receiver = first.as_str(),
                    "treating callable as a method because of its first parameter name; \
                     pass is_method explicitly to silence this"
                );
                return true;
            }
        }
    }
    TypeId::of::<R>() != TypeId::of::<()>()
}

/// Declared parameters of a method, without a leading receiver name.
pub fn method_arguments<'a>(params: &'a [String], settings: &Settings) -> &'a [String] {
    match params.split_first() {
        Some((first, rest)) if settings.is_receiver_name(first) => rest,
        _ => params,
    }
}

/// The `is_method` configuration and the resolved `in_class` answer.
///
/// On its own it is an identity decorator: the target is returned unchanged.
///
/// ```
/// use auxilium_functools::{CallArgs, Callable, HybridDecorator};
/// use serde_json::Value;
///
/// struct Point;
///
/// let mut hybrid = HybridDecorator::default();
/// let method = Callable::new("norm", |_p: &Point, _args: &CallArgs| Ok(Value::Null));
/// assert!(hybrid.detect(&method.into()));
/// assert_eq!(hybrid.in_class(), Some(true));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HybridDecorator {
    is_method: Option<bool>,
    in_class: Option<bool>,
}

impl HybridDecorator {
    /// Creates a hybrid context with an explicit `is_method`.
    pub const fn new(is_method: Option<bool>) -> Self {
        Self {
            is_method,
            in_class: None,
        }
    }

    /// Reads `is_method` from bound parameters.
    pub fn from_bound(params: &BoundParameters) -> AuxiliumResult<Self> {
        Ok(Self::new(params.get_opt_bool(IS_METHOD)?))
    }

    /// Appends the `is_method` parameter (default `null`) to `spec`.
    pub fn extend_spec(spec: ParameterSpec) -> ParameterSpec {
        spec.with_parameter(IS_METHOD).with_default(IS_METHOD, Value::Null)
    }

    /// The explicit `is_method` configuration.
    pub const fn is_method(&self) -> Option<bool> {
        self.is_method
    }

    /// The resolved answer, once [`detect`](Self::detect) has run.
    pub const fn in_class(&self) -> Option<bool> {
        self.in_class
    }

    /// Resolves `in_class` for `target` with the active settings.
    ///
    /// The answer is computed on the first call and reused afterwards.
    pub fn detect<R: 'static>(&mut self, target: &Target<R>) -> bool {
        self.detect_with(target, settings::active())
    }

    /// Resolves `in_class` for `target` with explicit settings.
    pub fn detect_with<R: 'static>(&mut self, target: &Target<R>, settings: &Settings) -> bool {
        let is_method = self.is_method;
        *self
            .in_class
            .get_or_insert_with(|| detect_in_class(is_method, target, settings))
    }
}

impl Decorator for HybridDecorator {
    fn parameter_spec() -> ParameterSpec {
        Self::extend_spec(ParameterSpec::default())
    }

    fn from_parameters(params: &BoundParameters) -> AuxiliumResult<Self> {
        Self::from_bound(params)
    }
}

impl<R: 'static> Wrap<R> for HybridDecorator {
    type Output = Target<R>;

    fn pre_wrap(&mut self, target: &Target<R>) -> AuxiliumResult<()> {
        self.detect(target);
        Ok(())
    }

    fn get_wrapped_object(self, target: Target<R>) -> AuxiliumResult<Target<R>> {
        Ok(target)
    }
}
