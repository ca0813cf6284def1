//! Lazy evaluation of functions.
//!
//! A function decorated with [`LazyDecorator`] does not run when called.
//! The call returns a [`LazyValue`] which captures the arguments and runs the
//! function the first time its value is needed. The decorator declares which
//! kinds of value the function may produce, and a result of any other kind is
//! rejected.
//!
//! # Examples
//!
//! ```
//! use auxilium_functools::lazy::flazy;
//! use auxilium_functools::{call_args, CallArgs, Callable};
//! use serde_json::json;
//!
//! let suffix = Callable::function("suffix", |args: &CallArgs| {
//!     let base = args.positional()[0].as_str().unwrap_or_default();
//!     Ok(json!(format!("{base}foo")))
//! });
//! let lazy_suffix = flazy(suffix, "string").unwrap();
//!
//! let value = lazy_suffix.call(&call_args!("bar"));
//! assert!(!value.is_evaluated());
//! assert_eq!(value.get().unwrap(), &json!("barfoo"));
//! assert!(value.is_evaluated());
//! ```

use std::fmt;
use std::str::FromStr;

use auxilium_core::{AuxiliumError, AuxiliumResult};
use once_cell::sync::OnceCell;
use serde_json::Value;

use crate::args::CallArgs;
use crate::callable::{Callable, Metadata, Target};
use crate::decorator::{Decorator, Wrap, Wraps};
use crate::params::{BoundParameters, ParameterSpec};

/// The dynamic kind of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// `null`
    Null,
    /// `true` or `false`
    Bool,
    /// Any number.
    Number,
    /// A string.
    String,
    /// An array.
    Array,
    /// An object.
    Object,
}

impl ValueKind {
    /// Returns the kind of `value`.
    pub const fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Returns the kind's name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl FromStr for ValueKind {
    type Err = AuxiliumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "null" => Ok(Self::Null),
            "bool" => Ok(Self::Bool),
            "number" => Ok(Self::Number),
            "string" => Ok(Self::String),
            "array" => Ok(Self::Array),
            "object" => Ok(Self::Object),
            other => Err(AuxiliumError::ConfigurationError(format!(
                "Unknown value kind \"{other}\""
            ))),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn kinds_display(kinds: &[ValueKind]) -> String {
    kinds
        .iter()
        .map(|k| k.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Makes functions return [`LazyValue`]s.
///
/// Takes one required parameter, `types`: a kind name or an array of kind
/// names (`null`, `bool`, `number`, `string`, `array`, `object`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyDecorator {
    kinds: Vec<ValueKind>,
}

impl LazyDecorator {
    /// The kinds the wrapped function may produce.
    pub fn kinds(&self) -> &[ValueKind] {
        &self.kinds
    }
}

impl Decorator for LazyDecorator {
    fn parameter_spec() -> ParameterSpec {
        ParameterSpec::new(["types"])
    }

    fn from_parameters(params: &BoundParameters) -> AuxiliumResult<Self> {
        let kinds: Vec<ValueKind> = match params.get("types") {
            Some(Value::String(name)) => vec![name.parse::<ValueKind>()?],
            Some(Value::Array(names)) => names
                .iter()
                .map(|name| match name {
                    Value::String(name) => name.parse::<ValueKind>(),
                    other => Err(AuxiliumError::TypeError(format!(
                        "\"types\" entries must be strings, got {other}"
                    ))),
                })
                .collect::<AuxiliumResult<Vec<_>>>()?,
            Some(other) => {
                return Err(AuxiliumError::TypeError(format!(
                    "\"types\" must be a string or an array of strings, got {other}"
                )));
            }
            None => {
                return Err(AuxiliumError::BindingError(
                    "\"types\" argument is not provided".to_string(),
                ));
            }
        };
        if kinds.is_empty() {
            return Err(AuxiliumError::ConfigurationError(
                "At least one possible value kind is required".to_string(),
            ));
        }
        Ok(Self { kinds })
    }
}

impl Wrap<()> for LazyDecorator {
    type Output = LazyFunction;

    fn get_wrapped_object(self, target: Target<()>) -> AuxiliumResult<LazyFunction> {
        match target {
            Target::Callable(function) => {
                let meta = function.metadata().clone();
                Ok(LazyFunction {
                    function,
                    kinds: self.kinds,
                    meta,
                })
            }
            Target::Class(class) => Err(AuxiliumError::TypeError(format!(
                "cannot make class \"{}\" lazy; lazy evaluation applies to functions",
                class.meta.name
            ))),
        }
    }
}

/// A function whose calls are deferred.
#[derive(Debug, Clone)]
pub struct LazyFunction {
    function: Callable,
    kinds: Vec<ValueKind>,
    meta: Metadata,
}

impl LazyFunction {
    /// Captures `args` without running the function.
    pub fn call(&self, args: &CallArgs) -> LazyValue {
        LazyValue {
            function: self.function.clone(),
            args: args.clone(),
            kinds: self.kinds.clone(),
            value: OnceCell::new(),
        }
    }

    /// The kinds the function may produce.
    pub fn kinds(&self) -> &[ValueKind] {
        &self.kinds
    }

    /// Metadata of the wrapped function.
    pub const fn metadata(&self) -> &Metadata {
        &self.meta
    }
}

impl Wraps for LazyFunction {
    fn update_wrapper(&mut self, wrapped: &Metadata) {
        self.meta.update_from(wrapped);
    }
}

/// A deferred function call, evaluated at most once.
///
/// A failed evaluation is not remembered: the next access runs the function
/// again.
pub struct LazyValue {
    function: Callable,
    args: CallArgs,
    kinds: Vec<ValueKind>,
    value: OnceCell<Value>,
}

impl LazyValue {
    /// Returns the value, evaluating the function on first access.
    pub fn get(&self) -> AuxiliumResult<&Value> {
        self.value.get_or_try_init(|| {
            tracing::debug!(function = self.function.name(), "evaluating lazy value");
            let value = self.function.call(&self.args)?;
            let kind = ValueKind::of(&value);
            if !self.kinds.contains(&kind) {
                return Err(AuxiliumError::TypeError(format!(
                    "\"{}\" produced a {kind} value, expected one of: {}",
                    self.function.name(),
                    kinds_display(&self.kinds)
                )));
            }
            Ok(value)
        })
    }

    /// Returns `true` once the value has been computed.
    pub fn is_evaluated(&self) -> bool {
        self.value.get().is_some()
    }

    /// The captured call arguments.
    pub const fn args(&self) -> &CallArgs {
        &self.args
    }

    /// Evaluates if needed and returns the owned value.
    pub fn into_value(self) -> AuxiliumResult<Value> {
        self.get()?;
        self.value
            .into_inner()
            .ok_or_else(|| AuxiliumError::TypeError("lazy value was not evaluated".to_string()))
    }
}

impl fmt::Debug for LazyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value.get() {
            Some(value) => f.debug_tuple("LazyValue").field(value).finish(),
            None => write!(f, "LazyValue(<unevaluated {}>)", self.function.name()),
        }
    }
}

/// Wraps `function` so that its calls return [`LazyValue`]s of the given
/// kinds.
pub fn flazy(function: Callable, types: impl Into<Value>) -> AuxiliumResult<LazyFunction> {
    LazyDecorator::as_decorator()
        .configure(CallArgs::new().arg(types))?
        .wrap(function)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_args;
    use crate::callable::ClassDef;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn add_five() -> (Callable, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let function = Callable::function("add_five", move |args: &CallArgs| {
            counter.fetch_add(1, Ordering::SeqCst);
            match args.positional().first() {
                Some(Value::Number(n)) => Ok(json!(n.as_i64().unwrap_or_default() + 5)),
                Some(Value::String(s)) => Ok(json!(format!("{s}foo"))),
                _ => Ok(Value::Null),
            }
        })
        .with_doc("Adds five");
        (function, calls)
    }

    #[test]
    fn test_value_kind() {
        assert_eq!(ValueKind::of(&json!(null)), ValueKind::Null);
        assert_eq!(ValueKind::of(&json!(1.5)), ValueKind::Number);
        assert_eq!(ValueKind::of(&json!({})), ValueKind::Object);
        assert_eq!("array".parse::<ValueKind>().unwrap(), ValueKind::Array);
        assert_eq!(ValueKind::Bool.to_string(), "bool");
        assert!(matches!(
            "integer".parse::<ValueKind>(),
            Err(AuxiliumError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_configure_types() {
        let single = LazyDecorator::as_decorator().configure(call_args!("string")).unwrap();
        assert_eq!(single.kinds(), &[ValueKind::String]);

        let many = LazyDecorator::as_decorator()
            .configure(call_args!(["string", "number"]))
            .unwrap();
        assert_eq!(many.kinds(), &[ValueKind::String, ValueKind::Number]);

        let empty = LazyDecorator::as_decorator().configure(CallArgs::new().arg(json!([])));
        assert!(matches!(empty, Err(AuxiliumError::ConfigurationError(_))));

        let wrong = LazyDecorator::as_decorator().configure(call_args!(5));
        assert!(matches!(wrong, Err(AuxiliumError::TypeError(_))));

        let missing = LazyDecorator::as_decorator().configure(CallArgs::new());
        assert!(matches!(missing, Err(AuxiliumError::BindingError(_))));
    }

    #[test]
    fn test_evaluation_is_deferred_and_once() {
        let (function, calls) = add_five();
        let lazy = flazy(function, json!(["string", "number"])).unwrap();

        let value = lazy.call(&call_args!(5));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(value.get().unwrap(), &json!(10));
        assert_eq!(value.get().unwrap(), &json!(10));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let other = lazy.call(&call_args!("bar"));
        assert_eq!(other.into_value().unwrap(), json!("barfoo"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unexpected_kind_is_type_error() {
        let (function, calls) = add_five();
        let lazy = flazy(function, "number").unwrap();
        let value = lazy.call(&call_args!("bar"));
        assert!(matches!(value.get(), Err(AuxiliumError::TypeError(_))));
        assert!(!value.is_evaluated());
        assert!(value.get().is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_errors_are_not_memoized() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let flaky = Callable::function("flaky", move |_args: &CallArgs| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AuxiliumError::BindingError("first attempt fails".into()))
            } else {
                Ok(json!("ok"))
            }
        });
        let value = flazy(flaky, "string").unwrap().call(&CallArgs::new());
        assert!(matches!(value.get(), Err(AuxiliumError::BindingError(_))));
        assert_eq!(value.get().unwrap(), &json!("ok"));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_metadata_and_debug() {
        let (function, _) = add_five();
        let lazy = flazy(function, "number").unwrap();
        assert_eq!(lazy.metadata().name, "add_five");
        assert_eq!(lazy.metadata().doc.as_deref(), Some("Adds five"));
        assert_eq!(lazy.kinds(), &[ValueKind::Number]);

        let value = lazy.call(&call_args!(1));
        assert_eq!(value.args(), &call_args!(1));
        assert_eq!(format!("{value:?}"), "LazyValue(<unevaluated add_five>)");
        value.get().unwrap();
        assert_eq!(format!("{value:?}"), "LazyValue(Number(6))");
    }

    #[test]
    fn test_class_target_is_type_error() {
        let result = LazyDecorator::as_decorator()
            .configure(call_args!("string"))
            .unwrap()
            .wrap(ClassDef::new("Foo"));
        assert!(matches!(result, Err(AuxiliumError::TypeError(_))));
    }

    #[test]
    fn test_lazy_value_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LazyValue>();
        assert_send_sync::<LazyFunction>();
    }
}
