//! Call-time arguments.
//!
//! [`CallArgs`] carries the positional and keyword arguments of a single call
//! as dynamic [`Value`]s. Keywords are kept in a sorted map so that two calls
//! with the same keywords in a different order are indistinguishable.

use std::collections::BTreeMap;

use serde_json::Value;

/// Positional and keyword arguments of one call.
///
/// # Examples
///
/// ```
/// use auxilium_functools::CallArgs;
/// use serde_json::json;
///
/// let args = CallArgs::new().arg(json!(1)).kwarg("b", json!(2));
/// assert_eq!(args.positional(), &[json!(1)]);
/// assert_eq!(args.get_kwarg("b"), Some(&json!(2)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallArgs {
    positional: Vec<Value>,
    keyword: BTreeMap<String, Value>,
}

impl CallArgs {
    /// Creates an empty argument set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an argument set from positional values only.
    pub fn from_positional(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            positional: values.into_iter().collect(),
            keyword: BTreeMap::new(),
        }
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a keyword argument, replacing any previous value under `name`.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.insert(name.into(), value.into());
        self
    }

    /// Returns the positional arguments in call order.
    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    /// Returns the keyword arguments sorted by name.
    pub const fn keyword(&self) -> &BTreeMap<String, Value> {
        &self.keyword
    }

    /// Returns a single keyword argument.
    pub fn get_kwarg(&self, name: &str) -> Option<&Value> {
        self.keyword.get(name)
    }

    /// Removes a keyword argument, returning its value.
    pub fn take_kwarg(&mut self, name: &str) -> Option<Value> {
        self.keyword.remove(name)
    }

    /// Returns `true` when there are neither positional nor keyword arguments.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }

    /// Returns the total number of arguments.
    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    /// Applies `self` as pre-bound arguments in front of `other`.
    ///
    /// Positionals are concatenated (`self` first); keywords in `other`
    /// override keywords in `self`.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.positional.extend(other.positional.iter().cloned());
        for (name, value) in &other.keyword {
            merged.keyword.insert(name.clone(), value.clone());
        }
        merged
    }
}

/// Builds a [`CallArgs`] from positional expressions followed by `;` and
/// `name = value` keyword pairs.
///
/// Each value is a Rust expression and is serialized into a [`Value`]. JSON
/// syntax that is not a Rust expression, such as `null` or `{"k": 1}`, has to
/// be spelled with `serde_json::json!` inside the macro.
///
/// ```
/// use auxilium_functools::call_args;
/// use serde_json::json;
///
/// let args = call_args!(1, "two"; three = 3, four = [4]);
/// assert_eq!(args.positional().len(), 2);
/// assert_eq!(args.keyword().len(), 2);
///
/// let keywords_only = call_args!(; recompute = true);
/// assert!(keywords_only.positional().is_empty());
///
/// let literals = call_args!(json!(null); x = json!({"k": 1}));
/// assert_eq!(literals.positional(), &[json!(null)]);
/// assert_eq!(literals.get_kwarg("x"), Some(&json!({"k": 1})));
/// ```
#[macro_export]
macro_rules! call_args {
    ($($pos:expr),* $(; $($key:ident = $val:expr),*)?) => {{
        #[allow(unused_mut)]
        let mut args = $crate::CallArgs::new();
        $( args = args.arg($crate::__private::json!($pos)); )*
        $($( args = args.kwarg(stringify!($key), $crate::__private::json!($val)); )*)?
        args
    }};
}

/// Python-like truthiness of a dynamic value.
///
/// `null`, `false`, zero, and empty strings, arrays, and objects are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
