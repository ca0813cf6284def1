//! Declarative parameter specifications for decorators.
//!
//! A decorator declares the configuration it accepts as an ordered list of
//! names, each optionally prefixed with `*` (positional overflow collector) or
//! `**` (keyword overflow collector), plus a map of defaults. The declaration
//! follows ordinary function-signature rules and is checked with
//! [`ParameterSpec::validate`] before any arguments are bound.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::OnceLock;

use auxilium_core::{AuxiliumError, AuxiliumResult};
use regex::Regex;
use serde_json::{Map, Value};

use crate::args::CallArgs;

/// How a declared parameter binds call-time arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    /// A named parameter without a default.
    Required,
    /// A named parameter with a default.
    Optional,
    /// `*name`: collects positional overflow.
    VarArgs,
    /// `**name`: collects keyword overflow.
    VarKwargs,
}

/// One classified parameter of a [`ParameterSpec`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// The parameter name without stars.
    pub name: String,
    /// How the parameter binds.
    pub kind: ParameterKind,
    /// The default value, for optional parameters.
    pub default: Option<Value>,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.default) {
            (ParameterKind::VarArgs, _) => write!(f, "*{}", self.name),
            (ParameterKind::VarKwargs, _) => write!(f, "**{}", self.name),
            (_, Some(default)) => write!(f, "{}={default}", self.name),
            (_, None) => write!(f, "{}", self.name),
        }
    }
}

/// Splits a declared parameter into its collector depth (0, 1 or 2 stars)
/// and the remaining name.
fn split_stars(declared: &str) -> (usize, &str) {
    if let Some(name) = declared.strip_prefix("**") {
        (2, name)
    } else if let Some(name) = declared.strip_prefix('*') {
        (1, name)
    } else {
        (0, declared)
    }
}

fn is_identifier(name: &str) -> bool {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER
        .get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier regex"))
        .is_match(name)
}

fn configuration_error(msg: impl Into<String>) -> AuxiliumError {
    AuxiliumError::ConfigurationError(msg.into())
}

fn binding_error(msg: impl Into<String>) -> AuxiliumError {
    AuxiliumError::BindingError(msg.into())
}

/// The parameters a decorator accepts.
///
/// # Examples
///
/// ```
/// use auxilium_functools::{call_args, ParameterSpec};
/// use serde_json::json;
///
/// let spec = ParameterSpec::new(["foo", "bar", "*args", "**kwargs"])
///     .with_default("bar", json!(null));
/// spec.validate().unwrap();
/// assert_eq!(spec.to_string(), "(foo, bar=null, *args, **kwargs)");
///
/// let bound = spec.resolve(&call_args!(1, 2, 3; extra = true)).unwrap();
/// assert_eq!(bound.get("foo"), Some(&json!(1)));
/// assert_eq!(bound.get("args"), Some(&json!([3])));
/// assert_eq!(bound.get("kwargs"), Some(&json!({"extra": true})));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSpec {
    declared: Vec<String>,
    defaults: BTreeMap<String, Value>,
}

impl ParameterSpec {
    /// Creates a specification from declared parameter strings.
    pub fn new<I, S>(declared: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            declared: declared.into_iter().map(Into::into).collect(),
            defaults: BTreeMap::new(),
        }
    }

    /// Appends a declared parameter.
    #[must_use]
    pub fn with_parameter(mut self, declared: impl Into<String>) -> Self {
        self.declared.push(declared.into());
        self
    }

    /// Declares a default value for a named parameter.
    #[must_use]
    pub fn with_default(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.defaults.insert(name.into(), value.into());
        self
    }

    /// Returns the declared parameter strings, stars included.
    pub fn declared(&self) -> &[String] {
        &self.declared
    }

    /// Returns the declared defaults.
    pub const fn defaults(&self) -> &BTreeMap<String, Value> {
        &self.defaults
    }

    /// Checks the declaration against function-signature rules.
    ///
    /// Has no side effects and may be called any number of times.
    pub fn validate(&self) -> AuxiliumResult<()> {
        let mut seen = HashSet::new();
        let mut varargs_seen = false;
        let mut varkwargs_seen = false;

        for declared in &self.declared {
            let (stars, name) = split_stars(declared);
            if !is_identifier(name) {
                return Err(configuration_error(format!(
                    "Invalid identifier name \"{declared}\""
                )));
            }
            if !seen.insert(name) {
                return Err(configuration_error(format!(
                    "Cannot redefine the same parameter \"{name}\""
                )));
            }
            match stars {
                0 if varargs_seen || varkwargs_seen => {
                    return Err(configuration_error(
                        "*args or **kwargs cannot be before regular parameters",
                    ));
                }
                1 if varkwargs_seen => {
                    return Err(configuration_error("*args have to be before **kwargs"));
                }
                1 if varargs_seen => {
                    return Err(configuration_error("Only one *args collector is allowed"));
                }
                1 => varargs_seen = true,
                2 if varkwargs_seen => {
                    return Err(configuration_error(
                        "Only one **kwargs collector is allowed",
                    ));
                }
                2 => varkwargs_seen = true,
                _ => {}
            }
        }

        let named: Vec<&str> = self.named().collect();
        for key in self.defaults.keys() {
            let is_collector = self
                .declared
                .iter()
                .map(|d| split_stars(d))
                .any(|(stars, name)| stars > 0 && name == key.as_str());
            if key.starts_with('*') || is_collector {
                return Err(configuration_error(format!(
                    "Invalid syntax for default parameter \"{key}\""
                )));
            }
            if !named.contains(&key.as_str()) {
                return Err(configuration_error(format!(
                    "Defaults must be defined in parameters attribute (\"{key}\")"
                )));
            }
        }

        let mut first_optional: Option<&str> = None;
        for name in named {
            if self.defaults.contains_key(name) {
                first_optional.get_or_insert(name);
            } else if let Some(optional) = first_optional {
                return Err(configuration_error(format!(
                    "Optional parameter before required parameter (\"{optional}\")"
                )));
            }
        }

        Ok(())
    }

    /// Named (non-collector) parameters in declaration order.
    fn named(&self) -> impl Iterator<Item = &str> {
        self.declared
            .iter()
            .filter(|d| split_stars(d).0 == 0)
            .map(String::as_str)
    }

    fn collector(&self, stars: usize) -> Option<&str> {
        self.declared
            .iter()
            .map(|d| split_stars(d))
            .find(|(s, _)| *s == stars)
            .map(|(_, name)| name)
    }

    /// Returns the classified parameters in declaration order.
    pub fn parameters(&self) -> Vec<Parameter> {
        self.declared
            .iter()
            .map(|declared| {
                let (stars, name) = split_stars(declared);
                let default = if stars == 0 {
                    self.defaults.get(name).cloned()
                } else {
                    None
                };
                let kind = match (stars, &default) {
                    (1, _) => ParameterKind::VarArgs,
                    (2, _) => ParameterKind::VarKwargs,
                    (_, Some(_)) => ParameterKind::Optional,
                    (_, None) => ParameterKind::Required,
                };
                Parameter {
                    name: name.to_string(),
                    kind,
                    default,
                }
            })
            .collect()
    }

    /// Binds call-time arguments to the declared parameters.
    ///
    /// Positional overflow goes to the `*` collector and unknown keywords go to
    /// the `**` collector when declared. Declared collectors are always bound,
    /// to an empty array or object when nothing overflows.
    pub fn resolve(&self, args: &CallArgs) -> AuxiliumResult<BoundParameters> {
        let named: Vec<&str> = self.named().collect();
        let varargs = self.collector(1);
        let varkwargs = self.collector(2);

        let mut bound = BoundParameters::default();
        let mut overflow = Vec::new();
        for (index, value) in args.positional().iter().enumerate() {
            match named.get(index) {
                Some(name) => bound.insert(*name, value.clone()),
                None if varargs.is_some() => overflow.push(value.clone()),
                None => {
                    return Err(binding_error(format!(
                        "Too many arguments: expected at most {} positional, got {}",
                        named.len(),
                        args.positional().len()
                    )));
                }
            }
        }

        let mut extra = Map::new();
        for (name, value) in args.keyword() {
            if named.contains(&name.as_str()) {
                if bound.contains(name) {
                    return Err(binding_error(format!("\"{name}\" parameter is repeated")));
                }
                bound.insert(name.clone(), value.clone());
            } else if varkwargs.is_some() {
                extra.insert(name.clone(), value.clone());
            } else {
                return Err(binding_error(format!(
                    "Unexpected keyword argument \"{name}\""
                )));
            }
        }

        for name in &named {
            if bound.contains(name) {
                continue;
            }
            match self.defaults.get(*name) {
                Some(default) => bound.insert(*name, default.clone()),
                None => {
                    return Err(binding_error(format!("\"{name}\" argument is not provided")));
                }
            }
        }

        if let Some(name) = varargs {
            bound.insert(name, Value::Array(overflow));
        }
        if let Some(name) = varkwargs {
            bound.insert(name, Value::Object(extra));
        }

        Ok(bound)
    }
}

impl fmt::Display for ParameterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.parameters().iter().map(ToString::to_string).collect();
        write!(f, "({})", rendered.join(", "))
    }
}

/// Parameter values resolved for one decorator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundParameters {
    values: BTreeMap<String, Value>,
}

impl BoundParameters {
    /// Sets a parameter value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Returns `true` if `name` is bound.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns a raw parameter value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    fn require(&self, name: &str) -> AuxiliumResult<&Value> {
        self.get(name)
            .ok_or_else(|| binding_error(format!("\"{name}\" argument is not provided")))
    }

    fn wrong_type(name: &str, expected: &str, value: &Value) -> AuxiliumError {
        AuxiliumError::TypeError(format!("\"{name}\" must be {expected}, got {value}"))
    }

    /// Returns a boolean parameter.
    pub fn get_bool(&self, name: &str) -> AuxiliumResult<bool> {
        let value = self.require(name)?;
        value
            .as_bool()
            .ok_or_else(|| Self::wrong_type(name, "a boolean", value))
    }

    /// Returns a boolean parameter which may be `null` or absent.
    pub fn get_opt_bool(&self, name: &str) -> AuxiliumResult<Option<bool>> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(Self::wrong_type(name, "a boolean or null", other)),
        }
    }

    /// Returns a string parameter.
    pub fn get_str(&self, name: &str) -> AuxiliumResult<&str> {
        let value = self.require(name)?;
        value
            .as_str()
            .ok_or_else(|| Self::wrong_type(name, "a string", value))
    }

    /// Returns an array parameter, such as a `*` collector.
    pub fn get_array(&self, name: &str) -> AuxiliumResult<&[Value]> {
        let value = self.require(name)?;
        value
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| Self::wrong_type(name, "an array", value))
    }

    /// Returns the number of bound parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over bound parameters sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Consumes the bound parameters, returning the underlying map.
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.values
    }
}

impl From<BTreeMap<String, Value>> for BoundParameters {
    fn from(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }
}
