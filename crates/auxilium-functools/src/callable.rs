//! Decoration targets.
//!
//! A [`Callable`] is a named body taking a receiver and [`CallArgs`]. Free
//! functions use the unit receiver `()`; methods use the type they are
//! defined on. A [`ClassDef`] stands for a class-like target, which decorators
//! receive without any metadata preservation.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use auxilium_core::AuxiliumResult;
use serde_json::Value;

use crate::args::CallArgs;

/// Descriptive metadata of a callable, preserved across wrapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// The callable's name.
    pub name: String,
    /// The callable's documentation.
    pub doc: Option<String>,
    /// The module path the callable was defined in.
    pub module: Option<String>,
    /// Declared parameter names, including a leading receiver name for methods.
    pub params: Vec<String>,
    /// Free-form attributes attached to the callable.
    pub attrs: BTreeMap<String, Value>,
}

impl Metadata {
    /// Creates metadata holding only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Copies the descriptive fields of `wrapped` onto `self`.
    ///
    /// Name, doc, module and params are replaced. Attributes of `wrapped` are
    /// added, but attributes already present on `self` win.
    pub fn update_from(&mut self, wrapped: &Self) {
        self.name.clone_from(&wrapped.name);
        self.doc.clone_from(&wrapped.doc);
        self.module.clone_from(&wrapped.module);
        self.params.clone_from(&wrapped.params);
        for (key, value) in &wrapped.attrs {
            self.attrs
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// Returns an attribute value.
    pub fn attr(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }
}

type Body<R> = dyn Fn(&R, &CallArgs) -> AuxiliumResult<Value> + Send + Sync;

/// A named, shareable function body with descriptive metadata.
///
/// # Examples
///
/// ```
/// use auxilium_functools::{CallArgs, Callable};
/// use serde_json::json;
///
/// let add = Callable::function("add", |args: &CallArgs| {
///     let sum: i64 = args.positional().iter().filter_map(|v| v.as_i64()).sum();
///     Ok(json!(sum))
/// })
/// .with_doc("Sum of all positional arguments");
///
/// assert_eq!(add.call(&CallArgs::new().arg(2).arg(3)).unwrap(), json!(5));
/// assert_eq!(add.metadata().doc.as_deref(), Some("Sum of all positional arguments"));
/// ```
pub struct Callable<R = ()> {
    meta: Metadata,
    body: Arc<Body<R>>,
}

impl<R> Clone for Callable<R> {
    fn clone(&self) -> Self {
        Self {
            meta: self.meta.clone(),
            body: Arc::clone(&self.body),
        }
    }
}

impl<R> fmt::Debug for Callable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable").field("meta", &self.meta).finish_non_exhaustive()
    }
}

impl<R> Callable<R> {
    /// Creates a callable taking a receiver of type `R`.
    pub fn new(
        name: impl Into<String>,
        body: impl Fn(&R, &CallArgs) -> AuxiliumResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            meta: Metadata::named(name),
            body: Arc::new(body),
        }
    }

    /// Sets the documentation.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.meta.doc = Some(doc.into());
        self
    }

    /// Sets the defining module path.
    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.meta.module = Some(module.into());
        self
    }

    /// Declares parameter names, including a leading receiver name for methods.
    #[must_use]
    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.meta.params = params.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches a free-form attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.attrs.insert(name.into(), value.into());
        self
    }

    /// Returns the callable's name.
    pub fn name(&self) -> &str {
        &self.meta.name
    }

    /// Returns the callable's metadata.
    pub const fn metadata(&self) -> &Metadata {
        &self.meta
    }

    /// Returns the callable's metadata for modification.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.meta
    }

    /// Invokes the body with an explicit receiver.
    pub fn invoke(&self, receiver: &R, args: &CallArgs) -> AuxiliumResult<Value> {
        (self.body)(receiver, args)
    }

    /// Returns `true` if both callables share the same body.
    pub fn same_body(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

impl Callable<()> {
    /// Creates a free function.
    pub fn function(
        name: impl Into<String>,
        body: impl Fn(&CallArgs) -> AuxiliumResult<Value> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, move |_receiver: &(), args: &CallArgs| body(args))
    }

    /// Calls a free function.
    pub fn call(&self, args: &CallArgs) -> AuxiliumResult<Value> {
        self.invoke(&(), args)
    }
}

/// A class-like decoration target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassDef {
    /// The class metadata. `params` is unused for classes.
    pub meta: Metadata,
}

impl ClassDef {
    /// Creates a class target with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            meta: Metadata::named(name),
        }
    }

    /// Sets the documentation.
    #[must_use]
    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.meta.doc = Some(doc.into());
        self
    }
}

/// The object handed to a decorator.
pub enum Target<R = ()> {
    /// A free function or a method.
    Callable(Callable<R>),
    /// A class.
    Class(ClassDef),
}

impl<R> Clone for Target<R> {
    fn clone(&self) -> Self {
        match self {
            Self::Callable(c) => Self::Callable(c.clone()),
            Self::Class(c) => Self::Class(c.clone()),
        }
    }
}

impl<R> fmt::Debug for Target<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callable(c) => f.debug_tuple("Callable").field(c).finish(),
            Self::Class(c) => f.debug_tuple("Class").field(c).finish(),
        }
    }
}

impl<R> Target<R> {
    /// Returns the target's metadata.
    pub const fn metadata(&self) -> &Metadata {
        match self {
            Self::Callable(c) => c.metadata(),
            Self::Class(c) => &c.meta,
        }
    }

    /// Returns the target's name.
    pub fn name(&self) -> &str {
        &self.metadata().name
    }

    /// Returns `true` for class targets.
    pub const fn is_class(&self) -> bool {
        matches!(self, Self::Class(_))
    }

    /// Returns the callable, if the target is one.
    pub const fn as_callable(&self) -> Option<&Callable<R>> {
        match self {
            Self::Callable(c) => Some(c),
            Self::Class(_) => None,
        }
    }
}

impl<R> From<Callable<R>> for Target<R> {
    fn from(callable: Callable<R>) -> Self {
        Self::Callable(callable)
    }
}

impl<R> From<ClassDef> for Target<R> {
    fn from(class: ClassDef) -> Self {
        Self::Class(class)
    }
}
