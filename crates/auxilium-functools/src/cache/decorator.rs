//! Caching decorators.
//!
//! [`CacheDecorator`] keeps one value per owner and [`MemoizeDecorator`] one
//! value per owner and argument set. On a free function the owner is the
//! decorated function itself ([`CachedFunction`]); on a method it is each
//! instance ([`CacheDescriptor`]).
//!
//! # Examples
//!
//! ```
//! use auxilium_functools::cache::{cache, Cached};
//! use auxilium_functools::{CallArgs, Callable};
//! use serde_json::json;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let calls = Arc::new(AtomicUsize::new(0));
//! let counter = Arc::clone(&calls);
//! let compute = Callable::function("compute", move |_args: &CallArgs| {
//!     counter.fetch_add(1, Ordering::SeqCst);
//!     Ok(json!("foo"))
//! });
//!
//! let Cached::Function(compute) = cache().decorate(compute).unwrap() else {
//!     unreachable!("free functions are cached on the decorator");
//! };
//! assert_eq!(compute.call(&CallArgs::new()).unwrap(), json!("foo"));
//! assert_eq!(compute.call(&CallArgs::new()).unwrap(), json!("foo"));
//! assert_eq!(compute.evict(&CallArgs::new()).unwrap(), json!("foo"));
//! assert_eq!(compute.call(&CallArgs::new()).unwrap(), json!("foo"));
//! assert_eq!(calls.load(Ordering::SeqCst), 2);
//! ```

use std::fmt;
use std::sync::Arc;

use auxilium_core::settings;
use auxilium_core::{AuxiliumError, AuxiliumResult};
use serde_json::{json, Value};

use crate::args::CallArgs;
use crate::cache::descriptor::CacheDescriptor;
use crate::cache::recompute::RecomputePolicy;
use crate::cache::store::{CacheSlots, Cacheable};
use crate::cache::strategy::{BaseCache, CacheKind};
use crate::callable::{Callable, Metadata, Target};
use crate::decorator::{Decorator, DecoratorFactory, Wrap, Wraps};
use crate::hybrid::{method_arguments, HybridDecorator};
use crate::params::{BoundParameters, ParameterSpec};

/// Name of the parameter turning a cached method into a property.
pub const AS_PROPERTY: &str = "as_property";
/// Name of the parameter forcing recomputation on every call.
pub const RECOMPUTE: &str = "recompute";
/// Name of the parameter renaming the per-call recompute keyword.
pub const RECOMPUTE_PARAMETER: &str = "recompute_parameter";
/// Name of the parameter renaming the "is cached" metadata marker.
pub const IS_CACHED: &str = "is_cached";
/// Name of the parameter renaming the storage-attribute metadata marker.
pub const CACHE_ATTR: &str = "cache_attr";

/// Configuration shared by every caching decorator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// Method detection.
    pub hybrid: HybridDecorator,
    /// Recompute on every call.
    pub recompute: bool,
    /// Keyword forcing recomputation of a single call.
    pub recompute_parameter: String,
    /// Metadata attribute set to `true` on the cached callable.
    pub is_cached: String,
    /// Metadata attribute holding the storage attribute name.
    pub cache_attr: String,
}

impl Default for CacheOptions {
    fn default() -> Self {
        let cache = &settings::active().cache;
        Self {
            hybrid: HybridDecorator::default(),
            recompute: false,
            recompute_parameter: cache.recompute_parameter.clone(),
            is_cached: cache.is_cached_attr.clone(),
            cache_attr: cache.cache_attr.clone(),
        }
    }
}

impl CacheOptions {
    /// Appends the shared caching parameters to `spec`.
    pub fn extend_spec(spec: ParameterSpec) -> ParameterSpec {
        let cache = &settings::active().cache;
        HybridDecorator::extend_spec(spec)
            .with_parameter(RECOMPUTE)
            .with_parameter(RECOMPUTE_PARAMETER)
            .with_parameter(IS_CACHED)
            .with_parameter(CACHE_ATTR)
            .with_default(RECOMPUTE, false)
            .with_default(RECOMPUTE_PARAMETER, cache.recompute_parameter.as_str())
            .with_default(IS_CACHED, cache.is_cached_attr.as_str())
            .with_default(CACHE_ATTR, cache.cache_attr.as_str())
    }

    /// Reads the shared caching parameters.
    pub fn from_bound(params: &BoundParameters) -> AuxiliumResult<Self> {
        Ok(Self {
            hybrid: HybridDecorator::from_bound(params)?,
            recompute: params.get_bool(RECOMPUTE)?,
            recompute_parameter: params.get_str(RECOMPUTE_PARAMETER)?.to_string(),
            is_cached: params.get_str(IS_CACHED)?.to_string(),
            cache_attr: params.get_str(CACHE_ATTR)?.to_string(),
        })
    }

    /// The recompute policy of wrappers built with these options.
    pub fn policy(&self) -> RecomputePolicy {
        RecomputePolicy::new(self.recompute_parameter.clone(), self.recompute)
    }

    fn mark(&self, meta: &mut Metadata, attribute: &str) {
        meta.attrs.insert(self.is_cached.clone(), Value::Bool(true));
        meta.attrs.insert(self.cache_attr.clone(), json!(attribute));
    }
}

/// Behaviour shared by [`CacheDecorator`] and [`MemoizeDecorator`].
pub trait BaseCacheDecorator: Decorator {
    /// The storage strategy.
    const KIND: CacheKind;

    /// The shared options.
    fn options(&self) -> &CacheOptions;

    /// The shared options, for modification.
    fn options_mut(&mut self) -> &mut CacheOptions;

    /// Whether cached methods become properties.
    fn as_property(&self) -> bool {
        false
    }

    /// Settles method detection and checks property mode against `target`.
    fn prepare_target<R: 'static>(&mut self, target: &Target<R>) -> AuxiliumResult<()> {
        let in_class = self.options_mut().hybrid.detect(target);
        let Target::Callable(callable) = target else {
            return Ok(());
        };
        if !self.as_property() {
            return Ok(());
        }
        if !in_class {
            tracing::debug!(
                function = callable.name(),
                "as_property has no effect on free functions"
            );
            return Ok(());
        }
        let params = &callable.metadata().params;
        if params.is_empty() {
            return Err(AuxiliumError::ConfigurationError(format!(
                "as_property requires the parameters of \"{}\" to be declared",
                callable.name()
            )));
        }
        let arguments = method_arguments(params, settings::active());
        if !arguments.is_empty() {
            return Err(AuxiliumError::ConfigurationError(format!(
                "as_property requires a method without parameters, but \"{}\" accepts ({})",
                callable.name(),
                arguments.join(", ")
            )));
        }
        Ok(())
    }

    /// Builds the cached wrapper for `target`.
    fn cache_wrapped_object<R: Cacheable + 'static>(
        self,
        target: Target<R>,
    ) -> AuxiliumResult<Cached<R>> {
        let callable = match target {
            Target::Callable(callable) => callable,
            Target::Class(class) => {
                return Err(AuxiliumError::TypeError(format!(
                    "cannot cache class \"{}\"; caching decorators apply to callables",
                    class.meta.name
                )));
            }
        };

        let options = self.options();
        let in_class = options.hybrid.in_class().unwrap_or(false);
        if in_class {
            let mut descriptor = CacheDescriptor::new(callable, Self::KIND, self.as_property())
                .with_policy(options.policy());
            let attribute = descriptor.cache_attribute().to_string();
            options.mark(descriptor.metadata_mut(), &attribute);
            tracing::debug!(
                attribute = attribute.as_str(),
                kind = Self::KIND.as_str(),
                "caching method"
            );
            Ok(Cached::Method(descriptor))
        } else {
            let mut function =
                CachedFunction::new(callable, Self::KIND).with_policy(options.policy());
            let attribute = function.cache_attribute().to_string();
            options.mark(&mut function.meta, &attribute);
            tracing::debug!(kind = Self::KIND.as_str(), "caching function");
            Ok(Cached::Function(function))
        }
    }
}

/// Caches a single value per owner, ignoring call arguments.
///
/// Parameters: `as_property` (default `false`), `is_method` (default `null`),
/// `recompute` (default `false`), `recompute_parameter`, `is_cached` and
/// `cache_attr` (defaults from settings).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheDecorator {
    as_property: bool,
    options: CacheOptions,
}

impl Decorator for CacheDecorator {
    fn parameter_spec() -> ParameterSpec {
        CacheOptions::extend_spec(ParameterSpec::new([AS_PROPERTY]).with_default(AS_PROPERTY, false))
    }

    fn from_parameters(params: &BoundParameters) -> AuxiliumResult<Self> {
        Ok(Self {
            as_property: params.get_bool(AS_PROPERTY)?,
            options: CacheOptions::from_bound(params)?,
        })
    }
}

impl BaseCacheDecorator for CacheDecorator {
    const KIND: CacheKind = CacheKind::Caching;

    fn options(&self) -> &CacheOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut CacheOptions {
        &mut self.options
    }

    fn as_property(&self) -> bool {
        self.as_property
    }
}

impl<R: Cacheable + 'static> Wrap<R> for CacheDecorator {
    type Output = Cached<R>;

    fn pre_wrap(&mut self, target: &Target<R>) -> AuxiliumResult<()> {
        self.prepare_target(target)
    }

    fn get_wrapped_object(self, target: Target<R>) -> AuxiliumResult<Cached<R>> {
        self.cache_wrapped_object(target)
    }
}

/// Caches one value per owner and argument set.
///
/// Accepts the same parameters as [`CacheDecorator`] except `as_property`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoizeDecorator {
    options: CacheOptions,
}

impl Decorator for MemoizeDecorator {
    fn parameter_spec() -> ParameterSpec {
        CacheOptions::extend_spec(ParameterSpec::default())
    }

    fn from_parameters(params: &BoundParameters) -> AuxiliumResult<Self> {
        Ok(Self {
            options: CacheOptions::from_bound(params)?,
        })
    }
}

impl BaseCacheDecorator for MemoizeDecorator {
    const KIND: CacheKind = CacheKind::Memoizing;

    fn options(&self) -> &CacheOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut CacheOptions {
        &mut self.options
    }
}

impl<R: Cacheable + 'static> Wrap<R> for MemoizeDecorator {
    type Output = Cached<R>;

    fn pre_wrap(&mut self, target: &Target<R>) -> AuxiliumResult<()> {
        self.prepare_target(target)
    }

    fn get_wrapped_object(self, target: Target<R>) -> AuxiliumResult<Cached<R>> {
        self.cache_wrapped_object(target)
    }
}

/// A cached free function. Its store lives on the wrapper and is shared by
/// every clone.
pub struct CachedFunction<R = ()> {
    function: Callable<R>,
    kind: CacheKind,
    attribute: String,
    store: Arc<CacheSlots>,
    policy: RecomputePolicy,
    meta: Metadata,
}

impl<R> Clone for CachedFunction<R> {
    fn clone(&self) -> Self {
        Self {
            function: self.function.clone(),
            kind: self.kind,
            attribute: self.attribute.clone(),
            store: Arc::clone(&self.store),
            policy: self.policy.clone(),
            meta: self.meta.clone(),
        }
    }
}

impl<R> fmt::Debug for CachedFunction<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedFunction")
            .field("function", &self.function.name())
            .field("kind", &self.kind)
            .field("attribute", &self.attribute)
            .field("cached", &self.store.len())
            .finish_non_exhaustive()
    }
}

impl<R> CachedFunction<R> {
    /// Wraps `function` with an empty store.
    pub fn new(function: Callable<R>, kind: CacheKind) -> Self {
        let meta = function.metadata().clone();
        Self {
            function,
            kind,
            attribute: settings::active().cache.function_attribute.clone(),
            store: Arc::new(CacheSlots::new()),
            policy: RecomputePolicy::default(),
            meta,
        }
    }

    /// Replaces the recompute policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RecomputePolicy) -> Self {
        self.policy = policy;
        self
    }

    fn cache(&self) -> Box<dyn BaseCache + '_> {
        self.kind.bind(&self.store, &self.attribute)
    }

    /// Calls the function with an explicit receiver, through the cache.
    pub fn call_with(&self, receiver: &R, args: &CallArgs) -> AuxiliumResult<Value> {
        let span = tracing::debug_span!(
            "cached_call",
            function = self.function.name(),
            kind = self.kind.as_str(),
        );
        let _guard = span.enter();
        self.policy
            .get_or_compute(self.cache().as_ref(), args.clone(), |args| {
                self.function.invoke(receiver, args)
            })
    }

    /// Removes and returns the value cached for `args`.
    pub fn evict(&self, args: &CallArgs) -> AuxiliumResult<Value> {
        let (args, _) = self.policy.prepare(args.clone());
        let value = self.cache().delete(&args)?;
        tracing::debug!(function = self.function.name(), "cache evicted");
        Ok(value)
    }

    /// Stores `value` as the result for `args` without calling the function.
    pub fn push(&self, value: Value, args: &CallArgs) {
        let (args, _) = self.policy.prepare(args.clone());
        self.cache().set(value, &args);
    }

    /// The store holding this function's cache.
    pub fn store(&self) -> &CacheSlots {
        &self.store
    }

    /// The store attribute holding the cache.
    pub fn cache_attribute(&self) -> &str {
        &self.attribute
    }

    /// The storage strategy.
    pub const fn kind(&self) -> CacheKind {
        self.kind
    }

    /// The undecorated function.
    pub const fn unwrapped(&self) -> &Callable<R> {
        &self.function
    }

    /// Metadata of the cached function, including cache markers.
    pub const fn metadata(&self) -> &Metadata {
        &self.meta
    }
}

impl CachedFunction<()> {
    /// Calls the function through the cache.
    pub fn call(&self, args: &CallArgs) -> AuxiliumResult<Value> {
        self.call_with(&(), args)
    }
}

/// The result of applying a caching decorator.
pub enum Cached<R = ()> {
    /// A free function, cached on the wrapper.
    Function(CachedFunction<R>),
    /// A method, cached on each instance.
    Method(CacheDescriptor<R>),
}

impl<R> Clone for Cached<R> {
    fn clone(&self) -> Self {
        match self {
            Self::Function(f) => Self::Function(f.clone()),
            Self::Method(m) => Self::Method(m.clone()),
        }
    }
}

impl<R> fmt::Debug for Cached<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function(func) => f.debug_tuple("Function").field(func).finish(),
            Self::Method(method) => f.debug_tuple("Method").field(method).finish(),
        }
    }
}

impl<R> Cached<R> {
    /// Metadata of the cached callable.
    pub const fn metadata(&self) -> &Metadata {
        match self {
            Self::Function(f) => f.metadata(),
            Self::Method(m) => m.metadata(),
        }
    }

    /// The attribute under which values are stored.
    pub fn cache_attribute(&self) -> &str {
        match self {
            Self::Function(f) => f.cache_attribute(),
            Self::Method(m) => m.cache_attribute(),
        }
    }

    /// Returns `true` when the target was cached as a method.
    pub const fn is_method(&self) -> bool {
        matches!(self, Self::Method(_))
    }

    /// The cached free function, if any.
    pub const fn as_function(&self) -> Option<&CachedFunction<R>> {
        match self {
            Self::Function(f) => Some(f),
            Self::Method(_) => None,
        }
    }

    /// The cache descriptor, if any.
    pub const fn as_method(&self) -> Option<&CacheDescriptor<R>> {
        match self {
            Self::Function(_) => None,
            Self::Method(m) => Some(m),
        }
    }

    /// Converts into the cached free function, if any.
    pub fn into_function(self) -> Option<CachedFunction<R>> {
        match self {
            Self::Function(f) => Some(f),
            Self::Method(_) => None,
        }
    }

    /// Converts into the cache descriptor, if any.
    pub fn into_method(self) -> Option<CacheDescriptor<R>> {
        match self {
            Self::Function(_) => None,
            Self::Method(m) => Some(m),
        }
    }
}

impl<R> Wraps for Cached<R> {
    fn update_wrapper(&mut self, wrapped: &Metadata) {
        match self {
            Self::Function(f) => f.meta.update_from(wrapped),
            Self::Method(m) => m.metadata_mut().update_from(wrapped),
        }
    }
}

/// `@cache`: single-value caching.
pub fn cache() -> DecoratorFactory<CacheDecorator> {
    CacheDecorator::as_decorator()
}

/// `@memoize`: per-argument caching.
pub fn memoize() -> DecoratorFactory<MemoizeDecorator> {
    MemoizeDecorator::as_decorator()
}

/// `@cache(as_property=True)`: cached methods become properties.
///
/// The method must declare its parameters (a receiver name and nothing else)
/// through [`Callable::with_params`]; undeclared or extra parameters are a
/// configuration error.
pub fn cache_property() -> DecoratorFactory<CacheDecorator> {
    DecoratorFactory::with_defaults(CallArgs::new().kwarg(AS_PROPERTY, true))
}

/// `@cache(is_method=True)`: the target is always treated as a method.
pub fn cache_method() -> DecoratorFactory<CacheDecorator> {
    DecoratorFactory::with_defaults(CallArgs::new().kwarg(crate::hybrid::IS_METHOD, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_args;
    use crate::callable::ClassDef;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Foo {
        cache: CacheSlots,
    }

    impl Cacheable for Foo {
        fn cache_slots(&self) -> &CacheSlots {
            &self.cache
        }
    }

    fn counted(name: &str) -> (Callable, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let callable = Callable::function(name, move |args: &CallArgs| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!(args.positional().len()))
        })
        .with_doc("Counts its arguments");
        (callable, calls)
    }

    fn method(params: &[&str]) -> Callable<Foo> {
        Callable::new("total", |_this: &Foo, _args: &CallArgs| Ok(json!(0)))
            .with_params(params.iter().copied())
    }

    // ── parameter specs ─────────────────────────────────────────────

    #[test]
    fn test_parameter_specs() {
        let spec = CacheDecorator::parameter_spec();
        assert!(spec.validate().is_ok());
        assert_eq!(
            spec.to_string(),
            "(as_property=false, is_method=null, recompute=false, \
             recompute_parameter=\"recompute\", is_cached=\"is_cached\", \
             cache_attr=\"cache_attr\")"
        );
        let memo = MemoizeDecorator::parameter_spec();
        assert!(memo.validate().is_ok());
        assert!(!memo.declared().iter().any(|d| d == AS_PROPERTY));
    }

    #[test]
    fn test_configure_options() {
        let deco = cache()
            .configure(call_args!(true; recompute_parameter = "refresh", is_method = true))
            .unwrap();
        assert!(deco.as_property());
        assert_eq!(deco.options().recompute_parameter, "refresh");
        assert_eq!(deco.options().hybrid.is_method(), Some(true));

        let memo = memoize().configure(call_args!(; recompute = true)).unwrap();
        assert!(memo.options().recompute);
        assert!(matches!(
            memoize().configure(call_args!(; as_property = true)),
            Err(AuxiliumError::BindingError(_))
        ));
    }

    // ── free functions ──────────────────────────────────────────────

    #[test]
    fn test_cache_free_function() {
        let (callable, calls) = counted("compute");
        let cached = cache().decorate(callable).unwrap().into_function().unwrap();

        assert_eq!(cached.call(&CallArgs::new()).unwrap(), json!(0));
        assert_eq!(cached.call(&call_args!(1, 2)).unwrap(), json!(0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(cached.evict(&CallArgs::new()).unwrap(), json!(0));
        assert!(cached.evict(&CallArgs::new()).unwrap_err().is_not_in_cache());
        assert_eq!(cached.call(&call_args!(1)).unwrap(), json!(1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.cache_attribute(), "cached_value");
        assert_eq!(cached.store().attributes(), vec!["cached_value"]);
    }

    #[test]
    fn test_clones_share_store() {
        let (callable, calls) = counted("compute");
        let cached = cache().decorate(callable).unwrap().into_function().unwrap();
        let copy = cached.clone();
        cached.call(&CallArgs::new()).unwrap();
        copy.call(&CallArgs::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_memoize_free_function() {
        let (callable, calls) = counted("compute");
        let cached = memoize().decorate(callable).unwrap().into_function().unwrap();

        cached.call(&call_args!(1)).unwrap();
        cached.call(&call_args!(2)).unwrap();
        cached.call(&call_args!(1)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        cached.call(&call_args!(; a = 1, b = 2)).unwrap();
        cached.call(&call_args!(; b = 2, a = 1)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        cached.push(json!("seeded"), &call_args!(9));
        assert_eq!(cached.call(&call_args!(9)).unwrap(), json!("seeded"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_recompute_options() {
        let (callable, calls) = counted("compute");
        let cached = cache()
            .configure(call_args!(; recompute_parameter = "refresh"))
            .unwrap()
            .wrap(callable)
            .unwrap()
            .into_function()
            .unwrap();
        cached.call(&CallArgs::new()).unwrap();
        cached.call(&call_args!(; refresh = true)).unwrap();
        cached.call(&call_args!(; refresh = false)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let (callable, calls) = counted("always");
        let always = cache()
            .configure(call_args!(; recompute = true))
            .unwrap()
            .wrap(callable)
            .unwrap()
            .into_function()
            .unwrap();
        always.call(&CallArgs::new()).unwrap();
        always.call(&CallArgs::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_metadata_markers() {
        let (callable, _) = counted("compute");
        let cached = cache().decorate(callable).unwrap();
        let meta = cached.metadata();
        assert_eq!(meta.name, "compute");
        assert_eq!(meta.doc.as_deref(), Some("Counts its arguments"));
        assert_eq!(meta.attr("is_cached"), Some(&json!(true)));
        assert_eq!(meta.attr("cache_attr"), Some(&json!("cached_value")));

        let (callable, _) = counted("compute");
        let renamed = cache()
            .configure(call_args!(; is_cached = "cached", cache_attr = "storage"))
            .unwrap()
            .wrap(callable)
            .unwrap();
        assert_eq!(renamed.metadata().attr("cached"), Some(&json!(true)));
        assert_eq!(renamed.metadata().attr("storage"), Some(&json!("cached_value")));
        assert_eq!(renamed.metadata().attr("is_cached"), None);
    }

    #[test]
    fn test_property_ignored_on_free_function() {
        let (callable, calls) = counted("compute");
        let cached = cache_property().decorate(callable).unwrap();
        assert!(!cached.is_method());
        let function = cached.as_function().unwrap();
        function.call(&call_args!(1)).unwrap();
        function.call(&call_args!(1)).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    // ── methods ─────────────────────────────────────────────────────

    #[test]
    fn test_method_becomes_descriptor() {
        let cached = cache().decorate(method(&["self"])).unwrap();
        assert!(cached.is_method());
        let descriptor = cached.as_method().unwrap();
        assert!(!descriptor.is_property());
        assert!(descriptor.cache_attribute().starts_with("total_cache_"));
        assert_eq!(
            cached.metadata().attr("cache_attr"),
            Some(&json!(descriptor.cache_attribute()))
        );

        let foo = Foo { cache: CacheSlots::new() };
        assert_eq!(descriptor.bind(&foo).call(&CallArgs::new()).unwrap(), json!(0));
        assert!(foo.cache.contains(descriptor.cache_attribute()));
    }

    #[test]
    fn test_memoize_method_attribute() {
        let cached = memoize().decorate(method(&["self", "x"])).unwrap();
        assert!(cached.cache_attribute().starts_with("total_memoize_"));
    }

    #[test]
    fn test_is_method_false_caches_on_wrapper() {
        let cached = cache()
            .configure(call_args!(; is_method = false))
            .unwrap()
            .wrap(method(&["self"]))
            .unwrap();
        let function = cached.into_function().unwrap();
        let foo = Foo { cache: CacheSlots::new() };
        assert_eq!(function.call_with(&foo, &CallArgs::new()).unwrap(), json!(0));
        assert!(foo.cache.is_empty());
        assert_eq!(function.store().len(), 1);
    }

    #[test]
    fn test_cache_method_forces_descriptor_for_unit_receiver() {
        let (callable, _) = counted("global");
        let cached = cache_method().decorate(callable).unwrap();
        let descriptor = cached.into_method().unwrap();
        assert_eq!(descriptor.bind(&()).call(&CallArgs::new()).unwrap(), json!(0));
        assert!(descriptor.slots(&()).contains(descriptor.cache_attribute()));
        assert!(!().cache_slots().contains(descriptor.cache_attribute()));
        descriptor.bind(&()).evict(&CallArgs::new()).unwrap();
    }

    #[test]
    fn test_unit_receiver_methods_with_same_name_are_isolated() {
        let first = Callable::function("compute", |_args: &CallArgs| Ok(json!("A")));
        let second = Callable::function("compute", |_args: &CallArgs| Ok(json!("B")));
        let first = cache_method().decorate(first).unwrap().into_method().unwrap();
        let second = cache_method().decorate(second).unwrap().into_method().unwrap();
        assert_eq!(first.cache_attribute(), second.cache_attribute());

        assert_eq!(first.bind(&()).call(&CallArgs::new()).unwrap(), json!("A"));
        assert_eq!(second.bind(&()).call(&CallArgs::new()).unwrap(), json!("B"));
        assert_eq!(first.bind(&()).call(&CallArgs::new()).unwrap(), json!("A"));

        let copy = first.clone();
        assert_eq!(copy.bind(&()).evict(&CallArgs::new()).unwrap(), json!("A"));
        assert_eq!(second.bind(&()).evict(&CallArgs::new()).unwrap(), json!("B"));
    }

    #[test]
    fn test_property_method() {
        let cached = cache_property().decorate(method(&["self"])).unwrap();
        let descriptor = cached.into_method().unwrap();
        assert!(descriptor.is_property());
        let foo = Foo { cache: CacheSlots::new() };
        assert_eq!(descriptor.get(&foo).unwrap(), json!(0));
    }

    #[test]
    fn test_property_with_arguments_is_configuration_error() {
        let result = cache_property().decorate(method(&["self", "x"]));
        match result {
            Err(AuxiliumError::ConfigurationError(msg)) => {
                assert!(msg.contains("\"total\" accepts (x)"), "{msg}");
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_property_with_undeclared_parameters_is_configuration_error() {
        let result = cache_property().decorate(method(&[]));
        match result {
            Err(AuxiliumError::ConfigurationError(msg)) => {
                assert!(msg.contains("parameters of \"total\" to be declared"), "{msg}");
            }
            other => panic!("expected configuration error, got {other:?}"),
        }
        assert!(cache().decorate(method(&[])).is_ok());
    }

    #[test]
    fn test_caching_class_is_type_error() {
        let result: AuxiliumResult<Cached> = cache().decorate::<()>(ClassDef::new("Foo"));
        assert!(matches!(result, Err(AuxiliumError::TypeError(_))));
        let result: AuxiliumResult<Cached> = memoize().decorate::<()>(ClassDef::new("Foo"));
        assert!(matches!(result, Err(AuxiliumError::TypeError(_))));
    }
}
