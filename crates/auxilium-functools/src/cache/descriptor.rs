//! Instance-level caching of methods.
//!
//! A [`CacheDescriptor`] stands in for a method on its class. Read off the
//! class ([`unbound`](CacheDescriptor::unbound)) it is the original method.
//! Bound to an instance ([`bind`](CacheDescriptor::bind)) it is a
//! [`BoundMethod`] whose results are kept in the instance's [`CacheSlots`].
//! In property mode the instance value is read, assigned and deleted directly.
//!
//! # Examples
//!
//! ```
//! use auxilium_functools::cache::{CacheDescriptor, CacheKind, CacheSlots, Cacheable};
//! use auxilium_functools::{CallArgs, Callable};
//! use serde_json::json;
//! use std::sync::atomic::{AtomicI64, Ordering};
//!
//! struct Foo {
//!     counter: AtomicI64,
//!     cache: CacheSlots,
//! }
//!
//! impl Cacheable for Foo {
//!     fn cache_slots(&self) -> &CacheSlots {
//!         &self.cache
//!     }
//! }
//!
//! let foo_method = Callable::new("foo", |this: &Foo, _args: &CallArgs| {
//!     Ok(json!(this.counter.fetch_add(1, Ordering::SeqCst) + 1))
//! });
//! let descriptor = CacheDescriptor::new(foo_method, CacheKind::Caching, false);
//!
//! let f = Foo { counter: AtomicI64::new(5), cache: CacheSlots::new() };
//! let bound = descriptor.bind(&f);
//! assert_eq!(bound.call(&CallArgs::new()).unwrap(), json!(6));
//! assert_eq!(bound.call(&CallArgs::new()).unwrap(), json!(6));
//! assert_eq!(bound.evict(&CallArgs::new()).unwrap(), json!(6));
//! assert_eq!(bound.call(&CallArgs::new()).unwrap(), json!(7));
//! ```

use std::fmt;
use std::sync::Arc;

use auxilium_core::settings;
use auxilium_core::{AuxiliumError, AuxiliumResult};
use serde_json::Value;

use crate::args::CallArgs;
use crate::cache::recompute::RecomputePolicy;
use crate::cache::store::{CacheSlots, Cacheable};
use crate::cache::strategy::{BaseCache, CacheKind};
use crate::callable::{Callable, Metadata};

/// A cached method, storing its results on each instance.
pub struct CacheDescriptor<R> {
    method: Callable<R>,
    kind: CacheKind,
    attribute: String,
    as_property: bool,
    policy: RecomputePolicy,
    meta: Metadata,
    /// Storage for receivers that are not per-instance owners, shared by clones.
    own_store: Arc<CacheSlots>,
}

impl<R> Clone for CacheDescriptor<R> {
    fn clone(&self) -> Self {
        Self {
            method: self.method.clone(),
            kind: self.kind,
            attribute: self.attribute.clone(),
            as_property: self.as_property,
            policy: self.policy.clone(),
            meta: self.meta.clone(),
            own_store: Arc::clone(&self.own_store),
        }
    }
}

impl<R> fmt::Debug for CacheDescriptor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheDescriptor")
            .field("method", &self.method.name())
            .field("kind", &self.kind)
            .field("attribute", &self.attribute)
            .field("as_property", &self.as_property)
            .finish_non_exhaustive()
    }
}

impl<R> CacheDescriptor<R> {
    /// Creates a descriptor for `method`.
    ///
    /// The storage attribute is derived from the method name with the
    /// pattern configured for `kind`.
    pub fn new(method: Callable<R>, kind: CacheKind, as_property: bool) -> Self {
        let attribute = kind.attribute_name(method.name(), &settings::active().cache);
        let meta = method.metadata().clone();
        Self {
            method,
            kind,
            attribute,
            as_property,
            policy: RecomputePolicy::default(),
            meta,
            own_store: Arc::new(CacheSlots::new()),
        }
    }

    /// Replaces the recompute policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RecomputePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Class-level access: the original, undecorated method.
    pub const fn unbound(&self) -> &Callable<R> {
        &self.method
    }

    /// The instance attribute holding the cache.
    pub fn cache_attribute(&self) -> &str {
        &self.attribute
    }

    /// The storage strategy.
    pub const fn kind(&self) -> CacheKind {
        self.kind
    }

    /// Whether the descriptor behaves as a property.
    pub const fn is_property(&self) -> bool {
        self.as_property
    }

    /// The recompute policy.
    pub const fn policy(&self) -> &RecomputePolicy {
        &self.policy
    }

    /// Metadata of the cached method, including cache markers.
    pub const fn metadata(&self) -> &Metadata {
        &self.meta
    }

    /// Metadata for modification.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.meta
    }

    fn not_a_property(&self, action: &str) -> AuxiliumError {
        AuxiliumError::AttributeError(format!(
            "cannot {action} \"{}\": cached method is not a property",
            self.method.name()
        ))
    }
}

impl<R: Cacheable> CacheDescriptor<R> {
    /// The store holding `instance`'s values for this method.
    pub fn slots<'a>(&'a self, instance: &'a R) -> &'a CacheSlots {
        if R::PER_INSTANCE {
            instance.cache_slots()
        } else {
            &self.own_store
        }
    }

    fn cache<'a>(&'a self, instance: &'a R) -> Box<dyn BaseCache + 'a> {
        self.kind.bind(self.slots(instance), &self.attribute)
    }

    /// Instance-level access: a method bound to `instance`.
    pub const fn bind<'a>(&'a self, instance: &'a R) -> BoundMethod<'a, R> {
        BoundMethod {
            descriptor: self,
            instance,
        }
    }

    /// Returns the cached value for `args`, computing it on a miss.
    pub fn getter(&self, instance: &R, args: CallArgs) -> AuxiliumResult<Value> {
        let span = tracing::debug_span!(
            "cached_call",
            method = self.method.name(),
            attribute = self.attribute.as_str(),
            kind = self.kind.as_str(),
        );
        let _guard = span.enter();
        self.policy
            .get_or_compute(self.cache(instance).as_ref(), args, |args| {
                self.method.invoke(instance, args)
            })
    }

    /// Removes and returns the value cached for `args`.
    pub fn pop(&self, instance: &R, args: &CallArgs) -> AuxiliumResult<Value> {
        let (args, _) = self.policy.prepare(args.clone());
        let value = self.cache(instance).delete(&args)?;
        tracing::debug!(attribute = self.attribute.as_str(), "cache evicted");
        Ok(value)
    }

    /// Stores `value` as the result for `args` without calling the method.
    pub fn push(&self, instance: &R, value: Value, args: &CallArgs) {
        let (args, _) = self.policy.prepare(args.clone());
        self.cache(instance).set(value, &args);
    }

    /// Property read.
    ///
    /// Fails with a type error when the descriptor is not a property, since
    /// a plain cached method has to be called through [`bind`](Self::bind).
    pub fn get(&self, instance: &R) -> AuxiliumResult<Value> {
        if !self.as_property {
            return Err(AuxiliumError::TypeError(format!(
                "\"{}\" is a cached method, not a property; call it through bind()",
                self.method.name()
            )));
        }
        self.getter(instance, CallArgs::new())
    }

    /// Property assignment: overwrites the cached value.
    pub fn set(&self, instance: &R, value: Value) -> AuxiliumResult<()> {
        if !self.as_property {
            return Err(self.not_a_property("assign"));
        }
        self.cache(instance).set(value, &CallArgs::new());
        Ok(())
    }

    /// Property deletion: evicts the cached value.
    pub fn delete(&self, instance: &R) -> AuxiliumResult<Value> {
        if !self.as_property {
            return Err(self.not_a_property("delete"));
        }
        self.pop(instance, &CallArgs::new())
    }
}

/// A cached method bound to one instance.
pub struct BoundMethod<'a, R> {
    descriptor: &'a CacheDescriptor<R>,
    instance: &'a R,
}

impl<R> fmt::Debug for BoundMethod<'_, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundMethod")
            .field("descriptor", self.descriptor)
            .finish_non_exhaustive()
    }
}

impl<'a, R: Cacheable> BoundMethod<'a, R> {
    /// Calls the method through the instance's cache.
    pub fn call(&self, args: &CallArgs) -> AuxiliumResult<Value> {
        self.descriptor.getter(self.instance, args.clone())
    }

    /// Removes and returns the value cached for `args` on this instance.
    pub fn evict(&self, args: &CallArgs) -> AuxiliumResult<Value> {
        self.descriptor.pop(self.instance, args)
    }

    /// Stores `value` as this instance's result for `args`.
    pub fn push(&self, value: Value, args: &CallArgs) {
        self.descriptor.push(self.instance, value, args);
    }

    /// Metadata of the cached method.
    pub const fn metadata(&self) -> &'a Metadata {
        self.descriptor.metadata()
    }

    /// The instance this method is bound to.
    pub const fn instance(&self) -> &'a R {
        self.instance
    }
}
