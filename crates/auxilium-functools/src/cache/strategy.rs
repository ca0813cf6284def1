//! Cache strategies.
//!
//! A strategy reads and writes one attribute of a [`CacheSlots`]. [`Caching`]
//! keeps a single value there regardless of arguments, while [`Memoizing`]
//! keeps an object mapping a canonical argument key to a value.

use std::fmt::Write as _;

use auxilium_core::settings::CacheSettings;
use auxilium_core::{AuxiliumError, AuxiliumResult};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::args::CallArgs;
use crate::cache::store::CacheSlots;

/// Storage capability shared by all cache strategies.
pub trait BaseCache {
    /// Returns the cached value for `args`, or [`AuxiliumError::NotInCache`].
    fn get(&self, args: &CallArgs) -> AuxiliumResult<Value>;

    /// Stores `value` for `args` and returns it.
    fn set(&self, value: Value, args: &CallArgs) -> Value;

    /// Removes and returns the cached value for `args`, or
    /// [`AuxiliumError::NotInCache`].
    fn delete(&self, args: &CallArgs) -> AuxiliumResult<Value>;
}

/// Single-value strategy: arguments are ignored.
#[derive(Debug, Clone, Copy)]
pub struct Caching<'a> {
    parent: &'a CacheSlots,
    attr: &'a str,
}

impl<'a> Caching<'a> {
    /// Creates a strategy storing under `attr` of `parent`.
    pub const fn new(parent: &'a CacheSlots, attr: &'a str) -> Self {
        Self { parent, attr }
    }
}

impl BaseCache for Caching<'_> {
    fn get(&self, _args: &CallArgs) -> AuxiliumResult<Value> {
        self.parent.get(self.attr).ok_or(AuxiliumError::NotInCache)
    }

    fn set(&self, value: Value, _args: &CallArgs) -> Value {
        self.parent.set(self.attr, value.clone());
        value
    }

    fn delete(&self, _args: &CallArgs) -> AuxiliumResult<Value> {
        self.parent.remove(self.attr).ok_or(AuxiliumError::NotInCache)
    }
}

/// Memoizing strategy: one value per canonical argument key.
#[derive(Debug, Clone, Copy)]
pub struct Memoizing<'a> {
    parent: &'a CacheSlots,
    attr: &'a str,
}

impl<'a> Memoizing<'a> {
    /// Creates a strategy storing its table under `attr` of `parent`.
    pub const fn new(parent: &'a CacheSlots, attr: &'a str) -> Self {
        Self { parent, attr }
    }
}

impl BaseCache for Memoizing<'_> {
    fn get(&self, args: &CallArgs) -> AuxiliumResult<Value> {
        let key = cache_key(args);
        self.parent
            .with_slot(self.attr, |table| table.and_then(|t| t.get(&key)).cloned())
            .ok_or(AuxiliumError::NotInCache)
    }

    fn set(&self, value: Value, args: &CallArgs) -> Value {
        let key = cache_key(args);
        self.parent.update(self.attr, |slot| {
            // A slot holding something other than a table is replaced.
            let mut table = match slot.take() {
                Some(Value::Object(table)) => table,
                _ => Map::new(),
            };
            table.insert(key, value.clone());
            *slot = Some(Value::Object(table));
        });
        value
    }

    fn delete(&self, args: &CallArgs) -> AuxiliumResult<Value> {
        let key = cache_key(args);
        self.parent
            .update(self.attr, |slot| match slot {
                Some(Value::Object(table)) => table.remove(&key),
                _ => None,
            })
            .ok_or(AuxiliumError::NotInCache)
    }
}

/// The two storage strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// One value per owner.
    Caching,
    /// One value per owner and argument key.
    Memoizing,
}

impl CacheKind {
    /// Binds the strategy to an attribute of `parent`.
    pub fn bind<'a>(self, parent: &'a CacheSlots, attr: &'a str) -> Box<dyn BaseCache + 'a> {
        match self {
            Self::Caching => Box::new(Caching::new(parent, attr)),
            Self::Memoizing => Box::new(Memoizing::new(parent, attr)),
        }
    }

    /// The storage attribute pattern for method caches of this kind.
    pub fn attribute_pattern(self, settings: &CacheSettings) -> &str {
        match self {
            Self::Caching => &settings.cache_attribute_pattern,
            Self::Memoizing => &settings.memoize_attribute_pattern,
        }
    }

    /// The storage attribute of a method called `name`.
    pub fn attribute_name(self, name: &str, settings: &CacheSettings) -> String {
        attribute_name(self.attribute_pattern(settings), name)
    }

    /// Short label used in log events.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Caching => "cache",
            Self::Memoizing => "memoize",
        }
    }
}

/// Canonical memoization key of a call.
///
/// The JSON text of the positional array followed by the JSON text of the
/// keyword `[name, value]` pairs sorted by name, e.g. `[5][]` or
/// `[][["a",1],["b",2]]`. Keyword order never matters; positional order does.
pub fn cache_key(args: &CallArgs) -> String {
    let positional = Value::Array(args.positional().to_vec());
    let keyword = Value::Array(
        args.keyword()
            .iter()
            .map(|(name, value)| Value::Array(vec![Value::String(name.clone()), value.clone()]))
            .collect(),
    );
    format!("{positional}{keyword}")
}

/// A short, process-independent hash of `name`: the first 8 bytes of its
/// SHA-256 digest in lowercase hex.
pub fn stable_hash(name: &str) -> String {
    let digest = Sha256::digest(name.as_bytes());
    digest[..8]
        .iter()
        .fold(String::with_capacity(16), |mut s, b| {
            let _ = write!(s, "{b:02x}");
            s
        })
}

/// Expands `{name}` and `{hash}` in an attribute pattern.
pub fn attribute_name(pattern: &str, name: &str) -> String {
    pattern
        .replace("{name}", name)
        .replace("{hash}", &stable_hash(name))
}
