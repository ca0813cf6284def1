//! Per-owner cache storage.
//!
//! Cached values live in a [`CacheSlots`] owned by whatever the cache belongs
//! to: an instance for cached methods, the decorator itself for cached free
//! functions. Types opt into method caching by implementing [`Cacheable`].

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use serde_json::Value;

/// An attribute store (attribute name to value) guarded by a lock.
///
/// Every single operation is atomic. A read followed by a write is not, so two
/// threads missing the same slot may both compute and the last store wins.
///
/// # Examples
///
/// ```
/// use auxilium_functools::cache::CacheSlots;
/// use serde_json::json;
///
/// let slots = CacheSlots::new();
/// slots.set("answer_cache", json!(42));
/// assert_eq!(slots.get("answer_cache"), Some(json!(42)));
/// assert_eq!(slots.remove("answer_cache"), Some(json!(42)));
/// assert!(slots.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct CacheSlots {
    slots: RwLock<HashMap<String, Value>>,
}

impl Clone for CacheSlots {
    /// Clones the current contents into an independent store.
    fn clone(&self) -> Self {
        Self {
            slots: RwLock::new(self.slots.read().expect("cache slots lock poisoned").clone()),
        }
    }
}

impl CacheSlots {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the value stored under `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.slots
            .read()
            .expect("cache slots lock poisoned")
            .get(name)
            .cloned()
    }

    /// Runs `f` on the value stored under `name` without copying it.
    pub fn with_slot<T>(&self, name: &str, f: impl FnOnce(Option<&Value>) -> T) -> T {
        let slots = self.slots.read().expect("cache slots lock poisoned");
        f(slots.get(name))
    }

    /// Stores `value` under `name`, replacing any previous value.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.slots
            .write()
            .expect("cache slots lock poisoned")
            .insert(name.into(), value);
    }

    /// Removes and returns the value stored under `name`.
    pub fn remove(&self, name: &str) -> Option<Value> {
        self.slots
            .write()
            .expect("cache slots lock poisoned")
            .remove(name)
    }

    /// Returns `true` if something is stored under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.slots
            .read()
            .expect("cache slots lock poisoned")
            .contains_key(name)
    }

    /// Atomically reads and rewrites the slot `name`.
    ///
    /// `f` receives the current value (`None` when empty). Whatever it leaves
    /// in the slot is stored back; leaving `None` empties the slot.
    pub fn update<T>(&self, name: &str, f: impl FnOnce(&mut Option<Value>) -> T) -> T {
        let mut slots = self.slots.write().expect("cache slots lock poisoned");
        let mut slot = slots.remove(name);
        let result = f(&mut slot);
        if let Some(value) = slot {
            slots.insert(name.to_string(), value);
        }
        result
    }

    /// Returns the names of all occupied slots, sorted.
    pub fn attributes(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .slots
            .read()
            .expect("cache slots lock poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.read().expect("cache slots lock poisoned").len()
    }

    /// Returns `true` if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empties every slot.
    pub fn clear(&self) {
        self.slots.write().expect("cache slots lock poisoned").clear();
    }
}

/// A type whose instances can hold cached method results.
///
/// # Examples
///
/// ```
/// use auxilium_functools::cache::{CacheSlots, Cacheable};
///
/// struct Report {
///     rows: Vec<u32>,
///     cache: CacheSlots,
/// }
///
/// impl Cacheable for Report {
///     fn cache_slots(&self) -> &CacheSlots {
///         &self.cache
///     }
/// }
/// ```
pub trait Cacheable {
    /// Whether distinct values of the type are distinct cache owners.
    ///
    /// When `false`, a cached method keeps its values in a store of its own
    /// instead of [`cache_slots`](Self::cache_slots), so two methods with the
    /// same name never share an entry.
    const PER_INSTANCE: bool = true;

    /// Returns the instance's cache storage.
    fn cache_slots(&self) -> &CacheSlots;
}

/// Slots handed out for `()`. Cached methods never store here.
static UNIT_SLOTS: Lazy<CacheSlots> = Lazy::new(CacheSlots::new);

impl Cacheable for () {
    const PER_INSTANCE: bool = false;

    fn cache_slots(&self) -> &CacheSlots {
        &UNIT_SLOTS
    }
}

impl Cacheable for CacheSlots {
    fn cache_slots(&self) -> &CacheSlots {
        self
    }
}
