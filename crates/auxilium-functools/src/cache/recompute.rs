//! The lookup, compute and store cycle shared by every cached wrapper.

use auxilium_core::settings;
use auxilium_core::{AuxiliumError, AuxiliumResult};
use serde_json::Value;

use crate::args::{is_truthy, CallArgs};
use crate::cache::strategy::BaseCache;

/// When a cached wrapper bypasses its cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecomputePolicy {
    /// Keyword argument which, when truthy, forces recomputation.
    pub parameter: String,
    /// Recompute on every call.
    pub always: bool,
}

impl Default for RecomputePolicy {
    fn default() -> Self {
        Self {
            parameter: settings::active().cache.recompute_parameter.clone(),
            always: false,
        }
    }
}

impl RecomputePolicy {
    /// Creates a policy with the given override keyword.
    pub fn new(parameter: impl Into<String>, always: bool) -> Self {
        Self {
            parameter: parameter.into(),
            always,
        }
    }

    /// Removes the override keyword from `args`.
    ///
    /// Returns the remaining arguments and whether recomputation is forced.
    pub fn prepare(&self, mut args: CallArgs) -> (CallArgs, bool) {
        let requested = args
            .take_kwarg(&self.parameter)
            .is_some_and(|value| is_truthy(&value));
        (args, self.always || requested)
    }

    /// Returns the cached value for `args`, computing and storing it on a miss.
    ///
    /// The cache is not locked while `compute` runs, so concurrent misses may
    /// compute more than once; the last store wins. Errors from `compute` are
    /// returned unchanged and nothing is stored.
    pub fn get_or_compute(
        &self,
        cache: &dyn BaseCache,
        args: CallArgs,
        compute: impl FnOnce(&CallArgs) -> AuxiliumResult<Value>,
    ) -> AuxiliumResult<Value> {
        let (args, forced) = self.prepare(args);
        if forced {
            tracing::debug!("cache bypassed, recomputing");
        } else {
            match cache.get(&args) {
                Ok(value) => {
                    tracing::debug!("cache hit");
                    return Ok(value);
                }
                Err(AuxiliumError::NotInCache) => tracing::debug!("cache miss"),
                Err(err) => return Err(err),
            }
        }
        let value = compute(&args)?;
        tracing::debug!("cache store");
        Ok(cache.set(value, &args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::CacheSlots;
    use crate::cache::strategy::{Caching, Memoizing};
    use crate::call_args;
    use serde_json::json;
    use std::cell::Cell;

    #[test]
    fn test_default_uses_settings_parameter() {
        let policy = RecomputePolicy::default();
        assert_eq!(policy.parameter, "recompute");
        assert!(!policy.always);
    }

    #[test]
    fn test_prepare_strips_override() {
        let policy = RecomputePolicy::new("recompute", false);
        let (args, forced) = policy.prepare(call_args!(1; recompute = true, x = 2));
        assert!(forced);
        assert_eq!(args, call_args!(1; x = 2));

        let (args, forced) = policy.prepare(call_args!(; recompute = 0));
        assert!(!forced);
        assert!(args.is_empty());

        let (_, forced) = RecomputePolicy::new("recompute", true).prepare(CallArgs::new());
        assert!(forced);
    }

    #[test]
    fn test_get_or_compute_hit_and_miss() {
        let slots = CacheSlots::new();
        let cache = Caching::new(&slots, "value");
        let policy = RecomputePolicy::new("recompute", false);
        let calls = Cell::new(0);
        let compute = |_args: &CallArgs| {
            calls.set(calls.get() + 1);
            Ok(json!(calls.get()))
        };

        assert_eq!(policy.get_or_compute(&cache, CallArgs::new(), compute).unwrap(), json!(1));
        assert_eq!(policy.get_or_compute(&cache, CallArgs::new(), compute).unwrap(), json!(1));
        assert_eq!(calls.get(), 1);

        let forced = call_args!(; recompute = true);
        assert_eq!(policy.get_or_compute(&cache, forced, compute).unwrap(), json!(2));
        assert_eq!(policy.get_or_compute(&cache, CallArgs::new(), compute).unwrap(), json!(2));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_override_keyword_is_not_part_of_memo_key() {
        let slots = CacheSlots::new();
        let cache = Memoizing::new(&slots, "table");
        let policy = RecomputePolicy::new("refresh", false);

        let seen = policy
            .get_or_compute(&cache, call_args!(3; refresh = true), |args: &CallArgs| {
                Ok(json!(args.len()))
            })
            .unwrap();
        assert_eq!(seen, json!(1));
        assert_eq!(cache.get(&call_args!(3)).unwrap(), json!(1));
    }

    #[test]
    fn test_errors_are_not_stored() {
        let slots = CacheSlots::new();
        let cache = Caching::new(&slots, "value");
        let policy = RecomputePolicy::default();

        let result = policy.get_or_compute(&cache, CallArgs::new(), |_args: &CallArgs| {
            Err(AuxiliumError::TypeError("boom".into()))
        });
        assert!(matches!(result, Err(AuxiliumError::TypeError(_))));
        assert!(slots.is_empty());
    }
}
