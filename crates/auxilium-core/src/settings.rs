//! Settings system for django-auxilium-rs.
//!
//! This module provides the [`Settings`] struct, which holds the naming
//! conventions and detection switches used by the decorator and caching
//! machinery, and [`LazySettings`], a globally-accessible, lazily-initialized
//! settings instance.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Naming defaults for the caching decorators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Keyword argument which forces a cached callable to recompute.
    pub recompute_parameter: String,
    /// Metadata attribute marking a callable as cached.
    pub is_cached_attr: String,
    /// Metadata attribute exposing the cache storage attribute name.
    pub cache_attr: String,
    /// Storage attribute pattern for single-value method caches.
    pub cache_attribute_pattern: String,
    /// Storage attribute pattern for memoized method caches.
    pub memoize_attribute_pattern: String,
    /// Storage attribute used for free-function caches on the decorator.
    pub function_attribute: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            recompute_parameter: "recompute".to_string(),
            is_cached_attr: "is_cached".to_string(),
            cache_attr: "cache_attr".to_string(),
            cache_attribute_pattern: "{name}_cache_{hash}".to_string(),
            memoize_attribute_pattern: "{name}_memoize_{hash}".to_string(),
            function_attribute: "cached_value".to_string(),
        }
    }
}

/// The complete set of settings.
///
/// Use [`SETTINGS`] to access the global instance, or [`active`] to fall back
/// to defaults when nothing has been configured.
///
/// # Examples
///
/// ```
/// use auxilium_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.cache.recompute_parameter, "recompute");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled.
    pub debug: bool,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level (e.g. "info", "debug", "warn").
    pub log_level: String,

    // ── Method detection ─────────────────────────────────────────────

    /// Whether to classify callables as methods by their first parameter name.
    ///
    /// Off by default: the heuristic misclassifies free functions whose first
    /// parameter happens to be called `self`, and static methods.
    pub detect_methods_by_name: bool,
    /// First-parameter names treated as a method receiver.
    pub receiver_names: Vec<String>,

    // ── Cache ────────────────────────────────────────────────────────

    /// Naming defaults for the caching decorators.
    pub cache: CacheSettings,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings that don't fit into the above categories.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            log_level: "info".to_string(),
            detect_methods_by_name: false,
            receiver_names: vec!["self".to_string(), "cls".to_string()],
            cache: CacheSettings::default(),
            extra: HashMap::new(),
        }
    }
}

impl Settings {
    /// Returns `true` if `name` is one of the configured receiver names.
    pub fn is_receiver_name(&self, name: &str) -> bool {
        self.receiver_names.iter().any(|r| r == name)
    }
}

/// A lazily-initialized, globally-accessible settings container.
///
/// Call [`configure`](LazySettings::configure) once at startup to set the
/// settings, then use [`get`](LazySettings::get) to access them.
pub struct LazySettings {
    inner: OnceLock<Settings>,
}

impl Default for LazySettings {
    fn default() -> Self {
        Self::new()
    }
}

impl LazySettings {
    /// Creates a new, unconfigured `LazySettings`.
    pub const fn new() -> Self {
        Self {
            inner: OnceLock::new(),
        }
    }

    /// Configures the global settings. Must be called exactly once.
    ///
    /// # Panics
    ///
    /// Panics if settings have already been configured.
    pub fn configure(&self, settings: Settings) {
        self.inner
            .set(settings)
            .expect("Settings have already been configured");
    }

    /// Returns a reference to the configured settings.
    ///
    /// # Panics
    ///
    /// Panics if settings have not been configured.
    pub fn get(&self) -> &Settings {
        self.inner
            .get()
            .expect("Settings have not been configured. Call SETTINGS.configure() first.")
    }

    /// Returns the configured settings, if any.
    pub fn try_get(&self) -> Option<&Settings> {
        self.inner.get()
    }

    /// Returns `true` if settings have been configured.
    pub fn is_configured(&self) -> bool {
        self.inner.get().is_some()
    }
}

/// The global settings instance.
pub static SETTINGS: LazySettings = LazySettings::new();

static DEFAULT_SETTINGS: once_cell::sync::Lazy<Settings> =
    once_cell::sync::Lazy::new(Settings::default);

/// Returns the configured global settings, or the defaults when
/// [`SETTINGS`] has not been configured.
pub fn active() -> &'static Settings {
    SETTINGS.try_get().unwrap_or(&DEFAULT_SETTINGS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(s.debug);
        assert_eq!(s.log_level, "info");
        assert!(!s.detect_methods_by_name);
        assert_eq!(s.receiver_names, vec!["self", "cls"]);
        assert!(s.extra.is_empty());
    }

    #[test]
    fn test_default_cache_settings() {
        let c = CacheSettings::default();
        assert_eq!(c.recompute_parameter, "recompute");
        assert_eq!(c.is_cached_attr, "is_cached");
        assert_eq!(c.cache_attr, "cache_attr");
        assert_eq!(c.cache_attribute_pattern, "{name}_cache_{hash}");
        assert_eq!(c.memoize_attribute_pattern, "{name}_memoize_{hash}");
        assert_eq!(c.function_attribute, "cached_value");
    }

    #[test]
    fn test_is_receiver_name() {
        let s = Settings::default();
        assert!(s.is_receiver_name("self"));
        assert!(s.is_receiver_name("cls"));
        assert!(!s.is_receiver_name("this"));
    }

    #[test]
    fn test_lazy_settings_configure_and_get() {
        let lazy = LazySettings::new();
        assert!(!lazy.is_configured());
        assert!(lazy.try_get().is_none());

        let mut settings = Settings::default();
        settings.debug = false;
        settings.cache.recompute_parameter = "refresh".to_string();

        lazy.configure(settings);
        assert!(lazy.is_configured());
        assert!(!lazy.get().debug);
        assert_eq!(lazy.get().cache.recompute_parameter, "refresh");
    }

    #[test]
    #[should_panic(expected = "already been configured")]
    fn test_lazy_settings_double_configure_panics() {
        let lazy = LazySettings::new();
        lazy.configure(Settings::default());
        lazy.configure(Settings::default());
    }

    #[test]
    #[should_panic(expected = "not been configured")]
    fn test_lazy_settings_get_before_configure_panics() {
        let lazy = LazySettings::new();
        let _ = lazy.get();
    }

    #[test]
    fn test_active_falls_back_to_defaults() {
        assert_eq!(active().cache.is_cached_attr, "is_cached");
    }
}
