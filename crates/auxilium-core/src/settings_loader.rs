//! Settings loading from configuration files.
//!
//! This module provides functions to load [`Settings`] from TOML files, JSON
//! files, and to apply environment variable overrides.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `AUXILIUM_DEBUG` | `debug` |
//! | `AUXILIUM_LOG_LEVEL` | `log_level` |
//! | `AUXILIUM_DETECT_METHODS_BY_NAME` | `detect_methods_by_name` |
//! | `AUXILIUM_RECEIVER_NAMES` | `receiver_names` (comma-separated) |
//! | `AUXILIUM_RECOMPUTE_PARAMETER` | `cache.recompute_parameter` |
//! | `AUXILIUM_IS_CACHED_ATTR` | `cache.is_cached_attr` |
//! | `AUXILIUM_CACHE_ATTR` | `cache.cache_attr` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use auxilium_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file("config/auxilium.toml").unwrap();
//! let settings = settings_loader::from_json_file_with_env("config/auxilium.json").unwrap();
//! ```

use std::path::Path;

use serde_json::Value as Json;

use crate::error::AuxiliumError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Any fields not present in the TOML keep their default values.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, AuxiliumError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| AuxiliumError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, AuxiliumError> {
    let content = read_config(path.as_ref())?;
    from_toml_str(&content)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, AuxiliumError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from a JSON string.
pub fn from_json_str(json_str: &str) -> Result<Settings, AuxiliumError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| AuxiliumError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, AuxiliumError> {
    let content = read_config(path.as_ref())?;
    from_json_str(&content)
}

/// Loads settings from a JSON file and then applies environment variable overrides.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> Result<Settings, AuxiliumError> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `AUXILIUM_*` environment variable overrides to a settings struct.
///
/// Boolean variables accept "true"/"1"/"yes" as true and anything else as false.
pub fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(val) = std::env::var("AUXILIUM_DEBUG") {
        settings.debug = parse_flag(&val);
    }

    if let Ok(val) = std::env::var("AUXILIUM_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Ok(val) = std::env::var("AUXILIUM_DETECT_METHODS_BY_NAME") {
        settings.detect_methods_by_name = parse_flag(&val);
    }

    if let Ok(val) = std::env::var("AUXILIUM_RECEIVER_NAMES") {
        settings.receiver_names = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Ok(val) = std::env::var("AUXILIUM_RECOMPUTE_PARAMETER") {
        settings.cache.recompute_parameter = val;
    }

    if let Ok(val) = std::env::var("AUXILIUM_IS_CACHED_ATTR") {
        settings.cache.is_cached_attr = val;
    }

    if let Ok(val) = std::env::var("AUXILIUM_CACHE_ATTR") {
        settings.cache.cache_attr = val;
    }
}

// ============================================================
// Helpers
// ============================================================

fn parse_flag(val: &str) -> bool {
    matches!(val.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn read_config(path: &Path) -> Result<String, AuxiliumError> {
    Ok(std::fs::read_to_string(path)?)
}

fn merge_over_defaults(
    value: serde_json::Value,
    format: &str,
) -> Result<Settings, AuxiliumError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        AuxiliumError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let mut merged = default_json;
    merge_into(&mut merged, value);
    serde_json::from_value(merged).map_err(|e| {
        AuxiliumError::ConfigurationError(format!(
            "Failed to deserialize settings from {format}: {e}"
        ))
    })
}

/// Converts a parsed TOML document into JSON. Datetimes become strings.
fn toml_to_json(value: toml::Value) -> Json {
    use toml::Value as Toml;

    match value {
        Toml::String(text) => Json::String(text),
        Toml::Integer(number) => Json::from(number),
        Toml::Float(number) => Json::from(number),
        Toml::Boolean(flag) => Json::Bool(flag),
        Toml::Datetime(stamp) => Json::String(stamp.to_string()),
        Toml::Array(items) => items.into_iter().map(toml_to_json).collect(),
        Toml::Table(table) => Json::Object(
            table
                .into_iter()
                .map(|(key, item)| (key, toml_to_json(item)))
                .collect(),
        ),
    }
}

/// Merges `overrides` into `base` in place.
///
/// Objects merge key by key, recursively. Any other override replaces the
/// base value outright, arrays included.
fn merge_into(base: &mut Json, overrides: Json) {
    match (base, overrides) {
        (Json::Object(base), Json::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            debug = false
            log_level = "debug"
            detect_methods_by_name = true
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.log_level, "debug");
        assert!(settings.detect_methods_by_name);
        // Defaults preserved
        assert_eq!(settings.receiver_names, vec!["self", "cls"]);
    }

    #[test]
    fn test_from_toml_str_cache_table() {
        let toml = r#"
            [cache]
            recompute_parameter = "refresh"
            memoize_attribute_pattern = "_{name}_memo"
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.cache.recompute_parameter, "refresh");
        assert_eq!(settings.cache.memoize_attribute_pattern, "_{name}_memo");
        // Untouched keys of the nested table keep their defaults
        assert_eq!(settings.cache.is_cached_attr, "is_cached");
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.cache.cache_attr, "cache_attr");
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = from_toml_str("this is = = not toml");
        assert!(matches!(result, Err(AuxiliumError::ConfigurationError(_))));
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let result = from_toml_str("debug = \"maybe\"");
        assert!(result.is_err());
    }

    // ── JSON loading ────────────────────────────────────────────────

    #[test]
    fn test_from_json_str_basic() {
        let json = r#"{"debug": false, "receiver_names": ["this"], "extra": {"team": "core"}}"#;
        let settings = from_json_str(json).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.receiver_names, vec!["this"]);
        assert_eq!(settings.extra["team"], "core");
    }

    #[test]
    fn test_from_json_str_empty_object() {
        let settings = from_json_str("{}").unwrap();
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(from_json_str("{not json").is_err());
    }

    // ── File loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_file() {
        let dir = std::env::temp_dir().join("auxilium_test_toml");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test_settings.toml");

        std::fs::write(&path, "log_level = \"warn\"\n").unwrap();

        let settings = from_toml_file(&path).unwrap();
        assert_eq!(settings.log_level, "warn");

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(&dir).ok();
    }

    #[test]
    fn test_from_json_file() {
        let dir = std::env::temp_dir().join("auxilium_test_json");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test_settings.json");

        std::fs::write(&path, r#"{"cache": {"cache_attr": "storage"}}"#).unwrap();

        let settings = from_json_file(&path).unwrap();
        assert_eq!(settings.cache.cache_attr, "storage");

        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(&dir).ok();
    }

    #[test]
    fn test_from_toml_file_missing() {
        let result = from_toml_file("/nonexistent/path/auxilium.toml");
        match result {
            Err(AuxiliumError::IoError(err)) => {
                assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected an IO error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_json_file_missing() {
        assert!(from_json_file("/nonexistent/path/auxilium.json").is_err());
    }

    // ── Environment variable overrides ──────────────────────────────

    #[test]
    fn test_apply_env_overrides_receiver_names() {
        let mut settings = Settings::default();
        std::env::set_var("AUXILIUM_RECEIVER_NAMES", "self, this,");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.receiver_names, vec!["self", "this"]);
        std::env::remove_var("AUXILIUM_RECEIVER_NAMES");
    }

    #[test]
    fn test_apply_env_overrides_cache_names() {
        let mut settings = Settings::default();
        std::env::set_var("AUXILIUM_IS_CACHED_ATTR", "memoized");
        std::env::set_var("AUXILIUM_CACHE_ATTR", "storage");
        apply_env_overrides(&mut settings);
        assert_eq!(settings.cache.is_cached_attr, "memoized");
        assert_eq!(settings.cache.cache_attr, "storage");
        std::env::remove_var("AUXILIUM_IS_CACHED_ATTR");
        std::env::remove_var("AUXILIUM_CACHE_ATTR");
    }

    #[test]
    fn test_from_env_flags() {
        std::env::set_var("AUXILIUM_DETECT_METHODS_BY_NAME", "yes");
        let settings = from_env();
        assert!(settings.detect_methods_by_name);
        std::env::remove_var("AUXILIUM_DETECT_METHODS_BY_NAME");
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("off"));
    }

    // ── merge_into helper ───────────────────────────────────────────

    #[test]
    fn test_merge_into_nested() {
        let base = serde_json::json!({"outer": {"a": 1, "b": 2}});
        let over = serde_json::json!({"outer": {"b": 3}});
        let mut merged = base;
        merge_into(&mut merged, over);
        assert_eq!(merged["outer"]["a"], 1);
        assert_eq!(merged["outer"]["b"], 3);
    }

    #[test]
    fn test_merge_into_array_override() {
        let base = serde_json::json!({"list": [1, 2, 3]});
        let over = serde_json::json!({"list": [4]});
        let mut merged = base;
        merge_into(&mut merged, over);
        assert_eq!(merged["list"], serde_json::json!([4]));
    }

    #[test]
    fn test_toml_to_json() {
        let toml_val: toml::Value = toml::from_str(
            r#"
            name = "test"
            count = 42
            [nested]
            key = "value"
        "#,
        )
        .unwrap();

        let json = toml_to_json(toml_val);
        assert_eq!(json["name"], "test");
        assert_eq!(json["count"], 42);
        assert_eq!(json["nested"]["key"], "value");
    }

    #[test]
    fn test_toml_with_env_override() {
        let dir = std::env::temp_dir().join("auxilium_test_toml_env");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings_env.toml");

        std::fs::write(&path, "[cache]\nrecompute_parameter = \"refresh\"\n").unwrap();

        std::env::set_var("AUXILIUM_RECOMPUTE_PARAMETER", "force");
        let settings = from_toml_file_with_env(&path).unwrap();
        assert_eq!(settings.cache.recompute_parameter, "force");

        std::env::remove_var("AUXILIUM_RECOMPUTE_PARAMETER");
        std::fs::remove_file(&path).ok();
        std::fs::remove_dir(&dir).ok();
    }
}
