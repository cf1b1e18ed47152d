//! Config loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with [`ServerConfig::default()`]
//! 2. If a config file is given and exists, deep-merge its values over defaults
//! 3. Apply `WSEVENTS_*` environment variable overrides
//! 4. Validate
//!
//! CLI flags are applied by the binary on top of the result.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use super::ServerConfig;
use crate::errors::ConfigError;

/// Load config from an optional JSON file with env var overrides.
///
/// A missing file yields defaults. Invalid JSON or invalid values are errors.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    let defaults = serde_json::to_value(ServerConfig::default())?;

    let merged = match path {
        Some(path) if path.exists() => {
            debug!(?path, "loading config from file");
            let content = std::fs::read_to_string(path)?;
            let user: Value = serde_json::from_str(&content)?;
            deep_merge(defaults, user)
        }
        Some(path) => {
            debug!(?path, "config file not found, using defaults");
            defaults
        }
        None => defaults,
    };

    let mut config: ServerConfig = serde_json::from_value(merged)?;
    apply_env_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `WSEVENTS_*` process environment overrides.
pub fn apply_env_overrides(config: &mut ServerConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

/// Apply overrides read through `lookup`.
///
/// Numbers must parse and fall within range; invalid values are ignored
/// (falling back to file/default).
pub fn apply_overrides(config: &mut ServerConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = read_string(&lookup, "WSEVENTS_HOST") {
        config.host = v;
    }
    if let Some(v) = read_number::<u16>(&lookup, "WSEVENTS_PORT", 0, u16::MAX) {
        config.port = v;
    }
    if let Some(v) = read_number::<usize>(&lookup, "WSEVENTS_MAX_CONNECTIONS", 1, 1_000_000) {
        config.max_connections = v;
    }
    if let Some(v) = read_number::<usize>(&lookup, "WSEVENTS_OUTBOUND_CAPACITY", 1, 1_000_000) {
        config.outbound_capacity = v;
    }
    if let Some(v) = read_string(&lookup, "WSEVENTS_STATIC_DIR") {
        config.static_dir = Some(v.into());
    }
    if let Some(v) = read_string(&lookup, "WSEVENTS_LOG_LEVEL") {
        config.log_level = v;
    }
}

fn read_string(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    let value = lookup(key)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

fn read_number<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, min: T, max: T) -> Option<T>
where
    T: std::str::FromStr + PartialOrd,
{
    let raw = read_string(lookup, key)?;
    match raw.parse::<T>() {
        Ok(v) if v >= min && v <= max => Some(v),
        _ => {
            debug!(key, value = %raw, "ignoring invalid env override");
            None
        }
    }
}
