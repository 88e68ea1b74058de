//! User settings persisted in the key/value store.

use crate::config::{
    DEFAULT_CACHE_HOURS, DEFAULT_LANGUAGE, MAX_CACHE_HOURS, MIN_CACHE_HOURS, keys,
};
use crate::error::{AppError, Result};
use crate::storage::KeyValueStore;
use log::warn;
use serde_json::Value;
use std::time::Duration;

/// Reads the raw cache duration setting in hours.
///
/// Numbers and numeric strings are accepted. Anything else, including zero,
/// reads as the default. Range clamping is applied by [`effective_duration`].
pub async fn cache_duration_hours(store: &dyn KeyValueStore) -> f64 {
    let parsed = match store.get(keys::CACHE_DURATION).await {
        None => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(other) => {
            warn!("Ignoring cache duration of unexpected type: {}", other);
            None
        }
    };

    match parsed {
        Some(hours) if hours != 0.0 => hours,
        _ => DEFAULT_CACHE_HOURS,
    }
}

/// Persists the cache duration in hours.
pub async fn set_cache_duration(store: &dyn KeyValueStore, hours: f64) -> Result<()> {
    let Some(number) = serde_json::Number::from_f64(hours) else {
        return Err(AppError::Config(format!(
            "cache duration must be finite, got {}",
            hours
        )));
    };
    store.set(keys::CACHE_DURATION, Value::Number(number)).await
}

/// Resolves a duration setting to the duration actually used.
///
/// Values outside `[MIN_CACHE_HOURS, MAX_CACHE_HOURS]` (or not finite) fall
/// back to the default so a bad setting cannot cause a refresh loop.
pub fn effective_duration(hours: f64) -> Duration {
    let hours = if hours.is_finite() && (MIN_CACHE_HOURS..=MAX_CACHE_HOURS).contains(&hours) {
        hours
    } else {
        warn!(
            "Cache duration {}h outside [{}, {}], using {}h",
            hours, MIN_CACHE_HOURS, MAX_CACHE_HOURS, DEFAULT_CACHE_HOURS
        );
        DEFAULT_CACHE_HOURS
    };
    Duration::from_secs_f64(hours * 3600.0)
}

/// Reads the UI language code.
pub async fn language(store: &dyn KeyValueStore) -> String {
    match store.get(keys::LANGUAGE).await {
        Some(Value::String(code)) if !code.is_empty() => code,
        _ => DEFAULT_LANGUAGE.to_string(),
    }
}

/// Persists the UI language code.
pub async fn set_language(store: &dyn KeyValueStore, code: &str) -> Result<()> {
    store.set(keys::LANGUAGE, Value::from(code)).await
}
