//! Field-by-field merging of values supplied by different tiers.
//!
//! Scalars and lists from a higher tier replace the lower tier's value;
//! mappings (for example `sentinel_kwargs`) are merged key by key.

use serde_json::Value;

/// Merge `overlay` onto `base`, with `overlay` taking precedence.
///
/// - Mappings are merged recursively
/// - Lists, strings, numbers and booleans replace the base value
/// - A null overlay keeps the base value (null means "not specified")
///
/// # Example
/// ```
/// use serde_json::json;
/// use celery_broker_config::config::deep_merge;
///
/// let base = json!({"master_name": "mymaster", "socket_timeout": 5});
/// let overlay = json!({"socket_timeout": 10});
/// assert_eq!(
///     deep_merge(base, overlay),
///     json!({"master_name": "mymaster", "socket_timeout": 10})
/// );
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (base, Value::Null) => base,
        (_, overlay) => overlay,
    }
}
