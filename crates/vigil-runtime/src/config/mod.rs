//! Configuration: schema, loading, and the shared runtime store.
//!
//! The [`ConfigStore`] is the single mutable configuration owned by the
//! composition root and shared (via `Arc`) with the supervisor. Runtime
//! reconfiguration flows exclusively through
//! [`ConfigStore::update_from_json`], which deep-merges a JSON delta
//! into the current configuration; the supervisor then restarts
//! affected modules.

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::{CoreConfig, HttpConfig, NotifyConfig, VigilConfig};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

/// Shared, thread-safe configuration store.
///
/// Reads take a snapshot (cheap clone); writes replace the whole
/// validated config under the lock. Point-in-time consistency only —
/// a reader may observe the config from just before an update.
#[derive(Debug)]
pub struct ConfigStore {
    inner: RwLock<VigilConfig>,
}

impl ConfigStore {
    /// Wraps a loaded configuration.
    #[must_use]
    pub fn new(config: VigilConfig) -> Self {
        Self {
            inner: RwLock::new(config),
        }
    }

    /// Returns a point-in-time copy of the full configuration.
    #[must_use]
    pub fn snapshot(&self) -> VigilConfig {
        self.inner.read().clone()
    }

    /// Returns the configuration section for an engine
    /// (case-insensitive), or `Value::Null` if absent.
    #[must_use]
    pub fn engine_config(&self, name: &str) -> Value {
        self.inner
            .read()
            .engine(name)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Returns the shared notification settings.
    #[must_use]
    pub fn notify(&self) -> NotifyConfig {
        self.inner.read().core.notify.clone()
    }

    /// Deep-merges a JSON delta into the configuration.
    ///
    /// Object fields are merged recursively; scalars and arrays in the
    /// delta replace the current value. The merged result must still
    /// deserialize as a valid [`VigilConfig`], otherwise the store is
    /// left untouched.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidDelta`] when the delta is not a JSON
    /// object or the merged result is schema-invalid.
    pub fn update_from_json(&self, delta: &Value) -> Result<(), ConfigError> {
        if !delta.is_object() {
            return Err(ConfigError::InvalidDelta(
                "delta must be a JSON object".into(),
            ));
        }

        let mut guard = self.inner.write();
        let mut merged = serde_json::to_value(&*guard)
            .map_err(|err| ConfigError::InvalidDelta(err.to_string()))?;
        merge_values(&mut merged, delta);
        let updated: VigilConfig = serde_json::from_value(merged)
            .map_err(|err| ConfigError::InvalidDelta(err.to_string()))?;

        debug!("configuration delta applied");
        *guard = updated;
        Ok(())
    }
}

/// Recursive JSON object merge: delta wins, objects merge key-wise.
fn merge_values(base: &mut Value, delta: &Value) {
    match (base, delta) {
        (Value::Object(base_map), Value::Object(delta_map)) => {
            for (key, delta_val) in delta_map {
                match base_map.get_mut(key) {
                    Some(base_val) => merge_values(base_val, delta_val),
                    None => {
                        base_map.insert(key.clone(), delta_val.clone());
                    }
                }
            }
        }
        (base, delta) => *base = delta.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> ConfigStore {
        let config: VigilConfig = toml::from_str(
            r#"
            [core]
            active_modules = ["heartbeat"]
            [core.notify]
            sender = "vigil@example.com"
            [engines.heartbeat]
            interval_secs = 5
            "#,
        )
        .unwrap();
        ConfigStore::new(config)
    }

    #[test]
    fn engine_config_lookup() {
        let store = store();
        assert_eq!(
            store.engine_config("HEARTBEAT"),
            json!({ "interval_secs": 5 })
        );
        assert_eq!(store.engine_config("missing"), Value::Null);
    }

    #[test]
    fn delta_merges_engine_section() {
        let store = store();
        store
            .update_from_json(&json!({
                "engines": { "heartbeat": { "interval_secs": 1 } }
            }))
            .unwrap();
        assert_eq!(
            store.engine_config("heartbeat"),
            json!({ "interval_secs": 1 })
        );
        // Untouched sections survive the merge.
        assert_eq!(store.notify().sender, "vigil@example.com");
    }

    #[test]
    fn delta_adds_new_keys() {
        let store = store();
        store
            .update_from_json(&json!({
                "engines": { "file_watch": { "paths": ["/tmp"] } }
            }))
            .unwrap();
        assert_eq!(
            store.engine_config("file_watch"),
            json!({ "paths": ["/tmp"] })
        );
    }

    #[test]
    fn non_object_delta_rejected() {
        let store = store();
        let err = store.update_from_json(&json!(["not", "an", "object"]));
        assert!(matches!(err, Err(ConfigError::InvalidDelta(_))));
        // Store unchanged.
        assert_eq!(store.snapshot().core.active_modules, vec!["heartbeat"]);
    }

    #[test]
    fn schema_invalid_delta_leaves_store_untouched() {
        let store = store();
        let err = store.update_from_json(&json!({
            "core": { "http": { "port": "not-a-port" } }
        }));
        assert!(err.is_err());
        assert_eq!(store.snapshot().core.http.port, 8462);
    }
}
