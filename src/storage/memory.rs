//! DashMap-based configuration store.
//!
//! Used by the `imap-auth-check` binary (loaded from a JSON file) and by
//! tests. Embedding applications normally provide their own [`ConfigStore`].

use dashmap::DashMap;
use serde_json::Value;

use crate::error::{AuthError, Result};

use super::traits::ConfigStore;

/// In-memory `ConfigStore` keyed by `(namespace, key)`.
pub struct MemoryConfigStore {
    values: DashMap<(String, String), String>,
}

impl MemoryConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            values: DashMap::new(),
        }
    }

    /// Load a flat JSON object into `namespace`.
    ///
    /// String values are stored as-is; numbers and booleans are stored in
    /// their JSON text form. `null` values are skipped.
    pub fn from_json(namespace: &str, json: &str) -> Result<Self> {
        let object = match serde_json::from_str::<Value>(json)? {
            Value::Object(object) => object,
            other => {
                return Err(AuthError::InvalidConfig(format!(
                    "Expected a JSON object of settings, got {other}"
                )));
            }
        };

        let store = Self::new();
        for (key, value) in object {
            let value = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(AuthError::InvalidConfig(format!(
                        "Setting {key:?} must be a scalar value"
                    )));
                }
            };
            store
                .values
                .insert((namespace.to_string(), key), value);
        }
        Ok(store)
    }
}

impl Default for MemoryConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn keys(&self, namespace: &str) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self
            .values
            .iter()
            .filter(|entry| entry.key().0 == namespace)
            .map(|entry| entry.key().1.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        Ok(self
            .values
            .get(&(namespace.to_string(), key.to_string()))
            .map(|v| v.value().clone()))
    }

    fn set(&self, namespace: &str, key: &str, value: &str) -> Result<()> {
        self.values
            .insert((namespace.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    fn unset(&self, namespace: &str, key: &str) -> Result<()> {
        self.values.remove(&(namespace.to_string(), key.to_string()));
        Ok(())
    }
}
