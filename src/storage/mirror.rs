use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use super::KeyValueStore;

/// Typed JSON view over a [`KeyValueStore`].
///
/// Best effort only: write failures and corrupt values are logged and
/// swallowed so a broken local copy never fails the caller.
#[derive(Clone)]
pub struct Mirror {
    store: Arc<dyn KeyValueStore>,
}

impl Mirror {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.save_raw(key, &json),
            Err(e) => error!("Failed to serialize value for '{key}': {e}"),
        }
    }

    /// Returns `None` when the key is absent or its value no longer parses.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                error!("Failed to parse stored value for '{key}': {e}");
                None
            }
        }
    }

    pub fn save_raw(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            error!("Failed to write '{key}' to storage: {e}");
        }
    }

    pub fn load_raw(&self, key: &str) -> Option<String> {
        self.store.get(key)
    }

    pub fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            error!("Failed to remove '{key}' from storage: {e}");
        }
    }

    pub fn remove_prefix(&self, prefix: &str) {
        for key in self.store.keys().into_iter().filter(|k| k.starts_with(prefix)) {
            self.remove(&key);
        }
    }

    pub fn keys(&self) -> Vec<String> {
        self.store.keys()
    }
}
