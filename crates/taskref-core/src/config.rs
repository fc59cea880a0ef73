// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Lazy-layer settings and the storage port they are loaded through.
//!
//! Settings are typed documents ([`ConfigDocument`]) stored as JSON under a
//! fixed key. A missing or empty document loads as its `Default`.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Storage port for raw config documents, keyed by document name.
pub trait ConfigStore {
    /// Raw bytes stored under `key`. Fails with [`ConfigError::NotFound`]
    /// when nothing is stored.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replace whatever is stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// A settings document persisted under a fixed key.
pub trait ConfigDocument: Serialize + DeserializeOwned + Default {
    /// Store key the document lives under.
    const KEY: &'static str;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing stored under the key.
    #[error("[CONFIG_NOT_FOUND] nothing stored under `{key}`")]
    NotFound {
        /// The key that was looked up.
        key: String,
    },
    /// I/O failure in a file-backed store.
    #[error("[CONFIG_IO] {0}")]
    Io(#[from] std::io::Error),
    /// The document under `key` could not be (de)serialized.
    #[error("[CONFIG_SERDE] document `{key}`: {source}")]
    Serde {
        /// The document's key.
        key: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Store-specific failure.
    #[error("[CONFIG_STORE] {0}")]
    Store(String),
}

impl ConfigError {
    /// Shorthand for [`ConfigError::NotFound`].
    pub fn not_found(key: &str) -> Self {
        Self::NotFound {
            key: key.to_owned(),
        }
    }

    fn serde(key: &str, source: serde_json::Error) -> Self {
        Self::Serde {
            key: key.to_owned(),
            source,
        }
    }
}

/// Reads and writes [`ConfigDocument`]s through a [`ConfigStore`].
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Create a service over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Load document `T`; a missing or empty document yields `T::default()`.
    pub fn load<T: ConfigDocument>(&self) -> Result<T, ConfigError> {
        let bytes = match self.store.load_raw(T::KEY) {
            Ok(bytes) => bytes,
            Err(ConfigError::NotFound { .. }) => return Ok(T::default()),
            Err(err) => return Err(err),
        };
        if bytes.is_empty() {
            return Ok(T::default());
        }
        serde_json::from_slice(&bytes).map_err(|e| ConfigError::serde(T::KEY, e))
    }

    /// Like [`ConfigService::load`], but any failure yields defaults (logged).
    pub fn load_or_default<T: ConfigDocument>(&self) -> T {
        self.load().unwrap_or_else(|err| {
            warn!(key = T::KEY, %err, "unreadable config document; using defaults");
            T::default()
        })
    }

    /// Persist document `T` as pretty JSON.
    pub fn save<T: ConfigDocument>(&self, doc: &T) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(doc).map_err(|e| ConfigError::serde(T::KEY, e))?;
        debug!(key = T::KEY, bytes = data.len(), "saving config document");
        self.store.save_raw(T::KEY, &data)
    }
}

/// How a [`LazyTask`](crate::LazyTask) treats repeated access to record data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferencePolicy {
    /// Fetch once, keep the record for every later accessor.
    #[default]
    Memoize,
    /// Fetch again on every accessor that needs record data.
    Refetch,
}

/// Settings for lazy tasks and lazy task sets, stored under `lazy`.
///
/// Every field has a default, so a partial (or empty) JSON object is a valid
/// config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LazyConfig {
    /// Record caching for single references. Sets always memoize.
    pub reference_policy: ReferencePolicy,
    /// Log a warning when a set materializes more uuids than this.
    pub warn_materialize_above: Option<usize>,
}

impl Default for LazyConfig {
    fn default() -> Self {
        Self {
            reference_policy: ReferencePolicy::Memoize,
            warn_materialize_above: Some(500),
        }
    }
}

impl ConfigDocument for LazyConfig {
    const KEY: &'static str = "lazy";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MapStore(RefCell<HashMap<String, Vec<u8>>>);

    impl ConfigStore for MapStore {
        fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
            self.0
                .borrow()
                .get(key)
                .cloned()
                .ok_or_else(|| ConfigError::not_found(key))
        }

        fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
            self.0.borrow_mut().insert(key.to_owned(), data.to_vec());
            Ok(())
        }
    }

    #[test]
    fn missing_config_loads_defaults() {
        let service = ConfigService::new(MapStore::default());
        assert_eq!(service.load::<LazyConfig>().unwrap(), LazyConfig::default());
    }

    #[test]
    fn empty_document_loads_defaults() {
        let store = MapStore::default();
        store.save_raw(LazyConfig::KEY, b"").unwrap();
        let service = ConfigService::new(store);
        assert_eq!(service.load::<LazyConfig>().unwrap(), LazyConfig::default());
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let store = MapStore::default();
        store
            .save_raw(LazyConfig::KEY, br#"{"reference_policy":"refetch"}"#)
            .unwrap();
        let config: LazyConfig = ConfigService::new(store).load().unwrap();
        assert_eq!(config.reference_policy, ReferencePolicy::Refetch);
        assert_eq!(config.warn_materialize_above, Some(500));
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let service = ConfigService::new(MapStore::default());
        let config = LazyConfig {
            reference_policy: ReferencePolicy::Refetch,
            warn_materialize_above: None,
        };
        service.save(&config).unwrap();
        assert!(service.store().0.borrow().contains_key("lazy"));
        assert_eq!(service.load::<LazyConfig>().unwrap(), config);
    }

    #[test]
    fn corrupt_config_names_its_key_and_falls_back_to_defaults() {
        let store = MapStore::default();
        store.save_raw(LazyConfig::KEY, b"{not json").unwrap();
        let service = ConfigService::new(store);

        let err = service.load::<LazyConfig>().unwrap_err();
        assert!(matches!(&err, ConfigError::Serde { key, .. } if key == "lazy"));
        assert!(err.to_string().contains("`lazy`"));
        assert_eq!(service.load_or_default::<LazyConfig>(), LazyConfig::default());
    }
}
