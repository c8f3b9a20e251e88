//! The set of configured backends.

use std::sync::Arc;

use super::backend::Backend;
use super::config::BackendConfig;
use super::error::StorageError;

/// Selector value addressing every backend.
pub const ALL_BACKENDS: &str = "all";

/// Configured backends, in catalog merge order.
#[derive(Debug, Default)]
pub struct BackendRegistry {
    backends: Vec<Arc<Backend>>,
}

impl BackendRegistry {
    /// Create a registry from already built backends.
    #[must_use]
    pub fn new(backends: Vec<Backend>) -> Self {
        Self {
            backends: backends.into_iter().map(Arc::new).collect(),
        }
    }

    /// Build every backend from its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a provider cannot be initialized or two backends
    /// share an id.
    pub fn from_configs(configs: Vec<BackendConfig>) -> Result<Self, StorageError> {
        let mut backends: Vec<Backend> = Vec::with_capacity(configs.len());
        for config in configs {
            if backends.iter().any(|b| b.id() == config.id) {
                return Err(StorageError::configuration(format!(
                    "duplicate backend id '{}'",
                    config.id
                )));
            }
            if config.id == ALL_BACKENDS || config.id.contains('/') || config.id.is_empty() {
                return Err(StorageError::configuration(format!(
                    "invalid backend id '{}'",
                    config.id
                )));
            }
            backends.push(Backend::from_config(config)?);
        }
        Ok(Self::new(backends))
    }

    /// All backends in merge order.
    #[must_use]
    pub fn all(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    /// Find a backend by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<Backend>> {
        self.backends.iter().find(|b| b.id() == id).cloned()
    }

    /// Whether no backend is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Resolve the backends addressed by a client `storage` field.
    ///
    /// `all` selects every backend, a backend id selects that backend, and an
    /// absent selector falls back to `defaults` (every backend when empty).
    ///
    /// # Errors
    ///
    /// Returns a validation error for unknown ids or an empty registry.
    pub fn select(
        &self,
        selector: Option<&str>,
        defaults: &[String],
    ) -> Result<Vec<Arc<Backend>>, StorageError> {
        if self.backends.is_empty() {
            return Err(StorageError::validation("no storage backend configured"));
        }

        let lookup = |id: &str| {
            self.get(id)
                .ok_or_else(|| StorageError::validation(format!("unknown storage '{id}'")))
        };

        match selector.map(str::trim).filter(|s| !s.is_empty()) {
            Some(ALL_BACKENDS) => Ok(self.backends.clone()),
            Some(id) => Ok(vec![lookup(id)?]),
            None if defaults.is_empty() => Ok(self.backends.clone()),
            None => defaults.iter().map(|id| lookup(id)).collect(),
        }
    }
}
