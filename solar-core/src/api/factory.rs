use std::collections::HashMap;

use async_trait::async_trait;

use super::service::{ApiError, SimulationApi};

/// Default request timeout, matching the web client.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Backend-agnostic service configuration.
///
/// `backend` must match the [`ServiceFactory::backend_name`] of a
/// registered factory.  `endpoint` is passed through to that factory
/// unchanged; its meaning is backend-specific.
///
/// | backend    | endpoint examples                           |
/// |------------|---------------------------------------------|
/// | `http`     | `http://localhost:8000/api/v1`              |
/// | `offline`  | `./catalog` (directory holding the CSVs)    |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Lowercase identifier matching a registered factory (e.g. `"http"`).
    pub backend: String,
    /// Opaque value forwarded to the factory's `create` method.
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            backend: "http".to_string(),
            endpoint: "http://localhost:8000/api/v1".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// One implementation per backend.  Each backend crate exports a unit
/// struct implementing this trait, registered with a [`ServiceRegistry`]
/// at startup.
#[async_trait]
pub trait ServiceFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Build a ready-to-use service.  Implementations may load catalogs or
    /// construct HTTP clients here.
    async fn create(&self, config: &ServiceConfig) -> Result<Box<dyn SimulationApi>, ApiError>;
}

/// Registry of [`ServiceFactory`] instances, keyed by backend name.
pub struct ServiceRegistry {
    factories: HashMap<&'static str, Box<dyn ServiceFactory>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a backend factory, replacing any factory with the same name.
    pub fn register(&mut self, factory: Box<dyn ServiceFactory>) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatch to the factory that matches `config.backend`.
    ///
    /// # Errors
    /// * [`ApiError::Configuration`] if no factory is registered for the
    ///   requested backend name.
    /// * Any error the chosen factory itself returns.
    pub async fn create(
        &self,
        config: &ServiceConfig,
    ) -> Result<Box<dyn SimulationApi>, ApiError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                ApiError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        factory.create(config).await
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
