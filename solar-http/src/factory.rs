use std::time::Duration;

use async_trait::async_trait;
use solar_core::{ApiError, ServiceConfig, ServiceFactory, SimulationApi};
use tracing::info;

use crate::client::{DEFAULT_BASE_URL, HttpSimulationApi};

/// Registers the REST backend under the name `http`.
pub struct HttpServiceFactory;

#[async_trait]
impl ServiceFactory for HttpServiceFactory {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    async fn create(&self, config: &ServiceConfig) -> Result<Box<dyn SimulationApi>, ApiError> {
        let endpoint = match config.endpoint.trim() {
            "" => DEFAULT_BASE_URL,
            endpoint => endpoint,
        };
        let api = HttpSimulationApi::new(endpoint, Duration::from_secs(config.timeout_secs))?;
        info!(endpoint = api.base_url(), "using simulation service");
        Ok(Box::new(api))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_endpoint_falls_back_to_default() {
        let config = ServiceConfig {
            backend: "http".to_string(),
            endpoint: String::new(),
            timeout_secs: 30,
        };
        assert!(HttpServiceFactory.create(&config).await.is_ok());
    }

    #[tokio::test]
    async fn invalid_endpoint_is_a_configuration_error() {
        let config = ServiceConfig {
            backend: "http".to_string(),
            endpoint: "ftp://example.test".to_string(),
            timeout_secs: 30,
        };
        assert!(matches!(
            HttpServiceFactory.create(&config).await,
            Err(ApiError::Configuration(_))
        ));
    }
}
