use std::path::Path;

use async_trait::async_trait;
use solar_core::{ApiError, ServiceConfig, ServiceFactory, SimulationApi};
use tracing::info;

use crate::catalog::Catalog;
use crate::offline::OfflineSimulationApi;

/// Registers the CSV-catalog backend under the name `offline`. The
/// configured endpoint is the catalog directory.
pub struct OfflineServiceFactory;

#[async_trait]
impl ServiceFactory for OfflineServiceFactory {
    fn backend_name(&self) -> &'static str {
        "offline"
    }

    async fn create(&self, config: &ServiceConfig) -> Result<Box<dyn SimulationApi>, ApiError> {
        let dir = config.endpoint.trim();
        if dir.is_empty() {
            return Err(ApiError::Configuration(
                "offline backend needs a catalog directory".to_string(),
            ));
        }

        let catalog = Catalog::load_dir(Path::new(dir))
            .map_err(|e| ApiError::Configuration(e.to_string()))?;
        info!(dir, "using offline catalog");
        Ok(Box::new(OfflineSimulationApi::new(catalog)))
    }
}
