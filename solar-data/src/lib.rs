//! Offline backend: project and tariff catalogs read from CSV files, with
//! simulations computed locally by the reference engine.

pub mod catalog;
pub mod factory;
pub mod offline;

pub use catalog::{Catalog, CatalogLoadError};
pub use factory::OfflineServiceFactory;
pub use offline::OfflineSimulationApi;
