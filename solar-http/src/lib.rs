//! REST/JSON backend for the simulation platform.

pub mod client;
pub mod error;
pub mod factory;

pub use client::{DEFAULT_BASE_URL, HttpSimulationApi};
pub use error::{error_for_status, extract_error_message};
pub use factory::HttpServiceFactory;
