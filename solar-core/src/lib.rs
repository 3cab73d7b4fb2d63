pub mod api;
pub mod calculations;
pub mod draft;
pub mod models;
pub mod validation;

pub use api::factory::{ServiceConfig, ServiceFactory, ServiceRegistry};
pub use api::service::{ApiError, SimulationApi};
pub use draft::{EffectiveLimit, SimulationDraft, SimulationSession, SubmitError};
pub use models::*;
pub use validation::{FieldError, ValidationErrors};
