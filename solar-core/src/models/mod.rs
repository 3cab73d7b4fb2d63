mod bill_limits;
mod contact;
mod exchange_rate;
mod project;
mod request;
mod simulation;
mod simulation_mode;
mod tariff_category;

pub use bill_limits::{BillLimits, LimitsQuery};
pub use contact::{Acknowledgement, ContactMessage, NewsletterSubscription};
pub use exchange_rate::ExchangeRate;
pub use project::{Project, ProjectCapacity, ProjectStats, ProjectStatus};
pub use request::{ComparisonRequest, SimulationParameters, SimulationRequest};
pub use simulation::{
    CapacityCheck, ComparisonEntry, ComparisonProjectInfo, ComparisonResponse, Simulation,
    SimulationResponse, SimulationStats, SimulationSummary,
};
pub use simulation_mode::SimulationMode;
pub use tariff_category::TariffCategory;
