//! The simulation parameter resolver: the visitor's draft, the bounds that
//! apply to it, and the request it turns into.

mod effective_limit;
mod limit_fetcher;
mod payload;
mod session;
mod simulation_draft;
mod validation;

pub use effective_limit::{
    EffectiveLimit, MAX_COVERAGE_PERCENTAGE, MIN_COVERAGE_PERCENTAGE, resolve_effective_limit,
};
pub use limit_fetcher::{BillLimitsCache, LimitsFetcher, LimitsInputs, LimitsTicket};
pub use payload::{build_payload, mode_field};
pub use session::{SimulationSession, SubmitError};
pub use simulation_draft::{DEFAULT_COVERAGE_PERCENTAGE, SimulationDraft};
pub use validation::validate_draft;
