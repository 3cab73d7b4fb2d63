//! Investment calculations for community-solar simulations.
//!
//! The remote service is authoritative for these figures; the engine here is
//! used by the offline backend and mirrors the service's rounding.

pub mod common;
pub mod engine;

pub use engine::{
    ANNUAL_GENERATION_FACTOR, DEFAULT_EXCHANGE_RATE, EngineError, PAYBACK_SENTINEL_YEARS,
    PERFORMANCE_RATIO, SimulationEngine, SimulationFigures,
};
